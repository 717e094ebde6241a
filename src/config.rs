//! Run configuration.
//!
//! Everything a run needs is collected once in `main` into a [`RunConfig`]
//! and passed down explicitly. Outlets default to the six national dailies
//! below and can be replaced with a YAML list:
//!
//! ```yaml
//! - name: 동아일보
//!   code: "020"
//! - name: 한겨레
//!   code: "028"
//! ```

use crate::delivery::{CHUNK_DELAY, CHUNK_LIMIT};
use crate::models::SourceSpec;
use std::error::Error;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

/// Outlets polled when no outlet file is given: (name, code).
pub const DEFAULT_SOURCES: [(&str, &str); 6] = [
    ("동아일보", "020"),
    ("한국일보", "469"),
    ("조선일보", "023"),
    ("중앙일보", "025"),
    ("한겨레", "028"),
    ("경향신문", "032"),
];

pub fn default_sources() -> Vec<SourceSpec> {
    DEFAULT_SOURCES
        .iter()
        .map(|(name, code)| SourceSpec::new(name, code))
        .collect()
}

/// Load outlets from a YAML file, or use [`DEFAULT_SOURCES`] when `path` is `None`.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed, or lists no outlets.
#[instrument(level = "info")]
pub async fn load_sources(path: Option<&str>) -> Result<Vec<SourceSpec>, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(default_sources());
    };
    let text = fs::read_to_string(path).await?;
    let sources: Vec<SourceSpec> = serde_yaml::from_str(&text)?;
    if sources.is_empty() {
        return Err(format!("{path} lists no outlets").into());
    }
    info!(count = sources.len(), "Loaded outlets");
    Ok(sources)
}

/// Which model configuration the collaborator calls use.
///
/// The lite tier points `awful_aj` at a cheaper model; the pipeline is the
/// same for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Standard,
    Lite,
}

impl ModelTier {
    pub fn from_lite_flag(lite: bool) -> Self {
        if lite { ModelTier::Lite } else { ModelTier::Standard }
    }

    /// Shown in report headers.
    pub fn label(self) -> &'static str {
        match self {
            ModelTier::Standard => "standard",
            ModelTier::Lite => "lite",
        }
    }

    /// `awful_aj` configuration file, relative to its config directory.
    pub fn config_filename(self) -> &'static str {
        match self {
            ModelTier::Standard => "config.yaml",
            ModelTier::Lite => "config_lite.yaml",
        }
    }
}

/// Where the links for a run come from, and where they are recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFiles {
    /// Read links from this file instead of discovering them.
    pub input: Option<String>,
    /// Write the links used by this run to this file.
    pub output: Option<String>,
}

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Edition date, `YYYYMMDD`.
    pub date: String,
    pub sources: Vec<SourceSpec>,
    pub tier: ModelTier,
    /// Directory receiving `final_report.{txt,html,json}`.
    pub output_dir: String,
    pub link_files: LinkFiles,
    pub chunk_limit: usize,
    pub chunk_delay: Duration,
}

impl RunConfig {
    pub fn new(date: String, sources: Vec<SourceSpec>, tier: ModelTier, output_dir: String) -> Self {
        Self {
            date,
            sources,
            tier,
            output_dir,
            link_files: LinkFiles::default(),
            chunk_limit: CHUNK_LIMIT,
            chunk_delay: CHUNK_DELAY,
        }
    }
}
