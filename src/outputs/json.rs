//! JSON artifact for the grouped report.
//!
//! Written next to the text artifacts on every run, overwriting the
//! previous one:
//!
//! ```text
//! output_dir/
//! └── final_report.json
//! ```
//!
//! Member indices are resolved to their outlet and URL so the file stands
//! on its own.

use crate::models::{PressCritique, SummarizedItem, TopicGroup};
use crate::outputs::report::Edition;
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub const JSON_FILENAME: &str = "final_report.json";

#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub date: &'a str,
    pub mode: &'a str,
    pub coverage: Vec<CoverageEntry<'a>>,
    pub topics: Vec<TopicDocument<'a>>,
}

#[derive(Debug, Serialize)]
pub struct CoverageEntry<'a> {
    pub source: &'a str,
    pub links: usize,
}

#[derive(Debug, Serialize)]
pub struct TopicDocument<'a> {
    pub label: &'a str,
    pub articles: Vec<ArticleRef<'a>>,
    pub summary_bullets: &'a [String],
    pub narrative_body: &'a str,
    pub critiques: &'a [PressCritique],
}

#[derive(Debug, Serialize)]
pub struct ArticleRef<'a> {
    pub source: &'a str,
    pub url: &'a str,
    pub summary: &'a str,
}

impl<'a> ReportDocument<'a> {
    pub fn new(edition: &'a Edition, groups: &'a [TopicGroup], items: &'a [SummarizedItem]) -> Self {
        Self {
            date: &edition.date,
            mode: &edition.mode_label,
            coverage: edition
                .coverage
                .iter()
                .map(|(source, links)| CoverageEntry {
                    source,
                    links: *links,
                })
                .collect(),
            topics: groups
                .iter()
                .map(|group| TopicDocument {
                    label: &group.label,
                    articles: group
                        .member_indices
                        .iter()
                        .filter_map(|&idx| items.get(idx))
                        .map(|entry| ArticleRef {
                            source: &entry.item.source,
                            url: &entry.item.url,
                            summary: &entry.summary,
                        })
                        .collect(),
                    summary_bullets: &group.summary_bullets,
                    narrative_body: &group.narrative_body,
                    critiques: &group.critiques,
                })
                .collect(),
        }
    }
}

/// Serialize `document` to `{output_dir}/final_report.json`.
///
/// # Returns
///
/// The path written, or an error if serialization or the write fails.
#[instrument(level = "info", skip_all, fields(%output_dir))]
pub async fn write_report_json(
    document: &ReportDocument<'_>,
    output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(document)?;
    fs::create_dir_all(output_dir).await?;

    let path = Path::new(output_dir).join(JSON_FILENAME);
    fs::write(&path, json).await?;
    info!(path = %path.display(), topics = document.topics.len(), "Wrote JSON report");
    Ok(path)
}
