//! Run-level failures.
//!
//! Per-item problems (a listing page that would not load, an article that
//! timed out, a summary that came back empty) never surface here; they are
//! logged and recorded in the data. Only conditions that stop a run without
//! producing a report are represented.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no article links were discovered from any outlet")]
    NoLinks,

    #[error("no article could be summarised")]
    NoSummaries,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("output error: {0}")]
    Output(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
