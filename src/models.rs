//! Data models shared by every pipeline stage.
//!
//! Everything here lives for a single run:
//! - [`SourceSpec`]: a configured outlet (static configuration)
//! - [`CandidateLink`]: an article URL discovered on an outlet's listing page
//! - [`FetchedItem`]: a candidate with its extracted body, or a failure sentinel
//! - [`SummarizedItem`]: a fetched item that the LLM summarised successfully
//! - [`TopicGroup`]: a cluster of summarised items covering one story
//! - [`RenderedReport`], [`DeliveryChunk`], [`DeliveryOutcome`]: output side

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text shown wherever an article body could not be fetched.
pub const NO_CONTENT: &str = "no content";

/// A news outlet polled by the link extractor.
///
/// `code` is the outlet identifier used in the listing-page URL template
/// and in article paths (`/article/newspaper/{code}/`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceSpec {
    /// Display name of the outlet (e.g. `"동아일보"`).
    pub name: String,
    /// Stable outlet code (e.g. `"020"`).
    pub code: String,
}

impl SourceSpec {
    pub fn new(name: &str, code: &str) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
        }
    }
}

/// An article URL believed to be front-page content for one outlet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CandidateLink {
    /// Outlet display name.
    pub source: String,
    /// Absolute article URL.
    pub url: String,
}

/// Extracted article text, or the marker for a fetch that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleBody {
    Text(String),
    Unavailable,
}

impl ArticleBody {
    /// The extracted text, if the fetch succeeded.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArticleBody::Text(text) => Some(text),
            ArticleBody::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ArticleBody::Text(_))
    }
}

impl fmt::Display for ArticleBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleBody::Text(text) => f.write_str(text),
            ArticleBody::Unavailable => f.write_str(NO_CONTENT),
        }
    }
}

/// One attempted article fetch. The fetcher returns exactly one of these
/// per [`CandidateLink`], in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedItem {
    pub source: String,
    pub url: String,
    pub body: ArticleBody,
}

impl FetchedItem {
    pub fn failed(link: &CandidateLink) -> Self {
        Self {
            source: link.source.clone(),
            url: link.url.clone(),
            body: ArticleBody::Unavailable,
        }
    }
}

/// A fetched item together with the collaborator's per-article summary.
///
/// Topic classification indexes into a slice of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizedItem {
    pub item: FetchedItem,
    pub summary: String,
}

/// How one outlet framed a topic, as reported by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct PressCritique {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub tone: String,
}

/// Items grouped under one story label.
///
/// `member_indices` always point into the summarised item slice the group
/// was built from, and no index appears in two groups of the same pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicGroup {
    pub label: String,
    pub member_indices: Vec<usize>,
    pub summary_bullets: Vec<String>,
    pub narrative_body: String,
    pub critiques: Vec<PressCritique>,
}

/// A flattened rendering ready to be written out or chunked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub header: String,
    pub body: String,
}

impl RenderedReport {
    /// Header and body joined into the text that actually gets delivered.
    pub fn text(&self) -> String {
        format!("{}{}", self.header, self.body)
    }
}

/// One transport-safe piece of a rendered report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryChunk {
    /// Zero-based position of the chunk in the report.
    pub sequence_index: usize,
    /// Chunk text including the `(i/total)` header when there is more than one chunk.
    pub text: String,
}

/// Result of sending one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub chunk_index: usize,
    pub success: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_body_display() {
        assert_eq!(ArticleBody::Text("본문".to_string()).to_string(), "본문");
        assert_eq!(ArticleBody::Unavailable.to_string(), NO_CONTENT);
    }

    #[test]
    fn test_failed_item_keeps_identity() {
        let link = CandidateLink {
            source: "한겨레".to_string(),
            url: "https://n.news.naver.com/article/newspaper/028/1?date=20250101".to_string(),
        };
        let item = FetchedItem::failed(&link);
        assert_eq!(item.source, link.source);
        assert_eq!(item.url, link.url);
        assert!(!item.body.is_available());
        assert_eq!(item.body.as_text(), None);
    }

    #[test]
    fn test_rendered_report_text() {
        let report = RenderedReport {
            header: "head\n".to_string(),
            body: "body\n".to_string(),
        };
        assert_eq!(report.text(), "head\nbody\n");
    }

    #[test]
    fn test_source_spec_from_yaml() {
        let yaml = "- name: 동아일보\n  code: \"020\"\n- name: 한겨레\n  code: \"028\"\n";
        let specs: Vec<SourceSpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0], SourceSpec::new("동아일보", "020"));
    }
}
