//! Collaborator calls: per-article summaries and the aggregate topic classification.
//!
//! Both calls go through [`AskAsync`]. Model output is treated as untrusted
//! text; validation of the classification result lives in
//! [`crate::topics`].

use crate::api::AskAsync;
use crate::models::{FetchedItem, SummarizedItem};
use crate::utils::{truncate_chars, truncate_for_log};
use futures::stream::{self, StreamExt};
use std::fmt::Write;
use tracing::{debug, error, info, instrument, warn};

/// Maximum number of summary calls in flight at once.
pub const PARALLEL_SUMMARIES: usize = 12;

/// Characters of each summary included in the classification payload.
pub const CLASSIFY_EXCERPT_CHARS: usize = 2000;

/// Input text for summarising one article.
pub fn summary_prompt(source: &str, url: &str, body: &str) -> String {
    format!("[Outlet] {source}\n[URL] {url}\n\n[Article]\n{body}")
}

/// Summarise every fetched article that has content.
///
/// Items carrying the failure sentinel are not sent. A call that fails or
/// returns only whitespace drops that item; the rest are returned in input
/// order.
#[instrument(level = "info", skip_all, fields(count = items.len()))]
pub async fn summarize_items<A>(asker: &A, items: Vec<FetchedItem>) -> Vec<SummarizedItem>
where
    A: AskAsync<Response = String>,
{
    let total = items.len();
    let (with_content, without): (Vec<FetchedItem>, Vec<FetchedItem>) =
        items.into_iter().partition(|item| item.body.is_available());
    for item in &without {
        warn!(source = %item.source, url = %item.url, "No article body; not summarising");
    }

    info!(
        to_summarise = with_content.len(),
        skipped = without.len(),
        parallel = PARALLEL_SUMMARIES,
        "Starting article summaries"
    );

    let summarized: Vec<SummarizedItem> = stream::iter(with_content)
        .map(|item| async move {
            let prompt = summary_prompt(&item.source, &item.url, item.body.as_text().unwrap_or_default());
            match asker.ask(&prompt).await {
                Ok(answer) if !answer.trim().is_empty() => {
                    debug!(source = %item.source, url = %item.url, "Summarised article");
                    Some(SummarizedItem {
                        summary: answer.trim().to_string(),
                        item,
                    })
                }
                Ok(_) => {
                    warn!(source = %item.source, url = %item.url, "Empty summary; dropping article");
                    None
                }
                Err(e) => {
                    error!(source = %item.source, url = %item.url, error = %e, "Summary call failed; dropping article");
                    None
                }
            }
        })
        .buffered(PARALLEL_SUMMARIES)
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(
        total,
        summarized = summarized.len(),
        dropped = total - summarized.len(),
        "Completed article summaries"
    );
    summarized
}

/// Input text for the classification call: one line per item, keyed by index.
pub fn classification_payload(items: &[SummarizedItem]) -> String {
    let mut payload = String::new();
    for (i, entry) in items.iter().enumerate() {
        let excerpt = truncate_chars(&entry.summary, CLASSIFY_EXCERPT_CHARS).replace('\n', " ");
        let _ = writeln!(payload, "[ID:{i}] outlet:{} | summary:{excerpt}", entry.item.source);
    }
    payload
}

/// Ask the classifier to group the summarised items into topics.
///
/// Returns the raw answer, or `None` when the call failed. Either way the
/// caller continues; see [`crate::topics::group_by_topic`].
#[instrument(level = "info", skip_all, fields(count = items.len()))]
pub async fn classify<A>(asker: &A, items: &[SummarizedItem]) -> Option<String>
where
    A: AskAsync<Response = String>,
{
    let payload = classification_payload(items);
    match asker.ask(&payload).await {
        Ok(answer) => {
            debug!(preview = %truncate_for_log(&answer, 300), "Classification answer");
            Some(answer)
        }
        Err(e) => {
            error!(error = %e, "Classification call failed; falling back to per-article listing");
            None
        }
    }
}
