//! Topic grouping over the classifier's answer.
//!
//! The classifier is asked for JSON shaped like
//!
//! ```json
//! {"topics": [{"title": "...", "ids": [0, 2], "summary_bullets": ["..."],
//!              "full_article": "...", "press_critiques": [{"source": "...", "position": "...", "tone": "..."}]}]}
//! ```
//!
//! but a bare `{"label": [indices]}` mapping is accepted too. Whatever comes
//! back is validated here: out-of-range or repeated indices are dropped,
//! groups left without members disappear, and an answer that cannot be used
//! at all turns into one group per article.

use crate::models::{PressCritique, SummarizedItem, TopicGroup};
use crate::utils::{strip_code_fences, truncate_for_log};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Classification {
    Topics { topics: Vec<RawTopic> },
    Labels(Map<String, Value>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTopic {
    title: Option<String>,
    ids: Vec<Value>,
    summary_bullets: Vec<Value>,
    full_article: Option<String>,
    press_critiques: Vec<Value>,
}

impl From<(String, Value)> for RawTopic {
    fn from((label, ids): (String, Value)) -> Self {
        RawTopic {
            title: Some(label),
            ids: match ids {
                Value::Array(ids) => ids,
                _ => Vec::new(),
            },
            ..Default::default()
        }
    }
}

/// Group summarised items under the classifier's topic labels.
///
/// `classification` is the raw classifier answer, or `None` if the call
/// failed. Groups are ordered by member count, largest first; equal sizes
/// keep the classifier's order. Labels and member order are kept as given.
///
/// Never fails: if the answer is unusable every item becomes its own group,
/// labelled `Article 1`, `Article 2`, ... with its summary as the body.
pub fn group_by_topic(items: &[SummarizedItem], classification: Option<&str>) -> Vec<TopicGroup> {
    let raw_topics = match classification.map(parse_classification) {
        Some(Ok(topics)) => topics,
        Some(Err(e)) => {
            warn!(
                error = %e,
                answer = %truncate_for_log(classification.unwrap_or_default(), 300),
                "Classification answer is not valid JSON; listing articles individually"
            );
            return per_item_groups(items);
        }
        None => return per_item_groups(items),
    };

    let mut claimed: HashSet<usize> = HashSet::new();
    let mut groups: Vec<TopicGroup> = Vec::with_capacity(raw_topics.len());

    for raw in raw_topics {
        let label = raw
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled")
            .to_string();

        let offered = raw.ids.len();
        let member_indices: Vec<usize> = raw
            .ids
            .iter()
            .filter_map(as_index)
            .filter(|idx| *idx < items.len() && claimed.insert(*idx))
            .collect();

        if member_indices.len() < offered {
            debug!(
                %label,
                offered,
                kept = member_indices.len(),
                "Dropped invalid or repeated indices"
            );
        }
        if member_indices.is_empty() {
            warn!(%label, "Topic has no valid members; dropping it");
            continue;
        }

        groups.push(TopicGroup {
            label,
            member_indices,
            summary_bullets: raw
                .summary_bullets
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string)
                .collect(),
            narrative_body: raw.full_article.unwrap_or_default().trim().to_string(),
            critiques: raw
                .press_critiques
                .into_iter()
                .filter_map(|v| serde_json::from_value::<PressCritique>(v).ok())
                .filter(|c| !c.source.trim().is_empty() && !c.position.trim().is_empty())
                .collect(),
        });
    }

    if groups.is_empty() {
        warn!("Classification produced no usable topics; listing articles individually");
        return per_item_groups(items);
    }

    // stable: equal sizes keep the classifier's order
    groups.sort_by(|a, b| b.member_indices.len().cmp(&a.member_indices.len()));

    let unassigned = items.len() - claimed.len();
    if unassigned > 0 {
        warn!(unassigned, "Some articles were not assigned to any topic");
    }
    info!(groups = groups.len(), items = items.len(), "Grouped articles by topic");
    groups
}

fn parse_classification(answer: &str) -> Result<Vec<RawTopic>, serde_json::Error> {
    let parsed: Classification = serde_json::from_str(strip_code_fences(answer))?;
    Ok(match parsed {
        Classification::Topics { topics } => topics,
        Classification::Labels(map) => map.into_iter().map(RawTopic::from).collect(),
    })
}

/// Accept integer indices, and integers written as strings.
fn as_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One group per item, used when no classification is available.
fn per_item_groups(items: &[SummarizedItem]) -> Vec<TopicGroup> {
    items
        .iter()
        .enumerate()
        .map(|(i, entry)| TopicGroup {
            label: format!("Article {}", i + 1),
            member_indices: vec![i],
            summary_bullets: Vec::new(),
            narrative_body: entry.summary.clone(),
            critiques: Vec::new(),
        })
        .collect()
}
