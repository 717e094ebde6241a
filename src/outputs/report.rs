//! Report assembly.
//!
//! One pass over the topic groups produces two renderings:
//!
//! - the **message** rendering, Telegram-flavoured HTML with every dynamic
//!   string escaped, which is chunked and delivered
//! - the **flat** rendering, plain text with `### ` headings and `[Section]`
//!   markers, which is written to disk and published as the web view
//!
//! Links are listed per outlet so that an outlet with several articles on
//! one topic takes a single line.

use crate::models::{CandidateLink, RenderedReport, SummarizedItem, TopicGroup};
use html_escape::{encode_double_quoted_attribute, encode_text};
use itertools::Itertools;
use std::fmt::Write;

const SEPARATOR: &str = "━━━━━━━━━━━━━━";

/// Edition-level facts shown in the report headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edition {
    /// Edition date, `YYYYMMDD`.
    pub date: String,
    /// Which model tier produced the analysis, e.g. `"standard"`.
    pub mode_label: String,
    /// Discovered links per outlet, in outlet order.
    pub coverage: Vec<(String, usize)>,
}

/// Both renderings of one run's report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Briefing {
    pub message: RenderedReport,
    pub flat: RenderedReport,
}

/// Count links per outlet, outlets in order of first appearance.
pub fn coverage(links: &[CandidateLink]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for link in links {
        match counts.iter_mut().find(|(source, _)| *source == link.source) {
            Some((_, n)) => *n += 1,
            None => counts.push((link.source.clone(), 1)),
        }
    }
    counts
}

fn coverage_line(coverage: &[(String, usize)]) -> String {
    if coverage.is_empty() {
        return "none".to_string();
    }
    coverage
        .iter()
        .map(|(source, n)| format!("{source} {n}"))
        .join(" | ")
}

/// Member URLs of a group keyed by outlet, outlets in order of first appearance.
///
/// Indices outside `items` are skipped.
pub fn links_by_source<'a>(group: &TopicGroup, items: &'a [SummarizedItem]) -> Vec<(&'a str, Vec<&'a str>)> {
    let mut by_source: Vec<(&str, Vec<&str>)> = Vec::new();
    for entry in group.member_indices.iter().filter_map(|&idx| items.get(idx)) {
        let source = entry.item.source.as_str();
        let url = entry.item.url.as_str();
        match by_source.iter_mut().find(|(s, _)| *s == source) {
            Some((_, urls)) => urls.push(url),
            None => by_source.push((source, vec![url])),
        }
    }
    by_source
}

/// Render the grouped analysis.
///
/// With no groups both renderings still carry their header and a notice
/// that no report was produced.
pub fn assemble(groups: &[TopicGroup], items: &[SummarizedItem], edition: &Edition) -> Briefing {
    let stats = coverage_line(&edition.coverage);

    let message_header = format!(
        "<b>🗞 {} front-page briefing ({})</b>\n\n📊 <b>Coverage:</b> {}\n\n",
        encode_text(&edition.date),
        encode_text(&edition.mode_label),
        encode_text(&stats),
    );
    let flat_header = format!(
        "📰 {} front-page report ({})\n\n[Coverage] {}\n\n",
        edition.date, edition.mode_label, stats
    );

    let mut message = String::new();
    let mut flat = String::new();

    if groups.is_empty() {
        message.push_str("<b>⚠️ No report was produced: the analysis returned no topics.</b>\n");
        flat.push_str("No report was produced: the analysis returned no topics.\n");
    }

    for group in groups {
        let count = group.member_indices.len();
        let sources = links_by_source(group, items);

        let _ = writeln!(message, "{SEPARATOR}");
        let _ = writeln!(message, "📌 <b>{}</b> ({count} articles)", encode_text(&group.label));
        let _ = writeln!(flat, "### 📌 {} ({count} articles)", group.label);

        flat.push_str("[Links]\n");
        for (source, urls) in &sources {
            let anchors = urls
                .iter()
                .enumerate()
                .map(|(i, url)| {
                    format!("<a href=\"{}\">{}</a>", encode_double_quoted_attribute(url), i + 1)
                })
                .join(" ");
            let _ = writeln!(message, "🔗 {}: {anchors}", encode_text(source));
            let _ = writeln!(flat, " - {source}: {}", urls.join(" , "));
        }
        message.push('\n');

        if !group.summary_bullets.is_empty() {
            flat.push_str("\n[Key points]\n");
            for bullet in &group.summary_bullets {
                let _ = writeln!(message, "• {}", encode_text(bullet));
                let _ = writeln!(flat, " - {bullet}");
            }
            message.push('\n');
        }

        if !group.narrative_body.is_empty() {
            let _ = writeln!(message, "{}\n", encode_text(&group.narrative_body));
            let _ = writeln!(flat, "\n[Full story]\n{}", group.narrative_body);
        }

        if !group.critiques.is_empty() {
            message.push_str("📰 <b>Outlet stances</b>\n");
            flat.push_str("\n[Outlet stances]\n");
            for critique in &group.critiques {
                let _ = writeln!(
                    message,
                    "- {}: {}",
                    encode_text(&critique.source),
                    encode_text(&critique.position)
                );
                let tone = if critique.tone.is_empty() {
                    String::new()
                } else {
                    format!("({}) ", critique.tone)
                };
                let _ = writeln!(flat, " - {}: {tone}{}", critique.source, critique.position);
            }
            message.push('\n');
        }

        flat.push_str("\n\n");
    }

    Briefing {
        message: RenderedReport {
            header: message_header,
            body: message,
        },
        flat: RenderedReport {
            header: flat_header,
            body: flat,
        },
    }
}

/// Append a link to the published web view at the end of the message.
pub fn append_webview_link(message: &mut RenderedReport, url: &str) {
    let _ = write!(
        message.body,
        "\n📱 <b><a href=\"{}\">👉 Read the full report</a></b>\n",
        encode_double_quoted_attribute(url)
    );
}
