//! One briefing run from link discovery to delivery.
//!
//! ```text
//! discover (per outlet) ─► fetch (bounded pool) ─► summarise (per item)
//!   ─► classify (one call) ─► group ─► assemble ─► write artifacts
//!   ─► publish web view ─► deliver chunks
//! ```
//!
//! Per-outlet, per-article and per-call failures are logged and absorbed.
//! The run stops early only when nothing was discovered or nothing could
//! be summarised.

use crate::analysis::{classify, summarize_items};
use crate::api::AskAsync;
use crate::config::RunConfig;
use crate::delivery::{DeliverySink, deliver};
use crate::error::{PipelineError, Result};
use crate::models::CandidateLink;
use crate::outputs::json::{ReportDocument, write_report_json};
use crate::outputs::links::{read_links_file, write_links_file};
use crate::outputs::report::{Edition, append_webview_link, assemble, coverage};
use crate::outputs::telegraph::TelegraphClient;
use crate::outputs::text::write_text_artifacts;
use crate::scrapers::PageFetch;
use crate::scrapers::articles::fetch_contents;
use crate::scrapers::naver::discover_links;
use crate::topics::group_by_topic;
use tracing::{error, info, instrument, warn};

/// External services a run talks to.
pub struct Collaborators<'a, P, S, C, D> {
    /// Listing and article pages.
    pub pages: &'a P,
    /// Per-article summary model.
    pub summarizer: &'a S,
    /// Topic classification model.
    pub classifier: &'a C,
    /// Message delivery; `None` skips delivery.
    pub sink: Option<&'a D>,
    /// Web view publishing; `None` skips it.
    pub webview: Option<&'a TelegraphClient>,
}

/// What a completed run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub links: usize,
    pub fetched: usize,
    pub failed_fetches: usize,
    pub summarized: usize,
    pub groups: usize,
    pub chunks_delivered: usize,
    pub chunks_attempted: usize,
    pub webview_url: Option<String>,
}

/// Links for this run: from a links file if configured, otherwise discovered.
async fn collect_links<P: PageFetch>(config: &RunConfig, pages: &P) -> Result<Vec<CandidateLink>> {
    let links = match &config.link_files.input {
        Some(path) => read_links_file(path)
            .await
            .map_err(|e| PipelineError::Config(format!("cannot read links file {path}: {e}")))?,
        None => discover_links(pages, &config.sources, &config.date).await,
    };

    if let Some(path) = &config.link_files.output {
        if let Err(e) = write_links_file(&links, path).await {
            error!(%path, error = %e, "Failed to write links file");
        }
    }
    Ok(links)
}

/// Execute one run.
///
/// # Errors
///
/// [`PipelineError::NoLinks`] when no article link was found,
/// [`PipelineError::NoSummaries`] when no article could be summarised, and
/// [`PipelineError::Config`] when a configured links file cannot be read.
/// Nothing is written or delivered in those cases.
#[instrument(level = "info", skip_all, fields(date = %config.date, tier = config.tier.label()))]
pub async fn run<P, S, C, D>(config: &RunConfig, services: Collaborators<'_, P, S, C, D>) -> Result<RunSummary>
where
    P: PageFetch,
    S: AskAsync<Response = String>,
    C: AskAsync<Response = String>,
    D: DeliverySink,
{
    let mut summary = RunSummary::default();

    // ---- Links ----
    let links = collect_links(config, services.pages).await?;
    if links.is_empty() {
        return Err(PipelineError::NoLinks);
    }
    summary.links = links.len();
    let edition = Edition {
        date: config.date.clone(),
        mode_label: config.tier.label().to_string(),
        coverage: coverage(&links),
    };

    // ---- Fetch ----
    let fetched = fetch_contents(services.pages, &links).await;
    summary.fetched = fetched.len();
    summary.failed_fetches = fetched.iter().filter(|i| !i.body.is_available()).count();

    // ---- Summaries ----
    let summarized = summarize_items(services.summarizer, fetched).await;
    if summarized.is_empty() {
        return Err(PipelineError::NoSummaries);
    }
    summary.summarized = summarized.len();

    // ---- Topics ----
    let classification = classify(services.classifier, &summarized).await;
    let groups = group_by_topic(&summarized, classification.as_deref());
    summary.groups = groups.len();

    // ---- Render & persist ----
    let mut briefing = assemble(&groups, &summarized, &edition);
    let title = format!("{} front-page briefing", config.date);

    if let Err(e) = write_text_artifacts(&briefing, &title, &config.output_dir).await {
        error!(error = %e, "Failed to write text artifacts");
    }
    let document = ReportDocument::new(&edition, &groups, &summarized);
    if let Err(e) = write_report_json(&document, &config.output_dir).await {
        error!(error = %e, "Failed to write JSON artifact");
    }

    // ---- Web view ----
    if let Some(telegraph) = services.webview {
        match telegraph.publish(&title, &briefing.flat.text()).await {
            Ok(url) => {
                append_webview_link(&mut briefing.message, &url);
                summary.webview_url = Some(url);
            }
            Err(e) => warn!(error = %e, "Web view publishing failed; delivering without it"),
        }
    }

    // ---- Deliver ----
    match services.sink {
        Some(sink) => {
            let outcomes = deliver(sink, &briefing.message, config.chunk_limit, config.chunk_delay).await;
            summary.chunks_attempted = outcomes.len();
            summary.chunks_delivered = outcomes.iter().filter(|o| o.success).count();
        }
        None => warn!("Delivery credentials missing; skipping delivery"),
    }

    info!(?summary, "Run finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::ScriptedAsk;
    use crate::config::ModelTier;
    use crate::delivery::testing::RecordingSink;
    use crate::models::SourceSpec;
    use crate::scrapers::naver::listing_url;
    use crate::scrapers::testing::StaticPages;
    use std::time::Duration;

    const DATE: &str = "20250101";

    fn article_url(code: &str, id: u32) -> String {
        format!("https://n.news.naver.com/article/newspaper/{code}/{id:010}?date={DATE}")
    }

    fn listing(code: &str, ids: &[u32]) -> String {
        let items: String = ids
            .iter()
            .map(|id| format!("<li><a href=\"{}\">기사</a></li>", article_url(code, *id)))
            .collect();
        format!("<html><body><div><h3>A1면</h3><ul>{items}</ul></div></body></html>")
    }

    /// Two outlets, three articles; the second article page is missing.
    fn pages() -> StaticPages {
        StaticPages::default()
            .with_page(&listing_url("020", DATE), &listing("020", &[1, 2]))
            .with_page(&listing_url("028", DATE), &listing("028", &[3]))
            .with_page(&article_url("020", 1), "<div id=\"dic_area\">첫 기사</div>")
            .with_page(&article_url("028", 3), "<div id=\"dic_area\">셋째 기사</div>")
    }

    fn config(output_dir: &str) -> RunConfig {
        let mut config = RunConfig::new(
            DATE.to_string(),
            vec![SourceSpec::new("동아일보", "020"), SourceSpec::new("한겨레", "028")],
            ModelTier::Standard,
            output_dir.to_string(),
        );
        config.chunk_delay = Duration::ZERO;
        config
    }

    fn summarizer() -> ScriptedAsk<impl Fn(&str) -> std::result::Result<String, String>> {
        ScriptedAsk::new(|prompt: &str| Ok(format!("summary of {}", prompt.lines().nth(1).unwrap_or_default())))
    }

    #[tokio::test]
    async fn test_full_run_groups_and_delivers() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path().to_str().unwrap());
        let classifier = ScriptedAsk::new(|_: &str| Ok(r#"{"Economy": [1], "Politics": [0, 1]}"#.to_string()));
        let sink = RecordingSink::default();

        let summary = run(
            &config,
            Collaborators {
                pages: &pages(),
                summarizer: &summarizer(),
                classifier: &classifier,
                sink: Some(&sink),
                webview: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(summary.links, 3);
        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.failed_fetches, 1);
        assert_eq!(summary.summarized, 2);
        // index 1 is claimed by "Economy" first, leaving Politics with [0]
        assert_eq!(summary.groups, 2);
        assert_eq!(summary.chunks_attempted, 1);
        assert_eq!(summary.chunks_delivered, 1);

        let sent = sink.sent.lock().unwrap();
        assert!(sent[0].contains("동아일보 2 | 한겨레 1"));
        assert!(sent[0].contains("📌 <b>Economy</b> (1 articles)"));

        let text = std::fs::read_to_string(tmp.path().join("final_report.txt")).unwrap();
        assert!(text.contains("### 📌 Politics (1 articles)"));
        assert!(tmp.path().join("final_report.html").exists());
        assert!(tmp.path().join("final_report.json").exists());
    }

    #[tokio::test]
    async fn test_invalid_classification_still_reports() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path().to_str().unwrap());
        let classifier = ScriptedAsk::new(|_: &str| Ok("not json at all".to_string()));
        let sink = RecordingSink::default();

        let summary = run(
            &config,
            Collaborators {
                pages: &pages(),
                summarizer: &summarizer(),
                classifier: &classifier,
                sink: Some(&sink),
                webview: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(summary.groups, 2);
        let sent = sink.sent.lock().unwrap().concat();
        assert!(sent.contains("Article 1"));
        assert!(sent.contains("Article 2"));
    }

    #[tokio::test]
    async fn test_no_links_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path().to_str().unwrap());
        let classifier = ScriptedAsk::new(|_: &str| Ok("{}".to_string()));

        let result = run(
            &config,
            Collaborators {
                pages: &StaticPages::default(),
                summarizer: &summarizer(),
                classifier: &classifier,
                sink: None::<&RecordingSink>,
                webview: None,
            },
        )
        .await;

        assert!(matches!(result, Err(PipelineError::NoLinks)));
        assert!(!tmp.path().join("final_report.txt").exists());
    }

    #[tokio::test]
    async fn test_no_summaries_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path().to_str().unwrap());
        let failing = ScriptedAsk::new(|_: &str| Err("quota exceeded".to_string()));
        let sink = RecordingSink::default();

        let result = run(
            &config,
            Collaborators {
                pages: &pages(),
                summarizer: &failing,
                classifier: &failing,
                sink: Some(&sink),
                webview: None,
            },
        )
        .await;

        assert!(matches!(result, Err(PipelineError::NoSummaries)));
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_links_file_round_trip_through_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let links_path = tmp.path().join("urls.txt");
        let links_path = links_path.to_str().unwrap().to_string();
        let classifier = ScriptedAsk::new(|_: &str| Ok("{}".to_string()));

        let mut first = config(tmp.path().to_str().unwrap());
        first.link_files.output = Some(links_path.clone());
        run(
            &first,
            Collaborators {
                pages: &pages(),
                summarizer: &summarizer(),
                classifier: &classifier,
                sink: None::<&RecordingSink>,
                webview: None,
            },
        )
        .await
        .unwrap();

        // the second run finds no listing pages but reads the saved links
        let article_pages = StaticPages::default()
            .with_page(&article_url("020", 1), "<div id=\"dic_area\">첫 기사</div>");
        let mut second = config(tmp.path().to_str().unwrap());
        second.link_files.input = Some(links_path);
        let summary = run(
            &second,
            Collaborators {
                pages: &article_pages,
                summarizer: &summarizer(),
                classifier: &classifier,
                sink: None::<&RecordingSink>,
                webview: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(summary.links, 3);
        assert_eq!(summary.summarized, 1);
    }

    #[tokio::test]
    async fn test_missing_links_file_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config(tmp.path().to_str().unwrap());
        config.link_files.input = Some(tmp.path().join("missing.txt").to_str().unwrap().to_string());
        let classifier = ScriptedAsk::new(|_: &str| Ok("{}".to_string()));

        let result = run(
            &config,
            Collaborators {
                pages: &pages(),
                summarizer: &summarizer(),
                classifier: &classifier,
                sink: None::<&RecordingSink>,
                webview: None,
            },
        )
        .await;

        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
