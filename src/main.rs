//! # Front-page Briefing
//!
//! Builds a daily briefing from the front pages of Korean national dailies.
//! The front-page articles of each outlet's print edition are scraped from
//! Naver's newspaper listings, summarised one by one through an LLM, grouped
//! into topics by a second LLM call, and delivered to a Telegram chat, with
//! the full report kept on disk and optionally published as a Telegraph page.
//!
//! ## Usage
//!
//! ```sh
//! frontpage_briefing -o ./output_frontpage
//! frontpage_briefing --date 20251117 --lite
//! ```
//!
//! ## Architecture
//!
//! 1. **Indexing**: find the front-page article links of every outlet
//! 2. **Fetching**: download article bodies (10 at a time)
//! 3. **Summarising**: one LLM call per article (12 at a time)
//! 4. **Grouping**: one LLM call assigns articles to topics
//! 5. **Output**: write `final_report.{txt,html,json}`, publish the web
//!    view, deliver the message in chunks

use awful_aj::{config_dir, template};
use chrono::Utc;
use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analysis;
mod api;
mod cli;
mod config;
mod delivery;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod topics;
mod utils;

use api::{AskFnWrapper, SUMMARY_TEMPLATE, TOPICS_TEMPLATE};
use cli::Cli;
use config::{LinkFiles, ModelTier, RunConfig, load_sources};
use delivery::telegram::TelegramSink;
use error::PipelineError;
use outputs::telegraph::TelegraphClient;
use pipeline::{Collaborators, RunSummary};
use scrapers::HttpFetcher;
use utils::{edition_date, ensure_writable_dir};

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_path = dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("frontpage_briefing starting up");
    if let Some(path) = dotenv_path {
        debug!(path = %path.display(), "Loaded environment file");
    }

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.date, lite = args.lite, "Parsed CLI arguments");

    match run(args).await {
        Ok(summary) => {
            info!(
                elapsed_secs = start_time.elapsed().as_secs(),
                links = summary.links,
                summarized = summary.summarized,
                groups = summary.groups,
                delivered = summary.chunks_delivered,
                attempted = summary.chunks_attempted,
                webview = summary.webview_url.as_deref().unwrap_or("-"),
                "Briefing finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(
                error = %e,
                elapsed_secs = start_time.elapsed().as_secs(),
                "Briefing aborted"
            );
            ExitCode::FAILURE
        }
    }
}

/// Resolve configuration, build the collaborators and execute one run.
async fn run(args: Cli) -> Result<RunSummary, PipelineError> {
    let tier = ModelTier::from_lite_flag(args.lite);
    let date = args.date.clone().unwrap_or_else(|| edition_date(Utc::now()));
    info!(%date, tier = tier.label(), "Edition selected");

    let sources = load_sources(args.outlets.as_deref())
        .await
        .map_err(|e| PipelineError::Config(format!("cannot load outlets: {e}")))?;

    // Early check: ensure the output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(PipelineError::Output(format!("{}: {e}", args.output_dir)));
    }

    let mut run_config = RunConfig::new(date, sources, tier, args.output_dir.clone());
    run_config.link_files = LinkFiles {
        input: args.from_links.clone(),
        output: args.links_file.clone(),
    };

    // ---- Load templates & config ----
    let summary_template = template::load_template(SUMMARY_TEMPLATE)
        .await
        .map_err(|e| PipelineError::Config(format!("template {SUMMARY_TEMPLATE}: {e}")))?;
    let topics_template = template::load_template(TOPICS_TEMPLATE)
        .await
        .map_err(|e| PipelineError::Config(format!("template {TOPICS_TEMPLATE}: {e}")))?;
    info!("Loaded templates: {SUMMARY_TEMPLATE}, {TOPICS_TEMPLATE}");

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => config_dir()
            .map_err(|e| PipelineError::Config(format!("no config directory: {e}")))?
            .join(tier.config_filename())
            .to_string_lossy()
            .into_owned(),
    };
    let llm_config = awful_aj::config::load_config(&config_path)
        .map_err(|e| PipelineError::Config(format!("{config_path}: {e}")))?;
    info!(%config_path, "Loaded configuration");

    // ---- Collaborators ----
    let pages = HttpFetcher::new().map_err(|e| PipelineError::Config(format!("HTTP client: {e}")))?;
    let summarizer = AskFnWrapper {
        config: &llm_config,
        template: &summary_template,
    };
    let classifier = AskFnWrapper {
        config: &llm_config,
        template: &topics_template,
    };

    let http = reqwest::Client::new();
    let webview = (!args.no_webview).then(|| TelegraphClient::new(http.clone()));

    let credentials = args
        .telegram_bot_token
        .filter(|t| !t.trim().is_empty())
        .zip(args.telegram_chat_id.filter(|c| !c.trim().is_empty()));
    let sink = credentials.map(|(token, chat)| TelegramSink::new(http, token, chat));
    if sink.is_none() {
        warn!("TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set; the report will only be written to disk");
    }

    pipeline::run(
        &run_config,
        Collaborators {
            pages: &pages,
            summarizer: &summarizer,
            classifier: &classifier,
            sink: sink.as_ref(),
            webview: webview.as_ref(),
        },
    )
    .await
}
