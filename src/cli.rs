//! Command-line interface definitions for Front-page Briefing.
//!
//! Credentials can be given as flags or through the environment (a `.env`
//! file in the working directory is loaded first).

use crate::utils::parse_edition_date;
use clap::Parser;

/// Command-line arguments for the Front-page Briefing application.
///
/// # Examples
///
/// ```sh
/// # Today's edition (KST), delivered to the chat in TELEGRAM_CHAT_ID
/// frontpage_briefing
///
/// # A past edition with the cheaper model, keeping the discovered links
/// frontpage_briefing --date 20251117 --lite --links-file urls.txt
///
/// # Re-run analysis on a saved links file
/// frontpage_briefing --from-links urls.txt -o ./reports
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory for final_report.txt, final_report.html and final_report.json
    #[arg(short, long, default_value = "output_frontpage")]
    pub output_dir: String,

    /// Edition date as YYYYMMDD (default: today in KST)
    #[arg(short, long, value_parser = parse_edition_date)]
    pub date: Option<String>,

    /// YAML file listing outlets (name, code) to poll instead of the defaults
    #[arg(long)]
    pub outlets: Option<String>,

    /// Use the cheaper model configuration (config_lite.yaml)
    #[arg(long)]
    pub lite: bool,

    /// Explicit path to the awful_aj config file (overrides --lite selection)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Also write the discovered links to this file
    #[arg(long)]
    pub links_file: Option<String>,

    /// Skip discovery and read links from this file
    #[arg(long)]
    pub from_links: Option<String>,

    /// Telegram bot token used for delivery
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat receiving the briefing
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    /// Do not publish the full report as a Telegraph page
    #[arg(long)]
    pub no_webview: bool,
}
