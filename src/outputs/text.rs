//! Text artifacts: the flat report and the message markup.
//!
//! Both files live at fixed paths under the output directory and are
//! replaced on every run.

use crate::outputs::report::Briefing;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub const TEXT_FILENAME: &str = "final_report.txt";
pub const HTML_FILENAME: &str = "final_report.html";

/// Wrap Telegram-flavoured markup into a standalone page.
fn html_page(title: &str, markup: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n\
<body>\n<div style=\"white-space: pre-wrap; font-family: sans-serif\">\n{}</div>\n</body>\n</html>\n",
        html_escape::encode_text(title),
        markup
    )
}

/// Write `final_report.txt` and `final_report.html` into `output_dir`.
///
/// # Returns
///
/// The paths written, text file first.
#[instrument(level = "info", skip_all, fields(%output_dir))]
pub async fn write_text_artifacts(
    briefing: &Briefing,
    title: &str,
    output_dir: &str,
) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    fs::create_dir_all(output_dir).await?;

    let text_path = Path::new(output_dir).join(TEXT_FILENAME);
    fs::write(&text_path, briefing.flat.text()).await?;
    info!(path = %text_path.display(), "Wrote text report");

    let html_path = Path::new(output_dir).join(HTML_FILENAME);
    fs::write(&html_path, html_page(title, &briefing.message.text())).await?;
    info!(path = %html_path.display(), "Wrote HTML report");

    Ok(vec![text_path, html_path])
}
