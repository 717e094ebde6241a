//! Utility functions for edition dates, string truncation, and file system checks.
//!
//! - Edition date computation (KST, `YYYYMMDD`)
//! - Character-safe truncation for prompts and logging
//! - Stripping Markdown code fences from LLM answers
//! - Output directory validation

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Offset of Korean Standard Time from UTC, in hours.
const KST_OFFSET_HOURS: i64 = 9;

/// Newspaper edition date for a given instant, as `YYYYMMDD` in KST.
///
/// Listing pages are keyed by the print date, which rolls over at midnight
/// Seoul time rather than UTC.
pub fn edition_date(now_utc: DateTime<Utc>) -> String {
    (now_utc + Duration::hours(KST_OFFSET_HOURS))
        .format("%Y%m%d")
        .to_string()
}

/// Validate a user-supplied `YYYYMMDD` edition date.
pub fn parse_edition_date(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.len() != 8 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("expected YYYYMMDD, got {trimmed:?}"));
    }
    NaiveDate::parse_from_str(trimmed, "%Y%m%d")
        .map(|_| trimmed.to_string())
        .map_err(|e| format!("{trimmed:?} is not a calendar date: {e}"))
}

/// Keep at most `max` characters of `s`, never splitting a character.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// Truncate a string for logging purposes.
///
/// Strings longer than `max` characters are cut and suffixed with the number
/// of bytes dropped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", kept, s.len() - kept.len())
    }
}

/// Remove a surrounding Markdown code fence (```` ```json ... ``` ````) if present.
///
/// Models asked for JSON often wrap it in a fence anyway.
pub fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (e.g. "json") up to the first newline
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Scratch file created and removed by [`ensure_writable_dir`].
const WRITE_PROBE: &str = ".frontpage_write_check";

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe = Path::new(path).join(WRITE_PROBE);
    fs::write(&probe, b"").await?;
    fs::remove_file(&probe).await?;
    info!("Output directory is writable");
    Ok(())
}
