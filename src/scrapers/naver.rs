//! Front-page link discovery on Naver's per-outlet newspaper pages.
//!
//! Each outlet has a listing page for every print edition at
//! `https://media.naver.com/press/{code}/newspaper?date={YYYYMMDD}` that
//! links to all articles of that edition, grouped by page. Article links
//! look like `/article/newspaper/{code}/{id}?date={YYYYMMDD}`.
//!
//! # Heuristic
//!
//! A link is front-page content when one of its nearest ancestors (at most
//! [`ANCESTOR_DEPTH`] levels up) renders text containing a page-1 marker
//! such as `A1면`. The markup changes often enough that the markers
//! regularly vanish; when no link matches, the first
//! [`FALLBACK_LINK_COUNT`] edition links in document order are used
//! instead. The two paths are exclusive.

use crate::models::{CandidateLink, SourceSpec};
use crate::scrapers::PageFetch;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Markers meaning "page 1" in the rendered page labels.
pub const FRONT_PAGE_KEYWORDS: [&str; 6] = ["A1면", "A01면", "A 1면", "A 01면", "1면", "1 面"];

/// How many ancestors of a link are inspected for a front-page marker.
pub const ANCESTOR_DEPTH: usize = 6;

/// How many links the positional fallback keeps.
pub const FALLBACK_LINK_COUNT: usize = 4;

const LISTING_TIMEOUT: Duration = Duration::from_secs(20);

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

/// Listing page URL for one outlet and edition date.
pub fn listing_url(source_code: &str, date: &str) -> String {
    format!("https://media.naver.com/press/{source_code}/newspaper?date={date}")
}

/// Extract the front-page article links from one listing page.
///
/// # Arguments
///
/// * `markup` - Listing page HTML
/// * `page_url` - URL the markup was served from; relative hrefs are joined against it
/// * `source_code` - Outlet code, e.g. `"020"`
/// * `target_date` - Edition date as `YYYYMMDD`
///
/// # Returns
///
/// Absolute article URLs without duplicates, in document order. Either all
/// keyword-matched links, or (if none matched) at most
/// [`FALLBACK_LINK_COUNT`] edition links.
///
/// # Errors
///
/// Fails only when `page_url` is not a valid absolute URL.
pub fn extract_front_page_links(
    markup: &str,
    page_url: &str,
    source_code: &str,
    target_date: &str,
) -> Result<Vec<String>, url::ParseError> {
    let base = Url::parse(page_url.trim())?;
    let document = Html::parse_document(markup);

    let path_marker = format!("/article/newspaper/{source_code}/");
    let date_marker = format!("date={target_date}");

    // every link of this outlet's edition, in document order
    let edition_links: Vec<(ElementRef<'_>, String)> = document
        .select(&LINK_SELECTOR)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let resolved = base.join(href.trim()).ok()?.to_string();
            (resolved.contains(&path_marker) && resolved.contains(&date_marker))
                .then_some((anchor, resolved))
        })
        .collect();

    let front_page: Vec<String> = edition_links
        .iter()
        .filter(|(anchor, _)| near_front_page_marker(*anchor))
        .map(|(_, url)| url.clone())
        .unique()
        .collect();

    if !front_page.is_empty() {
        debug!(
            source_code,
            matched = front_page.len(),
            candidates = edition_links.len(),
            "Front-page markers found"
        );
        return Ok(front_page);
    }

    let fallback: Vec<String> = edition_links
        .into_iter()
        .map(|(_, url)| url)
        .unique()
        .take(FALLBACK_LINK_COUNT)
        .collect();
    if !fallback.is_empty() {
        warn!(
            source_code,
            count = fallback.len(),
            "No front-page marker found; using the first edition links"
        );
    }
    Ok(fallback)
}

/// Whether any of the nearest ancestors of `anchor` mentions page 1.
fn near_front_page_marker(anchor: ElementRef<'_>) -> bool {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(ANCESTOR_DEPTH)
        .any(|ancestor| {
            let text = rendered_text(ancestor);
            FRONT_PAGE_KEYWORDS.iter().any(|key| text.contains(key))
        })
}

/// Text of an element as a reader sees it: trimmed fragments joined by single spaces.
fn rendered_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .join(" ")
}

/// Discover front-page links for every configured outlet.
///
/// Outlets are processed one after another; an outlet whose listing page
/// cannot be fetched or parsed is logged and contributes no links.
/// Duplicates across outlets are kept, the `source` field tells them apart.
#[instrument(level = "info", skip_all, fields(%date, outlets = sources.len()))]
pub async fn discover_links<F: PageFetch>(
    fetcher: &F,
    sources: &[SourceSpec],
    date: &str,
) -> Vec<CandidateLink> {
    let mut links = Vec::new();

    for source in sources {
        let page_url = listing_url(&source.code, date);
        debug!(source = %source.name, url = %page_url, "Fetching listing page");

        let markup = match fetcher.fetch_page(&page_url, LISTING_TIMEOUT).await {
            Ok(markup) => markup,
            Err(e) => {
                error!(source = %source.name, url = %page_url, error = %e, "Listing page fetch failed");
                continue;
            }
        };

        match extract_front_page_links(&markup, &page_url, &source.code, date) {
            Ok(urls) if urls.is_empty() => {
                warn!(source = %source.name, "No front-page candidates found");
            }
            Ok(urls) => {
                info!(source = %source.name, count = urls.len(), "Indexed front-page links");
                links.extend(urls.into_iter().map(|url| CandidateLink {
                    source: source.name.clone(),
                    url,
                }));
            }
            Err(e) => {
                error!(source = %source.name, error = %e, "Link extraction failed");
            }
        }
    }

    info!(count = links.len(), "Link discovery finished");
    links
}
