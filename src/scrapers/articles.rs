//! Article body fetching and extraction.
//!
//! Article pages come from several outlets and several generations of
//! Naver's article viewer, so the body is located by trying a fixed list of
//! container selectors in priority order. When none matches, the visible
//! text of the whole page is used instead.

use crate::models::{ArticleBody, CandidateLink, FetchedItem};
use crate::scrapers::PageFetch;
use crate::utils::truncate_chars;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Upper bound on the characters kept from one article body.
pub const MAX_CONTENT_CHARS: usize = 4000;

/// Maximum number of article requests in flight at once.
pub const MAX_CONCURRENT_FETCHES: usize = 10;

const ARTICLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Containers known to hold the article body, first match wins.
const BODY_SELECTORS: [&str; 10] = [
    "div#dic_area",
    "div#newsEndContents",
    "div.newsct_article",
    "div#articleBodyContents",
    "div#articeBody",
    "div.article_body",
    "div.article-body",
    "div#article-view-content-div",
    "[itemprop='articleBody']",
    "article",
];

static BODY_SELECTOR_LIST: Lazy<Vec<Selector>> = Lazy::new(|| {
    BODY_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("static selector"))
        .collect()
});

static PAGE_BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("static selector"));

static INLINE_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\u{a0}\u{3000}]+").expect("static regex"));

/// Extract the article text from a page.
///
/// Returns `None` when the page has no visible text at all.
pub fn extract_body(markup: &str) -> Option<String> {
    let document = Html::parse_document(markup);

    let container = BODY_SELECTOR_LIST
        .iter()
        .find_map(|selector| document.select(selector).next())
        .or_else(|| document.select(&PAGE_BODY).next())
        .unwrap_or_else(|| document.root_element());

    let text = visible_text(container);
    (!text.is_empty()).then_some(text)
}

/// Non-empty text lines under `element`, skipping script and style contents.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| {
            !node
                .parent()
                .and_then(ElementRef::wrap)
                .is_some_and(|parent| {
                    matches!(parent.value().name(), "script" | "style" | "noscript")
                })
        })
        .map(|(_, text)| INLINE_WHITESPACE.replace_all(text.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .join("\n")
}

/// Fetch and extract every candidate article.
///
/// Up to [`MAX_CONCURRENT_FETCHES`] requests run at once. The result has
/// one entry per input link, in input order, whatever order the requests
/// complete in. A link that fails to load or yields no text gets
/// [`ArticleBody::Unavailable`].
#[instrument(level = "info", skip_all, fields(count = links.len()))]
pub async fn fetch_contents<F: PageFetch>(fetcher: &F, links: &[CandidateLink]) -> Vec<FetchedItem> {
    info!(count = links.len(), "Fetching article contents");

    let mut indexed: Vec<(usize, FetchedItem)> = stream::iter(links.iter().enumerate())
        .map(|(idx, link)| async move { (idx, fetch_article(fetcher, link).await) })
        .buffer_unordered(MAX_CONCURRENT_FETCHES)
        .collect()
        .await;

    // completion order is arbitrary; restore input order
    indexed.sort_unstable_by_key(|(idx, _)| *idx);
    let items: Vec<FetchedItem> = indexed.into_iter().map(|(_, item)| item).collect();

    let failed = items.iter().filter(|i| !i.body.is_available()).count();
    info!(
        total = items.len(),
        failed,
        "Fetched article contents"
    );
    items
}

/// Fetch a single article, turning every failure into the sentinel body.
#[instrument(level = "debug", skip_all, fields(source = %link.source, url = %link.url))]
async fn fetch_article<F: PageFetch>(fetcher: &F, link: &CandidateLink) -> FetchedItem {
    let markup = match fetcher.fetch_page(&link.url, ARTICLE_TIMEOUT).await {
        Ok(markup) => markup,
        Err(e) => {
            error!(source = %link.source, url = %link.url, error = %e, "Article fetch failed");
            return FetchedItem::failed(link);
        }
    };

    match extract_body(&markup) {
        Some(text) => {
            let body = truncate_chars(&text, MAX_CONTENT_CHARS).to_string();
            debug!(chars = body.chars().count(), "Parsed article");
            FetchedItem {
                source: link.source.clone(),
                url: link.url.clone(),
                body: ArticleBody::Text(body),
            }
        }
        None => {
            warn!(source = %link.source, url = %link.url, "Article page had no text");
            FetchedItem::failed(link)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::testing::StaticPages;

    fn link(source: &str, url: &str) -> CandidateLink {
        CandidateLink {
            source: source.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_extract_body_prefers_first_selector() {
        let markup = r#"<html><body>
            <article><p>generic wrapper</p></article>
            <div id="dic_area">첫 문단<br>둘째   문단</div>
        </body></html>"#;
        assert_eq!(extract_body(markup).unwrap(), "첫 문단\n둘째 문단");
    }

    #[test]
    fn test_extract_body_uses_later_selector_when_needed() {
        let markup = r#"<html><body><nav>menu</nav>
            <div class="article_body"><p>본문</p></div></body></html>"#;
        assert_eq!(extract_body(markup).unwrap(), "본문");
    }

    #[test]
    fn test_extract_body_falls_back_to_page_text() {
        let markup = r#"<html><head><title>t</title></head><body>
            <script>var x = 1;</script><style>p {}</style>
            <p>only paragraph</p></body></html>"#;
        assert_eq!(extract_body(markup).unwrap(), "only paragraph");
    }

    #[test]
    fn test_extract_body_empty_page() {
        assert_eq!(extract_body("<html><body>  </body></html>"), None);
    }

    #[tokio::test]
    async fn test_fetch_contents_truncates_long_bodies() {
        let long = "가".repeat(MAX_CONTENT_CHARS + 500);
        let url = "https://n.news.naver.com/a/1";
        let pages = StaticPages::default()
            .with_page(url, &format!("<div id=\"dic_area\">{long}</div>"));

        let items = fetch_contents(&pages, &[link("동아일보", url)]).await;
        let body = items[0].body.as_text().unwrap();
        assert_eq!(body.chars().count(), MAX_CONTENT_CHARS);
    }

    #[tokio::test]
    async fn test_fetch_contents_preserves_order_with_failures() {
        let urls: Vec<String> = (0..6).map(|i| format!("https://n.news.naver.com/a/{i}")).collect();
        let mut pages = StaticPages::default();
        for (i, url) in urls.iter().enumerate() {
            // odd items are missing, early items answer slowest
            if i % 2 == 0 {
                pages = pages.with_page(url, &format!("<div id=\"dic_area\">body {i}</div>"));
            }
            pages = pages.with_delay(url, Duration::from_millis(((6 - i) * 10) as u64));
        }
        let links: Vec<CandidateLink> = urls
            .iter()
            .enumerate()
            .map(|(i, url)| link(if i < 3 { "한겨레" } else { "경향신문" }, url))
            .collect();

        let items = fetch_contents(&pages, &links).await;

        assert_eq!(items.len(), links.len());
        for (i, (item, input)) in items.iter().zip(&links).enumerate() {
            assert_eq!(item.source, input.source);
            assert_eq!(item.url, input.url);
            if i % 2 == 0 {
                assert_eq!(item.body.as_text(), Some(format!("body {i}").as_str()));
            } else {
                assert_eq!(item.body, ArticleBody::Unavailable);
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_contents_empty_input() {
        let items = fetch_contents(&StaticPages::default(), &[]).await;
        assert!(items.is_empty());
    }
}
