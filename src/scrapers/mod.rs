//! Scrapers for outlet listing pages and article pages.
//!
//! Work happens in two phases, like every scraper in this crate:
//!
//! 1. **Indexing** ([`naver`]): read each outlet's newspaper listing page for
//!    the edition date and pick out the front-page article links
//! 2. **Fetching** ([`articles`]): download every discovered article and
//!    extract its body text
//!
//! Both phases go through the [`PageFetch`] trait so that the HTTP layer can
//! be swapped out; [`HttpFetcher`] is the `reqwest` implementation.
//!
//! Failures are contained: a listing page that cannot be loaded contributes
//! no links, an article that cannot be loaded becomes a failure sentinel.

pub mod articles;
pub mod naver;

use reqwest::Client;
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Desktop browser User-Agent; the listing pages serve a reduced page to unknown agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Something that can GET a page and return its markup.
pub trait PageFetch {
    /// Fetch `url`, giving up after `timeout`.
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, Box<dyn Error>>;
}

/// [`PageFetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

impl PageFetch for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let body = self
            .client
            .get(url.trim())
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}
