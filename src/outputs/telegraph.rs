//! Web view publishing on Telegraph.
//!
//! The flat report is converted into Telegraph's node format and posted as
//! a new page under a throwaway account. The resulting URL is linked from
//! the delivered message; if publishing fails the message simply goes out
//! without it.
//!
//! # Line mapping
//!
//! | Flat line | Node |
//! |-----------|------|
//! | `### text` | `<h4>text</h4>` |
//! | `[Section]` | `<p><b>[Section]</b></p>` |
//! | anything else non-empty | `<p>line</p>` |

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

const API_BASE: &str = "https://api.telegra.ph";
const ACCOUNT_SHORT_NAME: &str = "FrontPageBriefing";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A Telegraph DOM node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Text(String),
    Element {
        tag: &'static str,
        children: Vec<Node>,
    },
}

impl Node {
    fn element(tag: &'static str, children: Vec<Node>) -> Self {
        Node::Element { tag, children }
    }

    fn text(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

/// Convert the flat report into Telegraph nodes, headed by `heading`.
pub fn telegraph_nodes(heading: &str, flat_text: &str) -> Vec<Node> {
    let mut nodes = vec![Node::element("h3", vec![Node::text(heading)])];

    for line in flat_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let node = if let Some(title) = line.strip_prefix("### ") {
            Node::element("h4", vec![Node::text(title)])
        } else if line.starts_with('[') && line.ends_with(']') {
            Node::element("p", vec![Node::element("b", vec![Node::text(line)])])
        } else {
            Node::element("p", vec![Node::text(line)])
        };
        nodes.push(node);
    }
    nodes
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, call: &str) -> Result<T, Box<dyn Error>> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(format!(
                "Telegraph {call} failed: {}",
                self.error.unwrap_or_else(|| "no result".to_string())
            )
            .into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Account {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Page {
    url: String,
}

/// Publishes flat reports as Telegraph pages.
#[derive(Debug, Clone)]
pub struct TelegraphClient {
    client: Client,
}

impl TelegraphClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Publish `flat_text` as a page titled `title` and return its URL.
    #[instrument(level = "info", skip_all, fields(%title))]
    pub async fn publish(&self, title: &str, flat_text: &str) -> Result<String, Box<dyn Error>> {
        let account: Account = self
            .client
            .get(format!("{API_BASE}/createAccount"))
            .query(&[("short_name", ACCOUNT_SHORT_NAME)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .json::<ApiResponse<Account>>()
            .await?
            .into_result("createAccount")?;

        let content = serde_json::to_string(&telegraph_nodes("Front-page report", flat_text))?;
        let form = [
            ("access_token", account.access_token.as_str()),
            ("title", title),
            ("content", content.as_str()),
            ("return_content", "false"),
        ];
        let page: Page = self
            .client
            .post(format!("{API_BASE}/createPage"))
            .form(&form)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .json::<ApiResponse<Page>>()
            .await?
            .into_result("createPage")?;

        info!(url = %page.url, "Published web view");
        Ok(page.url)
    }
}
