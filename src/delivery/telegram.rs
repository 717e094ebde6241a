//! Telegram Bot API sink.

use super::DeliverySink;
use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, instrument};

const API_BASE: &str = "https://api.telegram.org";

/// Sends chunks to one chat with `sendMessage`, parsed as HTML.
#[derive(Clone)]
pub struct TelegramSink {
    client: Client,
    bot_token: String,
    chat_id: String,
    timeout: Duration,
}

impl TelegramSink {
    pub fn new(client: Client, bot_token: String, chat_id: String) -> Self {
        Self {
            client,
            bot_token,
            chat_id,
            timeout: Duration::from_secs(10),
        }
    }
}

// the token is part of the endpoint URL; keep it out of debug output
impl std::fmt::Debug for TelegramSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSink")
            .field("chat_id", &self.chat_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DeliverySink for TelegramSink {
    #[instrument(level = "debug", skip_all, fields(chars = text.chars().count()))]
    async fn send(&self, text: &str) -> Result<(), Box<dyn Error>> {
        let endpoint = format!("{API_BASE}/bot{}/sendMessage", self.bot_token);
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text),
            ("parse_mode", "HTML"),
            ("disable_web_page_preview", "true"),
        ];

        let rsp = self
            .client
            .post(&endpoint)
            .form(&form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| format!("Telegram request failed: {}", e.without_url()))?;

        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(format!("Telegram HTTP {}: {body}", status.as_u16()).into());
        }
        debug!("Chunk accepted");
        Ok(())
    }
}
