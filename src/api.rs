//! LLM API interaction.
//!
//! The summariser and the topic classifier are both reached through the
//! [`AskAsync`] trait; [`AskFnWrapper`] adapts `awful_aj`'s `ask` function
//! (OpenAI-compatible endpoint, model and key from `config.yaml`) with one
//! chat template per task.
//!
//! Every call is a single attempt. A failed call is reported to the caller,
//! which decides how to degrade.

use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use std::error::Error;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Template used for the per-article summary call.
pub const SUMMARY_TEMPLATE: &str = "frontpage_summary";

/// Template used for the aggregate topic classification call.
pub const TOPICS_TEMPLATE: &str = "frontpage_topics";

/// Trait for async LLM interaction.
///
/// Implementors send text to a model and return its answer. Tests provide
/// scripted implementations.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper around `awful_aj::api::ask` that implements [`AskAsync`].
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    /// Reference to the LLM configuration (API keys, endpoints, model settings).
    pub config: &'a AwfulJadeConfig,
    /// Reference to the chat template defining the conversation structure.
    pub template: &'a ChatTemplate,
}

impl<'a> AskAsync for AskFnWrapper<'a> {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(input_chars = text.chars().count()))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(self.config, text.to_string(), self.template, None, None).await;
        let dt = t0.elapsed();

        match &res {
            Ok(answer) => info!(
                elapsed_ms = dt.as_millis() as u64,
                answer_chars = answer.chars().count(),
                "API call succeeded"
            ),
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "API call failed"),
        }
        res
    }
}
