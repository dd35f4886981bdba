//! Fundamentals-only summaries for relevant stories.
//!
//! The [`Summarizer`] wraps an [`AskAsync`] model client with the fixed
//! prompt template and the pause that follows every outbound call.

use crate::api::{AskAsync, SummaryError};
use crate::models::RawArticle;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument};

/// Stored as `ai_summary` when the model call fails.
pub const SUMMARY_FAILED: &str = "Error generating summary.";

/// Render the instruction sent to the model for one article.
pub fn build_prompt(article: &RawArticle) -> String {
    format!(
        "Summarize this business/economy news article in 2-3 sentences.\n\
         Focus ONLY on fundamental impacts to companies, industries, or the Indian economy.\n\
         DO NOT include stock price movements or investment recommendations.\n\
         \n\
         Article from {}:\n\
         Headline: {}\n\
         Text: {}\n",
        article.source, article.headline, article.summary
    )
}

/// Sequential summarizer with a fixed pause after each call.
#[derive(Debug)]
pub struct Summarizer<A> {
    client: A,
    delay: Duration,
}

impl<A: AskAsync> Summarizer<A> {
    pub fn new(client: A, delay: Duration) -> Self {
        Self { client, delay }
    }

    #[cfg(test)]
    pub fn client(&self) -> &A {
        &self.client
    }

    /// Ask the model for a summary of `article`.
    ///
    /// The pause runs after the call whether it succeeded or not, so two
    /// consecutive calls are always at least `delay` apart.
    #[instrument(level = "info", skip_all, fields(source = %article.source))]
    pub async fn summarize(&self, article: &RawArticle) -> Result<String, SummaryError> {
        let result = self
            .client
            .ask(&build_prompt(article))
            .await
            .map(|text| text.trim().to_string());

        if !self.delay.is_zero() {
            debug!(delay_ms = self.delay.as_millis() as u64, "Rate limit pause");
            sleep(self.delay).await;
        }
        result
    }
}
