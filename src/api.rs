//! Text generation API interaction.
//!
//! This module provides the interface for sending a prompt to a hosted
//! language model and getting plain text back.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async prompt/response interaction
//! - [`GeminiClient`]: Google Generative Language (`generateContent`) implementation
//!
//! Each prompt is sent once. A failed call is returned to the caller, which
//! records a sentinel summary and moves on.

use crate::config::SummarySettings;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Why a model call produced no usable text.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("response contained no text")]
    EmptyResponse,
}

/// Trait for async prompt/response interaction with a language model.
pub trait AskAsync {
    /// Send `prompt` and return the model's text response.
    async fn ask(&self, prompt: &str) -> Result<String, SummaryError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text = content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<String>();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Parse a raw `generateContent` response body into its text.
fn parse_response(body: &str) -> Result<String, SummaryError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)?;
    parsed.first_text().ok_or(SummaryError::EmptyResponse)
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(api_key: &str, settings: &SummarySettings) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint,
            self.model,
            urlencoding::encode(&self.api_key)
        )
    }
}

impl AskAsync for GeminiClient {
    #[instrument(level = "debug", skip_all, fields(model = %self.model))]
    async fn ask(&self, prompt: &str) -> Result<String, SummaryError> {
        let t0 = Instant::now();
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self.http.post(self.url()).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        if !status.is_success() {
            warn!(elapsed_ms, status = status.as_u16(), "Gemini call failed");
            return Err(SummaryError::Api {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }

        debug!(elapsed_ms, bytes = body.len(), "Gemini call succeeded");
        parse_response(&body)
    }
}
