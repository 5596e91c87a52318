//! Google Gemini client for single-prompt text generation.
//!
//! Uses the `generateContent` REST endpoint.
//! See: <https://ai.google.dev/api/generate-content>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::GenerationProvider;
use crate::{DocQueryError, Result, UpstreamError};

/// Default base URL for the Gemini API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Gemini `generateContent` API.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    http: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, base_url, DEFAULT_MODEL, DEFAULT_TIMEOUT)
    }

    /// Create a client with every knob set explicitly.
    ///
    /// `timeout` bounds each HTTP request; it is the only timeout applied to
    /// a generation call.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DocQueryError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// The model this client generates with.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, UpstreamError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.map_err(transport_error)?;
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }

        // Body reads can still time out or lose the connection.
        let bytes = response.bytes().await.map_err(transport_error)?;
        let body: GenerateContentResponse = serde_json::from_slice(&bytes)
            .map_err(|e| UpstreamError::Other(format!("error decoding response body: {e}")))?;

        body.into_text()
            .ok_or_else(|| UpstreamError::Other("response contained no candidate text".into()))
    }
}

/// Map a reqwest transport failure onto the upstream taxonomy.
///
/// A connection the peer drops before or during the response surfaces as a
/// request or body error; both count as connection failures.
/// The URL is stripped so error messages never carry request parameters.
fn transport_error(err: reqwest::Error) -> UpstreamError {
    let err = err.without_url();
    let message = err.to_string();
    if err.is_timeout() {
        UpstreamError::Timeout(message)
    } else if err.is_connect() || err.is_request() || err.is_body() {
        UpstreamError::Connect(message)
    } else {
        UpstreamError::Other(message)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        Some(text)
    }
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}
