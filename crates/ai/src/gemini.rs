//! Gemini `generateContent` client.

use crate::model::{GenerativeModel, Prompt};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use slidecraft_core::{Error, Result};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Vision-capable model used for slide plans.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
/// Model used for speaker notes.
pub const DEFAULT_NOTES_MODEL: &str = "gemini-1.5-flash";

/// Connection settings for the Gemini API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
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

fn request_body(prompt: &Prompt) -> GeminiRequest<'_> {
    let mut parts = vec![RequestPart::Text {
        text: prompt.text.as_str(),
    }];
    parts.extend(prompt.images.iter().map(|image| RequestPart::Inline {
        inline_data: InlineData {
            mime_type: image.mime_type.as_str(),
            data: STANDARD.encode(&image.data),
        },
    }));
    GeminiRequest {
        contents: vec![Content { parts }],
    }
}

/// Text of the first candidate, all parts concatenated.
fn response_text(raw: &str) -> Result<String> {
    let response: GeminiResponse = serde_json::from_str(raw)
        .map_err(|e| Error::AiGenerationError(format!("Unreadable Gemini response: {}", e)))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::AiGenerationError(
            "Gemini returned no text".to_string(),
        ));
    }
    Ok(text)
}

/// Blocking Gemini REST client.
pub struct GeminiClient {
    config: GeminiConfig,
    http: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::AiGenerationError(
                "Gemini API key is not configured".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::AiGenerationError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

impl GenerativeModel for GeminiClient {
    fn generate(&self, prompt: &Prompt) -> Result<String> {
        log::debug!(
            "Calling {} with {} chars and {} images",
            self.config.model,
            prompt.text.len(),
            prompt.images.len()
        );

        let response = self
            .http
            .post(self.config.endpoint())
            .header("X-goog-api-key", &self.config.api_key)
            .json(&request_body(prompt))
            .send()
            .map_err(|e| Error::AiGenerationError(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        let raw = response
            .text()
            .map_err(|e| Error::AiGenerationError(format!("Failed to read Gemini response: {}", e)))?;
        if !status.is_success() {
            return Err(Error::AiGenerationError(format!(
                "Gemini API request failed: {} - {}",
                status, raw
            )));
        }

        response_text(&raw)
    }
}
