use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tillscan_core::LlmConfig;

use crate::LlmError;

/// A hosted model that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

// ── Gemini ────────────────────────────────────────────────────────────────────

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build from config, reading the API key from the configured env var.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(
            config.endpoint.as_str(),
            config.model.as_str(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "calling generateContent");
        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest::new(prompt))
            .send()
            .await?
            .error_for_status()?;
        let body: GenerateResponse = response.json().await?;
        body.text().ok_or(LlmError::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<PartOut<'a>>,
}

#[derive(Debug, Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self { contents: vec![Content { parts: vec![PartOut { text: prompt }] }] }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartIn>,
}

#[derive(Debug, Default, Deserialize)]
struct PartIn {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

// ── Mock generator (always available, used for tests) ─────────────────────────

/// Replies with a fixed answer and records every prompt it receives.
pub struct MockGenerator {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn replying(text: impl Into<String>) -> Self {
        Self { reply: Ok(text.into()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { reply: Err(message.into()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.reply.clone().map_err(LlmError::Generation)
    }
}
