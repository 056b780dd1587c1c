//! Generative-text backends used to condense items into digests.
//!
//! # Architecture
//!
//! - [`Backend`]: one prompt in, one completion out
//! - [`OpenAiBackend`]: OpenAI-compatible chat completions
//! - [`GeminiBackend`]: Google `generateContent`
//! - [`LlmBackend`]: the configured provider, selected at startup
//!
//! Each request is made exactly once; failures are returned to the caller
//! and never retried.

use crate::config::SummaryConfig;
use crate::error::BackendError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{info, instrument, warn};

pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

const OPENAI_BASE: &str = "https://api.openai.com/v1";
const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Which service writes the digests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    #[value(name = "openai")]
    OpenAi,
    Gemini,
}

impl Provider {
    /// Environment variable holding this provider's credential.
    pub fn key_var(self) -> &'static str {
        match self {
            Provider::OpenAi => OPENAI_KEY_VAR,
            Provider::Gemini => GEMINI_KEY_VAR,
        }
    }
}

/// A generative-text service.
pub trait Backend {
    /// Short label for logs, e.g. `openai/gpt-4-turbo`.
    fn label(&self) -> String;

    /// Send one request and return the generated text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, BackendError>;
}

/// OpenAI chat completions (`POST {base}/chat/completions`).
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, model: String, api_base: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.unwrap_or_else(|| OPENAI_BASE.to_string()),
            api_key,
            model,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl Backend for OpenAiBackend {
    fn label(&self) -> String {
        format!("openai/{}", self.model)
    }

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, BackendError> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: 1000,
            temperature: 0.5,
        };

        let response: ChatResponse = self
            .http
            .post(format!("{}/chat/completions", self.api_base.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| BackendError::Malformed("no message content in choices".to_string()))?;

        info!(elapsed_ms = t0.elapsed().as_millis() as u64, chars = text.len(), "Completion received");
        Ok(text)
    }
}

/// Gemini `generateContent` (`POST {base}/models/{model}:generateContent`).
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(api_key: String, model: String, api_base: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.unwrap_or_else(|| GEMINI_BASE.to_string()),
            api_key,
            model,
        }
    }
}

impl Backend for GeminiBackend {
    fn label(&self) -> String {
        format!("gemini/{}", self.model)
    }

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, BackendError> {
        let t0 = Instant::now();
        let body = serde_json::json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        let response: Value = self
            .http
            .post(format!(
                "{}/models/{}:generateContent",
                self.api_base.trim_end_matches('/'),
                self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = response["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<String>()
            })
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BackendError::Malformed("no text in first candidate".to_string()))?;

        info!(elapsed_ms = t0.elapsed().as_millis() as u64, chars = text.len(), "Completion received");
        Ok(text)
    }
}

/// The backend chosen by configuration.
#[derive(Debug, Clone)]
pub enum LlmBackend {
    OpenAi(OpenAiBackend),
    Gemini(GeminiBackend),
}

impl LlmBackend {
    /// Build the configured backend, reading its credential from the
    /// environment.
    pub fn from_config(config: &SummaryConfig) -> Result<Self, BackendError> {
        let key = std::env::var(config.provider.key_var()).ok();
        Self::with_key(config, key)
    }

    /// Build the configured backend with an explicit credential. A missing
    /// or blank key is [`BackendError::MissingCredential`].
    pub fn with_key(config: &SummaryConfig, api_key: Option<String>) -> Result<Self, BackendError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(BackendError::MissingCredential(config.provider.key_var()))?;
        let model = config.model.clone();
        let base = config.api_base.clone();
        Ok(match config.provider {
            Provider::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(api_key, model, base)),
            Provider::Gemini => LlmBackend::Gemini(GeminiBackend::new(api_key, model, base)),
        })
    }
}

impl Backend for LlmBackend {
    fn label(&self) -> String {
        match self {
            LlmBackend::OpenAi(b) => b.label(),
            LlmBackend::Gemini(b) => b.label(),
        }
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, BackendError> {
        let result = match self {
            LlmBackend::OpenAi(b) => b.complete(system, prompt).await,
            LlmBackend::Gemini(b) => b.complete(system, prompt).await,
        };
        if let Err(e) = &result {
            warn!(backend = %self.label(), error = %e, "Completion request failed");
        }
        result
    }
}
