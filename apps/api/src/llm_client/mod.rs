/// LLM Client: the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call a model provider directly.
/// All model interactions go through `LlmClient::generate`, and all JSON
/// extraction from model output goes through `normalize`.
///
/// Exactly one backend is active per process, chosen at startup.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

pub mod gemini;
pub mod normalize;
pub mod ollama;

pub use normalize::{normalize, Normalized};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Transport failures, rate limits, provider 5xx and empty completions are worth retrying.
    /// Any other API status (bad key, bad request) will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::EmptyContent => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Parse(_) => false,
        }
    }
}

/// A text-generation backend: prompt in, raw text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Short backend name for logs ("gemini" | "ollama").
    fn backend(&self) -> &'static str;

    fn model(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Ollama,
}

/// Resolves the configured provider. Gemini without a key silently becomes Ollama.
pub fn select_provider(preferred: &str, gemini_api_key: &str) -> Provider {
    match preferred.trim().to_lowercase().as_str() {
        "gemini" if !gemini_api_key.trim().is_empty() => Provider::Gemini,
        "gemini" => {
            warn!("GEMINI_API_KEY is missing. Falling back to Ollama.");
            Provider::Ollama
        }
        "ollama" => Provider::Ollama,
        other => {
            warn!("Unknown AI_PROVIDER '{other}', using Ollama");
            Provider::Ollama
        }
    }
}

/// The single LLM client shared by all services. Cheap to clone.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn TextGenerator>,
}

impl LlmClient {
    pub fn new(inner: Arc<dyn TextGenerator>) -> Self {
        Self { inner }
    }

    /// Builds the backend selected by `AI_PROVIDER`.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(config.ai_timeout_secs);
        let inner: Arc<dyn TextGenerator> =
            match select_provider(&config.ai_provider, &config.gemini_api_key) {
                Provider::Gemini => Arc::new(gemini::GeminiClient::new(
                    config.gemini_api_key.clone(),
                    timeout,
                )?),
                Provider::Ollama => Arc::new(ollama::OllamaClient::new(
                    config.ollama_host.clone(),
                    config.ai_model.clone(),
                    timeout,
                )?),
            };
        info!(
            "LLM backend selected: {} (model: {})",
            inner.backend(),
            inner.model()
        );
        Ok(Self::new(inner))
    }

    pub fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    pub fn model(&self) -> &str {
        self.inner.model()
    }

    /// Sends one prompt to the active backend. Blank completions are reported as `EmptyContent`.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(
            "LLM call: backend={} prompt_chars={}",
            self.inner.backend(),
            prompt.chars().count()
        );
        let text = self.inner.generate(prompt).await?;
        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        debug!("LLM call succeeded: response_chars={}", text.chars().count());
        Ok(text)
    }
}

/// Reads an error body from a failed provider response, keeping the status.
pub(crate) async fn api_error(response: reqwest::Response) -> LlmError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    LlmError::Api { status, message }
}
