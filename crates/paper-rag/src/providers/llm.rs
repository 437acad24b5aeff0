//! LLM provider trait and per-request generation settings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Supported generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// Locally hosted Ollama chat model
    Ollama,
    /// Google Gemini REST API (requires an API key)
    Gemini,
}

impl Provider {
    /// Every supported provider
    pub const ALL: [Provider; 2] = [Provider::Ollama, Provider::Gemini];

    /// Display name, also the canonical provider string
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "Ollama",
            Provider::Gemini => "Gemini",
        }
    }

    /// Whether requests must carry an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Provider::Gemini)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnsupportedProvider(s.to_string()))
    }
}

/// Settings for one generation call
///
/// Passed by value into the pipeline and never modified by it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider identifier, e.g. "Ollama" or "Gemini"
    pub provider: String,
    /// Backend-specific model name; the backend default is used when unset
    #[serde(default)]
    pub model: Option<String>,
    /// Credential for cloud backends
    #[serde(default)]
    pub api_key: Option<String>,
}

impl GenerationConfig {
    /// Settings for any provider string
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: None,
            api_key: None,
        }
    }

    /// Local Ollama generation
    pub fn ollama(model: impl Into<String>) -> Self {
        Self::new(Provider::Ollama.as_str()).with_model(model)
    }

    /// Gemini generation with an API key
    pub fn gemini(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::new(Provider::Gemini.as_str())
            .with_model(model)
            .with_api_key(api_key)
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Resolve the provider string
    pub fn provider(&self) -> Result<Provider> {
        self.provider.parse()
    }

    /// API key, ignoring blank values
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(Provider::Ollama.as_str())
    }
}

// Keeps API keys out of logs
impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Trait for prompt-to-text generation backends
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server (gemma3, llama3, etc.)
/// - `GeminiLlm`: Google Gemini API (gemini-2.5-flash)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for a fully assembled prompt
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Model used when the request names none
    fn default_model(&self) -> &str;

    /// Model for a request
    fn model_for<'a>(&'a self, config: &'a GenerationConfig) -> &'a str {
        config
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.default_model())
    }
}
