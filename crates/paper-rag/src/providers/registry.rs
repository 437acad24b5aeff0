//! Provider lookup table for generation requests

use std::collections::HashMap;
use std::sync::Arc;

use super::gemini::GeminiLlm;
use super::llm::{GenerationConfig, LlmProvider, Provider};
use super::ollama::OllamaLlm;
use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Result of a generation call whose failures are reported in-band
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText {
    /// Generated text, or a readable error message
    pub text: String,
    /// True when `text` describes a failure
    pub failed: bool,
}

/// Routes each request to the backend registered for its provider
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<Provider, Arc<dyn LlmProvider>>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Ollama and Gemini backends
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(Self::new()
            .with_backend(Provider::Ollama, Arc::new(OllamaLlm::new(config)?))
            .with_backend(Provider::Gemini, Arc::new(GeminiLlm::new(config)?)))
    }

    /// Register a backend, replacing any previous one for the provider
    pub fn register(&mut self, provider: Provider, backend: Arc<dyn LlmProvider>) {
        self.backends.insert(provider, backend);
    }

    /// Builder-style `register`
    pub fn with_backend(mut self, provider: Provider, backend: Arc<dyn LlmProvider>) -> Self {
        self.register(provider, backend);
        self
    }

    /// Registered providers
    pub fn providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = self.backends.keys().copied().collect();
        providers.sort_by_key(|p| p.as_str());
        providers
    }

    /// Find the backend for a request
    pub fn resolve(&self, config: &GenerationConfig) -> Result<Arc<dyn LlmProvider>> {
        let provider = config.provider()?;
        self.backends
            .get(&provider)
            .cloned()
            .ok_or_else(|| Error::UnsupportedProvider(config.provider.clone()))
    }

    /// Generate text, returning backend failures as errors
    pub async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let backend = self.resolve(config)?;
        tracing::debug!(
            "Dispatching generation to {} ({} prompt chars)",
            backend.name(),
            prompt.len()
        );
        backend.generate(prompt, config).await
    }

    /// Generate text, turning any failure into a readable message
    pub async fn generate_or_error_text(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> GeneratedText {
        match self.generate(prompt, config).await {
            Ok(text) => GeneratedText {
                text,
                failed: false,
            },
            Err(e) => {
                tracing::warn!("Generation via {} failed: {}", config.provider, e);
                GeneratedText {
                    text: e.to_answer_text(&config.provider),
                    failed: true,
                }
            }
        }
    }
}
