//! Ollama-based providers for embeddings and chat generation
//!
//! One `OllamaClient` can back both the embedder and the LLM provider.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::embedding::EmbeddingProvider;
use super::llm::{GenerationConfig, LlmProvider};
use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

/// Outcome of a failed attempt
enum AttemptError {
    /// Worth retrying (transport failure, 5xx)
    Retryable(Error),
    /// Retrying cannot help (unknown model, bad request)
    Fatal(Error),
}

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Base URL, without trailing slash
    base_url: String,
    /// Sampling temperature
    temperature: f32,
    /// Maximum retries
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    /// Base URL of the Ollama server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, AttemptError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Retryable(e)) => {
                    if attempt >= self.max_retries {
                        return Err(e);
                    }
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        "Ollama request failed (attempt {}/{}): {}; retrying in {:?}",
                        attempt + 1,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Embed a batch of texts in a single request
    pub async fn embed_batch(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);
        let url = url.as_str();

        let embeddings = self
            .retry_request(|| async move {
                let request = EmbedRequest { model, input: texts };

                let response = self
                    .client
                    .post(url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| {
                        AttemptError::Retryable(Error::embedding(self.transport_message("Embedding", e)))
                    })?;

                let status = response.status();
                if !status.is_success() {
                    let message = error_message(response).await;
                    let error = Error::embedding(format!("HTTP {} - {}", status, message));
                    return Err(classify(status, error));
                }

                let body: EmbedResponse = response.json().await.map_err(|e| {
                    AttemptError::Fatal(Error::embedding(format!(
                        "Failed to parse embedding response: {}",
                        e
                    )))
                })?;

                Ok(body.embeddings)
            })
            .await?;

        if embeddings.len() != texts.len() {
            return Err(Error::embedding(format!(
                "Ollama returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        Ok(embeddings)
    }

    /// Send a single-turn chat request and return the reply text
    pub async fn chat(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let url = url.as_str();

        tracing::info!("Generating answer with Ollama model: {}", model);

        self.retry_request(|| async move {
            let request = ChatRequest {
                model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                stream: false,
                options: ChatOptions {
                    temperature: self.temperature,
                },
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| AttemptError::Retryable(Error::llm(self.transport_message("Generation", e))))?;

            let status = response.status();
            if !status.is_success() {
                let message = error_message(response).await;
                return Err(chat_failure(status, model, &message));
            }

            let body: ChatResponse = response.json().await.map_err(|e| {
                AttemptError::Fatal(Error::llm(format!("Failed to parse chat response: {}", e)))
            })?;

            Ok(body.message.content)
        })
        .await
    }

    fn transport_message(&self, what: &str, err: reqwest::Error) -> String {
        if err.is_connect() {
            format!("cannot connect to Ollama at {}: {}", self.base_url, err)
        } else if err.is_timeout() {
            format!("{} request to Ollama timed out", what)
        } else {
            format!("{} request failed: {}", what, err)
        }
    }
}

/// Longest wait between retries
const MAX_BACKOFF_SECS: u64 = 60;

/// Wait before retry number `attempt + 1`: 1s, 2s, 4s, ... capped at a minute
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt).min(MAX_BACKOFF_SECS))
}

/// Map a failed chat response to a retry decision
fn chat_failure(status: StatusCode, model: &str, message: &str) -> AttemptError {
    if status == StatusCode::NOT_FOUND {
        return AttemptError::Fatal(Error::llm(format!(
            "model '{}' not found (pull it with `ollama pull {}`)",
            model, model
        )));
    }
    classify(
        status,
        Error::llm(format!("Generation failed: HTTP {} - {}", status, message)),
    )
}

/// Server errors are retried, client errors are not
fn classify(status: StatusCode, error: Error) -> AttemptError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        AttemptError::Retryable(error)
    } else {
        AttemptError::Fatal(error)
    }
}

/// Pull Ollama's `{"error": ...}` message out of a failed response
async fn error_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body)
}

/// Ollama embedding provider using all-minilm or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    model: String,
    batch_size: usize,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(llm: &LlmConfig, embeddings: &EmbeddingConfig) -> Result<Self> {
        Ok(Self::from_client(
            Arc::new(OllamaClient::new(llm)?),
            embeddings.model.clone(),
            embeddings.batch_size,
        ))
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, model: String, batch_size: usize) -> Self {
        Self {
            client,
            model,
            batch_size: batch_size.max(1),
        }
    }

    /// Embedding model name
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.client.embed_batch(&self.model, &[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::embedding("Ollama returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.client.embed_batch(&self.model, batch).await?);
        }
        Ok(embeddings)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama chat provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    default_model: String,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self::from_client(
            Arc::new(OllamaClient::new(config)?),
            config.ollama_model.clone(),
        ))
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, default_model: String) -> Self {
        Self {
            client,
            default_model,
        }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Arc<OllamaClient> {
        &self.client
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let model = self.model_for(config);
        self.client.chat(model, prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> LlmConfig {
        LlmConfig {
            // Port 9 (discard) is closed on test machines
            ollama_url: "http://127.0.0.1:9/".to_string(),
            timeout_secs: 2,
            max_retries: 0,
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_base_url_trimmed() {
        let client = OllamaClient::new(&unreachable_config()).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9");
    }

    #[test]
    fn test_model_falls_back_to_default() {
        let llm = OllamaLlm::new(&LlmConfig::default()).unwrap();
        assert_eq!(llm.model_for(&GenerationConfig::default()), "gemma3:latest");
        assert_eq!(llm.model_for(&GenerationConfig::ollama("llama3")), "llama3");
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(6), Duration::from_secs(MAX_BACKOFF_SECS));
        assert_eq!(backoff_delay(64), Duration::from_secs(MAX_BACKOFF_SECS));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_secs(MAX_BACKOFF_SECS));
    }

    #[test]
    fn test_server_errors_are_retried() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::TOO_MANY_REQUESTS,
        ] {
            assert!(
                matches!(chat_failure(status, "llama3", "busy"), AttemptError::Retryable(_)),
                "{}",
                status
            );
        }
    }

    #[test]
    fn test_client_errors_are_fatal() {
        for status in [StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED, StatusCode::NOT_FOUND] {
            assert!(
                matches!(chat_failure(status, "llama3", "bad"), AttemptError::Fatal(_)),
                "{}",
                status
            );
        }
    }

    #[test]
    fn test_missing_model_message() {
        match chat_failure(StatusCode::NOT_FOUND, "llama3", "model not found") {
            AttemptError::Fatal(Error::Llm(message)) => {
                assert!(message.contains("'llama3' not found"));
                assert!(message.contains("ollama pull llama3"));
            }
            _ => panic!("missing model should be fatal"),
        }

        match chat_failure(StatusCode::BAD_GATEWAY, "llama3", "upstream down") {
            AttemptError::Retryable(Error::Llm(message)) => {
                assert!(message.contains("502"));
                assert!(message.contains("upstream down"));
            }
            _ => panic!("bad gateway should be retried"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_llm_error() {
        let llm = OllamaLlm::new(&unreachable_config()).unwrap();
        let result = llm.generate("hello", &GenerationConfig::default()).await;
        assert!(matches!(result, Err(Error::Llm(_))));
    }

    #[tokio::test]
    async fn test_health_check_reports_unavailable() {
        let client = OllamaClient::new(&unreachable_config()).unwrap();
        assert!(!client.health_check().await.unwrap());
    }
}
