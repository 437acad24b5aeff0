//! Gemini client for answer generation via the Generative Language API
//!
//! Authenticates with a per-request API key taken from `GenerationConfig`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::llm::{GenerationConfig, LlmProvider, Provider};
use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Gemini REST client
pub struct GeminiLlm {
    client: Client,
    base_url: String,
    default_model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: SamplingConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SamplingConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiLlm {
    /// Create a new Gemini client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.gemini_url.trim_end_matches('/').to_string(),
            default_model: config.gemini_model.clone(),
            temperature: config.temperature,
        })
    }

    /// Get the API endpoint URL
    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

/// Map an unsuccessful status to a readable failure
fn status_error(status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::llm(format!("Gemini rejected the API key ({}): {}", status, body))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            Error::llm(format!("Gemini quota or rate limit exceeded ({}): {}", status, body))
        }
        StatusCode::NOT_FOUND => Error::llm(format!("Gemini model not found ({}): {}", status, body)),
        _ => Error::llm(format!("Gemini generation failed ({}): {}", status, body)),
    }
}

#[async_trait]
impl LlmProvider for GeminiLlm {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        // Checked before any network I/O
        let api_key = config
            .api_key()
            .ok_or_else(|| Error::missing_credential(Provider::Gemini.as_str()))?;

        let model = self.model_for(config);
        tracing::info!("Generating answer with Gemini model: {}", model);

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: SamplingConfig {
                temperature: self.temperature,
                max_output_tokens: 2048,
            },
        };

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let gen_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse Gemini response: {}", e)))?;

        gen_response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .reduce(|mut acc, text| {
                acc.push_str(&text);
                acc
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::llm("No text in Gemini response"))
    }

    async fn health_check(&self) -> Result<bool> {
        // No key is available outside a request
        Ok(true)
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}
