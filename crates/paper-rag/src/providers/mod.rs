//! Provider abstractions for embeddings and answer generation
//!
//! Embedders turn text into vectors; LLM providers turn prompts into text.
//! Generation requests are routed to a provider through `BackendRegistry`.

pub mod embedding;
pub mod gemini;
pub mod hashing;
pub mod llm;
pub mod ollama;
pub mod registry;

pub use embedding::EmbeddingProvider;
pub use gemini::GeminiLlm;
pub use hashing::HashingEmbedder;
pub use llm::{GenerationConfig, LlmProvider, Provider};
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use registry::{BackendRegistry, GeneratedText};
