//! paper-rag: retrieval-augmented question answering over research-paper abstracts
//!
//! Abstracts are embedded into an exact L2 vector index. A question is
//! answered by retrieving the nearest abstracts, placing them in a prompt as
//! numbered `Doc` blocks and sending that prompt to a local (Ollama) or cloud
//! (Gemini) generation backend. Answers come back together with the hits
//! they were grounded on, so callers can render citations.

pub mod config;
pub mod error;
pub mod export;
pub mod generation;
pub mod index;
pub mod providers;
pub mod retrieval;
pub mod sources;
pub mod types;

pub use config::{PromptLimits, RagConfig};
pub use error::{Error, Result};
pub use providers::{BackendRegistry, GenerationConfig, Provider};
pub use retrieval::RagPipeline;
pub use types::{Answer, Document, Paper, RetrievalHit};
