//! Error types for the RAG pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
///
/// Precondition failures (`EmptyCorpus`, `NotReady`, `NotBuilt`) are always
/// returned to the caller. Generation failures can be downgraded into answer
/// text with [`Error::to_answer_text`].
#[derive(Debug, Error)]
pub enum Error {
    /// `build_index` was called without documents
    #[error("Cannot build an index from an empty corpus")]
    EmptyCorpus,

    /// Retrieval before a successful `build_index`
    #[error("Index not built yet")]
    NotReady,

    /// Vector search before the index was built
    #[error("Vector index has not been built")]
    NotBuilt,

    /// Vector of the wrong length
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Caller supplied an unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Provider string not handled by any registered backend
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Cloud backend invoked without an API key
    #[error("Missing API key for provider {provider}")]
    MissingCredential { provider: String },

    /// Generation backend failure (network, auth, quota, model)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Document acquisition error
    #[error("Document source error: {0}")]
    Source(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a document source error
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /// Create an invalid argument error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a missing credential error
    pub fn missing_credential(provider: impl Into<String>) -> Self {
        Self::MissingCredential {
            provider: provider.into(),
        }
    }

    /// Whether this error belongs to call ordering or input validation
    /// rather than to a generation backend
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::EmptyCorpus
                | Error::NotReady
                | Error::NotBuilt
                | Error::DimensionMismatch { .. }
                | Error::InvalidArgument(_)
        )
    }

    /// Render a generation failure as the in-band text shown to users
    pub fn to_answer_text(&self, provider: &str) -> String {
        match self {
            Error::UnsupportedProvider(p) => {
                format!("Error: Invalid provider selected ({}).", p)
            }
            Error::MissingCredential { provider } => {
                format!("Error: API key for {} is missing.", provider)
            }
            Error::Llm(msg) => format!("Error querying {}: {}", provider, msg),
            other => format!("Error querying {}: {}", provider, other),
        }
    }
}
