//! Configuration for the RAG pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Generation backend configuration
    pub llm: LlmConfig,
    /// Retrieval defaults
    pub retrieval: RetrievalConfig,
    /// Prompt assembly limits
    pub prompt: PromptLimits,
    /// Paper source configuration
    pub source: SourceConfig,
}

impl RagConfig {
    /// Read a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: RagConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit path, the user config directory,
    /// or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `<config_dir>/paper-rag/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("paper-rag").join("config.toml"))
    }

    /// Reject values that would make every call fail later
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.default_k == 0 {
            return Err(Error::Config("retrieval.default_k must be positive".to_string()));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be positive".to_string()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::Config("embeddings.batch_size must be positive".to_string()));
        }
        if self.source.max_results == 0 {
            return Err(Error::Config("source.max_results must be positive".to_string()));
        }
        Ok(())
    }
}

/// Which embedder to construct
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Ollama embedding model
    #[default]
    Ollama,
    /// Offline feature-hashing embedder
    Hashing,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedder backend
    pub provider: EmbedderKind,
    /// Ollama embedding model
    pub model: String,
    /// Vector size for the hashing embedder
    pub dimensions: usize,
    /// Texts per embedding request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbedderKind::Ollama,
            model: "all-minilm".to_string(),
            dimensions: 384,
            batch_size: 32,
        }
    }
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub ollama_url: String,
    /// Gemini REST base URL
    pub gemini_url: String,
    /// Model used when a request names none (Ollama)
    pub ollama_model: String,
    /// Model used when a request names none (Gemini)
    pub gemini_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            gemini_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            ollama_model: "gemma3:latest".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            temperature: 0.3,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Retrieval defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Documents retrieved per question
    pub default_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { default_k: 5 }
    }
}

/// Limits applied while assembling the prompt context
///
/// Unset limits leave the context untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptLimits {
    /// Maximum number of documents placed in the prompt
    pub max_documents: Option<usize>,
    /// Maximum characters kept from each document
    pub max_chars_per_document: Option<usize>,
    /// Maximum characters of document text across the whole context
    pub max_context_chars: Option<usize>,
}

impl PromptLimits {
    /// No limits
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Cap the number of documents
    pub fn with_max_documents(mut self, max: usize) -> Self {
        self.max_documents = Some(max);
        self
    }

    /// Cap characters per document
    pub fn with_max_chars_per_document(mut self, max: usize) -> Self {
        self.max_chars_per_document = Some(max);
        self
    }

    /// Cap total context characters
    pub fn with_max_context_chars(mut self, max: usize) -> Self {
        self.max_context_chars = Some(max);
        self
    }
}

/// Paper source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// arXiv query API endpoint
    pub arxiv_url: String,
    /// Papers fetched when the caller gives no limit
    pub max_results: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            arxiv_url: "http://export.arxiv.org/api/query".to_string(),
            max_results: 40,
            timeout_secs: 30,
        }
    }
}
