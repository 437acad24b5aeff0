//! Retrieval-augmented answering over an indexed document collection
//!
//! Lifecycle: a pipeline starts empty; `build_index` embeds and indexes a
//! collection, after which `retrieve` and `answer` may be called any number
//! of times. Rebuilding replaces the previous collection.

use std::sync::Arc;

use crate::config::{EmbedderKind, PromptLimits, RagConfig};
use crate::error::{Error, Result};
use crate::generation::{extract_citations, PromptBuilder};
use crate::index::{FlatL2Index, VectorIndex};
use crate::providers::{
    BackendRegistry, EmbeddingProvider, GenerationConfig, HashingEmbedder, OllamaEmbedder,
};
use crate::types::{Answer, Document, RetrievalHit};

/// Documents retrieved when the caller does not choose
pub const DEFAULT_TOP_K: usize = 5;

/// Build the embedder selected by the configuration
pub fn embedder_from_config(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.provider {
        EmbedderKind::Ollama => Arc::new(OllamaEmbedder::new(&config.llm, &config.embeddings)?),
        EmbedderKind::Hashing => Arc::new(HashingEmbedder::new(config.embeddings.dimensions)?),
    };
    Ok(embedder)
}

/// RAG pipeline owning an embedder handle, a vector index and the indexed
/// documents
pub struct RagPipeline {
    /// Text embedder
    embedder: Arc<dyn EmbeddingProvider>,
    /// Generation backends keyed by provider
    backends: Arc<BackendRegistry>,
    /// Vector index, row `i` is `documents[i]`
    index: Box<dyn VectorIndex>,
    /// Indexed documents; empty until `build_index` succeeds
    documents: Vec<Document>,
    /// Model used when a request names none
    default_model: Option<String>,
    /// Prompt context limits
    limits: PromptLimits,
    /// k used by `query`
    default_k: usize,
}

impl RagPipeline {
    /// Create a pipeline with an exact L2 index
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, backends: Arc<BackendRegistry>) -> Self {
        Self::with_index(embedder, backends, Box::new(FlatL2Index::new()))
    }

    /// Create a pipeline around a specific index implementation
    pub fn with_index(
        embedder: Arc<dyn EmbeddingProvider>,
        backends: Arc<BackendRegistry>,
        index: Box<dyn VectorIndex>,
    ) -> Self {
        Self {
            embedder,
            backends,
            index,
            documents: Vec::new(),
            default_model: None,
            limits: PromptLimits::default(),
            default_k: DEFAULT_TOP_K,
        }
    }

    /// Create a pipeline with the configured embedder, backends and limits
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        config.validate()?;
        let embedder = embedder_from_config(config)?;
        let backends = Arc::new(BackendRegistry::from_config(&config.llm)?);

        Ok(Self::new(embedder, backends)
            .with_prompt_limits(config.prompt.clone())
            .with_default_k(config.retrieval.default_k))
    }

    /// Set the model used when a request names none
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Set prompt context limits
    pub fn with_prompt_limits(mut self, limits: PromptLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the k used by `query`
    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    /// Check if `build_index` has succeeded
    pub fn is_ready(&self) -> bool {
        !self.documents.is_empty()
    }

    /// Indexed documents in positional order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Vector length of the index, once built
    pub fn dimensions(&self) -> Option<usize> {
        self.index.dimensions()
    }

    /// Embed and index a document collection
    ///
    /// All documents are embedded in one batch call. On failure the
    /// previously indexed collection, if any, stays in place.
    pub async fn build_index(&mut self, documents: Vec<String>) -> Result<()> {
        if documents.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        tracing::info!(
            "Embedding {} documents with {}",
            documents.len(),
            self.embedder.name()
        );

        let vectors = self.embedder.embed_batch(&documents).await?;

        if vectors.len() != documents.len() {
            return Err(Error::embedding(format!(
                "embedder returned {} vectors for {} documents",
                vectors.len(),
                documents.len()
            )));
        }

        let dimensions = vectors.first().map_or(0, Vec::len);
        self.index.build(vectors)?;

        self.documents = documents
            .into_iter()
            .enumerate()
            .map(|(id, text)| Document::new(id, text))
            .collect();

        tracing::info!(
            "Indexed {} documents ({} dims, {} index)",
            self.documents.len(),
            dimensions,
            self.index.name()
        );

        Ok(())
    }

    /// Retrieve the `k` documents closest to the question
    ///
    /// Hits are in ascending distance. When `k` exceeds the collection
    /// size every document is returned.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<RetrievalHit>> {
        if !self.is_ready() {
            return Err(Error::NotReady);
        }
        if k == 0 {
            return Err(Error::invalid("k must be positive"));
        }

        let query = self.embedder.embed(question).await?;
        let neighbors = self.index.search(&query, k)?;

        let hits = neighbors
            .into_iter()
            .map(|n| {
                let document = self.documents.get(n.id).ok_or_else(|| {
                    Error::invalid(format!("index returned unknown document {}", n.id))
                })?;
                Ok(RetrievalHit {
                    doc_id: document.id,
                    text: document.text.clone(),
                    distance: n.distance,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Retrieved {} documents for \"{}\"", hits.len(), question);

        Ok(hits)
    }

    /// Answer a question from the retrieved documents
    ///
    /// Retrieval errors are returned. Generation errors are not: the
    /// returned answer then carries a readable error message as its text,
    /// `failed` is set, and the hits are still included.
    pub async fn answer(
        &self,
        question: &str,
        config: GenerationConfig,
        k: usize,
    ) -> Result<Answer> {
        let hits = self.retrieve(question, k).await?;
        let prompt = PromptBuilder::build(question, &hits, &self.limits);

        let mut request = config;
        if request.model.is_none() {
            request.model = self.default_model.clone();
        }

        tracing::info!(
            "Answering with {} ({} of {} documents in prompt)",
            request.provider,
            prompt.included,
            hits.len()
        );

        let generated = self
            .backends
            .generate_or_error_text(&prompt.text, &request)
            .await;

        let citations = if generated.failed {
            Vec::new()
        } else {
            extract_citations(&generated.text, prompt.included)
        };

        Ok(Answer {
            text: generated.text,
            hits,
            citations,
            failed: generated.failed,
        })
    }

    /// `retrieve` with the configured default k
    pub async fn query(&self, question: &str) -> Result<Vec<RetrievalHit>> {
        self.retrieve(question, self.default_k).await
    }
}
