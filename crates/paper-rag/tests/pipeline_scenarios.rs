//! End-to-end pipeline behaviour with the offline embedder and stub backends

use async_trait::async_trait;
use std::sync::Arc;

use paper_rag::config::{LlmConfig, PromptLimits};
use paper_rag::providers::{HashingEmbedder, LlmProvider};
use paper_rag::{BackendRegistry, Error, GenerationConfig, Provider, RagPipeline, Result};

const CORPUS: [&str; 3] = [
    "Transformers are used in NLP for translation.",
    "BLEU and ROUGE evaluate NLP models.",
    "GNNs are applied in drug discovery.",
];

const QUESTION: &str = "What metrics are used to evaluate NLP models?";

struct CannedLlm(&'static str);

#[async_trait]
impl LlmProvider for CannedLlm {
    async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
        Ok(self.0.to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "canned"
    }

    fn default_model(&self) -> &str {
        "canned-1"
    }
}

struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
        Err(Error::llm("connection refused"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn default_model(&self) -> &str {
        "none"
    }
}

fn corpus() -> Vec<String> {
    CORPUS.iter().map(|s| s.to_string()).collect()
}

fn embedder() -> Arc<HashingEmbedder> {
    Arc::new(HashingEmbedder::new(384).unwrap())
}

async fn built(backends: BackendRegistry) -> RagPipeline {
    let mut rag = RagPipeline::new(embedder(), Arc::new(backends));
    rag.build_index(corpus()).await.unwrap();
    rag
}

fn canned() -> BackendRegistry {
    BackendRegistry::new().with_backend(
        Provider::Ollama,
        Arc::new(CannedLlm("BLEU and ROUGE are the usual metrics (Doc 1).")),
    )
}

#[tokio::test]
async fn test_metrics_question_ranks_evaluation_abstract_first() {
    let rag = built(canned()).await;
    let hits = rag.retrieve(QUESTION, 2).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text, CORPUS[1]);
    assert_eq!(hits[0].doc_id, 1);
    assert_ne!(hits[1].doc_id, 1);
    assert!(hits[0].distance <= hits[1].distance);
}

#[tokio::test]
async fn test_exact_text_is_at_distance_zero() {
    let rag = built(canned()).await;
    let hits = rag.retrieve(CORPUS[2], 1).await.unwrap();

    assert_eq!(hits[0].doc_id, 2);
    assert!(hits[0].distance.abs() < 1e-6);
}

#[tokio::test]
async fn test_retrieval_is_repeatable() {
    let rag = built(canned()).await;
    let first = rag.retrieve(QUESTION, 3).await.unwrap();
    let second = rag.retrieve(QUESTION, 3).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_k_larger_than_corpus_returns_everything_sorted() {
    let rag = built(canned()).await;
    let hits = rag.retrieve(QUESTION, 10).await.unwrap();

    assert_eq!(hits.len(), CORPUS.len());
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

    let mut ids: Vec<usize> = hits.iter().map(|h| h.doc_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_rebuild_replaces_collection() {
    let mut rag = built(canned()).await;
    rag.build_index(vec!["Diffusion models generate images.".to_string()])
        .await
        .unwrap();

    let hits = rag.retrieve(QUESTION, 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "Diffusion models generate images.");
}

#[tokio::test]
async fn test_precondition_errors_are_raised() {
    let mut rag = RagPipeline::new(embedder(), Arc::new(canned()));

    assert!(matches!(rag.retrieve(QUESTION, 2).await, Err(Error::NotReady)));
    assert!(matches!(
        rag.answer(QUESTION, GenerationConfig::default(), 2).await,
        Err(Error::NotReady)
    ));
    assert!(matches!(rag.build_index(Vec::new()).await, Err(Error::EmptyCorpus)));
}

#[tokio::test]
async fn test_answer_pairs_text_with_hits() {
    let rag = built(canned()).await;
    let answer = rag
        .answer(QUESTION, GenerationConfig::default(), 2)
        .await
        .unwrap();

    assert!(!answer.failed);
    assert_eq!(answer.citations, vec![1]);
    assert_eq!(answer.cited_hits()[0].text, CORPUS[1]);

    let (text, hits) = answer.into_parts();
    assert_eq!(text, "BLEU and ROUGE are the usual metrics (Doc 1).");
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn test_unsupported_provider_becomes_answer_text() {
    let rag = built(canned()).await;

    for k in [1, 2, 5] {
        let answer = rag
            .answer(QUESTION, GenerationConfig::new("Claude"), k)
            .await
            .unwrap();

        assert!(answer.failed);
        assert!(answer.text.contains("Invalid provider"));
        assert_eq!(answer.hits.len(), k.min(CORPUS.len()));
        assert!(answer.citations.is_empty());
    }
}

#[tokio::test]
async fn test_gemini_without_key_reports_missing_key() {
    let backends = BackendRegistry::from_config(&LlmConfig::default()).unwrap();
    let rag = built(backends).await;

    for config in [
        GenerationConfig::new("Gemini"),
        GenerationConfig::gemini("gemini-2.5-flash", "   "),
    ] {
        let answer = rag.answer(QUESTION, config, 2).await.unwrap();

        assert!(answer.failed);
        assert!(answer.text.contains("API key"));
        assert!(answer.text.contains("missing"));
        assert_eq!(answer.hits.len(), 2);
        assert_eq!(answer.hits[0].text, CORPUS[1]);
    }
}

#[tokio::test]
async fn test_backend_failure_keeps_hits() {
    let backends = BackendRegistry::new().with_backend(Provider::Ollama, Arc::new(FailingLlm));
    let rag = built(backends).await;

    let answer = rag
        .answer(QUESTION, GenerationConfig::ollama("gemma3:latest"), 3)
        .await
        .unwrap();

    assert!(answer.failed);
    assert!(answer.text.starts_with("Error querying Ollama"));
    assert!(answer.text.contains("connection refused"));
    assert_eq!(answer.hits.len(), 3);
}

#[tokio::test]
async fn test_prompt_limits_do_not_change_hits() {
    let mut rag = RagPipeline::new(embedder(), Arc::new(canned()))
        .with_prompt_limits(PromptLimits::unlimited().with_max_documents(1));
    rag.build_index(corpus()).await.unwrap();

    let answer = rag
        .answer(QUESTION, GenerationConfig::default(), 3)
        .await
        .unwrap();

    assert_eq!(answer.hits.len(), 3);
    assert_eq!(answer.citations, vec![1]);
}
