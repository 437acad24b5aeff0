//! Offline feature-hashing embedder
//!
//! Lowercased Unicode words, adjacent word pairs and the trimmed raw text
//! are hashed with SHA-256 into one of `dimensions` buckets; the weighted
//! bucket counts are L2-normalised. Identical texts always produce identical
//! vectors and texts sharing more words land closer together. Reordered
//! words or changed casing move a text away from the original, so distinct
//! documents only share a vector on a hash collision. No model download or
//! server is needed.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

use super::embedding::EmbeddingProvider;
use crate::error::{Error, Result};

/// Weight of each word and word pair
const TERM_WEIGHT: f32 = 1.0;

/// Weight of the whole-text feature
const SURFACE_WEIGHT: f32 = 0.5;

/// Deterministic feature-hashing embedder
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimensions` floats
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::embedding("hashing embedder needs at least one dimension"));
        }
        Ok(Self { dimensions })
    }

    /// Vector length
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(bytes) % self.dimensions as u64) as usize
    }

    /// Embed without going through the async trait
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let words: Vec<String> = text.unicode_words().map(str::to_lowercase).collect();
        for word in &words {
            vector[self.bucket(word)] += TERM_WEIGHT;
        }
        for pair in words.windows(2) {
            vector[self.bucket(&format!("{} {}", pair[0], pair[1]))] += TERM_WEIGHT;
        }

        let surface = text.trim();
        if !surface.is_empty() {
            vector[self.bucket(&format!("\u{0}{}", surface))] += SURFACE_WEIGHT;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.encode(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.encode(t)).collect())
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::squared_l2;

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }

    #[test]
    fn test_deterministic_and_normalised() {
        let embedder = HashingEmbedder::new(384).unwrap();
        let a = embedder.encode("Graph neural networks for drug discovery");
        let b = embedder.encode("Graph neural networks for drug discovery");

        assert_eq!(a, b);
        assert_eq!(a.len(), 384);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_case_and_punctuation_variants_stay_close() {
        let embedder = HashingEmbedder::new(384).unwrap();
        let a = embedder.encode("NLP models.");
        let b = embedder.encode("nlp MODELS");
        let far = embedder.encode("diffusion generates images");

        assert_ne!(a, b);
        assert!(squared_l2(&a, &b) < squared_l2(&a, &far));
    }

    #[test]
    fn test_word_order_changes_vector() {
        let embedder = HashingEmbedder::new(384).unwrap();
        let a = embedder.encode("NLP models evaluate");
        let b = embedder.encode("evaluate NLP models");

        assert_ne!(a, b);
        assert!(squared_l2(&a, &b) > 1e-3);
        assert!(squared_l2(&b, &embedder.encode("evaluate NLP models")) < 1e-12);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16).unwrap();
        assert!(embedder.encode("").iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_shared_words_are_closer() {
        let embedder = HashingEmbedder::new(384).unwrap();
        let query = embedder.encode("graph neural networks");
        let near = embedder.encode("graph neural networks for molecules");
        let far = embedder.encode("diffusion models generate images");

        assert!(squared_l2(&query, &near) < squared_l2(&query, &far));
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let texts = vec!["first text".to_string(), "second text".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], embedder.embed("second text").await.unwrap());
    }
}
