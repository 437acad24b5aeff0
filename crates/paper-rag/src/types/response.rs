//! Retrieval and answer types

use serde::{Deserialize, Serialize};

/// A retrieved document with its distance to the question
///
/// Lower distance means more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// Position of the document in the indexed collection
    pub doc_id: usize,
    /// Document text
    pub text: String,
    /// Squared L2 distance between question and document vectors
    pub distance: f32,
}

/// Generated answer together with the evidence used to produce it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Generated text, or a readable error message when generation failed
    pub text: String,
    /// Retrieved documents in ascending distance order; `Doc i` in the
    /// prompt refers to `hits[i - 1]`
    pub hits: Vec<RetrievalHit>,
    /// `Doc` labels (1-based) cited in the answer text
    pub citations: Vec<usize>,
    /// True when `text` is a downgraded generation error
    pub failed: bool,
}

impl Answer {
    /// Hits referenced by the answer's citations
    pub fn cited_hits(&self) -> Vec<&RetrievalHit> {
        self.citations
            .iter()
            .filter_map(|label| self.hits.get(label.wrapping_sub(1)))
            .collect()
    }

    /// Split into `(answer_text, hits)`
    pub fn into_parts(self) -> (String, Vec<RetrievalHit>) {
        (self.text, self.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(doc_id: usize, distance: f32) -> RetrievalHit {
        RetrievalHit {
            doc_id,
            text: format!("doc {}", doc_id),
            distance,
        }
    }

    #[test]
    fn test_cited_hits_maps_labels() {
        let answer = Answer {
            text: "See (Doc 2).".to_string(),
            hits: vec![hit(4, 0.1), hit(0, 0.2)],
            citations: vec![2],
            failed: false,
        };

        let cited = answer.cited_hits();
        assert_eq!(cited.len(), 1);
        assert_eq!(cited[0].doc_id, 0);
    }

    #[test]
    fn test_into_parts() {
        let answer = Answer {
            text: "ok".to_string(),
            hits: vec![hit(1, 0.0)],
            citations: Vec::new(),
            failed: false,
        };
        let (text, hits) = answer.into_parts();
        assert_eq!(text, "ok");
        assert_eq!(hits.len(), 1);
    }
}
