//! Citation extraction and linking

use regex::Regex;
use std::sync::OnceLock;

use crate::types::RetrievalHit;

fn doc_label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Matches "Doc 1", "doc2", "Document 3"
    PATTERN.get_or_init(|| Regex::new(r"(?i)\bdoc(?:ument)?\s*(\d+)\b").expect("Invalid regex"))
}

/// `Doc` labels cited by an answer, in order of first appearance
///
/// Labels outside `1..=included` are ignored since they cannot refer to a
/// document that was in the prompt.
pub fn extract_citations(answer: &str, included: usize) -> Vec<usize> {
    let mut labels = Vec::new();

    for cap in doc_label_pattern().captures_iter(answer) {
        let label: Option<usize> = cap.get(1).and_then(|m| m.as_str().parse().ok());

        if let Some(label) = label {
            if (1..=included).contains(&label) && !labels.contains(&label) {
                labels.push(label);
            }
        }
    }

    labels
}

/// Pair each cited label with its hit
pub fn link_citations<'a>(labels: &[usize], hits: &'a [RetrievalHit]) -> Vec<(usize, &'a RetrievalHit)> {
    labels
        .iter()
        .filter_map(|&label| hits.get(label.checked_sub(1)?).map(|hit| (label, hit)))
        .collect()
}
