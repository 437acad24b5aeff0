//! Prompt templates for grounded answer generation

use crate::config::PromptLimits;
use crate::types::RetrievalHit;

/// Instruction placed before every question
pub const PREAMBLE: &str = "You are a research assistant.\n\
Use the provided abstracts to answer the question.\n\
Cite sources as (Doc 1, Doc 2).";

/// An assembled prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Full prompt text
    pub text: String,
    /// Number of hits placed in the context; `Doc i` is `hits[i - 1]`
    pub included: usize,
}

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the labelled context block
    ///
    /// Labels follow hit order. Limits drop trailing hits or shorten
    /// excerpts, so labels never shift.
    pub fn build_context(hits: &[RetrievalHit], limits: &PromptLimits) -> (String, usize) {
        let max_docs = limits.max_documents.unwrap_or(hits.len()).min(hits.len());
        let mut remaining = limits.max_context_chars;
        let mut blocks = Vec::with_capacity(max_docs);

        for (i, hit) in hits.iter().take(max_docs).enumerate() {
            let mut excerpt = match limits.max_chars_per_document {
                Some(max) => truncate_excerpt(&hit.text, max),
                None => hit.text.clone(),
            };

            if let Some(budget) = remaining {
                if budget == 0 {
                    break;
                }
                if excerpt.chars().count() > budget {
                    excerpt = truncate_excerpt(&excerpt, budget);
                }
                remaining = Some(budget.saturating_sub(excerpt.chars().count()));
            }

            blocks.push(format!("Doc {}: {}", i + 1, excerpt));
        }

        let included = blocks.len();
        (blocks.join("\n\n"), included)
    }

    /// Build the full RAG prompt
    pub fn build(question: &str, hits: &[RetrievalHit], limits: &PromptLimits) -> Prompt {
        let (context, included) = Self::build_context(hits, limits);

        let text = format!(
            "{preamble}\n\nQuestion: {question}\n\nContext:\n{context}\n",
            preamble = PREAMBLE,
            question = question.trim(),
            context = context
        );

        Prompt { text, included }
    }

    /// Build the abstract summarization prompt
    pub fn build_summary_prompt(text: &str) -> String {
        format!(
            "Summarize this academic abstract in 3 bullet points.\n\
Preserve key methods, datasets, and results.\n\
Text:\n{text}\n",
            text = text
        )
    }
}

/// Marker appended to shortened excerpts
const ELLIPSIS: &str = "...";

/// Shorten `text` to at most `max_chars` characters, preferring a word
/// boundary, and mark the cut with "..."
///
/// The marker counts toward `max_chars`; it is left off when `max_chars`
/// is too small to hold it.
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let marker_len = ELLIPSIS.chars().count();
    if max_chars <= marker_len {
        return text.chars().take(max_chars).collect();
    }

    let keep = max_chars - marker_len;
    let end = text
        .char_indices()
        .nth(keep)
        .map_or(text.len(), |(idx, _)| idx);
    let head = &text[..end];

    if text[end..].starts_with(char::is_whitespace) {
        return format!("{}{}", head.trim_end(), ELLIPSIS);
    }

    match head.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => format!("{}{}", head[..pos].trim_end(), ELLIPSIS),
        _ => format!("{}{}", head, ELLIPSIS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(texts: &[&str]) -> Vec<RetrievalHit> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| RetrievalHit {
                doc_id: i,
                text: t.to_string(),
                distance: i as f32,
            })
            .collect()
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = PromptBuilder::build(
            "What metrics evaluate NLP models?",
            &hits(&["BLEU and ROUGE.", "Transformers."]),
            &PromptLimits::unlimited(),
        );

        assert_eq!(prompt.included, 2);
        assert_eq!(
            prompt.text,
            "You are a research assistant.\n\
Use the provided abstracts to answer the question.\n\
Cite sources as (Doc 1, Doc 2).\n\n\
Question: What metrics evaluate NLP models?\n\n\
Context:\n\
Doc 1: BLEU and ROUGE.\n\n\
Doc 2: Transformers.\n"
        );
    }

    #[test]
    fn test_labels_follow_hit_order() {
        let prompt = PromptBuilder::build("q", &hits(&["a", "b", "c"]), &PromptLimits::unlimited());
        let first = prompt.text.find("Doc 1: a").unwrap();
        let second = prompt.text.find("Doc 2: b").unwrap();
        let third = prompt.text.find("Doc 3: c").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_max_documents_drops_tail() {
        let limits = PromptLimits::unlimited().with_max_documents(2);
        let prompt = PromptBuilder::build("q", &hits(&["a", "b", "c"]), &limits);

        assert_eq!(prompt.included, 2);
        assert!(prompt.text.contains("Doc 2: b"));
        assert!(!prompt.text.contains("Doc 3:"));
    }

    #[test]
    fn test_per_document_truncation() {
        let limits = PromptLimits::unlimited().with_max_chars_per_document(15);
        let prompt = PromptBuilder::build(
            "q",
            &hits(&["graph neural networks for drug discovery"]),
            &limits,
        );
        assert!(prompt.text.contains("Doc 1: graph neural..."));
    }

    #[test]
    fn test_context_budget_stops_adding_documents() {
        let limits = PromptLimits::unlimited().with_max_context_chars(10);
        let prompt = PromptBuilder::build("q", &hits(&["0123456789", "second"]), &limits);

        assert_eq!(prompt.included, 1);
        assert!(!prompt.text.contains("Doc 2:"));
    }

    #[test]
    fn test_empty_hits() {
        let prompt = PromptBuilder::build("q", &[], &PromptLimits::unlimited());
        assert_eq!(prompt.included, 0);
        assert!(prompt.text.ends_with("Context:\n\n"));
    }

    #[test]
    fn test_truncate_excerpt() {
        assert_eq!(truncate_excerpt("short", 10), "short");
        assert_eq!(truncate_excerpt("This is a very long snippet", 12), "This is a...");
        assert_eq!(truncate_excerpt("abcdefghij", 4), "a...");
        // Multi-byte characters are counted, not bytes
        assert_eq!(truncate_excerpt("ééééé", 4), "é...");
        // No room for the marker
        assert_eq!(truncate_excerpt("abcdefghij", 3), "abc");
        assert_eq!(truncate_excerpt("abcdefghij", 0), "");
    }

    #[test]
    fn test_truncated_excerpt_never_exceeds_limit() {
        let text = "graph neural networks for drug discovery and abcdefghijklmnopqrstuvwxyz";
        for max in 0..text.chars().count() {
            assert!(truncate_excerpt(text, max).chars().count() <= max, "max = {}", max);
        }
    }

    fn context_blocks(prompt: &Prompt) -> Vec<String> {
        let context = &prompt.text[prompt.text.find("Context:\n").unwrap() + "Context:\n".len()..];
        context
            .split("\n\n")
            .filter_map(|block| block.trim_end().split_once(": "))
            .map(|(_, excerpt)| excerpt.to_string())
            .collect()
    }

    #[test]
    fn test_per_document_limit_includes_marker() {
        let limits = PromptLimits::unlimited().with_max_chars_per_document(12);
        let prompt = PromptBuilder::build(
            "q",
            &hits(&["graph neural networks for drug discovery", "abcdefghijklmnopqrstuvwxyz"]),
            &limits,
        );

        let excerpts = context_blocks(&prompt);
        assert_eq!(excerpts.len(), 2);
        for excerpt in &excerpts {
            assert!(excerpt.chars().count() <= 12, "{:?}", excerpt);
        }
        assert_eq!(excerpts[0], "graph...");
    }

    #[test]
    fn test_context_limit_includes_marker() {
        let limits = PromptLimits::unlimited().with_max_context_chars(10);
        let prompt = PromptBuilder::build("q", &hits(&["abcdefghijklmnopqrstuvwxyz"]), &limits);

        let excerpts = context_blocks(&prompt);
        assert_eq!(excerpts, vec!["abcdefg...".to_string()]);

        let limits = PromptLimits::unlimited().with_max_context_chars(20);
        let prompt = PromptBuilder::build(
            "q",
            &hits(&["first abstract text", "second abstract text"]),
            &limits,
        );
        let total: usize = context_blocks(&prompt).iter().map(|e| e.chars().count()).sum();
        assert!(total <= 20);
    }

    #[test]
    fn test_summary_prompt() {
        let prompt = PromptBuilder::build_summary_prompt("An abstract.");
        assert!(prompt.starts_with("Summarize this academic abstract in 3 bullet points."));
        assert!(prompt.ends_with("Text:\nAn abstract.\n"));
    }
}
