//! Prompt assembly, citation handling and summaries

pub mod citation;
pub mod prompt;
pub mod summary;

pub use citation::{extract_citations, link_citations};
pub use prompt::{truncate_excerpt, Prompt, PromptBuilder};
pub use summary::{summarize_cluster, Summarizer, SummaryStyle};
