//! Markdown export of answers and literature reviews

pub mod markdown;

pub use markdown::{export_markdown, format_key_paper, render_answer, LiteratureReview, Theme};
