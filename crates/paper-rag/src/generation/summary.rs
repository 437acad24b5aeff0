//! Abstract and theme summaries

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use super::prompt::PromptBuilder;
use crate::error::{Error, Result};
use crate::providers::{BackendRegistry, GenerationConfig};

/// Texts listed in a bullet-style theme summary
const MAX_THEME_BULLETS: usize = 5;

/// Layout of a theme summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryStyle {
    /// One bullet per text
    Bullets,
    /// Single running paragraph
    #[default]
    Paragraph,
}

impl FromStr for SummaryStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullets" => Ok(SummaryStyle::Bullets),
            "paragraph" => Ok(SummaryStyle::Paragraph),
            other => Err(Error::invalid(format!("unknown summary style '{}'", other))),
        }
    }
}

/// Summarize a group of abstracts without calling a model
pub fn summarize_cluster(texts: &[String], style: SummaryStyle) -> String {
    match style {
        SummaryStyle::Bullets => texts
            .iter()
            .take(MAX_THEME_BULLETS)
            .map(|t| format!("- {}", t))
            .collect::<Vec<_>>()
            .join("\n"),
        SummaryStyle::Paragraph => format!("In this theme, {}...", texts.join(" ")),
    }
}

/// Model-backed abstract summarizer
pub struct Summarizer {
    backends: Arc<BackendRegistry>,
}

impl Summarizer {
    /// Create a summarizer using the given backends
    pub fn new(backends: Arc<BackendRegistry>) -> Self {
        Self { backends }
    }

    /// Summarize one abstract into three bullet points
    pub async fn summarize(&self, text: &str, config: &GenerationConfig) -> Result<String> {
        let prompt = PromptBuilder::build_summary_prompt(text);
        let summary = self.backends.generate(&prompt, config).await?;
        Ok(summary.trim().to_string())
    }

    /// Summarize abstracts one after another, preserving order
    pub async fn batch_summarize(
        &self,
        texts: &[String],
        config: &GenerationConfig,
    ) -> Result<Vec<String>> {
        let mut summaries = Vec::with_capacity(texts.len());
        for text in texts {
            summaries.push(self.summarize(text, config).await?);
        }
        Ok(summaries)
    }
}
