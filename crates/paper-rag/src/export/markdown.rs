//! Markdown rendering for answers and literature reviews

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use crate::error::{Error, Result};
use crate::generation::{summarize_cluster, truncate_excerpt, SummaryStyle};
use crate::types::{Answer, Paper};

/// Characters of each hit shown under an answer
const EXCERPT_CHARS: usize = 300;

/// Key papers listed per theme
const KEY_PAPERS_PER_THEME: usize = 3;

/// A group of related papers with its summary
#[derive(Debug, Clone)]
pub struct Theme {
    /// Optional short name shown after the theme number
    pub label: String,
    /// Theme summary text
    pub summary: String,
    /// Papers in the theme, most representative first
    pub key_papers: Vec<Paper>,
}

/// A draft literature review made of numbered themes
#[derive(Debug, Clone, Default)]
pub struct LiteratureReview {
    pub themes: Vec<Theme>,
}

impl LiteratureReview {
    /// Create an empty review
    pub fn new() -> Self {
        Self::default()
    }

    /// Group papers by theme assignment and summarize each group
    ///
    /// `assignments[i]` is the theme of `papers[i]`. Themes are ordered by
    /// assignment value and papers keep their input order within a theme.
    pub fn from_assignments(
        papers: &[Paper],
        assignments: &[usize],
        style: SummaryStyle,
    ) -> Result<Self> {
        if papers.len() != assignments.len() {
            return Err(Error::invalid(format!(
                "{} theme assignments for {} papers",
                assignments.len(),
                papers.len()
            )));
        }

        let mut groups: BTreeMap<usize, Vec<&Paper>> = BTreeMap::new();
        for (paper, &theme) in papers.iter().zip(assignments) {
            groups.entry(theme).or_default().push(paper);
        }

        let themes = groups
            .into_values()
            .map(|members| {
                let texts: Vec<String> = members.iter().map(|p| p.summary.clone()).collect();
                Theme {
                    label: String::new(),
                    summary: summarize_cluster(&texts, style),
                    key_papers: members.into_iter().cloned().collect(),
                }
            })
            .collect();

        Ok(Self { themes })
    }

    /// Append a theme
    pub fn push(&mut self, theme: Theme) {
        self.themes.push(theme);
    }

    /// Render the review as markdown
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        for (i, theme) in self.themes.iter().enumerate() {
            if theme.label.trim().is_empty() {
                let _ = writeln!(out, "### Theme {}", i + 1);
            } else {
                let _ = writeln!(out, "### Theme {}: {}", i + 1, theme.label.trim());
            }
            let _ = writeln!(out, "{}\n", theme.summary.trim());

            if !theme.key_papers.is_empty() {
                out.push_str("**Key Papers:**\n");
                for paper in theme.key_papers.iter().take(KEY_PAPERS_PER_THEME) {
                    let _ = writeln!(out, "{}", format_key_paper(paper));
                }
                out.push('\n');
            }
        }

        out
    }
}

/// `- Title (Year) – authors`
pub fn format_key_paper(paper: &Paper) -> String {
    let year = paper
        .year()
        .map_or_else(|| "n.d.".to_string(), |y| y.to_string());
    format!("- {} ({}) – {}", paper.title, year, paper.short_authors())
}

/// Render an answer with the documents it was grounded on
pub fn render_answer(question: &str, answer: &Answer) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "## {}\n", question.trim());
    let _ = writeln!(out, "{}\n", answer.text.trim());

    if !answer.hits.is_empty() {
        out.push_str("### Sources\n\n");
        for (i, hit) in answer.hits.iter().enumerate() {
            let label = i + 1;
            let cited = if answer.citations.contains(&label) { " (cited)" } else { "" };
            let _ = writeln!(
                out,
                "- **Doc {}**{} (distance {:.4}): {}",
                label,
                cited,
                hit.distance,
                truncate_excerpt(&hit.text, EXCERPT_CHARS)
            );
        }
    }

    out
}

/// Write markdown content to `path`
pub fn export_markdown(content: &str, path: impl AsRef<Path>) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::invalid("No content to export"));
    }

    let path = path.as_ref();
    std::fs::write(path, content)?;
    tracing::info!("Exported {} bytes to {}", content.len(), path.display());
    Ok(())
}
