//! Document and paper types

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// A document held by the pipeline
///
/// The id is the document's position in the collection passed to
/// `build_index` and matches its row in the vector index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Position in the indexed collection
    pub id: usize,
    /// Document text
    pub text: String,
}

impl Document {
    /// Create a document
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Research paper metadata from a document source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Paper title
    pub title: String,
    /// Author names in listed order
    pub authors: Vec<String>,
    /// Abstract; this is the text indexed by the pipeline
    pub summary: String,
    /// Publication timestamp
    pub published: Option<DateTime<Utc>>,
    /// PDF link, or the abstract page when no PDF link is listed
    pub source_url: String,
}

impl Paper {
    /// Publication year, if known
    pub fn year(&self) -> Option<i32> {
        self.published.map(|p| p.year())
    }

    /// Up to three authors followed by "et al." when there are more
    pub fn short_authors(&self) -> String {
        let shown = self.authors.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
        if self.authors.len() > 3 {
            format!("{} et al.", shown)
        } else {
            shown
        }
    }
}
