//! Document sources that supply paper abstracts for indexing

pub mod arxiv;

pub use arxiv::{parse_atom_feed, ArxivSource};

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Paper;

/// Trait for paper metadata sources
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Search for up to `max_results` papers matching `query`
    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Paper>>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Abstracts of `papers`, ready for `RagPipeline::build_index`
///
/// Document `i` of the built index is then `papers[i]`.
pub fn abstracts(papers: &[Paper]) -> Vec<String> {
    papers.iter().map(|p| p.summary.clone()).collect()
}
