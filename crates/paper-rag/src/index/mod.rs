//! Vector index abstraction for document embeddings
//!
//! Implementations:
//! - `FlatL2Index`: exact brute-force search under squared L2 distance

pub mod distance;
pub mod flat;

pub use distance::squared_l2;
pub use flat::FlatL2Index;

use crate::error::Result;

/// A stored vector matched by a search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Insertion position of the vector
    pub id: usize,
    /// Squared L2 distance to the query
    pub distance: f32,
}

/// Trait for nearest-neighbor indexes over positional vectors
///
/// Ids are insertion positions. `search` returns neighbors in ascending
/// distance, ties in insertion order, and at most `k` of them.
pub trait VectorIndex: Send + Sync {
    /// Replace the index contents with `vectors`
    ///
    /// Fails on an empty sequence or on vectors of differing length.
    fn build(&mut self, vectors: Vec<Vec<f32>>) -> Result<()>;

    /// Find the `k` stored vectors closest to `query`
    ///
    /// Fails with `NotBuilt` before `build`.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// Number of stored vectors
    fn len(&self) -> usize;

    /// Check if no vectors are stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector length, once built
    fn dimensions(&self) -> Option<usize>;

    /// Index name for logging
    fn name(&self) -> &str;
}
