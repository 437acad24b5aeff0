//! Retrieval pipeline: indexing, nearest-document lookup and grounded answers

pub mod pipeline;

pub use pipeline::{embedder_from_config, RagPipeline, DEFAULT_TOP_K};
