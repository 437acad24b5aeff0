//! Core types for the RAG pipeline

pub mod document;
pub mod response;

pub use document::{Document, Paper};
pub use response::{Answer, RetrievalHit};
