//! Provider abstractions for the two sinks and the embedding model
//!
//! The ingestion pipeline only sees these traits, so the structured store,
//! the semantic index and the embedder can be swapped independently.

pub mod embedding;
pub mod local;
pub mod ollama;
pub mod record_store;
pub mod semantic_index;

pub use embedding::EmbeddingProvider;
pub use record_store::RecordStore;
pub use semantic_index::SemanticIndex;
