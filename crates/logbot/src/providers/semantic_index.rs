//! Semantic index trait for tagged text units

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{SemanticMatch, SemanticUnit};

/// Vector-similarity store of (text, metadata) units
///
/// Implementations:
/// - `LocalSemanticIndex`: in-process brute-force cosine search
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Write a batch of units; a failed batch stores nothing
    async fn add_batch(&self, units: &[SemanticUnit]) -> Result<usize>;

    /// Nearest units to a query embedding, at most `top_k`
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SemanticMatch>>;

    /// Number of stored units
    async fn len(&self) -> Result<usize>;

    /// Check if index is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get index name for logging
    fn name(&self) -> &str;
}
