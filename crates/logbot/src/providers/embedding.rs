//! Embedding model seam used by the semantic index

use async_trait::async_trait;
use crate::error::Result;

/// Turns unit text into vectors for the semantic index
///
/// `LocalSemanticIndex` embeds a whole batch before storing any of it, so
/// an `Err` from here rejects the batch.
///
/// Implementations:
/// - `OllamaEmbedder`: local Ollama server (nomic-embed-text)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one unit's text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch, one vector per text in input order
    ///
    /// Defaults to sequential `embed` calls and stops at the first failure.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Vector length every call must return
    fn dimensions(&self) -> usize;

    /// Provider name for logging
    fn name(&self) -> &str;
}
