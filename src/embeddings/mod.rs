//! Embeddings module - obtain semantic embeddings for text
//!
//! Embedding computation is delegated to an external service. This module
//! defines the trait the sqlite store ranks with and an HTTP client for
//! OpenAI-compatible `/embeddings` endpoints.

mod http;
mod similarity;

pub use http::HttpEmbedder;
pub use similarity::{bytes_to_vec, cosine_similarity, vec_to_bytes};

use crate::error::Result;

/// Trait for embedding providers
///
/// Requires Send + Sync so one provider can be shared by every collection handle.
pub trait EmbeddingEngine: Send + Sync {
    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding for a query text (with model-specific prefix if needed)
    ///
    /// Default implementation calls embed().
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text)
    }

    /// Generate embeddings for multiple passages (batch processing)
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get model name
    fn model_name(&self) -> &str;
}
