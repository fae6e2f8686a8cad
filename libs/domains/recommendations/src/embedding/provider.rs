use async_trait::async_trait;

use crate::error::RecommendationResult;

/// Trait for embedding generation providers
///
/// Implementations turn item text into a fixed-dimension vector. Every call
/// against the same provider and model must return the same dimension.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Name of the model producing the vectors, for logging
    fn model_name(&self) -> &str;

    /// Generate the embedding for a single text
    async fn embed(&self, text: &str) -> RecommendationResult<Vec<f32>>;
}
