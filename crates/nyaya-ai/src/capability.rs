//! The language-capability seam: embeddings and constrained completion.
//!
//! Everything probabilistic sits behind this trait. The pipeline holds one
//! shared implementation and treats every error as a degradation signal,
//! never as something to surface to a caller.

use std::time::Duration;

use async_trait::async_trait;
use nyaya_core::Language;
use thiserror::Error;

/// Why a capability call produced nothing usable.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("capability timed out after {0:?}")]
    Timeout(Duration),

    #[error("capability rate limited")]
    RateLimited,

    #[error("capability unavailable: {0}")]
    Unavailable(String),
}

/// One completion request. `facts` is the only content the model may draw
/// on; `instructions` tell it how to phrase, not what to say.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub instructions: String,
    pub facts: String,
    pub language: Language,
    pub max_tokens: u32,
    /// Sampling temperature; the pipeline always sends zero.
    pub temperature: f32,
}

/// Embeddings plus constrained text completion.
///
/// Implementations are shared across concurrent requests, so they take
/// `&self` and must be `Send + Sync`.
#[async_trait]
pub trait LanguageCapability: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Embedding dimensionality. Constant for the lifetime of the value.
    fn dim(&self) -> usize;

    /// Embed one text into a unit-length vector of [`dim`](Self::dim) lanes.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError>;

    /// Embed a batch, one vector per input, order preserved.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CapabilityError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Produce narrative text from the given facts only.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CapabilityError>;
}
