//! Adapts a provider's embeddings endpoint to the [`Embedder`] trait.

use async_trait::async_trait;
use ragline_core::embedding::Embedder;
use ragline_core::error::EmbeddingError;
use ragline_core::provider::{EmbeddingRequest, Provider};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Inputs per embeddings request.
const DEFAULT_BATCH_SIZE: usize = 64;

/// Embeds text through a remote [`Provider`].
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
    batch_size: usize,
    timeout: Duration,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let request = EmbeddingRequest {
                model: self.model.clone(),
                inputs: batch.to_vec(),
            };
            debug!(provider = %self.provider.name(), batch = batch.len(), "Embedding batch");

            let response = tokio::time::timeout(self.timeout, self.provider.embed(request))
                .await
                .map_err(|_| EmbeddingError::Timeout(self.timeout.as_secs()))??;

            if response.embeddings.len() != batch.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: batch.len(),
                    got: response.embeddings.len(),
                });
            }
            vectors.extend(response.embeddings);
        }

        Ok(vectors)
    }
}
