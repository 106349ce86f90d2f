//! Embedder trait: text in, fixed-dimensionality vectors out.
//!
//! The embedding index depends only on this trait. Backends: a remote
//! provider's embeddings endpoint, or the local feature-hashing embedder.

use async_trait::async_trait;
use crate::error::EmbeddingError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Embed a batch of texts. Returns exactly one vector per input, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        match vectors.len() {
            1 => Ok(vectors.remove(0)),
            got => Err(EmbeddingError::CountMismatch { expected: 1, got }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    #[async_trait]
    impl Embedder for Broken {
        fn name(&self) -> &str { "broken" }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn embed_one_rejects_wrong_count() {
        let err = Broken.embed_one("hello").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::CountMismatch { expected: 1, got: 0 }));
    }
}
