//! Local feature-hashing embedder.
//!
//! Deterministic and offline: each lowercase word is hashed into one of
//! `dimensions` buckets with a hash-derived sign, and the result is scaled
//! to unit length. Good enough for keyword-level similarity and tests.

use crate::vector::l2_normalize;
use async_trait::async_trait;
use ragline_core::embedding::Embedder;
use ragline_core::error::EmbeddingError;
use sha2::{Digest, Sha256};

pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed one text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let digest = Sha256::digest(word.to_lowercase().as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let index = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        l2_normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::cosine_similarity;

    #[test]
    fn deterministic_and_case_insensitive() {
        let e = HashEmbedder::new(128);
        assert_eq!(e.embed_text("Vitamin D"), e.embed_text("vitamin d"));
        assert_eq!(e.embed_text("Vitamin D").len(), 128);
    }

    #[test]
    fn unit_length_or_zero() {
        let e = HashEmbedder::new(64);
        let v = e.embed_text("bone broth and collagen");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);

        let empty = e.embed_text("   ...  ");
        assert!(empty.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn shared_words_score_higher() {
        let e = HashEmbedder::new(512);
        let query = e.embed_text("vitamin D sunlight");
        let close = e.embed_text("Sunlight lets skin make vitamin D");
        let far = e.embed_text("Fermented cabbage feeds gut bacteria");
        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[tokio::test]
    async fn batch_embed_keeps_order() {
        let e = HashEmbedder::new(32);
        let texts = vec!["one".to_string(), "two".to_string()];
        let vectors = e.embed(&texts).await.unwrap();
        assert_eq!(vectors[0], e.embed_text("one"));
        assert_eq!(vectors[1], e.embed_text("two"));
    }
}
