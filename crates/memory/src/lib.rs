//! Retrieval and conversation memory for Ragline.
//!
//! - [`EmbeddingIndex`]: segments + vectors, cosine nearest-neighbour lookup
//! - [`ConversationMemory`]: bounded window of recent turns
//! - [`HashEmbedder`]: offline feature-hashing embedder

pub mod hash_embedder;
pub mod index;
pub mod vector;
pub mod window;

pub use hash_embedder::HashEmbedder;
pub use index::{EmbeddingIndex, IndexReport};
pub use vector::{cosine_similarity, l2_normalize, rank_by_similarity};
pub use window::ConversationMemory;
