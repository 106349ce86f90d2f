//! Model provider implementations for Ragline.
//!
//! All providers implement the `ragline_core::Provider` trait.
//! The router builds the configured providers from `AppConfig`.

pub mod embedder;
pub mod openai_compat;
pub mod router;

pub use embedder::ProviderEmbedder;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config, default_base_url};
