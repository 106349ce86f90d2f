//! # Ragline Core
//!
//! Domain types, traits, and error definitions for the Ragline document
//! chatbot. This crate has **no I/O of its own**; it defines the model
//! that the ingest, memory, provider, tool and agent crates implement against.
//!
//! ## Seams
//!
//! Every external collaborator is a trait here:
//! - [`Provider`] — chat completion (and optionally embeddings) backend
//! - [`Embedder`] — text → vector, used by the embedding index
//! - [`Tool`] / [`ToolSource`] — externally discovered callable operations
//!
//! Concrete implementations live in their own crates, so tests can swap in
//! scripted stubs for all of them.

pub mod document;
pub mod embedding;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use document::{Document, Page, ScoredSegment, Segment};
pub use embedding::Embedder;
pub use error::{Error, Result};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use tool::{Tool, ToolCall, ToolOutput, ToolRegistry, ToolSource};
