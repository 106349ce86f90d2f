//! Error types for the Ragline domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum. [`Error`] gathers the ones
//! that can abort startup.
//!
//! Startup errors (config, ingest, index build) are fatal. Per-turn errors
//! (embedding lookup, tool invocation, tool loop, provider) are isolated to
//! the turn that raised them.

use thiserror::Error;

/// A failure that stops the session before the first prompt.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Model provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Embedding / index errors ---
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    // --- Document ingestion errors ---
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the chat model.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures producing or comparing embeddings.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Embedding provider unavailable: {0}")]
    Unavailable(String),

    #[error("Embedding provider returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    #[error("Embedding dimension mismatch: index holds {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Embedding request timed out after {0}s")]
    Timeout(u64),
}

impl From<ProviderError> for EmbeddingError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Timeout(secs) => Self::Timeout(secs),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Failures loading or splitting the source document.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read document {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse document {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Document {0} contains no text")]
    Empty(String),
}

/// Failure reaching an external tool source at startup.
#[derive(Debug, Clone, Error)]
pub enum ToolDiscoveryError {
    #[error("Tool source '{source_name}' unreachable: {reason}")]
    Unreachable { source_name: String, reason: String },

    #[error("Tool source '{source_name}' failed to list tools: {reason}")]
    ListFailed { source_name: String, reason: String },

    #[error("Tool source '{source_name}' timed out after {timeout_secs}s")]
    Timeout { source_name: String, timeout_secs: u64 },
}

/// Failure invoking a single tool call.
#[derive(Debug, Clone, Error)]
pub enum ToolInvocationError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Failures that end an agent round.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Tool call limit exceeded after {hops} hops")]
    ToolLoopExceeded { hops: u32 },

    #[error("Model request failed: {0}")]
    Provider(#[from] ProviderError),
}
