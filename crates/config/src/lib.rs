//! Configuration loading, validation, and management for Ragline.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides. Every field has a default, so a missing file is not an error.
//! Validates all settings at startup.
//!
//! Lookup order for the file: explicit path (`--config`), `RAGLINE_CONFIG`,
//! `./ragline.toml`, `~/.ragline/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Chat model provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Chat model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Source document and splitting
    #[serde(default)]
    pub document: DocumentConfig,

    /// Retrieval (RAG) settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Embedding backend
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Conversation memory window
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Agent behaviour
    #[serde(default)]
    pub agent: AgentConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// External tool servers (MCP)
    #[serde(default)]
    pub mcp_servers: HashMap<String, McpServerConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_true() -> bool {
    true
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("document", &self.document)
            .field("retrieval", &self.retrieval)
            .field("embedding", &self.embedding)
            .field("memory", &self.memory)
            .field("agent", &self.agent)
            .field("providers", &self.providers)
            .field("mcp_servers", &self.mcp_servers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Path to the PDF (or .txt/.md) to ingest at startup
    #[serde(default = "default_document_path")]
    pub path: PathBuf,

    /// Maximum segment size in tokens (4 chars ≈ 1 token)
    #[serde(default = "default_chunk_size_tokens")]
    pub chunk_size_tokens: usize,

    /// Don't cut at a sentence boundary before this many characters
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,

    /// Segments shorter than this (after trimming) are dropped
    #[serde(default = "default_min_segment_chars")]
    pub min_segment_chars: usize,

    /// Hard cap on segments per document
    #[serde(default = "default_max_segments")]
    pub max_segments: usize,
}

fn default_document_path() -> PathBuf {
    PathBuf::from("Deep Nutrition.pdf")
}
fn default_chunk_size_tokens() -> usize {
    800
}
fn default_min_chunk_chars() -> usize {
    350
}
fn default_min_segment_chars() -> usize {
    5
}
fn default_max_segments() -> usize {
    10_000
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: default_document_path(),
            chunk_size_tokens: default_chunk_size_tokens(),
            min_chunk_chars: default_min_chunk_chars(),
            min_segment_chars: default_min_segment_chars(),
            max_segments: default_max_segments(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Segments retrieved per user turn
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity (0.0 keeps everything)
    #[serde(default)]
    pub min_score: f32,
}

fn default_top_k() -> usize {
    4
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name from `[providers]`, or "hash" for the local embedder
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Embedding model name (remote providers)
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector size for the local hash embedder
    #[serde(default = "default_hash_dimensions")]
    pub dimensions: usize,
}

fn default_embedding_provider() -> String {
    "openai".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_hash_dimensions() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: default_hash_dimensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum turns kept in the conversation window
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Optional token budget for the window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

fn default_max_messages() -> usize {
    20
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// System prompt sent first in every request
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// One-line banner printed at startup
    #[serde(default = "default_banner")]
    pub banner: String,

    /// Maximum tool-call hops per user turn
    #[serde(default = "default_max_tool_hops")]
    pub max_tool_hops: u32,

    /// Timeout for each model, embedding and tool call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_system_prompt() -> String {
    "You are a helpful and knowledgeable nutrition assistant with deep expertise in the book \
     *Deep Nutrition* by Dr. Cate Shanahan. Base your answers primarily on this book, and when \
     you give advice or information, refer clearly to the relevant concepts or ideas from it. \
     You also have access to external tools and may invoke any of them when needed to answer \
     the user's questions. Always respond in a clear, friendly, and informative way."
        .into()
}
fn default_banner() -> String {
    "I am your assistant who is expert in nutrition.".into()
}
fn default_max_tool_hops() -> u32 {
    8
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            banner: default_banner(),
            max_tool_hops: default_max_tool_hops(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// How to reach an MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpTransport {
    /// Spawn a local process and speak over its stdin/stdout
    #[default]
    Stdio,
    /// Streamable HTTP
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    #[serde(default)]
    pub transport: McpTransport,

    /// Command to spawn (stdio)
    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Server URL (http)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl AppConfig {
    /// Load configuration, resolving the file path and applying
    /// environment overrides.
    ///
    /// Environment variables:
    /// - `RAGLINE_API_KEY`, then `OPENAI_API_KEY`, then `OPENROUTER_API_KEY`
    /// - `RAGLINE_PROVIDER`, `RAGLINE_MODEL`, `RAGLINE_DOCUMENT`
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env = |key: &str| std::env::var(key).ok();
        let path = Self::resolve_path(explicit, env);
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(env);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Pick the config file to read.
    pub fn resolve_path(explicit: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Some(path) = env("RAGLINE_CONFIG") {
            return PathBuf::from(path);
        }
        let local = PathBuf::from("ragline.toml");
        if local.exists() {
            return local;
        }
        Self::config_dir().join("config.toml")
    }

    /// Apply environment overrides. `env` is a lookup so tests needn't touch
    /// the process environment.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = env("RAGLINE_API_KEY")
                .or_else(|| env("OPENAI_API_KEY"))
                .or_else(|| env("OPENROUTER_API_KEY"));
        }
        if let Some(provider) = env("RAGLINE_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = env("RAGLINE_MODEL") {
            if let Some(provider) = self.providers.get_mut(&self.default_provider) {
                provider.default_model = None;
            }
            self.default_model = model;
        }
        if let Some(document) = env("RAGLINE_DOCUMENT") {
            self.document.path = PathBuf::from(document);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ragline")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError("retrieval.top_k must be >= 1".into()));
        }
        if self.memory.max_messages == 0 {
            return Err(ConfigError::ValidationError("memory.max_messages must be >= 1".into()));
        }
        if self.agent.max_tool_hops == 0 {
            return Err(ConfigError::ValidationError("agent.max_tool_hops must be >= 1".into()));
        }
        if self.agent.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("agent.timeout_secs must be >= 1".into()));
        }
        if self.document.chunk_size_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "document.chunk_size_tokens must be >= 1".into(),
            ));
        }
        if self.document.max_segments == 0 {
            return Err(ConfigError::ValidationError(
                "document.max_segments must be >= 1".into(),
            ));
        }
        if self.embedding.provider == "hash" && self.embedding.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimensions must be >= 1 for the hash embedder".into(),
            ));
        }

        for (name, server) in &self.mcp_servers {
            match server.transport {
                McpTransport::Stdio if server.command.trim().is_empty() => {
                    return Err(ConfigError::ValidationError(format!(
                        "mcp_servers.{name}: stdio transport requires 'command'"
                    )));
                }
                McpTransport::Http
                    if server.url.as_deref().is_none_or(|u| u.trim().is_empty()) =>
                {
                    return Err(ConfigError::ValidationError(format!(
                        "mcp_servers.{name}: http transport requires 'url'"
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// The chat model to request: the default provider's own
    /// `default_model` if its section sets one, else the top-level model.
    pub fn chat_model(&self) -> &str {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.as_deref())
            .unwrap_or(&self.default_model)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            document: DocumentConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            memory: MemoryConfig::default(),
            agent: AgentConfig::default(),
            providers: HashMap::new(),
            mcp_servers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
