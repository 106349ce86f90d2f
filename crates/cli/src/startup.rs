//! Everything that happens before the first prompt.
//!
//! Any failure here is fatal: the process exits non-zero before the loop.

use ragline_agent::{Agent, AgentSettings, Session};
use ragline_config::AppConfig;
use ragline_core::embedding::Embedder;
use ragline_core::error::{Error, ProviderError, Result};
use ragline_core::tool::ToolRegistry;
use ragline_ingest::SplitterConfig;
use ragline_memory::{ConversationMemory, EmbeddingIndex, HashEmbedder};
use ragline_providers::{ProviderEmbedder, build_from_config};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Load and validate the configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load(explicit).map_err(|e| Error::Config {
        message: e.to_string(),
    })
}

/// Pick the embedder named by `[embedding]`.
fn build_embedder(
    config: &AppConfig,
    router: &ragline_providers::ProviderRouter,
) -> Result<Arc<dyn Embedder>> {
    if config.embedding.provider == "hash" {
        return Ok(Arc::new(HashEmbedder::new(config.embedding.dimensions)));
    }

    let provider = router.get(&config.embedding.provider).ok_or_else(|| {
        ProviderError::NotConfigured(format!(
            "embedding provider '{}'",
            config.embedding.provider
        ))
    })?;
    Ok(Arc::new(
        ProviderEmbedder::new(provider, &config.embedding.model)
            .with_timeout(Duration::from_secs(config.agent.timeout_secs)),
    ))
}

/// Ingest, index, discover tools and wire up a session.
pub async fn build_session(config: &AppConfig) -> Result<Session> {
    if !config.has_api_key() && config.default_provider != "ollama" {
        warn!(
            provider = %config.default_provider,
            "No API key configured; set RAGLINE_API_KEY or api_key in the config file"
        );
    }

    let router = build_from_config(config);
    let provider = router
        .default_provider()
        .ok_or_else(|| ProviderError::NotConfigured(config.default_provider.clone()))?;

    let segments = ragline_ingest::ingest_path(
        &config.document.path,
        &SplitterConfig::from(&config.document),
    )?;
    let segment_count = segments.len();

    let embedder = build_embedder(config, &router)?;
    let index = EmbeddingIndex::new(embedder).with_min_score(config.retrieval.min_score);
    let report = index.add(segments).await?;

    let sources = ragline_tools::sources_from_config(config);
    let discovery = ragline_tools::discover(
        &sources,
        Duration::from_secs(config.agent.timeout_secs),
    )
    .await;
    let tools: ToolRegistry = discovery.registry;

    eprintln!("  Document:  {}", config.document.path.display());
    eprintln!("  Segments:  {segment_count} ({} indexed)", report.added);
    eprintln!("  Provider:  {} ({})", config.default_provider, config.chat_model());
    if tools.is_empty() {
        eprintln!("  Tools:     none");
    } else {
        eprintln!("  Tools:     {}", tools.names().join(", "));
    }
    for failure in &discovery.failures {
        eprintln!("  Skipped:   {failure}");
    }

    info!(
        segments = segment_count,
        tools = tools.len(),
        "Startup complete"
    );

    let agent = Agent::new(
        provider,
        Arc::new(index),
        Arc::new(tools),
        AgentSettings::from_config(config),
    );
    let memory = ConversationMemory::new(config.memory.max_messages)
        .with_max_tokens(config.memory.max_tokens);

    Ok(Session::new(Arc::new(agent), memory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragline_core::error::IngestError;
    use std::io::Write;

    fn hash_config(document: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.default_provider = "ollama".into();
        config.embedding.provider = "hash".into();
        config.document.path = document.to_path_buf();
        config
    }

    #[tokio::test]
    async fn builds_a_session_offline() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Vitamin D is made in the skin.\x0CButter carries vitamin K2.").unwrap();

        let session = build_session(&hash_config(file.path())).await.unwrap();
        assert!(session.memory().is_empty());
    }

    #[tokio::test]
    async fn missing_document_is_fatal() {
        let config = hash_config(std::path::Path::new("/nonexistent/book.pdf"));
        let err = build_session(&config).await.err().unwrap();
        assert!(matches!(err, Error::Ingest(IngestError::Read { .. })));
    }

    #[test]
    fn unregistered_embedding_provider_is_fatal() {
        let mut config = AppConfig::default();
        config.embedding.provider = "nowhere".into();
        let router = ragline_providers::ProviderRouter::new("openai");

        let err = build_embedder(&config, &router).err().unwrap();
        assert!(matches!(err, Error::Provider(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn invalid_config_file_is_a_config_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "[retrieval]\ntop_k = 0\n").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config { ref message } if message.contains("top_k")));
    }
}
