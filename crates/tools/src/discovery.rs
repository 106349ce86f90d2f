//! One-shot tool discovery at startup.

use crate::mcp::McpServerSource;
use ragline_config::AppConfig;
use ragline_core::error::ToolDiscoveryError;
use ragline_core::tool::{ToolRegistry, ToolSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Result of [`discover`]: every tool that could be registered, and the
/// sources that could not be reached.
pub struct DiscoveryOutcome {
    pub registry: ToolRegistry,
    pub failures: Vec<ToolDiscoveryError>,
}

/// List tools from every source, in order.
///
/// A failing source is logged and skipped. On a name clash the tool seen
/// first wins.
pub async fn discover(sources: &[Arc<dyn ToolSource>], timeout: Duration) -> DiscoveryOutcome {
    let mut registry = ToolRegistry::new();
    let mut failures = Vec::new();

    for source in sources {
        let listed = match tokio::time::timeout(timeout, source.list_tools()).await {
            Ok(result) => result,
            Err(_) => Err(ToolDiscoveryError::Timeout {
                source_name: source.name().to_string(),
                timeout_secs: timeout.as_secs(),
            }),
        };

        match listed {
            Ok(tools) => {
                for tool in tools {
                    let name = tool.name().to_string();
                    if !registry.register(tool) {
                        warn!(source = %source.name(), tool = %name, "Duplicate tool name, keeping the first");
                    }
                }
            }
            Err(e) => {
                warn!(source = %source.name(), error = %e, "Tool source unavailable, skipping");
                failures.push(e);
            }
        }
    }

    info!(
        tools = registry.len(),
        failed_sources = failures.len(),
        "Tool discovery complete"
    );
    DiscoveryOutcome { registry, failures }
}

/// Build a source for every enabled `[mcp_servers.<name>]` entry, sorted by
/// name so discovery order is stable.
pub fn sources_from_config(config: &AppConfig) -> Vec<Arc<dyn ToolSource>> {
    let call_timeout = Duration::from_secs(config.agent.timeout_secs);
    let mut servers: Vec<_> = config
        .mcp_servers
        .iter()
        .filter(|(_, server)| server.enabled)
        .collect();
    servers.sort_by(|a, b| a.0.cmp(b.0));

    servers
        .into_iter()
        .map(|(name, server)| {
            Arc::new(McpServerSource::new(name, server.clone(), call_timeout)) as Arc<dyn ToolSource>
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StaticSource, StubTool};
    use async_trait::async_trait;
    use ragline_config::{McpServerConfig, McpTransport};
    use ragline_core::tool::Tool;
    use std::collections::HashMap;

    struct DownSource;

    #[async_trait]
    impl ToolSource for DownSource {
        fn name(&self) -> &str {
            "down"
        }
        async fn list_tools(&self) -> Result<Vec<Arc<dyn Tool>>, ToolDiscoveryError> {
            Err(ToolDiscoveryError::Unreachable {
                source_name: "down".into(),
                reason: "connection refused".into(),
            })
        }
    }

    struct SlowSource;

    #[async_trait]
    impl ToolSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }
        async fn list_tools(&self) -> Result<Vec<Arc<dyn Tool>>, ToolDiscoveryError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    fn source(name: &str, tools: &[&str]) -> Arc<dyn ToolSource> {
        Arc::new(StaticSource::new(
            name,
            tools.iter().map(|t| Arc::new(StubTool::new(*t, "ok")) as Arc<dyn Tool>).collect(),
        ))
    }

    #[tokio::test]
    async fn failing_sources_are_skipped() {
        let sources = vec![
            Arc::new(DownSource) as Arc<dyn ToolSource>,
            source("weather", &["get_weather"]),
        ];
        let outcome = discover(&sources, Duration::from_secs(5)).await;
        assert_eq!(outcome.registry.names(), vec!["get_weather"]);
        assert_eq!(outcome.failures.len(), 1);
    }

    #[tokio::test]
    async fn zero_tools_is_valid() {
        let outcome = discover(&[], Duration::from_secs(5)).await;
        assert!(outcome.registry.is_empty());
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn first_registration_wins_on_duplicates() {
        let sources = vec![
            source("a", &["search", "fetch"]),
            source("b", &["search", "summarise"]),
        ];
        let outcome = discover(&sources, Duration::from_secs(5)).await;
        assert_eq!(outcome.registry.names(), vec!["search", "fetch", "summarise"]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out() {
        let sources = vec![Arc::new(SlowSource) as Arc<dyn ToolSource>, source("ok", &["ping"])];
        let outcome = discover(&sources, Duration::from_secs(10)).await;
        assert_eq!(outcome.registry.len(), 1);
        assert!(matches!(
            outcome.failures[0],
            ToolDiscoveryError::Timeout { timeout_secs: 10, .. }
        ));
    }

    #[test]
    fn sources_skip_disabled_and_sort_by_name() {
        let server = |enabled| McpServerConfig {
            transport: McpTransport::Stdio,
            command: "npx".into(),
            args: vec![],
            env: HashMap::new(),
            url: None,
            enabled,
        };
        let mut config = AppConfig::default();
        config.mcp_servers.insert("zeta".into(), server(true));
        config.mcp_servers.insert("alpha".into(), server(true));
        config.mcp_servers.insert("off".into(), server(false));

        let sources = sources_from_config(&config);
        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
