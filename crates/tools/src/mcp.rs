//! MCP tool sources.
//!
//! Each configured server is one [`ToolSource`]: listing tools connects to
//! the server (spawning it for stdio) and wraps every advertised tool in an
//! [`McpTool`] that shares the live connection.

use async_trait::async_trait;
use ragline_config::{McpServerConfig, McpTransport};
use ragline_core::error::{ToolDiscoveryError, ToolInvocationError};
use ragline_core::tool::{Tool, ToolOutput, ToolSource};
use rmcp::ServiceExt;
use rmcp::model::{
    CallToolRequestParams, ClientCapabilities, Content, Implementation, InitializeRequestParams,
    RawContent, ResourceContents,
};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::{StreamableHttpClientTransport, TokioChildProcess};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

type McpService = RunningService<RoleClient, InitializeRequestParams>;

/// How this client introduces itself to servers.
fn client_info() -> InitializeRequestParams {
    InitializeRequestParams {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "ragline".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        },
    }
}

/// One MCP server, as configured under `[mcp_servers.<name>]`.
pub struct McpServerSource {
    name: String,
    config: McpServerConfig,
    call_timeout: Duration,
}

impl McpServerSource {
    pub fn new(name: impl Into<String>, config: McpServerConfig, call_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            config,
            call_timeout,
        }
    }

    fn unreachable(&self, reason: impl ToString) -> ToolDiscoveryError {
        ToolDiscoveryError::Unreachable {
            source_name: self.name.clone(),
            reason: reason.to_string(),
        }
    }

    async fn connect(&self) -> Result<McpService, ToolDiscoveryError> {
        match self.config.transport {
            McpTransport::Stdio => {
                let mut cmd = tokio::process::Command::new(&self.config.command);
                cmd.args(&self.config.args);
                if !self.config.env.is_empty() {
                    cmd.envs(&self.config.env);
                }
                let transport = TokioChildProcess::new(cmd).map_err(|e| {
                    self.unreachable(format!("failed to spawn '{}': {e}", self.config.command))
                })?;
                client_info()
                    .serve(transport)
                    .await
                    .map_err(|e| self.unreachable(e))
            }
            McpTransport::Http => {
                let url = self
                    .config
                    .url
                    .as_deref()
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| self.unreachable("no url configured"))?;
                let transport = StreamableHttpClientTransport::from_uri(url);
                client_info()
                    .serve(transport)
                    .await
                    .map_err(|e| self.unreachable(e))
            }
        }
    }
}

#[async_trait]
impl ToolSource for McpServerSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<Arc<dyn Tool>>, ToolDiscoveryError> {
        let service = Arc::new(self.connect().await?);

        let listed = service
            .list_tools(Default::default())
            .await
            .map_err(|e| ToolDiscoveryError::ListFailed {
                source_name: self.name.clone(),
                reason: e.to_string(),
            })?
            .tools;

        info!(source = %self.name, tools = listed.len(), "Connected to MCP server");

        Ok(listed
            .into_iter()
            .map(|definition| {
                Arc::new(McpTool {
                    definition,
                    service: Arc::clone(&service),
                    timeout: self.call_timeout,
                }) as Arc<dyn Tool>
            })
            .collect())
    }
}

/// A tool advertised by an MCP server.
pub struct McpTool {
    definition: rmcp::model::Tool,
    service: Arc<McpService>,
    timeout: Duration,
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn description(&self) -> &str {
        self.definition.description.as_deref().unwrap_or("")
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::Value::Object((*self.definition.input_schema).clone())
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolInvocationError> {
        let tool_name = self.definition.name.to_string();
        let params = CallToolRequestParams {
            meta: None,
            name: self.definition.name.clone(),
            arguments: to_arguments(arguments)?,
            task: None,
        };

        debug!(tool = %tool_name, "Calling MCP tool");

        let result = tokio::time::timeout(self.timeout, self.service.call_tool(params))
            .await
            .map_err(|_| ToolInvocationError::Timeout {
                tool_name: tool_name.clone(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ToolInvocationError::ExecutionFailed {
                tool_name: tool_name.clone(),
                reason: e.to_string(),
            })?;

        let text = flatten_content(result.content);

        if result.is_error == Some(true) {
            return Err(ToolInvocationError::ExecutionFailed {
                tool_name,
                reason: if text.is_empty() { "no message returned".into() } else { text },
            });
        }

        Ok(ToolOutput::text(text))
    }
}

/// MCP takes arguments as a JSON object; `null` means none.
fn to_arguments(
    arguments: serde_json::Value,
) -> Result<Option<serde_json::Map<String, serde_json::Value>>, ToolInvocationError> {
    match arguments {
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::Null => Ok(None),
        other => Err(ToolInvocationError::InvalidArguments(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Flatten tool result content to text for the model.
pub fn flatten_content(content: Vec<Content>) -> String {
    content
        .into_iter()
        .map(|c| match c.raw {
            RawContent::Text(raw) => raw.text,
            RawContent::Image(raw) => format!("data:{};base64,{}", raw.mime_type, raw.data),
            RawContent::Resource(raw) => match raw.resource {
                ResourceContents::TextResourceContents { uri, text, .. } => {
                    format!("{uri}:\n{text}")
                }
                ResourceContents::BlobResourceContents {
                    uri, mime_type, blob, ..
                } => format!(
                    "{uri}: data:{};base64,{blob}",
                    mime_type.unwrap_or_else(|| "application/octet-stream".into())
                ),
            },
            RawContent::Audio(_) => "[audio content not supported]".to_string(),
            RawContent::ResourceLink(link) => format!("[resource: {}]", link.uri),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
