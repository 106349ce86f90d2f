//! Test doubles for tools: a recording stub tool and a fixed tool source.

use async_trait::async_trait;
use ragline_core::error::{ToolDiscoveryError, ToolInvocationError};
use ragline_core::tool::{Tool, ToolOutput, ToolSource};
use std::sync::{Arc, Mutex};

/// A tool that records every argument value it receives and returns a
/// fixed reply (or a fixed failure).
pub struct StubTool {
    name: String,
    reply: Result<String, String>,
    calls: Mutex<Vec<serde_json::Value>>,
}

impl StubTool {
    pub fn new(name: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: Ok(reply.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A tool whose every call fails with `reason`.
    pub fn failing(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: Err(reason.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Arguments of every call so far, in order.
    pub fn calls(&self) -> Vec<serde_json::Value> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Stub tool for tests"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolInvocationError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(arguments);
        }
        match &self.reply {
            Ok(text) => Ok(ToolOutput::text(text.clone())),
            Err(reason) => Err(ToolInvocationError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// A source that always lists the same tools.
pub struct StaticSource {
    name: String,
    tools: Vec<Arc<dyn Tool>>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            name: name.into(),
            tools,
        }
    }
}

#[async_trait]
impl ToolSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<Arc<dyn Tool>>, ToolDiscoveryError> {
        Ok(self.tools.clone())
    }
}
