//! The agent round: retrieve, assemble, call the model, run tools, repeat.

use crate::request::ChatRequest;
use ragline_config::AppConfig;
use ragline_core::document::ScoredSegment;
use ragline_core::error::{AgentError, EmbeddingError, ProviderError};
use ragline_core::message::{Message, MessageToolCall};
use ragline_core::provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
use ragline_core::tool::{ToolCall, ToolRegistry};
use ragline_memory::{ConversationMemory, EmbeddingIndex};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-round knobs, usually taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub system_prompt: String,
    pub top_k: usize,
    pub max_tool_hops: u32,
    /// Applied to each model call and to the retrieval lookup.
    pub timeout: Duration,
}

impl AgentSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.chat_model().to_string(),
            temperature: config.default_temperature,
            max_tokens: Some(config.default_max_tokens),
            system_prompt: config.agent.system_prompt.clone(),
            top_k: config.retrieval.top_k,
            max_tool_hops: config.agent.max_tool_hops,
            timeout: Duration::from_secs(config.agent.timeout_secs),
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Where a round currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    Idle,
    AwaitingModelResponse,
    AwaitingToolResult,
    Done,
}

/// One tool invocation made during a round.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
    /// Tool output, or `Error: ...` if the call failed.
    pub output: String,
    pub success: bool,
}

/// What a finished round produced, and what it was built from.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub answer: String,
    pub retrieved: Vec<ScoredSegment>,
    pub tool_calls: Vec<ToolCallRecord>,
    /// Model calls that ended in tool requests.
    pub hops: u32,
    /// Set when retrieval failed and the round ran without context.
    pub retrieval_error: Option<EmbeddingError>,
}

/// The shared, read-only half of a session: model, index, tools.
pub struct Agent {
    provider: Arc<dyn Provider>,
    index: Arc<EmbeddingIndex>,
    tools: Arc<ToolRegistry>,
    settings: AgentSettings,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn Provider>,
        index: Arc<EmbeddingIndex>,
        tools: Arc<ToolRegistry>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            provider,
            index,
            tools,
            settings,
        }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Look up context for `text`. Failures are soft.
    async fn retrieve(&self, text: &str) -> (Vec<ScoredSegment>, Option<EmbeddingError>) {
        let lookup = tokio::time::timeout(
            self.settings.timeout,
            self.index.query(text, self.settings.top_k),
        )
        .await
        .unwrap_or(Err(EmbeddingError::Timeout(self.settings.timeout.as_secs())));

        match lookup {
            Ok(segments) => {
                debug!(retrieved = segments.len(), "Retrieved context");
                (segments, None)
            }
            Err(e) => {
                warn!(error = %e, "Retrieval failed, answering without context");
                (Vec::new(), Some(e))
            }
        }
    }

    async fn call_model(
        &self,
        messages: Vec<Message>,
        tools: &[ToolDefinition],
    ) -> Result<ProviderResponse, ProviderError> {
        let request = ProviderRequest {
            model: self.settings.model.clone(),
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            tools: tools.to_vec(),
        };

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending model request"
        );

        tokio::time::timeout(self.settings.timeout, self.provider.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout(self.settings.timeout.as_secs()))?
    }

    /// Run one requested tool call. Never fails: errors become the result
    /// text the model sees.
    async fn run_tool(&self, call: &MessageToolCall) -> ToolCallRecord {
        let arguments = if call.arguments.trim().is_empty() {
            Ok(serde_json::Value::Object(Default::default()))
        } else {
            serde_json::from_str::<serde_json::Value>(&call.arguments)
        };

        let (arguments, result) = match arguments {
            Ok(arguments) => {
                let invocation = ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments,
                };
                let result = self.tools.invoke(&invocation).await;
                (invocation.arguments, result.map_err(|e| e.to_string()))
            }
            Err(e) => (
                serde_json::Value::String(call.arguments.clone()),
                Err(format!("Invalid tool arguments: {e}")),
            ),
        };

        match result {
            Ok(output) => {
                debug!(tool = %call.name, "Tool call succeeded");
                ToolCallRecord {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments,
                    output: output.content,
                    success: true,
                }
            }
            Err(reason) => {
                warn!(tool = %call.name, error = %reason, "Tool call failed");
                ToolCallRecord {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments,
                    output: format!("Error: {reason}"),
                    success: false,
                }
            }
        }
    }
}

/// One conversation: the agent plus its memory.
pub struct Session {
    agent: Arc<Agent>,
    memory: ConversationMemory,
    phase: AgentPhase,
}

impl Session {
    pub fn new(agent: Arc<Agent>, memory: ConversationMemory) -> Self {
        Self {
            agent,
            memory,
            phase: AgentPhase::Idle,
        }
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    fn enter(&mut self, phase: AgentPhase) {
        debug!(from = ?self.phase, to = ?phase, "Agent phase");
        self.phase = phase;
    }

    /// Answer one user line.
    ///
    /// Retrieval happens once per round. Tool calls loop back to the model
    /// until it answers in text or `max_tool_hops` is spent.
    pub async fn run_turn(&mut self, user_text: &str) -> Result<TurnReport, AgentError> {
        let agent = Arc::clone(&self.agent);
        let (retrieved, retrieval_error) = agent.retrieve(user_text).await;

        let request = ChatRequest {
            system_prompt: agent.settings.system_prompt.clone(),
            history: self.memory.window(),
            user_text: user_text.to_string(),
            retrieved,
            tools: agent.tools.definitions(),
        };
        let mut messages = request.to_messages();
        self.memory.append(Message::user(user_text));

        let mut tool_calls = Vec::new();
        let mut hops = 0u32;

        let outcome = loop {
            self.enter(AgentPhase::AwaitingModelResponse);
            let response = match agent.call_model(messages.clone(), &request.tools).await {
                Ok(response) => response,
                Err(e) => break Err(AgentError::Provider(e)),
            };

            if !response.message.requests_tools() {
                let answer = response.message.content.clone();
                self.memory.append(response.message);
                break Ok(answer);
            }

            if hops >= agent.settings.max_tool_hops {
                warn!(hops, "Tool call limit reached, ending round");
                break Err(AgentError::ToolLoopExceeded { hops });
            }
            hops += 1;

            self.enter(AgentPhase::AwaitingToolResult);
            let call_turn = response.message;
            messages.push(call_turn.clone());
            self.memory.append(call_turn.clone());

            for call in &call_turn.tool_calls {
                let record = agent.run_tool(call).await;
                let result_turn = Message::tool_result(&record.id, &record.output);
                messages.push(result_turn.clone());
                self.memory.append(result_turn);
                tool_calls.push(record);
            }
        };

        self.enter(AgentPhase::Done);
        self.enter(AgentPhase::Idle);
        let answer = outcome?;
        info!(
            retrieved = request.retrieved.len(),
            tool_calls = tool_calls.len(),
            hops,
            "Round complete"
        );

        Ok(TurnReport {
            answer,
            retrieved: request.retrieved,
            tool_calls,
            hops,
            retrieval_error,
        })
    }
}
