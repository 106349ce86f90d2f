//! The Ragline agent.
//!
//! One round per user line:
//!
//! 1. **Retrieve** the closest document segments, once
//! 2. **Assemble** system prompt + memory window + context-augmented user message
//! 3. **Call the model**; if it asks for tools, run them, append results, call again
//! 4. **Answer** once the model replies in text, or give up after `max_tool_hops`
//!
//! [`run_repl`] drives a [`Session`] from any line source.

pub mod agent;
pub mod repl;
pub mod request;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use agent::{Agent, AgentPhase, AgentSettings, Session, ToolCallRecord, TurnReport};
pub use repl::run_repl;
pub use request::ChatRequest;
