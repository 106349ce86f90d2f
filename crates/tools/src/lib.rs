//! External tools for Ragline.
//!
//! Tools come from MCP servers listed in the config. They are discovered
//! once at startup into a [`ToolRegistry`](ragline_core::tool::ToolRegistry)
//! that stays fixed for the session.

pub mod discovery;
pub mod mcp;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use discovery::{DiscoveryOutcome, discover, sources_from_config};
pub use mcp::{McpServerSource, McpTool, flatten_content};
