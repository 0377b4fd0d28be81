//! Shared types and traits for the agent tool system.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::boards::{Boards, Messenger, PortError};
use crate::core::tool::ToolDescriptor;

/// Ambient context for a tool invocation: the acting identity and the
/// collaborator ports the tool may call.
#[derive(Clone)]
pub struct ToolContext {
    pub actor_id: String,
    pub workspace_id: String,
    pub boards: Arc<dyn Boards>,
    pub messenger: Arc<dyn Messenger>,
}

/// Errors that can occur during tool execution. Never fatal to a run; the
/// loop captures them as error tool results.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("execution failed: {0}")]
    Execution(String),
}

impl From<PortError> for ToolError {
    fn from(e: PortError) -> Self {
        ToolError::Execution(e.to_string())
    }
}

/// Trait for implementing tools. One tool maps to one collaborator call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Descriptor including name, description, and JSON schema for inputs.
    fn descriptor(&self) -> ToolDescriptor;

    /// Invoke with the given context and JSON arguments. Output is an opaque
    /// JSON value recorded verbatim in run logs.
    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError>;
}

/// Pull a required string argument out of a tool input object.
pub(crate) fn required_str<'a>(
    input: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, ToolError> {
    input
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidInput(format!("missing required argument: {key}")))
}
