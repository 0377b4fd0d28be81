//! Neutral chat types shared by all provider adapters.
//!
//! Adapters translate these to and from each vendor's wire format; nothing
//! outside `model/providers/` speaks a vendor protocol.

use serde::{Deserialize, Serialize};

use crate::core::tool::ToolDescriptor;

/// Delta type for streaming callbacks.
#[derive(Debug, Clone)]
pub enum StreamDelta {
    /// Assistant text delta, observable before the terminal stream result.
    Content(String),
}

/// A model-requested invocation of a named tool with structured input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// Result of one tool call, fed back to the model on the next round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultPayload {
    pub call_id: String,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

/// One turn of the vendor-neutral transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatMessage {
    User {
        text: String,
    },
    Assistant {
        text: String,
        #[serde(default)]
        tool_calls: Vec<ToolCallRequest>,
    },
    #[serde(rename = "tool")]
    ToolResults {
        results: Vec<ToolResultPayload>,
    },
}

/// Why the provider stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The model finished its turn; the only clean termination signal.
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

/// Terminal payload of a streaming chat call, available only once the
/// transport completes.
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    /// Full assistant text for the turn (concatenation of all deltas).
    pub text: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub stop_reason: StopReason,
}

/// Inputs to a streaming chat call. The target model is fixed on the client
/// handed out by the registry.
#[derive(Debug, Clone)]
pub struct StreamChatRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDescriptor>,
    pub max_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("stream failed: {0}")]
    Stream(String),
    #[error("no AI provider configured")]
    NotConfigured,
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("unknown model for provider {provider}: {model}")]
    UnknownModel { provider: String, model: String },
}
