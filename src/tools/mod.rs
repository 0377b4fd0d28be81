//! Tools agents can call against the board collaborators.
//!
//! # Tool Lifecycle
//!
//! 1. The run loop receives a tool-call request from the model
//! 2. Guardrails evaluate budget and board scope
//! 3. The registry invokes the named tool against the collaborator ports
//! 4. The result (or captured error) is fed back as a tool result

pub use registry::ToolRegistry;
pub use types::{Tool, ToolContext, ToolError};

mod board;
mod registry;
mod types;
