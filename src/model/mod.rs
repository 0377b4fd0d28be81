//! Provider-agnostic chat model layer.
//!
//! ## Structure
//!
//! - `types`: neutral message/tool schema and stream contract
//! - `traits`: the `ChatModelClient` trait all vendors implement
//! - `provider`: provider ID enum and parsing
//! - `catalog`: model metadata and defaults
//! - `registry`: configuration-driven client resolution
//! - `providers/`: vendor wire-protocol implementations

pub mod catalog;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod traits;
pub mod types;

pub use catalog::ModelCatalog;
pub use provider::ProviderId;
pub use registry::ProviderRegistry;
pub use traits::{ChatModelClient, DeltaHandler};
pub use types::{
    ChatMessage, ModelError, StopReason, StreamChatRequest, StreamDelta, StreamOutcome,
    ToolCallRequest, ToolResultPayload,
};
