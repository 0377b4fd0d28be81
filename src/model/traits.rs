//! Traits for model clients.

use async_trait::async_trait;

use crate::model::types::{ModelError, StreamChatRequest, StreamDelta, StreamOutcome};

/// Streaming delta callback. Text deltas arrive here before `stream_chat`
/// returns its terminal outcome; a callback error aborts the stream.
pub type DeltaHandler<'a> = &'a mut (dyn FnMut(StreamDelta) -> Result<(), String> + Send);

/// Core trait for chat model clients.
/// Implemented once per vendor; the agent loop and one-shot callers only see
/// this contract, never a wire format.
#[async_trait]
pub trait ChatModelClient: Send + Sync {
    fn model_id(&self) -> String;

    /// Stream one assistant turn. Deltas are delivered through `on_delta`
    /// while the transport is open; the returned outcome (final tool-call
    /// list plus stop reason) resolves only after the stream completes.
    async fn stream_chat(
        &self,
        req: &StreamChatRequest,
        on_delta: DeltaHandler<'_>,
    ) -> Result<StreamOutcome, ModelError>;

    /// One-shot, non-streaming generation.
    async fn complete(&self, system: &str, user: &str, max_tokens: u32)
        -> Result<String, ModelError>;
}
