//! Provider-specific client implementations.
//!
//! Adding a vendor means adding an implementation of `ChatModelClient` here
//! and a construction arm in the registry - never a branch in the agent loop.

pub mod anthropic;
pub mod openai_compat;
