//! Reactive runtime: trigger listeners, the automation pipeline, and the
//! agent run loop.
//!
//! # Module Structure
//!
//! - `trigger_registry`: per-entity listener lifecycle (one per domain)
//! - `conditions`: pure condition evaluation for automations
//! - `actions`: sequential fail-fast action execution
//! - `automations`: automation trigger handling and execution logging
//! - `agent_loop`: the bounded agentic tool-calling loop
//! - `agents`: agent trigger handling and run entry points

pub mod actions;
pub mod agent_loop;
pub mod agents;
pub mod automations;
pub mod conditions;
pub mod trigger_registry;

pub use actions::{ActionExecutor, ActionOutcome, ExecutionOutcome, TriggerData};
pub use agent_loop::{AgentRunner, ToolCallRecord};
pub use agents::AgentRuntime;
pub use automations::AutomationRuntime;
pub use conditions::evaluate_conditions;
pub use trigger_registry::TriggerRegistry;
