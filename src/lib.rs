//! Boardflow - reactive automation and AI agent engine for collaborative
//! work boards.
//!
//! The engine turns stored "if this happens, do that" rules and AI agent
//! definitions into side effects:
//! - Collaborators emit [`bus::DomainEvent`]s on committed mutations
//! - The bus fans out to per-entity trigger listeners
//! - Automations run a condition/action pipeline with fail-fast semantics
//! - Agents run a guardrailed tool-calling loop against a streaming chat
//!   provider
//!
//! # Architecture
//!
//! - `bus`: domain events and in-process pub/sub
//! - `domain`: typed automation/agent specs
//! - `db`: SQLite persistence for specs and run records
//! - `model`: provider-agnostic streaming chat (Anthropic, OpenAI-compatible)
//! - `policy`: guardrail evaluation
//! - `runtime`: trigger registries, automation pipeline, agent run loop
//! - `tools`: board CRUD tools exposed to agents
//! - `core`: collaborator ports and shared types
//!
//! Board/item/workspace CRUD, auth, and the API surface live in the host
//! application; the engine reaches them through the `core::boards` ports.

pub mod bus;
pub mod config;
pub mod core;
pub mod db;
pub mod domain;
pub mod model;
pub mod policy;
pub mod runtime;
pub mod tools;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bus::EventBus;
use config::EngineConfig;
use crate::core::boards::{Boards, Messenger};
use db::Database;
use model::ProviderRegistry;
use runtime::{ActionExecutor, AgentRunner, AgentRuntime, AutomationRuntime};
use tools::ToolRegistry;

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    Db(#[from] db::DbError),
    #[error("{0}")]
    Model(#[from] model::ModelError),
    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Engine facade
// ---------------------------------------------------------------------------

/// Wires the bus, persistence, provider registry, and both runtimes together.
/// Hosts construct one per process and call [`Engine::init_listeners`] once
/// at startup.
pub struct Engine {
    pub bus: Arc<EventBus>,
    pub db: Arc<Database>,
    pub providers: Arc<ProviderRegistry>,
    pub automations: Arc<AutomationRuntime>,
    pub agents: Arc<AgentRuntime>,
    started: AtomicBool,
}

impl Engine {
    pub fn new(
        db: Arc<Database>,
        config: &EngineConfig,
        boards: Arc<dyn Boards>,
        messenger: Arc<dyn Messenger>,
    ) -> Arc<Self> {
        let bus = Arc::new(EventBus::new());
        let providers = Arc::new(ProviderRegistry::from_config(config));
        let tools = Arc::new(ToolRegistry::with_builtin());

        let executor = Arc::new(ActionExecutor::new(
            boards.clone(),
            messenger.clone(),
            providers.clone(),
        ));
        let automations = AutomationRuntime::new(db.clone(), bus.clone(), executor);

        let runner = Arc::new(AgentRunner::new(
            db.clone(),
            tools,
            providers.clone(),
            boards,
            messenger,
        ));
        let agents = AgentRuntime::new(db.clone(), bus.clone(), runner);

        Arc::new(Self {
            bus,
            db,
            providers,
            automations,
            agents,
            started: AtomicBool::new(false),
        })
    }

    /// Bulk-register listeners for all active automations and agents.
    /// Idempotent: repeat calls are ignored.
    pub fn init_listeners(&self) -> Result<(), EngineError> {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("init_listeners called more than once, ignoring");
            return Ok(());
        }
        self.automations.init_listeners()?;
        self.agents.init_listeners()?;
        Ok(())
    }
}

/// Install a default tracing subscriber honoring `RUST_LOG`. For hosts and
/// examples; embedding applications usually bring their own.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
