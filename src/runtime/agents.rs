//! Agent trigger handling and run entry points.
//!
//! Event-triggered runs execute inline on the agent's listener (one run per
//! delivered matching event, FIFO per agent). Manual runs return a run id
//! immediately and execute fire-and-forget; status is inspected through the
//! run record.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::bus::{DomainEvent, EventBus, EventFilter, EventHandler};
use crate::db::{queries, Database, DbError};
use crate::domain::AgentSpec;
use crate::runtime::agent_loop::AgentRunner;
use crate::runtime::trigger_registry::TriggerRegistry;
use crate::EngineError;

pub struct AgentRuntime {
    db: Arc<Database>,
    runner: Arc<AgentRunner>,
    listeners: TriggerRegistry,
}

impl AgentRuntime {
    pub fn new(db: Arc<Database>, bus: Arc<EventBus>, runner: Arc<AgentRunner>) -> Arc<Self> {
        Arc::new(Self {
            db,
            runner,
            listeners: TriggerRegistry::new("agents", bus),
        })
    }

    /// (Re-)register the listener for one agent. Agents subscribe only when
    /// active and carrying at least one event-typed trigger.
    pub fn register(self: &Arc<Self>, id: &str) -> Result<bool, DbError> {
        self.listeners.unbind(id);

        let Some(agent) = queries::load_agent(&self.db, id)? else {
            return Ok(false);
        };
        if !agent.status.is_active() || !agent.has_event_trigger() {
            return Ok(false);
        }

        let runtime = Arc::clone(self);
        let agent_id = id.to_string();
        let handler: EventHandler = Arc::new(move |event| {
            let runtime = Arc::clone(&runtime);
            let agent_id = agent_id.clone();
            Box::pin(async move { runtime.handle_event(&agent_id, event).await })
        });

        self.listeners.bind(id, EventFilter::All, handler);
        Ok(true)
    }

    /// Drop the listener for one agent. No-op if absent.
    pub fn unregister(&self, id: &str) -> bool {
        self.listeners.unbind(id)
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.listeners.is_registered(id)
    }

    /// Bulk-register all active agents. Run exactly once at startup.
    pub fn init_listeners(self: &Arc<Self>) -> Result<(), DbError> {
        let ids = queries::list_active_agent_ids(&self.db)?;
        let total = queries::count_agents(&self.db)?;
        let mut registered = 0usize;
        for id in &ids {
            match self.register(id) {
                Ok(true) => registered += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(id = id.as_str(), "skipping agent listener: {e}"),
            }
        }
        tracing::info!(registered, total, "agent listeners initialized");
        Ok(())
    }

    /// Manually invoke an agent. Creates the (queued) run, spawns execution,
    /// and returns the run id immediately.
    pub fn run_agent(
        &self,
        agent_id: &str,
        prompt: Option<String>,
        actor_id: &str,
    ) -> Result<String, EngineError> {
        let agent = queries::load_agent(&self.db, agent_id)?
            .ok_or_else(|| EngineError::Other(format!("agent not found: {agent_id}")))?;
        if !agent.status.is_active() {
            return Err(EngineError::Other(format!(
                "agent {agent_id} is {}",
                agent.status.as_str()
            )));
        }

        let run_id = self.create_run(&agent, "manual")?;
        let runner = Arc::clone(&self.runner);
        let actor_id = actor_id.to_string();
        let spawned_run_id = run_id.clone();
        tokio::spawn(async move {
            runner
                .execute(&agent, &spawned_run_id, prompt, &actor_id)
                .await;
        });

        Ok(run_id)
    }

    async fn handle_event(&self, agent_id: &str, event: DomainEvent) -> Result<(), String> {
        // Re-fetch at delivery time; registration-time state is stale.
        let agent = queries::load_agent(&self.db, agent_id).map_err(|e| e.to_string())?;
        let Some(agent) = agent else {
            return Ok(());
        };
        if !agent.status.is_active() {
            return Ok(());
        }
        if agent.matching_event_trigger(&event).is_none() {
            return Ok(());
        }

        let run_id = self.create_run(&agent, "event").map_err(|e| e.to_string())?;
        let prompt = event_prompt(&event);
        // Acting identity is the user whose mutation fired the event.
        self.runner
            .execute(&agent, &run_id, Some(prompt), event.actor_id())
            .await;
        Ok(())
    }

    fn create_run(&self, agent: &AgentSpec, triggered_by: &str) -> Result<String, DbError> {
        let run_id = Uuid::new_v4().to_string();
        queries::insert_agent_run(
            &self.db,
            &queries::AgentRunRow {
                id: run_id.clone(),
                agent_id: agent.id.clone(),
                triggered_by: triggered_by.to_string(),
                status: "queued".to_string(),
                messages_json: "[]".to_string(),
                tool_calls_json: "[]".to_string(),
                error: None,
                started_at: Utc::now().to_rfc3339(),
                finished_at: None,
            },
        )?;
        Ok(run_id)
    }
}

/// Natural-language description of an event, used to seed event-triggered
/// runs.
fn event_prompt(event: &DomainEvent) -> String {
    match event {
        DomainEvent::ItemCreated {
            board_id,
            item_id,
            group_id,
            column_values,
            ..
        } => format!(
            "A new item {item_id} was created in group {group_id} on board {board_id}. \
Column values: {column_values}. Handle it according to your instructions."
        ),
        DomainEvent::ItemUpdated {
            board_id,
            item_id,
            field,
            old_value,
            new_value,
            ..
        } => format!(
            "Item {item_id} on board {board_id} had its {field} changed from {old_value} to \
{new_value}. Handle it according to your instructions."
        ),
        DomainEvent::ColumnValueChanged {
            board_id,
            item_id,
            column_id,
            old_value,
            new_value,
            ..
        } => format!(
            "Item {item_id} on board {board_id} had column {column_id} changed from {old_value} \
to {new_value}. Handle it according to your instructions."
        ),
        DomainEvent::ItemDeleted {
            board_id, item_id, ..
        } => format!(
            "Item {item_id} was deleted from board {board_id}. Handle it according to your \
instructions."
        ),
    }
}
