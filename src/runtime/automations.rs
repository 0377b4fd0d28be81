//! Automation trigger handling.
//!
//! Each active automation holds one wildcard bus subscription; board and
//! trigger-type routing happens inside the handler, which re-fetches the
//! automation at delivery time because its status may have changed since
//! subscription.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::bus::{DomainEvent, EventBus, EventFilter, EventHandler};
use crate::db::{queries, Database, DbError};
use crate::runtime::actions::{ActionExecutor, TriggerData};
use crate::runtime::conditions::evaluate_conditions;
use crate::runtime::trigger_registry::TriggerRegistry;

pub struct AutomationRuntime {
    db: Arc<Database>,
    executor: Arc<ActionExecutor>,
    listeners: TriggerRegistry,
}

impl AutomationRuntime {
    pub fn new(db: Arc<Database>, bus: Arc<EventBus>, executor: Arc<ActionExecutor>) -> Arc<Self> {
        Arc::new(Self {
            db,
            executor,
            listeners: TriggerRegistry::new("automations", bus),
        })
    }

    /// (Re-)register the listener for one automation. Returns whether a
    /// subscription is now live; missing or inactive automations are left
    /// unregistered.
    pub fn register(self: &Arc<Self>, id: &str) -> Result<bool, DbError> {
        self.listeners.unbind(id);

        let Some(automation) = queries::load_automation(&self.db, id)? else {
            return Ok(false);
        };
        if !automation.status.is_active() {
            return Ok(false);
        }

        let runtime = Arc::clone(self);
        let automation_id = id.to_string();
        let handler: EventHandler = Arc::new(move |event| {
            let runtime = Arc::clone(&runtime);
            let automation_id = automation_id.clone();
            Box::pin(async move { runtime.handle_event(&automation_id, event).await })
        });

        self.listeners.bind(id, EventFilter::All, handler);
        Ok(true)
    }

    /// Drop the listener for one automation. No-op if absent.
    pub fn unregister(&self, id: &str) -> bool {
        self.listeners.unbind(id)
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.listeners.is_registered(id)
    }

    /// Bulk-register all active automations. Run exactly once at startup.
    pub fn init_listeners(self: &Arc<Self>) -> Result<(), DbError> {
        let ids = queries::list_active_automation_ids(&self.db)?;
        let total = queries::count_automations(&self.db)?;
        let mut registered = 0usize;
        for id in &ids {
            match self.register(id) {
                Ok(true) => registered += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(id = id.as_str(), "skipping automation listener: {e}"),
            }
        }
        tracing::info!(registered, total, "automation listeners initialized");
        Ok(())
    }

    async fn handle_event(&self, automation_id: &str, event: DomainEvent) -> Result<(), String> {
        // Re-fetch at delivery time; registration-time state is stale.
        let automation = queries::load_automation(&self.db, automation_id)
            .map_err(|e| e.to_string())?;
        let Some(automation) = automation else {
            return Ok(());
        };
        if !automation.status.is_active() {
            return Ok(());
        }
        if automation.board_id != event.board_id() {
            return Ok(());
        }
        if !automation.trigger.matches(&event) {
            return Ok(());
        }

        let column_values = column_values_of(&event);
        if !evaluate_conditions(&automation.conditions, &column_values) {
            tracing::debug!(automation_id, "trigger matched but conditions failed");
            return Ok(());
        }

        let trigger_data = TriggerData::from_event(&event);
        let outcome = self
            .executor
            .execute_all(&automation.actions, &trigger_data)
            .await;

        let now = Utc::now().to_rfc3339();
        let row = queries::AutomationRunRow {
            id: Uuid::new_v4().to_string(),
            automation_id: automation.id.clone(),
            trigger_data_json: trigger_data.snapshot.to_string(),
            actions_json: serde_json::to_string(&outcome.executed)
                .unwrap_or_else(|_| "[]".to_string()),
            success: outcome.success,
            error: outcome.error.clone(),
            created_at: now.clone(),
        };
        queries::insert_automation_run(&self.db, &row).map_err(|e| e.to_string())?;

        // Win or lose, the run counts.
        queries::bump_automation_run_stats(&self.db, &automation.id, &now)
            .map_err(|e| e.to_string())?;

        Ok(())
    }
}

/// Column-value view of an event for condition evaluation.
fn column_values_of(event: &DomainEvent) -> serde_json::Value {
    fn single(key: &str, value: &serde_json::Value) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(key.to_string(), value.clone());
        serde_json::Value::Object(map)
    }

    match event {
        DomainEvent::ItemCreated { column_values, .. } => column_values.clone(),
        DomainEvent::ItemUpdated {
            field, new_value, ..
        } => single(field, new_value),
        DomainEvent::ColumnValueChanged {
            column_id,
            new_value,
            ..
        } => single(column_id, new_value),
        DomainEvent::ItemDeleted { .. } => serde_json::json!({}),
    }
}
