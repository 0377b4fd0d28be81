//! Action execution for the automation path.
//!
//! Actions run strictly sequentially, never in parallel. The first failure
//! stops the list (fail-fast); every attempted action leaves an outcome
//! entry for the execution log either way.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::bus::DomainEvent;
use crate::core::boards::{Boards, Messenger, PortError};
use crate::domain::ActionSpec;
use crate::model::{ModelError, ProviderRegistry};

const AI_STEP_MAX_TOKENS: u32 = 1024;
const AI_STEP_SYSTEM_PROMPT: &str = "You are an automation step on a collaborative work board. \
Follow the instruction using the supplied trigger data. Reply with plain text only.";

/// Context an action list runs against, derived from the triggering event.
#[derive(Debug, Clone)]
pub struct TriggerData {
    pub board_id: String,
    pub item_id: String,
    pub actor_id: String,
    /// Serialized snapshot of the triggering event, recorded in the log and
    /// posted to webhooks.
    pub snapshot: serde_json::Value,
}

impl TriggerData {
    pub fn from_event(event: &DomainEvent) -> Self {
        Self {
            board_id: event.board_id().to_string(),
            item_id: event.item_id().to_string(),
            actor_id: event.actor_id().to_string(),
            snapshot: serde_json::to_value(event).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Per-action entry of the execution log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: String,
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of running one action list.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub executed: Vec<ActionOutcome>,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{0}")]
    Port(#[from] PortError),
    #[error("{0}")]
    Model(#[from] ModelError),
    #[error("webhook failed: {0}")]
    Webhook(String),
}

pub struct ActionExecutor {
    boards: Arc<dyn Boards>,
    messenger: Arc<dyn Messenger>,
    providers: Arc<ProviderRegistry>,
    http: reqwest::Client,
}

impl ActionExecutor {
    pub fn new(
        boards: Arc<dyn Boards>,
        messenger: Arc<dyn Messenger>,
        providers: Arc<ProviderRegistry>,
    ) -> Self {
        Self {
            boards,
            messenger,
            providers,
            http: reqwest::Client::new(),
        }
    }

    /// Run the list in order, stopping at the first failure.
    pub async fn execute_all(
        &self,
        actions: &[ActionSpec],
        trigger: &TriggerData,
    ) -> ExecutionOutcome {
        let mut executed = Vec::with_capacity(actions.len());

        for action in actions {
            match self.execute_one(action, trigger).await {
                Ok(result) => {
                    executed.push(ActionOutcome {
                        action: action.kind().to_string(),
                        result: Some(result),
                        error: None,
                    });
                }
                Err(e) => {
                    let message = e.to_string();
                    tracing::warn!(action = action.kind(), "action failed, aborting list: {message}");
                    executed.push(ActionOutcome {
                        action: action.kind().to_string(),
                        result: None,
                        error: Some(message.clone()),
                    });
                    return ExecutionOutcome {
                        executed,
                        success: false,
                        error: Some(message),
                    };
                }
            }
        }

        ExecutionOutcome {
            executed,
            success: true,
            error: None,
        }
    }

    async fn execute_one(
        &self,
        action: &ActionSpec,
        trigger: &TriggerData,
    ) -> Result<serde_json::Value, ActionError> {
        match action {
            ActionSpec::ChangeColumn { column_id, value } => {
                let item = self
                    .boards
                    .set_column_value(
                        &trigger.board_id,
                        &trigger.item_id,
                        column_id,
                        value,
                        &trigger.actor_id,
                    )
                    .await?;
                Ok(json!({ "column_id": column_id, "value": value, "item": item }))
            }
            ActionSpec::CreateItem {
                board_id,
                group_id,
                name,
                column_values,
            } => {
                let board_id = board_id.as_deref().unwrap_or(&trigger.board_id);
                let column_values = column_values.clone().unwrap_or_else(|| json!({}));
                let item = self
                    .boards
                    .create_item(board_id, group_id, name, &column_values, &trigger.actor_id)
                    .await?;
                Ok(item)
            }
            ActionSpec::MoveItem { group_id } => {
                let item = self
                    .boards
                    .move_item(
                        &trigger.board_id,
                        &trigger.item_id,
                        group_id,
                        &trigger.actor_id,
                    )
                    .await?;
                Ok(json!({ "moved": true, "group_id": group_id, "item": item }))
            }
            ActionSpec::Notify { user_id, message } => {
                let user_id = user_id.as_deref().unwrap_or(&trigger.actor_id);
                self.messenger.notify(user_id, message).await?;
                Ok(json!({ "notified": true, "message": message }))
            }
            ActionSpec::SendEmail { to, subject, body } => {
                self.messenger.send_email(to, subject, body).await?;
                Ok(json!({ "sent": true, "to": to }))
            }
            ActionSpec::Webhook { url } => {
                let response = self
                    .http
                    .post(url)
                    .json(&trigger.snapshot)
                    .send()
                    .await
                    .map_err(|e| ActionError::Webhook(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ActionError::Webhook(format!("{url} returned {status}")));
                }
                Ok(json!({ "delivered": true, "status": status.as_u16() }))
            }
            ActionSpec::AiStep { prompt } => {
                let client = self.providers.resolve_default()?;
                let user = format!(
                    "Instruction:\n{prompt}\n\nTrigger data:\n{}",
                    trigger.snapshot
                );
                let text = client
                    .complete(AI_STEP_SYSTEM_PROMPT, &user, AI_STEP_MAX_TOKENS)
                    .await?;
                Ok(json!({ "text": text }))
            }
        }
    }
}
