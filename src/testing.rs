//! Shared test doubles and fixtures.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::core::boards::{Boards, Messenger, PortError};
use crate::db::{queries, Database};
use crate::model::{
    ChatModelClient, DeltaHandler, ModelError, StopReason, StreamChatRequest, StreamDelta,
    StreamOutcome, ToolCallRequest,
};

/// In-memory board port that records every call and can be told to fail a
/// named operation.
#[derive(Default)]
pub struct MemoryBoards {
    pub calls: Mutex<Vec<String>>,
    pub fail_on: Mutex<Option<String>>,
}

impl MemoryBoards {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, op: &str) {
        *self.fail_on.lock().unwrap() = Some(op.to_string());
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == op)
            .count()
    }

    fn record(&self, op: &str) -> Result<(), PortError> {
        if self.fail_on.lock().unwrap().as_deref() == Some(op) {
            return Err(PortError::Failed(format!("injected failure in {op}")));
        }
        self.calls.lock().unwrap().push(op.to_string());
        Ok(())
    }
}

#[async_trait]
impl Boards for MemoryBoards {
    async fn get_board(&self, board_id: &str) -> Result<serde_json::Value, PortError> {
        self.record("get_board")?;
        Ok(json!({ "id": board_id, "name": "Board", "groups": [], "items": [] }))
    }

    async fn get_item(
        &self,
        board_id: &str,
        item_id: &str,
    ) -> Result<serde_json::Value, PortError> {
        self.record("get_item")?;
        Ok(json!({ "id": item_id, "board_id": board_id }))
    }

    async fn create_item(
        &self,
        board_id: &str,
        group_id: &str,
        name: &str,
        column_values: &serde_json::Value,
        actor_id: &str,
    ) -> Result<serde_json::Value, PortError> {
        self.record("create_item")?;
        Ok(json!({
            "id": "item_new",
            "board_id": board_id,
            "group_id": group_id,
            "name": name,
            "column_values": column_values,
            "created_by": actor_id,
        }))
    }

    async fn set_column_value(
        &self,
        board_id: &str,
        item_id: &str,
        column_id: &str,
        value: &serde_json::Value,
        _actor_id: &str,
    ) -> Result<serde_json::Value, PortError> {
        self.record("set_column_value")?;
        let mut column_values = serde_json::Map::new();
        column_values.insert(column_id.to_string(), value.clone());
        Ok(json!({
            "id": item_id,
            "board_id": board_id,
            "column_values": column_values,
        }))
    }

    async fn move_item(
        &self,
        board_id: &str,
        item_id: &str,
        group_id: &str,
        _actor_id: &str,
    ) -> Result<serde_json::Value, PortError> {
        self.record("move_item")?;
        Ok(json!({ "id": item_id, "board_id": board_id, "group_id": group_id }))
    }

    async fn delete_item(
        &self,
        _board_id: &str,
        _item_id: &str,
        _actor_id: &str,
    ) -> Result<(), PortError> {
        self.record("delete_item")
    }

    async fn list_workspace_members(
        &self,
        workspace_id: &str,
    ) -> Result<serde_json::Value, PortError> {
        self.record("list_workspace_members")?;
        Ok(json!([
            { "id": "u1", "name": "Ada", "workspace_id": workspace_id },
            { "id": "u2", "name": "Grace", "workspace_id": workspace_id },
        ]))
    }
}

/// Messenger double that records notifications and emails.
#[derive(Default)]
pub struct RecordingMessenger {
    pub notifications: Mutex<Vec<(String, String)>>,
    pub emails: Mutex<Vec<(String, String)>>,
    pub fail_on: Mutex<Option<String>>,
}

impl RecordingMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, op: &str) {
        *self.fail_on.lock().unwrap() = Some(op.to_string());
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn notify(&self, user_id: &str, message: &str) -> Result<(), PortError> {
        if self.fail_on.lock().unwrap().as_deref() == Some("notify") {
            return Err(PortError::Failed("injected failure in notify".into()));
        }
        self.notifications
            .lock()
            .unwrap()
            .push((user_id.to_string(), message.to_string()));
        Ok(())
    }

    async fn send_email(&self, to: &str, subject: &str, _body: &str) -> Result<(), PortError> {
        if self.fail_on.lock().unwrap().as_deref() == Some("send_email") {
            return Err(PortError::Failed("injected failure in send_email".into()));
        }
        self.emails
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

/// One scripted provider turn.
#[derive(Debug, Clone)]
pub struct ScriptedTurn {
    pub text: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub stop_reason: StopReason,
}

impl ScriptedTurn {
    pub fn end_turn(text: &str) -> Self {
        Self {
            text: text.to_string(),
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
        }
    }

    pub fn tool_use(text: &str, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            text: text.to_string(),
            tool_calls,
            stop_reason: StopReason::ToolUse,
        }
    }
}

/// Chat client double that replays scripted turns, streaming the text in two
/// chunks so delta accumulation is exercised.
pub struct ScriptedChatClient {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    /// When set, this turn is replayed forever once the queue drains.
    repeat: Option<ScriptedTurn>,
    pub requests: Mutex<Vec<StreamChatRequest>>,
}

impl ScriptedChatClient {
    pub fn new(turns: Vec<ScriptedTurn>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A model that issues the same turn every round, forever.
    pub fn repeating(turn: ScriptedTurn) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(VecDeque::new()),
            repeat: Some(turn),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModelClient for ScriptedChatClient {
    fn model_id(&self) -> String {
        "scripted".to_string()
    }

    async fn stream_chat(
        &self,
        req: &StreamChatRequest,
        on_delta: DeltaHandler<'_>,
    ) -> Result<StreamOutcome, ModelError> {
        self.requests.lock().unwrap().push(req.clone());

        let turn = {
            let mut turns = self.turns.lock().unwrap();
            match turns.pop_front() {
                Some(turn) => turn,
                None => self
                    .repeat
                    .clone()
                    .ok_or_else(|| ModelError::Request("script exhausted".to_string()))?,
            }
        };

        if !turn.text.is_empty() {
            let mid = turn.text.len() / 2;
            let (a, b) = turn.text.split_at(mid);
            if !a.is_empty() {
                on_delta(StreamDelta::Content(a.to_string())).map_err(ModelError::Stream)?;
            }
            if !b.is_empty() {
                on_delta(StreamDelta::Content(b.to_string())).map_err(ModelError::Stream)?;
            }
        }

        Ok(StreamOutcome {
            text: turn.text,
            tool_calls: turn.tool_calls,
            stop_reason: turn.stop_reason,
        })
    }

    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _max_tokens: u32,
    ) -> Result<String, ModelError> {
        Ok("scripted completion".to_string())
    }
}

// ---------------------------------------------------------------------------
// Row fixtures
// ---------------------------------------------------------------------------

pub fn seed_automation(
    db: &Database,
    id: &str,
    board_id: &str,
    status: &str,
    trigger_json: &str,
    conditions_json: &str,
    actions_json: &str,
) {
    let now = chrono::Utc::now().to_rfc3339();
    queries::insert_automation(
        db,
        &queries::AutomationRow {
            id: id.to_string(),
            board_id: board_id.to_string(),
            name: format!("automation {id}"),
            trigger_json: trigger_json.to_string(),
            conditions_json: conditions_json.to_string(),
            actions_json: actions_json.to_string(),
            status: status.to_string(),
            run_count: 0,
            last_run_at: None,
            created_at: now.clone(),
            updated_at: now,
        },
    )
    .expect("seed automation");
}

#[allow(clippy::too_many_arguments)]
pub fn seed_agent(
    db: &Database,
    id: &str,
    workspace_id: &str,
    status: &str,
    tools_json: &str,
    triggers_json: &str,
    guardrails_json: &str,
) {
    let now = chrono::Utc::now().to_rfc3339();
    queries::insert_agent(
        db,
        &queries::AgentRow {
            id: id.to_string(),
            workspace_id: workspace_id.to_string(),
            name: format!("agent {id}"),
            system_prompt: "You help manage the board.".to_string(),
            tools_json: tools_json.to_string(),
            triggers_json: triggers_json.to_string(),
            guardrails_json: guardrails_json.to_string(),
            status: status.to_string(),
            created_at: now.clone(),
            updated_at: now,
        },
    )
    .expect("seed agent");
}
