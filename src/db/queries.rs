use std::str::FromStr;

use rusqlite::params;
use serde::Serialize;

use super::{Database, DbError};
use crate::domain::{
    ActionSpec, AgentSpec, AgentTrigger, Automation, Condition, EntityStatus, Guardrails,
    TriggerSpec,
};

// ---------------------------------------------------------------------------
// Row types — flat structs that map directly to table columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AutomationRow {
    pub id: String,
    pub board_id: String,
    pub name: String,
    pub trigger_json: String,
    pub conditions_json: String,
    pub actions_json: String,
    pub status: String,
    pub run_count: i64,
    pub last_run_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutomationRunRow {
    pub id: String,
    pub automation_id: String,
    pub trigger_data_json: String,
    pub actions_json: String,
    pub success: bool,
    pub error: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentRow {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub system_prompt: String,
    pub tools_json: String,
    pub triggers_json: String,
    pub guardrails_json: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentRunRow {
    pub id: String,
    pub agent_id: String,
    pub triggered_by: String,
    pub status: String,
    pub messages_json: String,
    pub tool_calls_json: String,
    pub error: Option<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Decoding — JSON columns become typed specs at this boundary
// ---------------------------------------------------------------------------

fn decode<T: serde::de::DeserializeOwned>(
    entity: &str,
    field: &str,
    json: &str,
) -> Result<T, DbError> {
    serde_json::from_str(json).map_err(|e| DbError::Decode {
        entity: entity.to_string(),
        reason: format!("{field}: {e}"),
    })
}

fn decode_status(entity: &str, raw: &str) -> Result<EntityStatus, DbError> {
    EntityStatus::from_str(raw).map_err(|reason| DbError::Decode {
        entity: entity.to_string(),
        reason,
    })
}

impl AutomationRow {
    pub fn into_automation(self) -> Result<Automation, DbError> {
        let trigger: TriggerSpec = decode("automation", "trigger_json", &self.trigger_json)?;
        let conditions: Vec<Condition> =
            decode("automation", "conditions_json", &self.conditions_json)?;
        let actions: Vec<ActionSpec> = decode("automation", "actions_json", &self.actions_json)?;
        let status = decode_status("automation", &self.status)?;
        Ok(Automation {
            id: self.id,
            board_id: self.board_id,
            name: self.name,
            trigger,
            conditions,
            actions,
            status,
            run_count: self.run_count,
            last_run_at: self.last_run_at,
        })
    }
}

impl AgentRow {
    pub fn into_agent(self) -> Result<AgentSpec, DbError> {
        let tools: Vec<String> = decode("agent", "tools_json", &self.tools_json)?;
        let triggers: Vec<AgentTrigger> = decode("agent", "triggers_json", &self.triggers_json)?;
        let guardrails: Guardrails = decode("agent", "guardrails_json", &self.guardrails_json)?;
        let status = decode_status("agent", &self.status)?;
        Ok(AgentSpec {
            id: self.id,
            workspace_id: self.workspace_id,
            name: self.name,
            system_prompt: self.system_prompt,
            tools,
            triggers,
            guardrails,
            status,
        })
    }
}

// ---------------------------------------------------------------------------
// Automation queries
// ---------------------------------------------------------------------------

pub fn insert_automation(db: &Database, row: &AutomationRow) -> Result<(), DbError> {
    let conn = db.conn();
    conn.execute(
        "INSERT INTO automations (id, board_id, name, trigger_json, conditions_json, actions_json, status, run_count, last_run_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            row.id,
            row.board_id,
            row.name,
            row.trigger_json,
            row.conditions_json,
            row.actions_json,
            row.status,
            row.run_count,
            row.last_run_at,
            row.created_at,
            row.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_automation(db: &Database, id: &str) -> Result<Option<AutomationRow>, DbError> {
    let conn = db.conn();
    let mut stmt = conn.prepare(
        "SELECT id, board_id, name, trigger_json, conditions_json, actions_json, status, run_count, last_run_at, created_at, updated_at
         FROM automations WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![id], |row| {
        Ok(AutomationRow {
            id: row.get(0)?,
            board_id: row.get(1)?,
            name: row.get(2)?,
            trigger_json: row.get(3)?,
            conditions_json: row.get(4)?,
            actions_json: row.get(5)?,
            status: row.get(6)?,
            run_count: row.get(7)?,
            last_run_at: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    })?;
    rows.next().transpose().map_err(DbError::from)
}

/// Load and decode one automation. `Ok(None)` when the row is absent.
pub fn load_automation(db: &Database, id: &str) -> Result<Option<Automation>, DbError> {
    match get_automation(db, id)? {
        Some(row) => row.into_automation().map(Some),
        None => Ok(None),
    }
}

pub fn list_active_automation_ids(db: &Database) -> Result<Vec<String>, DbError> {
    let conn = db.conn();
    let mut stmt =
        conn.prepare("SELECT id FROM automations WHERE status = 'active' ORDER BY created_at")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

pub fn count_automations(db: &Database) -> Result<i64, DbError> {
    let conn = db.conn();
    let count = conn.query_row("SELECT COUNT(*) FROM automations", [], |row| row.get(0))?;
    Ok(count)
}

pub fn update_automation_status(db: &Database, id: &str, status: &str) -> Result<(), DbError> {
    let conn = db.conn();
    let changed = conn.execute(
        "UPDATE automations SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![id, status],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("automation {id}")));
    }
    Ok(())
}

/// Bump run_count and stamp last_run_at. Called unconditionally after every
/// triggered execution, success or failure.
pub fn bump_automation_run_stats(db: &Database, id: &str, now: &str) -> Result<(), DbError> {
    let conn = db.conn();
    conn.execute(
        "UPDATE automations SET run_count = run_count + 1, last_run_at = ?2, updated_at = ?2 WHERE id = ?1",
        params![id, now],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Automation execution log queries
// ---------------------------------------------------------------------------

pub fn insert_automation_run(db: &Database, row: &AutomationRunRow) -> Result<(), DbError> {
    let conn = db.conn();
    conn.execute(
        "INSERT INTO automation_runs (id, automation_id, trigger_data_json, actions_json, success, error, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            row.id,
            row.automation_id,
            row.trigger_data_json,
            row.actions_json,
            row.success,
            row.error,
            row.created_at
        ],
    )?;
    Ok(())
}

pub fn list_automation_runs(
    db: &Database,
    automation_id: &str,
) -> Result<Vec<AutomationRunRow>, DbError> {
    let conn = db.conn();
    let mut stmt = conn.prepare(
        "SELECT id, automation_id, trigger_data_json, actions_json, success, error, created_at
         FROM automation_runs WHERE automation_id = ?1 ORDER BY created_at",
    )?;
    let rows = stmt
        .query_map(params![automation_id], |row| {
            Ok(AutomationRunRow {
                id: row.get(0)?,
                automation_id: row.get(1)?,
                trigger_data_json: row.get(2)?,
                actions_json: row.get(3)?,
                success: row.get(4)?,
                error: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Agent queries
// ---------------------------------------------------------------------------

pub fn insert_agent(db: &Database, row: &AgentRow) -> Result<(), DbError> {
    let conn = db.conn();
    conn.execute(
        "INSERT INTO agents (id, workspace_id, name, system_prompt, tools_json, triggers_json, guardrails_json, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            row.id,
            row.workspace_id,
            row.name,
            row.system_prompt,
            row.tools_json,
            row.triggers_json,
            row.guardrails_json,
            row.status,
            row.created_at,
            row.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_agent(db: &Database, id: &str) -> Result<Option<AgentRow>, DbError> {
    let conn = db.conn();
    let mut stmt = conn.prepare(
        "SELECT id, workspace_id, name, system_prompt, tools_json, triggers_json, guardrails_json, status, created_at, updated_at
         FROM agents WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![id], |row| {
        Ok(AgentRow {
            id: row.get(0)?,
            workspace_id: row.get(1)?,
            name: row.get(2)?,
            system_prompt: row.get(3)?,
            tools_json: row.get(4)?,
            triggers_json: row.get(5)?,
            guardrails_json: row.get(6)?,
            status: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    })?;
    rows.next().transpose().map_err(DbError::from)
}

/// Load and decode one agent. `Ok(None)` when the row is absent.
pub fn load_agent(db: &Database, id: &str) -> Result<Option<AgentSpec>, DbError> {
    match get_agent(db, id)? {
        Some(row) => row.into_agent().map(Some),
        None => Ok(None),
    }
}

pub fn list_active_agent_ids(db: &Database) -> Result<Vec<String>, DbError> {
    let conn = db.conn();
    let mut stmt =
        conn.prepare("SELECT id FROM agents WHERE status = 'active' ORDER BY created_at")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

pub fn count_agents(db: &Database) -> Result<i64, DbError> {
    let conn = db.conn();
    let count = conn.query_row("SELECT COUNT(*) FROM agents", [], |row| row.get(0))?;
    Ok(count)
}

pub fn update_agent_status(db: &Database, id: &str, status: &str) -> Result<(), DbError> {
    let conn = db.conn();
    let changed = conn.execute(
        "UPDATE agents SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![id, status],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("agent {id}")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Agent run queries
// ---------------------------------------------------------------------------

pub fn insert_agent_run(db: &Database, row: &AgentRunRow) -> Result<(), DbError> {
    let conn = db.conn();
    conn.execute(
        "INSERT INTO agent_runs (id, agent_id, triggered_by, status, messages_json, tool_calls_json, error, started_at, finished_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            row.id,
            row.agent_id,
            row.triggered_by,
            row.status,
            row.messages_json,
            row.tool_calls_json,
            row.error,
            row.started_at,
            row.finished_at
        ],
    )?;
    Ok(())
}

/// Persist a run's terminal state together with whatever transcript and
/// tool-call log accumulated. Partial progress is never discarded.
pub fn finish_agent_run(
    db: &Database,
    run_id: &str,
    status: &str,
    messages_json: &str,
    tool_calls_json: &str,
    error: Option<&str>,
    finished_at: &str,
) -> Result<(), DbError> {
    let conn = db.conn();
    let changed = conn.execute(
        "UPDATE agent_runs SET status = ?2, messages_json = ?3, tool_calls_json = ?4, error = ?5, finished_at = ?6 WHERE id = ?1",
        params![run_id, status, messages_json, tool_calls_json, error, finished_at],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("agent run {run_id}")));
    }
    Ok(())
}

pub fn get_agent_run(db: &Database, run_id: &str) -> Result<Option<AgentRunRow>, DbError> {
    let conn = db.conn();
    let mut stmt = conn.prepare(
        "SELECT id, agent_id, triggered_by, status, messages_json, tool_calls_json, error, started_at, finished_at
         FROM agent_runs WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![run_id], |row| {
        Ok(AgentRunRow {
            id: row.get(0)?,
            agent_id: row.get(1)?,
            triggered_by: row.get(2)?,
            status: row.get(3)?,
            messages_json: row.get(4)?,
            tool_calls_json: row.get(5)?,
            error: row.get(6)?,
            started_at: row.get(7)?,
            finished_at: row.get(8)?,
        })
    })?;
    rows.next().transpose().map_err(DbError::from)
}

pub fn list_agent_runs(db: &Database, agent_id: &str) -> Result<Vec<AgentRunRow>, DbError> {
    let conn = db.conn();
    let mut stmt = conn.prepare(
        "SELECT id, agent_id, triggered_by, status, messages_json, tool_calls_json, error, started_at, finished_at
         FROM agent_runs WHERE agent_id = ?1 ORDER BY started_at",
    )?;
    let rows = stmt
        .query_map(params![agent_id], |row| {
            Ok(AgentRunRow {
                id: row.get(0)?,
                agent_id: row.get(1)?,
                triggered_by: row.get(2)?,
                status: row.get(3)?,
                messages_json: row.get(4)?,
                tool_calls_json: row.get(5)?,
                error: row.get(6)?,
                started_at: row.get(7)?,
                finished_at: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
