use rusqlite::Connection;

use super::DbError;

struct Migration {
    version: i64,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: r#"
CREATE TABLE automations (
    id              TEXT PRIMARY KEY,
    board_id        TEXT NOT NULL,
    name            TEXT NOT NULL,
    trigger_json    TEXT NOT NULL,
    conditions_json TEXT NOT NULL DEFAULT '[]',
    actions_json    TEXT NOT NULL DEFAULT '[]',
    status          TEXT NOT NULL DEFAULT 'active',
    run_count       INTEGER NOT NULL DEFAULT 0,
    last_run_at     TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE automation_runs (
    id                TEXT PRIMARY KEY,
    automation_id     TEXT NOT NULL REFERENCES automations(id),
    trigger_data_json TEXT NOT NULL,
    actions_json      TEXT NOT NULL DEFAULT '[]',
    success           INTEGER NOT NULL,
    error             TEXT,
    created_at        TEXT NOT NULL
);

CREATE TABLE agents (
    id              TEXT PRIMARY KEY,
    workspace_id    TEXT NOT NULL,
    name            TEXT NOT NULL,
    system_prompt   TEXT NOT NULL,
    tools_json      TEXT NOT NULL DEFAULT '[]',
    triggers_json   TEXT NOT NULL DEFAULT '[]',
    guardrails_json TEXT NOT NULL DEFAULT '{}',
    status          TEXT NOT NULL DEFAULT 'active',
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE agent_runs (
    id              TEXT PRIMARY KEY,
    agent_id        TEXT NOT NULL REFERENCES agents(id),
    triggered_by    TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'queued',
    messages_json   TEXT NOT NULL DEFAULT '[]',
    tool_calls_json TEXT NOT NULL DEFAULT '[]',
    error           TEXT,
    started_at      TEXT NOT NULL,
    finished_at     TEXT
);

CREATE INDEX idx_automations_board ON automations(board_id);
CREATE INDEX idx_automation_runs_automation ON automation_runs(automation_id, created_at);
CREATE INDEX idx_agents_workspace ON agents(workspace_id);
CREATE INDEX idx_agent_runs_agent ON agent_runs(agent_id, started_at);
"#,
}];

pub(super) fn run_migrations(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL
        );",
    )?;

    let applied: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT version FROM _migrations ORDER BY version")?;
        let result = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        result
    };

    for migration in MIGRATIONS {
        if applied.contains(&migration.version) {
            continue;
        }

        tracing::info!("applying migration v{}", migration.version);

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)
            .map_err(|e| DbError::Migration(format!("v{}: {e}", migration.version)))?;
        tx.execute(
            "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
            rusqlite::params![migration.version],
        )?;
        tx.commit()?;
    }

    Ok(())
}
