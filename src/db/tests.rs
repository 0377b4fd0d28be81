//! Database operations unit tests

#[cfg(test)]
mod tests {
    use crate::db::{queries, Database};
    use crate::domain::{ConditionOperator, EntityStatus};
    use uuid::Uuid;

    fn automation_row(id: &str, status: &str) -> queries::AutomationRow {
        let now = chrono::Utc::now().to_rfc3339();
        queries::AutomationRow {
            id: id.to_string(),
            board_id: "board_1".to_string(),
            name: "notify on done".to_string(),
            trigger_json: r#"{"type":"status_change","config":{"column_id":"col_x","to_value":"done"}}"#.to_string(),
            conditions_json: r#"[{"column_id":"col_p","operator":"equals","value":"high"}]"#
                .to_string(),
            actions_json: r#"[{"type":"notify","config":{"message":"done!"}}]"#.to_string(),
            status: status.to_string(),
            run_count: 0,
            last_run_at: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn agent_row(id: &str, status: &str) -> queries::AgentRow {
        let now = chrono::Utc::now().to_rfc3339();
        queries::AgentRow {
            id: id.to_string(),
            workspace_id: "ws_1".to_string(),
            name: "triage".to_string(),
            system_prompt: "You triage incoming items.".to_string(),
            tools_json: r#"["get_board","create_item"]"#.to_string(),
            triggers_json: r#"[{"type":"event","config":{"event_type":"item_created"}}]"#
                .to_string(),
            guardrails_json: r#"{"max_actions_per_run":5}"#.to_string(),
            status: status.to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn automation_round_trips_and_decodes() {
        let db = Database::open_in_memory().expect("in-memory DB");
        let id = Uuid::new_v4().to_string();
        queries::insert_automation(&db, &automation_row(&id, "active")).unwrap();

        let automation = queries::load_automation(&db, &id).unwrap().unwrap();
        assert_eq!(automation.board_id, "board_1");
        assert_eq!(automation.status, EntityStatus::Active);
        assert_eq!(automation.conditions.len(), 1);
        assert_eq!(automation.conditions[0].operator, ConditionOperator::Equals);
        assert_eq!(automation.actions.len(), 1);
        assert_eq!(automation.actions[0].kind(), "notify");
    }

    #[test]
    fn load_automation_returns_none_for_missing_row() {
        let db = Database::open_in_memory().expect("in-memory DB");
        assert!(queries::load_automation(&db, "nope").unwrap().is_none());
    }

    #[test]
    fn bump_run_stats_increments_and_stamps() {
        let db = Database::open_in_memory().expect("in-memory DB");
        let id = Uuid::new_v4().to_string();
        queries::insert_automation(&db, &automation_row(&id, "active")).unwrap();

        let now = chrono::Utc::now().to_rfc3339();
        queries::bump_automation_run_stats(&db, &id, &now).unwrap();
        queries::bump_automation_run_stats(&db, &id, &now).unwrap();

        let automation = queries::load_automation(&db, &id).unwrap().unwrap();
        assert_eq!(automation.run_count, 2);
        assert_eq!(automation.last_run_at.as_deref(), Some(now.as_str()));
    }

    #[test]
    fn active_id_listing_skips_paused_entities() {
        let db = Database::open_in_memory().expect("in-memory DB");
        queries::insert_automation(&db, &automation_row("a1", "active")).unwrap();
        queries::insert_automation(&db, &automation_row("a2", "paused")).unwrap();
        queries::insert_agent(&db, &agent_row("g1", "active")).unwrap();
        queries::insert_agent(&db, &agent_row("g2", "disabled")).unwrap();

        assert_eq!(queries::list_active_automation_ids(&db).unwrap(), vec!["a1"]);
        assert_eq!(queries::list_active_agent_ids(&db).unwrap(), vec!["g1"]);
        assert_eq!(queries::count_automations(&db).unwrap(), 2);
        assert_eq!(queries::count_agents(&db).unwrap(), 2);
    }

    #[test]
    fn agent_guardrails_decode_with_partial_json() {
        let db = Database::open_in_memory().expect("in-memory DB");
        queries::insert_agent(&db, &agent_row("g1", "active")).unwrap();

        let agent = queries::load_agent(&db, "g1").unwrap().unwrap();
        assert_eq!(agent.guardrails.max_actions_per_run, 5);
        assert!(!agent.guardrails.require_approval);
        assert!(agent.has_event_trigger());
    }

    #[test]
    fn malformed_stored_json_is_a_decode_error() {
        let db = Database::open_in_memory().expect("in-memory DB");
        let mut row = automation_row("a1", "active");
        row.actions_json = "{not json".to_string();
        queries::insert_automation(&db, &row).unwrap();

        let err = queries::load_automation(&db, "a1").unwrap_err();
        assert!(matches!(err, crate::db::DbError::Decode { .. }));
    }

    #[test]
    fn agent_run_terminal_update_preserves_transcript() {
        let db = Database::open_in_memory().expect("in-memory DB");
        queries::insert_agent(&db, &agent_row("g1", "active")).unwrap();

        let run_id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        queries::insert_agent_run(
            &db,
            &queries::AgentRunRow {
                id: run_id.clone(),
                agent_id: "g1".to_string(),
                triggered_by: "manual".to_string(),
                status: "queued".to_string(),
                messages_json: "[]".to_string(),
                tool_calls_json: "[]".to_string(),
                error: None,
                started_at: now.clone(),
                finished_at: None,
            },
        )
        .unwrap();

        queries::finish_agent_run(
            &db,
            &run_id,
            "failed",
            r#"[{"role":"user","text":"hi"}]"#,
            "[]",
            Some("provider exploded"),
            &now,
        )
        .unwrap();

        let run = queries::get_agent_run(&db, &run_id).unwrap().unwrap();
        assert_eq!(run.status, "failed");
        assert_eq!(run.error.as_deref(), Some("provider exploded"));
        assert!(run.messages_json.contains("hi"));
        assert!(run.finished_at.is_some());
    }
}
