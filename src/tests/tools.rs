//! Tool registry and board tool tests.

use pretty_assertions::assert_eq;
use serde_json::json;

use crate::testing::{MemoryBoards, RecordingMessenger};
use crate::tools::{ToolContext, ToolError, ToolRegistry};

fn context(boards: std::sync::Arc<MemoryBoards>) -> ToolContext {
    ToolContext {
        actor_id: "u1".to_string(),
        workspace_id: "ws1".to_string(),
        boards,
        messenger: RecordingMessenger::new(),
    }
}

#[tokio::test]
async fn get_board_invokes_the_port() {
    let boards = MemoryBoards::new();
    let registry = ToolRegistry::with_builtin();
    let ctx = context(boards.clone());

    let output = registry
        .invoke("get_board", &ctx, json!({ "board_id": "b1" }))
        .await
        .unwrap();
    assert_eq!(output["id"], "b1");
    assert_eq!(boards.call_count("get_board"), 1);
}

#[tokio::test]
async fn missing_required_arguments_are_invalid_input() {
    let registry = ToolRegistry::with_builtin();
    let ctx = context(MemoryBoards::new());

    let err = registry.invoke("get_board", &ctx, json!({})).await.unwrap_err();
    assert!(matches!(err, ToolError::InvalidInput(_)));
}

#[tokio::test]
async fn unknown_tool_names_are_rejected() {
    let registry = ToolRegistry::with_builtin();
    let ctx = context(MemoryBoards::new());

    let err = registry
        .invoke("summon_demons", &ctx, json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::UnknownTool(_)));
}

#[tokio::test]
async fn create_item_defaults_missing_column_values() {
    let boards = MemoryBoards::new();
    let registry = ToolRegistry::with_builtin();
    let ctx = context(boards.clone());

    let output = registry
        .invoke(
            "create_item",
            &ctx,
            json!({ "board_id": "b1", "group_id": "g1", "name": "new task" }),
        )
        .await
        .unwrap();
    assert_eq!(output["name"], "new task");
    assert_eq!(output["column_values"], json!({}));
    assert_eq!(output["created_by"], "u1");
}

#[tokio::test]
async fn notify_user_reaches_the_messenger() {
    let boards = MemoryBoards::new();
    let messenger = RecordingMessenger::new();
    let ctx = ToolContext {
        actor_id: "u1".to_string(),
        workspace_id: "ws1".to_string(),
        boards,
        messenger: messenger.clone(),
    };
    let registry = ToolRegistry::with_builtin();

    let output = registry
        .invoke(
            "notify_user",
            &ctx,
            json!({ "user_id": "u2", "message": "ping" }),
        )
        .await
        .unwrap();
    assert_eq!(output["notified"], true);
    assert_eq!(
        *messenger.notifications.lock().unwrap(),
        vec![("u2".to_string(), "ping".to_string())]
    );
}

#[tokio::test]
async fn port_failures_become_execution_errors() {
    let boards = MemoryBoards::new();
    boards.fail_on("delete_item");
    let registry = ToolRegistry::with_builtin();
    let ctx = context(boards);

    let err = registry
        .invoke(
            "delete_item",
            &ctx,
            json!({ "board_id": "b1", "item_id": "i1" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Execution(_)));
}
