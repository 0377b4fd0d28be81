//! Collaborator ports for board CRUD and outbound messaging.
//!
//! The engine never owns board data. Actions and agent tools reach boards,
//! items, and people through these traits; the host application supplies the
//! implementations. Activity logging is the collaborator's own side effect.

use async_trait::async_trait;

/// Failure surfaced by a collaborator call.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("collaborator failure: {0}")]
    Failed(String),
}

/// Board/item/column/group operations consumed by actions and agent tools.
///
/// Return values are opaque JSON snapshots of the touched entity; the engine
/// records them verbatim in execution logs and tool results.
#[async_trait]
pub trait Boards: Send + Sync {
    async fn get_board(&self, board_id: &str) -> Result<serde_json::Value, PortError>;

    async fn get_item(
        &self,
        board_id: &str,
        item_id: &str,
    ) -> Result<serde_json::Value, PortError>;

    async fn create_item(
        &self,
        board_id: &str,
        group_id: &str,
        name: &str,
        column_values: &serde_json::Value,
        actor_id: &str,
    ) -> Result<serde_json::Value, PortError>;

    async fn set_column_value(
        &self,
        board_id: &str,
        item_id: &str,
        column_id: &str,
        value: &serde_json::Value,
        actor_id: &str,
    ) -> Result<serde_json::Value, PortError>;

    async fn move_item(
        &self,
        board_id: &str,
        item_id: &str,
        group_id: &str,
        actor_id: &str,
    ) -> Result<serde_json::Value, PortError>;

    async fn delete_item(
        &self,
        board_id: &str,
        item_id: &str,
        actor_id: &str,
    ) -> Result<(), PortError>;

    async fn list_workspace_members(
        &self,
        workspace_id: &str,
    ) -> Result<serde_json::Value, PortError>;
}

/// Outbound notification channel.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn notify(&self, user_id: &str, message: &str) -> Result<(), PortError>;

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), PortError>;
}
