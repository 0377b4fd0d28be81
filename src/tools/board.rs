//! Board CRUD tools exposed to agents.
//!
//! Each tool is a thin, schema-described wrapper over one collaborator call.

use async_trait::async_trait;
use serde_json::json;

use crate::core::tool::ToolDescriptor;
use crate::tools::types::{required_str, Tool, ToolContext, ToolError};

pub struct GetBoardTool;

#[async_trait]
impl Tool for GetBoardTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_board".to_string(),
            description: "Fetch a board with its groups, columns and items.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "board_id": { "type": "string", "description": "Board to fetch" }
                },
                "required": ["board_id"]
            }),
        }
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let board_id = required_str(&input, "board_id")?;
        Ok(ctx.boards.get_board(board_id).await?)
    }
}

pub struct GetItemTool;

#[async_trait]
impl Tool for GetItemTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_item".to_string(),
            description: "Fetch a single item with its column values.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "board_id": { "type": "string" },
                    "item_id": { "type": "string" }
                },
                "required": ["board_id", "item_id"]
            }),
        }
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let board_id = required_str(&input, "board_id")?;
        let item_id = required_str(&input, "item_id")?;
        Ok(ctx.boards.get_item(board_id, item_id).await?)
    }
}

pub struct CreateItemTool;

#[async_trait]
impl Tool for CreateItemTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "create_item".to_string(),
            description: "Create an item in a board group, optionally with column values."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "board_id": { "type": "string" },
                    "group_id": { "type": "string" },
                    "name": { "type": "string", "description": "Item title" },
                    "column_values": {
                        "type": "object",
                        "description": "Map of column id to initial value"
                    }
                },
                "required": ["board_id", "group_id", "name"]
            }),
        }
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let board_id = required_str(&input, "board_id")?;
        let group_id = required_str(&input, "group_id")?;
        let name = required_str(&input, "name")?;
        let column_values = input
            .get("column_values")
            .cloned()
            .unwrap_or_else(|| json!({}));
        Ok(ctx
            .boards
            .create_item(board_id, group_id, name, &column_values, &ctx.actor_id)
            .await?)
    }
}

pub struct SetColumnValueTool;

#[async_trait]
impl Tool for SetColumnValueTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "set_column_value".to_string(),
            description: "Set one column value on an item.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "board_id": { "type": "string" },
                    "item_id": { "type": "string" },
                    "column_id": { "type": "string" },
                    "value": { "description": "New value for the column" }
                },
                "required": ["board_id", "item_id", "column_id", "value"]
            }),
        }
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let board_id = required_str(&input, "board_id")?;
        let item_id = required_str(&input, "item_id")?;
        let column_id = required_str(&input, "column_id")?;
        let value = input
            .get("value")
            .cloned()
            .ok_or_else(|| ToolError::InvalidInput("missing required argument: value".into()))?;
        Ok(ctx
            .boards
            .set_column_value(board_id, item_id, column_id, &value, &ctx.actor_id)
            .await?)
    }
}

pub struct MoveItemTool;

#[async_trait]
impl Tool for MoveItemTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "move_item".to_string(),
            description: "Move an item to another group on its board.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "board_id": { "type": "string" },
                    "item_id": { "type": "string" },
                    "group_id": { "type": "string", "description": "Destination group" }
                },
                "required": ["board_id", "item_id", "group_id"]
            }),
        }
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let board_id = required_str(&input, "board_id")?;
        let item_id = required_str(&input, "item_id")?;
        let group_id = required_str(&input, "group_id")?;
        Ok(ctx
            .boards
            .move_item(board_id, item_id, group_id, &ctx.actor_id)
            .await?)
    }
}

pub struct DeleteItemTool;

#[async_trait]
impl Tool for DeleteItemTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "delete_item".to_string(),
            description: "Delete an item from a board.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "board_id": { "type": "string" },
                    "item_id": { "type": "string" }
                },
                "required": ["board_id", "item_id"]
            }),
        }
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let board_id = required_str(&input, "board_id")?;
        let item_id = required_str(&input, "item_id")?;
        ctx.boards
            .delete_item(board_id, item_id, &ctx.actor_id)
            .await?;
        Ok(json!({ "deleted": true, "item_id": item_id }))
    }
}

pub struct ListWorkspaceMembersTool;

#[async_trait]
impl Tool for ListWorkspaceMembersTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "list_workspace_members".to_string(),
            description: "List the members of the agent's workspace.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        _input: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        Ok(ctx
            .boards
            .list_workspace_members(&ctx.workspace_id)
            .await?)
    }
}

pub struct NotifyUserTool;

#[async_trait]
impl Tool for NotifyUserTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "notify_user".to_string(),
            description: "Send an in-app notification to a user.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" },
                    "message": { "type": "string" }
                },
                "required": ["user_id", "message"]
            }),
        }
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let user_id = required_str(&input, "user_id")?;
        let message = required_str(&input, "message")?;
        ctx.messenger.notify(user_id, message).await?;
        Ok(json!({ "notified": true, "user_id": user_id }))
    }
}
