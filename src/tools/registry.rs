//! Tool registry for discovery and invocation.
//!
//! The registry is the tool catalog: an agent's effective tool set is this
//! catalog intersected with its allow-list minus its blocked tools.

use std::collections::HashMap;

use crate::core::tool::ToolDescriptor;
use crate::tools::board::{
    CreateItemTool, DeleteItemTool, GetBoardTool, GetItemTool, ListWorkspaceMembersTool,
    MoveItemTool, NotifyUserTool, SetColumnValueTool,
};
use crate::tools::types::{Tool, ToolContext, ToolError};

/// Registry of all available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates a new registry with all built-in board tools registered.
    pub fn with_builtin() -> Self {
        let mut tools: HashMap<String, Box<dyn Tool>> = HashMap::new();

        tools.insert("get_board".to_string(), Box::new(GetBoardTool));
        tools.insert("get_item".to_string(), Box::new(GetItemTool));
        tools.insert("create_item".to_string(), Box::new(CreateItemTool));
        tools.insert("set_column_value".to_string(), Box::new(SetColumnValueTool));
        tools.insert("move_item".to_string(), Box::new(MoveItemTool));
        tools.insert("delete_item".to_string(), Box::new(DeleteItemTool));
        tools.insert(
            "list_workspace_members".to_string(),
            Box::new(ListWorkspaceMembersTool),
        );
        tools.insert("notify_user".to_string(), Box::new(NotifyUserTool));

        Self { tools }
    }

    /// Catalog of tool names, sorted for stable prompts and logs.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Descriptors for the named subset, in the given order. Unknown names
    /// are skipped.
    pub fn descriptors_for(&self, names: &[String]) -> Vec<ToolDescriptor> {
        names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.descriptor())
            .collect()
    }

    pub async fn invoke(
        &self,
        name: &str,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.invoke(ctx, input).await
    }
}
