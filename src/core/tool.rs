use serde::{Deserialize, Serialize};

/// Vendor-neutral tool descriptor.
/// Adapters translate this into each provider's wire-level tool definition
/// shape, so tools are declared once regardless of vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}
