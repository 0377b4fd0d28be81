//! Typed automation specs.
//!
//! Automations are stored as rows with JSON columns and decoded eagerly into
//! these types when loaded, so unknown operators and malformed action configs
//! surface at the storage boundary instead of at point of use.

use serde::{Deserialize, Serialize};

use super::EntityStatus;
use crate::bus::{DomainEvent, EventKind};

/// What kind of board mutation fires an automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerType {
    ItemCreated,
    ItemUpdated,
    ItemDeleted,
    /// A specific column reached (or left) a value.
    StatusChange,
    /// Any value change on a column.
    ColumnChanged,
    Unknown,
}

impl TriggerType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TriggerType::ItemCreated => "item_created",
            TriggerType::ItemUpdated => "item_updated",
            TriggerType::ItemDeleted => "item_deleted",
            TriggerType::StatusChange => "status_change",
            TriggerType::ColumnChanged => "column_changed",
            TriggerType::Unknown => "unknown",
        }
    }
}

impl serde::Serialize for TriggerType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for TriggerType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "item_created" => TriggerType::ItemCreated,
            "item_updated" => TriggerType::ItemUpdated,
            "item_deleted" => TriggerType::ItemDeleted,
            "status_change" => TriggerType::StatusChange,
            "column_changed" => TriggerType::ColumnChanged,
            _ => TriggerType::Unknown,
        })
    }
}

/// Trigger-specific match fields. Absent fields match anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerSpec {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub config: TriggerConfig,
}

impl TriggerSpec {
    /// Whether this trigger fires for `event`. Board scoping happens in the
    /// handler before this is consulted.
    pub fn matches(&self, event: &DomainEvent) -> bool {
        match self.trigger_type {
            TriggerType::ItemCreated => event.kind() == EventKind::ItemCreated,
            TriggerType::ItemUpdated => event.kind() == EventKind::ItemUpdated,
            TriggerType::ItemDeleted => event.kind() == EventKind::ItemDeleted,
            TriggerType::StatusChange | TriggerType::ColumnChanged => {
                let DomainEvent::ColumnValueChanged {
                    column_id,
                    old_value,
                    new_value,
                    ..
                } = event
                else {
                    return false;
                };
                if let Some(want) = &self.config.column_id {
                    if want != column_id {
                        return false;
                    }
                }
                if let Some(from) = &self.config.from_value {
                    if from != old_value {
                        return false;
                    }
                }
                if let Some(to) = &self.config.to_value {
                    if to != new_value {
                        return false;
                    }
                }
                true
            }
            TriggerType::Unknown => {
                tracing::warn!("automation trigger has unknown type, never matches");
                false
            }
        }
    }
}

/// Comparison operator for a condition. Operators outside the legal set land
/// in `Unknown` at decode time; the evaluator treats them as a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
    Unknown,
}

impl ConditionOperator {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not_equals",
            ConditionOperator::Contains => "contains",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::LessThan => "less_than",
            ConditionOperator::IsEmpty => "is_empty",
            ConditionOperator::IsNotEmpty => "is_not_empty",
            ConditionOperator::Unknown => "unknown",
        }
    }
}

impl serde::Serialize for ConditionOperator {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for ConditionOperator {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "equals" => ConditionOperator::Equals,
            "not_equals" => ConditionOperator::NotEquals,
            "contains" => ConditionOperator::Contains,
            "greater_than" => ConditionOperator::GreaterThan,
            "less_than" => ConditionOperator::LessThan,
            "is_empty" => ConditionOperator::IsEmpty,
            "is_not_empty" => ConditionOperator::IsNotEmpty,
            _ => ConditionOperator::Unknown,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub column_id: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// One step of an automation's action list, with its typed config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum ActionSpec {
    ChangeColumn {
        column_id: String,
        value: serde_json::Value,
    },
    CreateItem {
        /// Defaults to the triggering board when absent.
        #[serde(default)]
        board_id: Option<String>,
        group_id: String,
        name: String,
        #[serde(default)]
        column_values: Option<serde_json::Value>,
    },
    MoveItem {
        group_id: String,
    },
    Notify {
        /// Defaults to the triggering actor when absent.
        #[serde(default)]
        user_id: Option<String>,
        message: String,
    },
    SendEmail {
        to: String,
        subject: String,
        body: String,
    },
    Webhook {
        url: String,
    },
    AiStep {
        prompt: String,
    },
}

impl ActionSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ActionSpec::ChangeColumn { .. } => "change_column",
            ActionSpec::CreateItem { .. } => "create_item",
            ActionSpec::MoveItem { .. } => "move_item",
            ActionSpec::Notify { .. } => "notify",
            ActionSpec::SendEmail { .. } => "send_email",
            ActionSpec::Webhook { .. } => "webhook",
            ActionSpec::AiStep { .. } => "ai_step",
        }
    }
}

/// A stored if-trigger-then-action rule scoped to one board.
#[derive(Debug, Clone)]
pub struct Automation {
    pub id: String,
    pub board_id: String,
    pub name: String,
    pub trigger: TriggerSpec,
    pub conditions: Vec<Condition>,
    pub actions: Vec<ActionSpec>,
    pub status: EntityStatus,
    pub run_count: i64,
    pub last_run_at: Option<String>,
}
