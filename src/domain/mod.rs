//! Typed domain specs for stored automations and agents.
//!
//! JSON columns are decoded into these types at the storage boundary
//! (`db::queries`), centralizing unknown-variant handling.

pub mod agent;
pub mod automation;

use serde::{Deserialize, Serialize};

/// Lifecycle status shared by automations and agents. Only `active` entities
/// hold bus subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Active,
    Paused,
    Disabled,
}

impl EntityStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Active => "active",
            EntityStatus::Paused => "paused",
            EntityStatus::Disabled => "disabled",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, EntityStatus::Active)
    }
}

impl std::str::FromStr for EntityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EntityStatus::Active),
            "paused" => Ok(EntityStatus::Paused),
            "disabled" => Ok(EntityStatus::Disabled),
            other => Err(format!("unknown entity status: {other}")),
        }
    }
}

pub use agent::{AgentSpec, AgentTrigger, AgentTriggerConfig, AgentTriggerType, Guardrails};
pub use automation::{
    ActionSpec, Automation, Condition, ConditionOperator, TriggerConfig, TriggerSpec, TriggerType,
};
