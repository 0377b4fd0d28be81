//! Typed agent specs and guardrails.

use serde::{Deserialize, Serialize};

use super::EntityStatus;
use crate::bus::{DomainEvent, EventKind};

/// How an agent can be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentTriggerType {
    /// Fires on matching bus events.
    Event,
    /// Only invoked explicitly through the run entry point.
    Manual,
    Unknown,
}

impl AgentTriggerType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AgentTriggerType::Event => "event",
            AgentTriggerType::Manual => "manual",
            AgentTriggerType::Unknown => "unknown",
        }
    }
}

impl serde::Serialize for AgentTriggerType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for AgentTriggerType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "event" => AgentTriggerType::Event,
            "manual" => AgentTriggerType::Manual,
            _ => AgentTriggerType::Unknown,
        })
    }
}

/// Event-trigger match fields. Absent fields match anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentTriggerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTrigger {
    #[serde(rename = "type")]
    pub trigger_type: AgentTriggerType,
    #[serde(default)]
    pub config: AgentTriggerConfig,
}

impl AgentTrigger {
    pub fn matches_event(&self, event: &DomainEvent) -> bool {
        if self.trigger_type != AgentTriggerType::Event {
            return false;
        }
        if let Some(kind) = self.config.event_type {
            if kind != event.kind() {
                return false;
            }
        }
        if let Some(board_id) = &self.config.board_id {
            if board_id != event.board_id() {
                return false;
            }
        }
        true
    }
}

fn default_max_actions() -> u32 {
    10
}

/// Hard limits constraining what an agent run may execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guardrails {
    /// Stored for the host application's approval surface; the run loop does
    /// not enforce it.
    #[serde(default)]
    pub require_approval: bool,
    /// Budget of *executed* tool calls per run; denied requests don't count.
    #[serde(default = "default_max_actions")]
    pub max_actions_per_run: u32,
    /// When set, tool calls carrying a board_id outside this list are denied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_board_ids: Option<Vec<String>>,
    #[serde(default)]
    pub blocked_tools: Vec<String>,
}

impl Default for Guardrails {
    fn default() -> Self {
        Self {
            require_approval: false,
            max_actions_per_run: default_max_actions(),
            allowed_board_ids: None,
            blocked_tools: Vec::new(),
        }
    }
}

/// A stored, tool-using AI persona scoped to one workspace.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub system_prompt: String,
    /// Allow-list intersected with the tool catalog at run time.
    pub tools: Vec<String>,
    pub triggers: Vec<AgentTrigger>,
    pub guardrails: Guardrails,
    pub status: EntityStatus,
}

impl AgentSpec {
    /// Agents subscribe to the bus only when at least one trigger is
    /// event-typed.
    pub fn has_event_trigger(&self) -> bool {
        self.triggers
            .iter()
            .any(|t| t.trigger_type == AgentTriggerType::Event)
    }

    pub fn matching_event_trigger(&self, event: &DomainEvent) -> Option<&AgentTrigger> {
        self.triggers.iter().find(|t| t.matches_event(event))
    }
}
