//! Guardrail enforcement for agent runs.
//!
//! Guardrail violations are never thrown: the run loop feeds the denial back
//! to the model as a synthesized error tool result and carries on.

use serde::Serialize;

use crate::domain::Guardrails;

/// Denial messages are part of the model-facing contract; the run loop sends
/// them verbatim as tool results.
pub const DENIAL_ACTION_LIMIT: &str = "Action limit reached";
pub const DENIAL_BOARD_SCOPE: &str = "Access denied";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GuardrailDecision {
    Allow,
    Deny(String),
}

#[derive(Debug, Clone)]
pub struct GuardrailEngine {
    guardrails: Guardrails,
}

impl GuardrailEngine {
    pub fn new(guardrails: Guardrails) -> Self {
        Self { guardrails }
    }

    pub fn max_actions(&self) -> u32 {
        self.guardrails.max_actions_per_run
    }

    /// Allowed tools = catalog ∩ agent allow-list − blocked tools.
    pub fn filter_allowed_tools(&self, catalog: &[String], agent_tools: &[String]) -> Vec<String> {
        catalog
            .iter()
            .filter(|name| agent_tools.iter().any(|t| t == *name))
            .filter(|name| !self.guardrails.blocked_tools.iter().any(|t| t == *name))
            .cloned()
            .collect()
    }

    /// Budget check against *executed* calls; denied requests don't count.
    pub fn evaluate_budget(&self, executed: u32) -> GuardrailDecision {
        if executed >= self.guardrails.max_actions_per_run {
            GuardrailDecision::Deny(DENIAL_ACTION_LIMIT.to_string())
        } else {
            GuardrailDecision::Allow
        }
    }

    /// Board-scope check. Only inputs that carry a `board_id` outside the
    /// allow-list are denied; inputs without one pass.
    pub fn evaluate_board_scope(&self, input: &serde_json::Value) -> GuardrailDecision {
        let Some(allowed) = &self.guardrails.allowed_board_ids else {
            return GuardrailDecision::Allow;
        };
        match input.get("board_id").and_then(|v| v.as_str()) {
            Some(board_id) if !allowed.iter().any(|b| b == board_id) => {
                GuardrailDecision::Deny(DENIAL_BOARD_SCOPE.to_string())
            }
            _ => GuardrailDecision::Allow,
        }
    }
}
