//! Agent run loop.
//!
//! Drives one run through `queued → running → {completed | failed}`. The
//! queued state is transient bookkeeping: only the creation write and the
//! terminal write touch the database. Guardrail denials are synthesized tool
//! results, never errors; tool failures are captured and fed back; provider
//! and persistence failures are fatal to the run but still leave an
//! inspectable record with whatever transcript accumulated.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::boards::{Boards, Messenger};
use crate::db::{queries, Database};
use crate::domain::AgentSpec;
use crate::model::{
    ChatMessage, ProviderRegistry, StopReason, StreamChatRequest, StreamDelta, ToolResultPayload,
};
use crate::policy::{GuardrailDecision, GuardrailEngine};
use crate::tools::{ToolContext, ToolRegistry};

/// Hard cap on provider round-trips per run. The action budget bounds
/// executed calls, but a model that keeps requesting denied actions would
/// otherwise loop indefinitely.
const MAX_ROUNDS: u32 = 32;
const AGENT_MAX_TOKENS: u32 = 4096;
const DEFAULT_RUN_PROMPT: &str = "Act on your system prompt.";

/// One executed tool call, as persisted on the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: String,
    pub tool_name: String,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub timestamp: String,
}

pub struct AgentRunner {
    db: Arc<Database>,
    tools: Arc<ToolRegistry>,
    providers: Arc<ProviderRegistry>,
    boards: Arc<dyn Boards>,
    messenger: Arc<dyn Messenger>,
}

impl AgentRunner {
    pub fn new(
        db: Arc<Database>,
        tools: Arc<ToolRegistry>,
        providers: Arc<ProviderRegistry>,
        boards: Arc<dyn Boards>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            db,
            tools,
            providers,
            boards,
            messenger,
        }
    }

    /// Drive an already-created (queued) run to its terminal state. Always
    /// persists exactly one terminal write, even on failure.
    pub async fn execute(
        &self,
        agent: &AgentSpec,
        run_id: &str,
        prompt: Option<String>,
        actor_id: &str,
    ) {
        let mut transcript: Vec<ChatMessage> = Vec::new();
        let mut tool_log: Vec<ToolCallRecord> = Vec::new();

        let result = self
            .run_loop(agent, actor_id, prompt, &mut transcript, &mut tool_log)
            .await;

        let (status, error) = match &result {
            Ok(()) => ("completed", None),
            Err(e) => {
                tracing::warn!(run_id, agent_id = agent.id.as_str(), "agent run failed: {e}");
                ("failed", Some(e.as_str()))
            }
        };

        let messages_json = serde_json::to_string(&transcript).unwrap_or_else(|_| "[]".to_string());
        let tool_calls_json = serde_json::to_string(&tool_log).unwrap_or_else(|_| "[]".to_string());
        let finished_at = Utc::now().to_rfc3339();

        if let Err(e) = queries::finish_agent_run(
            &self.db,
            run_id,
            status,
            &messages_json,
            &tool_calls_json,
            error,
            &finished_at,
        ) {
            tracing::error!(run_id, "failed to persist agent run terminal state: {e}");
        }
    }

    async fn run_loop(
        &self,
        agent: &AgentSpec,
        actor_id: &str,
        prompt: Option<String>,
        transcript: &mut Vec<ChatMessage>,
        tool_log: &mut Vec<ToolCallRecord>,
    ) -> Result<(), String> {
        let guardrails = GuardrailEngine::new(agent.guardrails.clone());
        let allowed = guardrails.filter_allowed_tools(&self.tools.names(), &agent.tools);
        let descriptors = self.tools.descriptors_for(&allowed);

        // Configuration errors fail fast, before any provider traffic.
        let client = self.providers.resolve_default().map_err(|e| e.to_string())?;

        let ctx = ToolContext {
            actor_id: actor_id.to_string(),
            workspace_id: agent.workspace_id.clone(),
            boards: self.boards.clone(),
            messenger: self.messenger.clone(),
        };

        transcript.push(ChatMessage::User {
            text: prompt.unwrap_or_else(|| DEFAULT_RUN_PROMPT.to_string()),
        });

        let mut cumulative_text = String::new();
        let mut executed: u32 = 0;
        let mut rounds: u32 = 0;

        loop {
            rounds += 1;
            if rounds > MAX_ROUNDS {
                return Err(format!("round cap of {MAX_ROUNDS} provider calls exceeded"));
            }

            let request = StreamChatRequest {
                system_prompt: agent.system_prompt.clone(),
                messages: transcript.clone(),
                tools: descriptors.clone(),
                max_tokens: AGENT_MAX_TOKENS,
            };

            let mut turn_text = String::new();
            let outcome = client
                .stream_chat(&request, &mut |delta| {
                    let StreamDelta::Content(text) = delta;
                    turn_text.push_str(&text);
                    cumulative_text.push_str(&text);
                    Ok(())
                })
                .await
                .map_err(|e| e.to_string())?;

            // The only clean termination path.
            if outcome.stop_reason == StopReason::EndTurn || outcome.tool_calls.is_empty() {
                break;
            }

            transcript.push(ChatMessage::Assistant {
                text: turn_text,
                tool_calls: outcome.tool_calls.clone(),
            });

            let mut results = Vec::with_capacity(outcome.tool_calls.len());
            for call in &outcome.tool_calls {
                if let GuardrailDecision::Deny(reason) = guardrails.evaluate_budget(executed) {
                    results.push(ToolResultPayload {
                        call_id: call.id.clone(),
                        content: reason,
                        is_error: true,
                    });
                    continue;
                }
                if let GuardrailDecision::Deny(reason) = guardrails.evaluate_board_scope(&call.input)
                {
                    results.push(ToolResultPayload {
                        call_id: call.id.clone(),
                        content: reason,
                        is_error: true,
                    });
                    continue;
                }

                let (output, is_error) =
                    match self.tools.invoke(&call.name, &ctx, call.input.clone()).await {
                        Ok(output) => (output, false),
                        Err(e) => (serde_json::json!({ "error": e.to_string() }), true),
                    };
                executed += 1;
                tool_log.push(ToolCallRecord {
                    id: call.id.clone(),
                    tool_name: call.name.clone(),
                    input: call.input.clone(),
                    output: output.clone(),
                    timestamp: Utc::now().to_rfc3339(),
                });
                results.push(ToolResultPayload {
                    call_id: call.id.clone(),
                    content: output.to_string(),
                    is_error,
                });
            }

            transcript.push(ChatMessage::ToolResults { results });

            // Budget hit mid-round: finish the round, never start another
            // provider call.
            if executed >= guardrails.max_actions() {
                break;
            }
        }

        transcript.push(ChatMessage::Assistant {
            text: cumulative_text,
            tool_calls: Vec::new(),
        });
        Ok(())
    }
}
