//! OpenAI-compatible chat completions client.
//!
//! This vendor streams text *and* tool-call argument fragments, keyed by a
//! per-turn call index. Fragments accumulate per index and are parsed as JSON
//! only once the stream finishes; malformed JSON degrades to an empty object
//! so one bad call never destabilizes a run. Tool results travel as separate
//! `tool`-role messages.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::core::tool::ToolDescriptor;
use crate::model::traits::{ChatModelClient, DeltaHandler};
use crate::model::types::{
    ChatMessage, ModelError, StopReason, StreamChatRequest, StreamDelta, StreamOutcome,
    ToolCallRequest,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const PROVIDER_NAME: &str = "openai";

pub struct OpenAiCompatClient {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_tools(tools: &[ToolDescriptor]) -> Option<Vec<OpenAiTool>> {
        if tools.is_empty() {
            return None;
        }
        Some(
            tools
                .iter()
                .map(|d| OpenAiTool {
                    type_: "function",
                    function: OpenAiFunction {
                        name: d.name.clone(),
                        description: d.description.clone(),
                        parameters: d.input_schema.clone(),
                    },
                })
                .collect(),
        )
    }

    /// Flatten the neutral transcript into wire messages. Tool results become
    /// separate tool-role messages, one per result.
    fn build_messages(system: &str, messages: &[ChatMessage]) -> Vec<OpenAiRequestMessage> {
        let mut out = Vec::with_capacity(messages.len() + 1);
        out.push(OpenAiRequestMessage {
            role: "system",
            content: Some(system.to_string()),
            tool_calls: None,
            tool_call_id: None,
        });
        for message in messages {
            match message {
                ChatMessage::User { text } => out.push(OpenAiRequestMessage {
                    role: "user",
                    content: Some(text.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                }),
                ChatMessage::Assistant { text, tool_calls } => {
                    let calls = if tool_calls.is_empty() {
                        None
                    } else {
                        Some(
                            tool_calls
                                .iter()
                                .map(|call| OpenAiToolCallOut {
                                    id: call.id.clone(),
                                    type_: "function",
                                    function: OpenAiFunctionCallOut {
                                        name: call.name.clone(),
                                        arguments: call.input.to_string(),
                                    },
                                })
                                .collect(),
                        )
                    };
                    out.push(OpenAiRequestMessage {
                        role: "assistant",
                        content: if text.is_empty() {
                            None
                        } else {
                            Some(text.clone())
                        },
                        tool_calls: calls,
                        tool_call_id: None,
                    });
                }
                ChatMessage::ToolResults { results } => {
                    for result in results {
                        out.push(OpenAiRequestMessage {
                            role: "tool",
                            content: Some(result.content.clone()),
                            tool_calls: None,
                            tool_call_id: Some(result.call_id.clone()),
                        });
                    }
                }
            }
        }
        out
    }

    async fn post(&self, body: &OpenAiChatRequest) -> Result<reqwest::Response, ModelError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ModelError::Auth(format!(
                "{PROVIDER_NAME} auth failed ({status}). Check API key and account access."
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::Request(format!(
                "{PROVIDER_NAME} error {status}: {text}"
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatModelClient for OpenAiCompatClient {
    fn model_id(&self) -> String {
        self.model.clone()
    }

    async fn stream_chat(
        &self,
        req: &StreamChatRequest,
        on_delta: DeltaHandler<'_>,
    ) -> Result<StreamOutcome, ModelError> {
        let tools = Self::build_tools(&req.tools);
        let has_tools = tools.is_some();
        let body = OpenAiChatRequest {
            model: self.model.clone(),
            messages: Self::build_messages(&req.system_prompt, &req.messages),
            temperature: 0.1,
            max_tokens: req.max_tokens,
            stream: true,
            tools,
            tool_choice: has_tools.then(|| "auto".to_string()),
        };

        let response = self.post(&body).await?;

        let mut content = String::new();
        let mut accumulators: Vec<ToolCallAccumulator> = Vec::new();
        let mut finish_reason: Option<String> = None;

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut done = false;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| ModelError::Stream(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(newline_idx) = buffer.find('\n') {
                let mut line = buffer[..newline_idx].to_string();
                if line.ends_with('\r') {
                    line.pop();
                }
                buffer.drain(..=newline_idx);

                if process_stream_line(
                    &line,
                    &mut content,
                    &mut accumulators,
                    &mut finish_reason,
                    on_delta,
                )? {
                    done = true;
                    break;
                }
            }

            if done {
                break;
            }
        }

        if !done && !buffer.trim().is_empty() {
            let _ = process_stream_line(
                buffer.trim_end_matches('\r'),
                &mut content,
                &mut accumulators,
                &mut finish_reason,
                on_delta,
            )?;
        }

        let tool_calls = finalize_tool_calls(accumulators);
        let stop_reason = match finish_reason.as_deref() {
            Some("stop") => StopReason::EndTurn,
            Some("tool_calls") | Some("function_call") => StopReason::ToolUse,
            Some("length") => StopReason::MaxTokens,
            Some(other) => StopReason::Other(other.to_string()),
            None if !tool_calls.is_empty() => StopReason::ToolUse,
            None => StopReason::EndTurn,
        };

        Ok(StreamOutcome {
            text: content,
            tool_calls,
            stop_reason,
        })
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, ModelError> {
        let body = OpenAiChatRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAiRequestMessage {
                    role: "system",
                    content: Some(system.to_string()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                OpenAiRequestMessage {
                    role: "user",
                    content: Some(user.to_string()),
                    tool_calls: None,
                    tool_call_id: None,
                },
            ],
            temperature: 0.1,
            max_tokens,
            stream: false,
            tools: None,
            tool_choice: None,
        };

        let response = self.post(&body).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let parsed: OpenAiChatResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::InvalidResponse(format!("{PROVIDER_NAME} parse failed: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ModelError::InvalidResponse(format!(
                    "missing choices[0].message.content from {PROVIDER_NAME} response"
                ))
            })
    }
}

/// Per-index accumulator for fragmented tool-call deltas.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    pub id: String,
    pub function_name: String,
    pub arguments: String,
}

/// Process one SSE line, pushing text deltas to `on_delta` and growing the
/// per-index accumulators. Returns true on the `[DONE]` sentinel.
pub fn process_stream_line(
    line: &str,
    content: &mut String,
    accumulators: &mut Vec<ToolCallAccumulator>,
    finish_reason: &mut Option<String>,
    on_delta: DeltaHandler<'_>,
) -> Result<bool, ModelError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') || trimmed.starts_with("event:") {
        return Ok(false);
    }

    let payload = trimmed
        .strip_prefix("data:")
        .map(|s| s.trim())
        .unwrap_or(trimmed);

    if payload.is_empty() || payload == "[DONE]" {
        return Ok(payload == "[DONE]");
    }

    let chunk: OpenAiStreamChunk = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(_) => return Ok(false),
    };

    for choice in chunk.choices {
        if let Some(reason) = choice.finish_reason {
            *finish_reason = Some(reason);
        }

        let Some(delta) = choice.delta else {
            continue;
        };

        if let Some(delta_content) = delta.content {
            if !delta_content.is_empty() {
                content.push_str(&delta_content);
                on_delta(StreamDelta::Content(delta_content)).map_err(ModelError::Stream)?;
            }
        }

        if let Some(tool_calls) = delta.tool_calls {
            for call in tool_calls {
                let idx = call.index.unwrap_or(0);
                if accumulators.len() <= idx {
                    accumulators.resize_with(idx + 1, ToolCallAccumulator::default);
                }
                let entry = &mut accumulators[idx];
                if let Some(id) = call.id {
                    if !id.is_empty() {
                        entry.id = id;
                    }
                }
                if let Some(function) = call.function {
                    if let Some(name) = function.name {
                        if !name.is_empty() {
                            entry.function_name.push_str(&name);
                        }
                    }
                    if let Some(arguments) = function.arguments {
                        if !arguments.is_empty() {
                            entry.arguments.push_str(&arguments);
                        }
                    }
                }
            }
        }
    }

    Ok(false)
}

/// Parse each accumulator's argument text once the stream has ended.
/// Malformed JSON degrades to an empty object; entries that never received a
/// function name are dropped.
pub fn finalize_tool_calls(accumulators: Vec<ToolCallAccumulator>) -> Vec<ToolCallRequest> {
    accumulators
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            if entry.function_name.trim().is_empty() {
                return None;
            }
            let input = serde_json::from_str::<serde_json::Value>(&entry.arguments)
                .unwrap_or_else(|e| {
                    tracing::warn!(
                        tool = entry.function_name.as_str(),
                        "malformed tool-call arguments, degrading to empty object: {e}"
                    );
                    serde_json::json!({})
                });
            Some(ToolCallRequest {
                id: if entry.id.is_empty() {
                    format!("call_{idx}")
                } else {
                    entry.id
                },
                name: entry.function_name,
                input,
            })
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiRequestMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    type_: &'static str,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct OpenAiRequestMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCallOut>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAiToolCallOut {
    id: String,
    #[serde(rename = "type")]
    type_: &'static str,
    function: OpenAiFunctionCallOut,
}

#[derive(Debug, Serialize)]
struct OpenAiFunctionCallOut {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: Option<OpenAiStreamDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAiStreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCallDelta {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<OpenAiFunctionCallDelta>,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAiFunctionCallDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}
