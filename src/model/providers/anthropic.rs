//! Anthropic messages API client.
//!
//! This vendor streams assistant text; tool-use blocks open with an id and
//! name, accumulate `input_json_delta` fragments per block index, and the
//! fully parsed tool-call list is revealed only in the terminal result. The
//! wire format requires tool results to ride inside a user-role message, so
//! the request builder merges neutral tool-result turns (and any adjacent
//! user text) into one user message of inline blocks.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::core::tool::ToolDescriptor;
use crate::model::traits::{ChatModelClient, DeltaHandler};
use crate::model::types::{
    ChatMessage, ModelError, StopReason, StreamChatRequest, StreamDelta, StreamOutcome,
    ToolCallRequest,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const PROVIDER_NAME: &str = "anthropic";

pub struct AnthropicClient {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    fn build_tools(tools: &[ToolDescriptor]) -> Option<Vec<ApiToolDef>> {
        if tools.is_empty() {
            return None;
        }
        Some(
            tools
                .iter()
                .map(|d| ApiToolDef {
                    name: d.name.clone(),
                    description: d.description.clone(),
                    input_schema: d.input_schema.clone(),
                })
                .collect(),
        )
    }

    /// Convert the neutral transcript into API messages, merging tool-result
    /// turns and adjacent user text into single user-role block lists.
    fn build_messages(messages: &[ChatMessage]) -> Vec<ApiMessage> {
        let mut out: Vec<ApiMessage> = Vec::with_capacity(messages.len());

        fn push_user_blocks(out: &mut Vec<ApiMessage>, blocks: Vec<ApiContentBlock>) {
            if let Some(last) = out.last_mut() {
                if last.role == "user" {
                    last.content.extend(blocks);
                    return;
                }
            }
            out.push(ApiMessage {
                role: "user",
                content: blocks,
            });
        }

        for message in messages {
            match message {
                ChatMessage::User { text } => {
                    push_user_blocks(
                        &mut out,
                        vec![ApiContentBlock::Text { text: text.clone() }],
                    );
                }
                ChatMessage::Assistant { text, tool_calls } => {
                    let mut content = Vec::new();
                    if !text.is_empty() {
                        content.push(ApiContentBlock::Text { text: text.clone() });
                    }
                    for call in tool_calls {
                        content.push(ApiContentBlock::ToolUse {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            input: call.input.clone(),
                        });
                    }
                    out.push(ApiMessage {
                        role: "assistant",
                        content,
                    });
                }
                ChatMessage::ToolResults { results } => {
                    let blocks = results
                        .iter()
                        .map(|result| ApiContentBlock::ToolResult {
                            tool_use_id: result.call_id.clone(),
                            content: result.content.clone(),
                            is_error: result.is_error,
                        })
                        .collect();
                    push_user_blocks(&mut out, blocks);
                }
            }
        }
        out
    }

    async fn post(&self, body: &MessagesRequest) -> Result<reqwest::Response, ModelError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("anthropic-version", API_VERSION)
            .header("x-api-key", &self.api_key)
            .header("content-type", "application/json")
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
impl ChatModelClient for AnthropicClient {
    fn model_id(&self) -> String {
        self.model.clone()
    }

    async fn stream_chat(
        &self,
        req: &StreamChatRequest,
        on_delta: DeltaHandler<'_>,
    ) -> Result<StreamOutcome, ModelError> {
        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: req.max_tokens,
            system: req.system_prompt.clone(),
            messages: Self::build_messages(&req.messages),
            tools: Self::build_tools(&req.tools),
            stream: true,
        };

        let response = self.post(&body).await?;

        let mut text = String::new();
        let mut blocks: Vec<BlockAccumulator> = Vec::new();
        let mut stop_reason: Option<String> = None;

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut done = false;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| ModelError::Stream(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // SSE events are separated by a blank line.
            while let Some(end) = buffer.find("\n\n") {
                let event_text = buffer[..end].to_string();
                buffer.drain(..end + 2);

                match parse_sse_event(&event_text)? {
                    SseEvent::ContentBlockStart {
                        index,
                        block_type,
                        id,
                        name,
                    } => {
                        if blocks.len() <= index {
                            blocks.resize_with(index + 1, BlockAccumulator::default);
                        }
                        let entry = &mut blocks[index];
                        entry.is_tool_use = block_type == "tool_use";
                        entry.id = id.unwrap_or_default();
                        entry.name = name.unwrap_or_default();
                    }
                    SseEvent::TextDelta { delta } => {
                        text.push_str(&delta);
                        on_delta(StreamDelta::Content(delta)).map_err(ModelError::Stream)?;
                    }
                    SseEvent::InputJsonDelta {
                        index,
                        partial_json,
                    } => {
                        if blocks.len() <= index {
                            blocks.resize_with(index + 1, BlockAccumulator::default);
                        }
                        blocks[index].input_json.push_str(&partial_json);
                    }
                    SseEvent::MessageDelta {
                        stop_reason: reason,
                    } => {
                        if reason.is_some() {
                            stop_reason = reason;
                        }
                    }
                    SseEvent::MessageStop => {
                        done = true;
                    }
                    SseEvent::Error {
                        error_type,
                        message,
                    } => {
                        return Err(ModelError::Stream(format!("{error_type}: {message}")));
                    }
                    SseEvent::Ignored => {}
                }
            }

            if done {
                break;
            }
        }

        let tool_calls = finalize_tool_blocks(blocks);
        let stop_reason = match stop_reason.as_deref() {
            Some("end_turn") => StopReason::EndTurn,
            Some("tool_use") => StopReason::ToolUse,
            Some("max_tokens") => StopReason::MaxTokens,
            Some(other) => StopReason::Other(other.to_string()),
            None if !tool_calls.is_empty() => StopReason::ToolUse,
            None => StopReason::EndTurn,
        };

        Ok(StreamOutcome {
            text,
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
        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens,
            system: system.to_string(),
            messages: vec![ApiMessage {
                role: "user",
                content: vec![ApiContentBlock::Text {
                    text: user.to_string(),
                }],
            }],
            tools: None,
            stream: false,
        };

        let response = self.post(&body).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::InvalidResponse(format!("{PROVIDER_NAME} parse failed: {e}")))?;

        let combined: String = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(text),
                ResponseContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if combined.is_empty() {
            return Err(ModelError::InvalidResponse(format!(
                "no text content in {PROVIDER_NAME} response"
            )));
        }
        Ok(combined)
    }
}

/// Per-index accumulator for streamed content blocks.
#[derive(Debug, Default)]
pub struct BlockAccumulator {
    pub is_tool_use: bool,
    pub id: String,
    pub name: String,
    pub input_json: String,
}

/// Parse accumulated tool-use blocks once the stream has ended, in index
/// order. An empty fragment buffer means a no-argument call; malformed JSON
/// degrades to an empty object.
pub fn finalize_tool_blocks(blocks: Vec<BlockAccumulator>) -> Vec<ToolCallRequest> {
    blocks
        .into_iter()
        .filter(|b| b.is_tool_use && !b.name.is_empty())
        .map(|b| {
            let input = if b.input_json.trim().is_empty() {
                serde_json::json!({})
            } else {
                serde_json::from_str(&b.input_json).unwrap_or_else(|e| {
                    tracing::warn!(
                        tool = b.name.as_str(),
                        "malformed tool-use input json, degrading to empty object: {e}"
                    );
                    serde_json::json!({})
                })
            };
            ToolCallRequest {
                id: b.id,
                name: b.name,
                input,
            }
        })
        .collect()
}

/// Events the stream consumer cares about; everything else is `Ignored`.
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    ContentBlockStart {
        index: usize,
        block_type: String,
        id: Option<String>,
        name: Option<String>,
    },
    TextDelta {
        delta: String,
    },
    InputJsonDelta {
        index: usize,
        partial_json: String,
    },
    MessageDelta {
        stop_reason: Option<String>,
    },
    MessageStop,
    Error {
        error_type: String,
        message: String,
    },
    Ignored,
}

/// Parse a single SSE event block (`event:`/`data:` lines).
pub fn parse_sse_event(event_text: &str) -> Result<SseEvent, ModelError> {
    let mut event_type = None;
    let mut data = None;

    for line in event_text.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            event_type = Some(value.trim());
        } else if let Some(value) = line.strip_prefix("data:") {
            data = Some(value.trim());
        }
    }

    let Some(event_type) = event_type else {
        return Ok(SseEvent::Ignored);
    };

    fn parse_data<T: serde::de::DeserializeOwned>(
        event_type: &str,
        data: Option<&str>,
    ) -> Result<T, ModelError> {
        let data = data.ok_or_else(|| {
            ModelError::InvalidResponse(format!("missing data for {event_type} event"))
        })?;
        serde_json::from_str(data)
            .map_err(|e| ModelError::InvalidResponse(format!("failed to parse {event_type}: {e}")))
    }

    match event_type {
        "content_block_start" => {
            let parsed: SseContentBlockStart = parse_data(event_type, data)?;
            Ok(SseEvent::ContentBlockStart {
                index: parsed.index,
                block_type: parsed.content_block.block_type,
                id: parsed.content_block.id,
                name: parsed.content_block.name,
            })
        }
        "content_block_delta" => {
            let parsed: SseContentBlockDelta = parse_data(event_type, data)?;
            match parsed.delta.delta_type.as_str() {
                "text_delta" => Ok(SseEvent::TextDelta {
                    delta: parsed.delta.text.unwrap_or_default(),
                }),
                "input_json_delta" => Ok(SseEvent::InputJsonDelta {
                    index: parsed.index,
                    partial_json: parsed.delta.partial_json.unwrap_or_default(),
                }),
                _ => Ok(SseEvent::Ignored),
            }
        }
        "message_delta" => {
            let parsed: SseMessageDelta = parse_data(event_type, data)?;
            Ok(SseEvent::MessageDelta {
                stop_reason: parsed.delta.stop_reason,
            })
        }
        "message_stop" => Ok(SseEvent::MessageStop),
        "error" => {
            let parsed: SseError = parse_data(event_type, data)?;
            Ok(SseEvent::Error {
                error_type: parsed.error.error_type,
                message: parsed.error.message,
            })
        }
        // message_start, content_block_stop, ping and future event kinds
        // carry nothing the accumulator needs.
        _ => Ok(SseEvent::Ignored),
    }
}

// === SSE response structures ===

#[derive(Debug, Deserialize)]
struct SseContentBlockStart {
    index: usize,
    content_block: SseContentBlock,
}

#[derive(Debug, Deserialize)]
struct SseContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SseContentBlockDelta {
    index: usize,
    delta: SseDelta,
}

#[derive(Debug, Deserialize)]
struct SseDelta {
    #[serde(rename = "type")]
    delta_type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    partial_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SseMessageDelta {
    delta: SseMessageDeltaInner,
}

#[derive(Debug, Deserialize)]
struct SseMessageDeltaInner {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SseError {
    error: SseErrorInfo,
}

#[derive(Debug, Deserialize)]
struct SseErrorInfo {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

// === Request/response types ===

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ApiToolDef>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: Vec<ApiContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct ApiToolDef {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
