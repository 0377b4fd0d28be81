//! Vendor adapter wire tests against a mock HTTP server.

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::model::providers::anthropic::AnthropicClient;
use crate::model::providers::openai_compat::{
    finalize_tool_calls, process_stream_line, OpenAiCompatClient, ToolCallAccumulator,
};
use crate::model::{
    ChatMessage, ChatModelClient, ModelError, StopReason, StreamChatRequest, StreamDelta,
};

fn chat_request(text: &str) -> StreamChatRequest {
    StreamChatRequest {
        system_prompt: "You are a board assistant.".to_string(),
        messages: vec![ChatMessage::User {
            text: text.to_string(),
        }],
        tools: Vec::new(),
        max_tokens: 512,
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible adapter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn openai_stream_reassembles_fragmented_tool_calls() {
    let server = MockServer::start_async().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Let me \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"check.\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_9\",\"function\":{\"name\":\"get_board\",\"arguments\":\"\"}}]}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"board_id\\\":\"}}]}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"b1\\\"}\"}}]}}]}\n\n",
        "data: {\"choices\":[{\"finish_reason\":\"tool_calls\"}]}\n\n",
        "data: [DONE]\n\n",
    );
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(body);
        })
        .await;

    let client = OpenAiCompatClient::new(
        "test-key".to_string(),
        "gpt-4.1".to_string(),
        Some(server.base_url()),
    );

    let mut deltas = Vec::new();
    let outcome = client
        .stream_chat(&chat_request("look at b1"), &mut |delta| {
            let StreamDelta::Content(text) = delta;
            deltas.push(text);
            Ok(())
        })
        .await
        .unwrap();

    mock.assert_async().await;
    // Deltas were observable before the terminal result, in order.
    assert_eq!(deltas, vec!["Let me ".to_string(), "check.".to_string()]);
    assert_eq!(outcome.text, "Let me check.");
    assert_eq!(outcome.stop_reason, StopReason::ToolUse);
    assert_eq!(outcome.tool_calls.len(), 1);
    assert_eq!(outcome.tool_calls[0].id, "call_9");
    assert_eq!(outcome.tool_calls[0].name, "get_board");
    assert_eq!(outcome.tool_calls[0].input, json!({ "board_id": "b1" }));
}

#[tokio::test]
async fn openai_malformed_arguments_degrade_to_empty_object() {
    let server = MockServer::start_async().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"c1\",\"function\":{\"name\":\"get_board\",\"arguments\":\"{oops\"}}]}}]}\n\n",
        "data: {\"choices\":[{\"finish_reason\":\"tool_calls\"}]}\n\n",
        "data: [DONE]\n\n",
    );
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(body);
        })
        .await;

    let client = OpenAiCompatClient::new(
        "test-key".to_string(),
        "gpt-4.1".to_string(),
        Some(server.base_url()),
    );
    let outcome = client
        .stream_chat(&chat_request("go"), &mut |_| Ok(()))
        .await
        .unwrap();

    assert_eq!(outcome.tool_calls.len(), 1);
    assert_eq!(outcome.tool_calls[0].input, json!({}));
}

#[test]
fn fragment_reassembly_is_byte_identical_under_any_split() {
    let args = r#"{"board_id":"b1","filter":{"status":"done","limit":42}}"#;

    for split in 0..=args.len() {
        let (first, second) = args.split_at(split);
        let mut content = String::new();
        let mut accumulators: Vec<ToolCallAccumulator> = Vec::new();
        let mut finish_reason = None;
        let mut sink = |_delta: StreamDelta| -> Result<(), String> { Ok(()) };

        let head = json!({
            "choices": [{ "delta": { "tool_calls": [
                { "index": 0, "id": "c1", "function": { "name": "get_board", "arguments": first } }
            ]}}]
        });
        let tail = json!({
            "choices": [{ "delta": { "tool_calls": [
                { "index": 0, "function": { "arguments": second } }
            ]}}]
        });

        for chunk in [head, tail] {
            process_stream_line(
                &format!("data: {chunk}"),
                &mut content,
                &mut accumulators,
                &mut finish_reason,
                &mut sink,
            )
            .unwrap();
        }

        assert_eq!(accumulators.len(), 1);
        assert_eq!(accumulators[0].arguments, args, "split at byte {split}");

        let calls = finalize_tool_calls(accumulators);
        assert_eq!(
            calls[0].input,
            json!({ "board_id": "b1", "filter": { "status": "done", "limit": 42 } })
        );
    }
}

#[tokio::test]
async fn openai_complete_returns_plain_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .json_body(json!({ "choices": [{ "message": { "content": "Hello." } }] }));
        })
        .await;

    let client = OpenAiCompatClient::new(
        "test-key".to_string(),
        "gpt-4.1".to_string(),
        Some(server.base_url()),
    );
    let text = client.complete("system", "say hello", 64).await.unwrap();
    assert_eq!(text, "Hello.");
}

#[tokio::test]
async fn openai_auth_failures_surface_as_auth_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401).body("{\"error\":\"bad key\"}");
        })
        .await;

    let client = OpenAiCompatClient::new(
        "bad-key".to_string(),
        "gpt-4.1".to_string(),
        Some(server.base_url()),
    );
    let err = client
        .stream_chat(&chat_request("hi"), &mut |_| Ok(()))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Auth(_)));
}

// ---------------------------------------------------------------------------
// Anthropic adapter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anthropic_stream_parses_text_and_tool_use_blocks() {
    let server = MockServer::start_async().await;
    let body = concat!(
        "event: message_start\n",
        "data: {\"type\":\"message_start\",\"message\":{\"model\":\"claude-sonnet-4-5\"}}\n\n",
        "event: content_block_start\n",
        "data: {\"index\":0,\"content_block\":{\"type\":\"text\"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Working\"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" on it\"}}\n\n",
        "event: content_block_stop\n",
        "data: {\"index\":0}\n\n",
        "event: content_block_start\n",
        "data: {\"index\":1,\"content_block\":{\"type\":\"tool_use\",\"id\":\"toolu_1\",\"name\":\"get_board\"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"index\":1,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\\\"board\"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"index\":1,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"_id\\\":\\\"b1\\\"}\"}}\n\n",
        "event: content_block_stop\n",
        "data: {\"index\":1}\n\n",
        "event: message_delta\n",
        "data: {\"delta\":{\"stop_reason\":\"tool_use\"}}\n\n",
        "event: message_stop\n",
        "data: {}\n\n",
    );
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(body);
        })
        .await;

    let client = AnthropicClient::new(
        "test-key".to_string(),
        "claude-sonnet-4-5".to_string(),
        Some(server.base_url()),
    );

    let mut deltas = Vec::new();
    let outcome = client
        .stream_chat(&chat_request("look at b1"), &mut |delta| {
            let StreamDelta::Content(text) = delta;
            deltas.push(text);
            Ok(())
        })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(deltas, vec!["Working".to_string(), " on it".to_string()]);
    assert_eq!(outcome.text, "Working on it");
    assert_eq!(outcome.stop_reason, StopReason::ToolUse);
    assert_eq!(outcome.tool_calls.len(), 1);
    assert_eq!(outcome.tool_calls[0].id, "toolu_1");
    assert_eq!(outcome.tool_calls[0].input, json!({ "board_id": "b1" }));
}

#[tokio::test]
async fn anthropic_end_turn_with_no_tools_terminates_cleanly() {
    let server = MockServer::start_async().await;
    let body = concat!(
        "event: content_block_start\n",
        "data: {\"index\":0,\"content_block\":{\"type\":\"text\"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Done.\"}}\n\n",
        "event: message_delta\n",
        "data: {\"delta\":{\"stop_reason\":\"end_turn\"}}\n\n",
        "event: message_stop\n",
        "data: {}\n\n",
    );
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(body);
        })
        .await;

    let client = AnthropicClient::new(
        "test-key".to_string(),
        "claude-sonnet-4-5".to_string(),
        Some(server.base_url()),
    );
    let outcome = client
        .stream_chat(&chat_request("hi"), &mut |_| Ok(()))
        .await
        .unwrap();

    assert_eq!(outcome.text, "Done.");
    assert_eq!(outcome.stop_reason, StopReason::EndTurn);
    assert!(outcome.tool_calls.is_empty());
}

#[tokio::test]
async fn anthropic_mid_stream_error_event_fails_the_call() {
    let server = MockServer::start_async().await;
    let body = concat!(
        "event: error\n",
        "data: {\"error\":{\"type\":\"overloaded_error\",\"message\":\"try later\"}}\n\n",
    );
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(body);
        })
        .await;

    let client = AnthropicClient::new(
        "test-key".to_string(),
        "claude-sonnet-4-5".to_string(),
        Some(server.base_url()),
    );
    let err = client
        .stream_chat(&chat_request("hi"), &mut |_| Ok(()))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Stream(_)));
}

#[tokio::test]
async fn anthropic_complete_concatenates_text_blocks() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(200).json_body(json!({
                "content": [
                    { "type": "text", "text": "Hello" },
                    { "type": "text", "text": " board" }
                ]
            }));
        })
        .await;

    let client = AnthropicClient::new(
        "test-key".to_string(),
        "claude-sonnet-4-5".to_string(),
        Some(server.base_url()),
    );
    let text = client.complete("system", "say hello", 64).await.unwrap();
    assert_eq!(text, "Hello board");
}
