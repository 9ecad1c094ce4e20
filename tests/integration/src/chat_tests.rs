//! Chat integration tests
//!
//! Streaming through the normalizer, non-streaming passthrough and error
//! mapping for provider failures.

use crate::helpers::*;
use crate::mock_providers::*;
use gateway_config::config::{DIFY, MAXKB, RAGFLOW, SQLBOT};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

/// MaxKB answers are re-framed as text events ending in `done`
#[tokio::test]
async fn test_maxkb_streaming_chat() {
    let maxkb = MockMaxKb::start().await;
    maxkb.mock_chat(TEST_USER, &["Hel", "lo"]).await;
    let gateway = TestGateway::start(config_with(&[(MAXKB, &maxkb.url())])).await;

    let response = gateway
        .chat(&json!({"message": "hi", "assistantId": "maxkb:app-1"}))
        .await;

    assert_status(&response, 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    assert_eq!(
        sse_events(response).await,
        vec![json!({"text": "Hel"}), json!({"text": "lo"}), json!({"done": true})]
    );
}

/// Dify streams use the same event format as MaxKB
#[tokio::test]
async fn test_dify_streaming_chat() {
    let dify = MockDify::start().await;
    dify.mock_chat(&["Bonjour"]).await;
    let gateway = TestGateway::start(config_with(&[(DIFY, &dify.url())])).await;

    let response = gateway
        .chat(&json!({"message": "salut", "assistantId": "dify:app"}))
        .await;

    assert_eq!(
        sse_events(response).await,
        vec![json!({"text": "Bonjour"}), json!({"done": true})]
    );
}

/// RAGFlow sends plain text; the gateway closes the stream itself
#[tokio::test]
async fn test_ragflow_raw_text_chat() {
    let ragflow = MockRagFlow::start().await;
    ragflow.mock_chat_text("kb-7", "The answer is 42").await;
    let gateway = TestGateway::start(config_with(&[(RAGFLOW, &ragflow.url())])).await;

    let response = gateway
        .chat(&json!({"message": "question", "assistantId": "ragflow:kb-7"}))
        .await;

    let events = sse_events(response).await;
    assert_eq!(events.last(), Some(&json!({"done": true})));
    let text: String = events
        .iter()
        .filter_map(|event| event["text"].as_str())
        .collect();
    assert_eq!(text, "The answer is 42");
}

/// A malformed event ends the stream with one error event
#[tokio::test]
async fn test_malformed_event_terminates_stream() {
    let maxkb = MockMaxKb::start().await;
    maxkb
        .mock_chat_raw("data: {\"answer\":\"ok\"}\n\ndata: {\"answer\":5}\n\ndata: {\"answer\":\"lost\"}\n\n")
        .await;
    let gateway = TestGateway::start(config_with(&[(MAXKB, &maxkb.url())])).await;

    let response = gateway
        .chat(&json!({"message": "hi", "assistantId": "maxkb:1"}))
        .await;

    assert_eq!(
        sse_events(response).await,
        vec![json!({"text": "ok"}), json!({"error": "stream processing error"})]
    );
}

/// A stream that just stops still gets exactly one `done`
#[tokio::test]
async fn test_stream_without_done_is_closed() {
    let maxkb = MockMaxKb::start().await;
    maxkb.mock_chat_raw("data: {\"answer\":\"partial\"}\n\n").await;
    let gateway = TestGateway::start(config_with(&[(MAXKB, &maxkb.url())])).await;

    let response = gateway
        .chat(&json!({"message": "hi", "assistantId": "maxkb:1"}))
        .await;

    assert_eq!(
        sse_events(response).await,
        vec![json!({"text": "partial"}), json!({"done": true})]
    );
}

/// SQLBot answers are returned as plain JSON
#[tokio::test]
async fn test_sqlbot_complete_chat() {
    let sqlbot = MockSqlBot::start().await;
    sqlbot
        .mock_question("sales", json!({"sql": "SELECT count(*) FROM orders", "rows": [[12]]}))
        .await;
    let gateway = TestGateway::start(config_with(&[(SQLBOT, &sqlbot.url())])).await;

    let response = gateway
        .chat(&json!({"message": "how many orders?", "assistantId": "sqlbot:sales"}))
        .await;

    assert_status(&response, 200);
    let body = json_body(response).await;
    assert_eq!(body["rows"], json!([[12]]));
}

/// Upstream failures surface as a generic 500
#[tokio::test]
async fn test_provider_error_is_internal_error() {
    let maxkb = MockMaxKb::start().await;
    maxkb.mock_chat_status(502).await;
    let gateway = TestGateway::start(config_with(&[(MAXKB, &maxkb.url())])).await;

    let response = gateway
        .chat(&json!({"message": "hi", "assistantId": "maxkb:1"}))
        .await;

    assert_status(&response, 500);
    let body = json_body(response).await;
    assert_eq!(body, json!({"error": "provider request failed"}));
}

/// Slow providers hit the configured call timeout
#[tokio::test]
async fn test_provider_timeout_is_internal_error() {
    let sqlbot = MockSqlBot::start().await;
    sqlbot.mock_question_delayed(Duration::from_secs(5)).await;
    let gateway = TestGateway::start(config_with(&[(SQLBOT, &sqlbot.url())])).await;

    let response = gateway
        .chat(&json!({"message": "hi", "assistantId": "sqlbot:x"}))
        .await;

    assert_status(&response, 500);
}

/// History lookup failures never block the chat itself
#[tokio::test]
async fn test_history_failure_is_not_fatal() {
    let dify = MockDify::start().await;
    dify.mock_history_status(500).await;
    dify.mock_chat(&["still here"]).await;
    let gateway = TestGateway::start(config_with(&[(DIFY, &dify.url())])).await;

    let response = gateway
        .chat(&json!({
            "message": "follow-up",
            "assistantId": "dify:app",
            "conversationId": "conv-1"
        }))
        .await;

    assert_status(&response, 200);
    assert_eq!(
        sse_events(response).await,
        vec![json!({"text": "still here"}), json!({"done": true})]
    );
}
