//! Routing integration tests
//!
//! Assistant ids are dispatched on their provider tag; anything the registry
//! does not know is rejected before any provider is called.

use crate::helpers::*;
use crate::mock_providers::*;
use gateway_config::config::{DIFY, MAXKB, SQLBOT};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_unknown_provider_rejected() {
    let gateway = TestGateway::start(empty_config()).await;

    let response = gateway
        .chat(&json!({"message": "hi", "assistantId": "demo:1"}))
        .await;

    assert_status(&response, 400);
    assert_eq!(
        json_body(response).await,
        json!({"error": "unsupported assistant type: demo:1"})
    );
}

/// A known tag whose provider is disabled is as unknown as any other
#[tokio::test]
async fn test_disabled_provider_rejected() {
    let sqlbot = MockSqlBot::start().await;
    let gateway = TestGateway::start(config_with(&[(SQLBOT, &sqlbot.url())])).await;

    let response = gateway
        .chat(&json!({"message": "hi", "assistantId": "maxkb:1"}))
        .await;

    assert_status(&response, 400);
    assert!(sqlbot.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_assistant_without_tag_rejected() {
    let gateway = TestGateway::start(empty_config()).await;

    for assistant_id in ["plain", ":nothing"] {
        let response = gateway
            .chat(&json!({"message": "hi", "assistantId": assistant_id}))
            .await;
        assert_status(&response, 400);
    }
}

#[tokio::test]
async fn test_missing_message_rejected() {
    let gateway = TestGateway::start(empty_config()).await;

    let response = gateway.chat(&json!({"assistantId": "maxkb:1"})).await;

    assert_status(&response, 400);
}

/// Each assistant only reaches its own backend
#[tokio::test]
async fn test_dispatch_by_prefix() {
    let maxkb = MockMaxKb::start().await;
    let dify = MockDify::start().await;
    maxkb.mock_chat(TEST_USER, &["from maxkb"]).await;
    dify.mock_chat(&["from dify"]).await;
    let gateway = TestGateway::start(config_with(&[
        (MAXKB, &maxkb.url()),
        (DIFY, &dify.url()),
    ]))
    .await;

    let response = gateway
        .chat(&json!({"message": "hi", "assistantId": "dify:app"}))
        .await;
    assert_eq!(sse_events(response).await[0], json!({"text": "from dify"}));

    let response = gateway
        .chat(&json!({"message": "hi", "assistantId": "maxkb:app"}))
        .await;
    assert_eq!(sse_events(response).await[0], json!({"text": "from maxkb"}));
}

#[tokio::test]
async fn test_providers_endpoint_lists_enabled() {
    let maxkb = MockMaxKb::start().await;
    let sqlbot = MockSqlBot::start().await;
    let gateway = TestGateway::start(config_with(&[
        (MAXKB, &maxkb.url()),
        (SQLBOT, &sqlbot.url()),
    ]))
    .await;

    let response = gateway.get("/providers").await;

    assert_eq!(
        json_body(response).await,
        json!([
            {"tag": "maxkb", "listing": "always_empty"},
            {"tag": "sqlbot", "listing": "query"}
        ])
    );
}

#[tokio::test]
async fn test_health_and_readiness() {
    let gateway = TestGateway::start(empty_config()).await;

    assert_status(&gateway.get("/health").await, 200);
    assert_status(&gateway.get("/ready").await, 503);
}
