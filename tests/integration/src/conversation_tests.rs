//! Conversation management integration tests

use crate::helpers::*;
use crate::mock_providers::*;
use gateway_config::config::{DIFY, MAXKB, RAGFLOW, SQLBOT};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_history_is_passed_through() {
    let dify = MockDify::start().await;
    let history = json!({"data": [{"query": "hi", "answer": "hello"}], "has_more": false});
    dify.mock_history("conv-1", TEST_USER, history.clone()).await;
    let gateway = TestGateway::start(config_with(&[(DIFY, &dify.url())])).await;

    let response = gateway.get("/conversations/dify:app/conv-1/history").await;

    assert_status(&response, 200);
    assert_eq!(json_body(response).await, history);
}

#[tokio::test]
async fn test_listing_maps_conversations() {
    let dify = MockDify::start().await;
    dify.mock_list(
        TEST_USER,
        json!({"data": [{"id": "c-1", "name": "Trip plans"}, {"name": "no id"}]}),
    )
    .await;
    let gateway = TestGateway::start(config_with(&[(DIFY, &dify.url())])).await;

    let response = gateway.get("/conversations/dify:app").await;

    assert_status(&response, 200);
    assert_eq!(
        json_body(response).await,
        json!([{
            "id": "c-1",
            "userId": TEST_USER,
            "assistantId": "dify:app",
            "metadata": {"name": "Trip plans"}
        }])
    );
}

#[tokio::test]
async fn test_ragflow_sessions_listing() {
    let ragflow = MockRagFlow::start().await;
    ragflow
        .mock_sessions("kb-7", json!({"code": 0, "data": [{"id": "s-1"}, {"id": "s-2"}]}))
        .await;
    let gateway = TestGateway::start(config_with(&[(RAGFLOW, &ragflow.url())])).await;

    let response = gateway.get("/conversations/ragflow:kb-7").await;

    let body = json_body(response).await;
    let ids: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|conversation| conversation["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("s-1"), json!("s-2")]);
}

/// MaxKB listing is always empty and never reaches the backend
#[tokio::test]
async fn test_maxkb_listing_is_empty() {
    let maxkb = MockMaxKb::start().await;
    maxkb.forbid_listing().await;
    let gateway = TestGateway::start(config_with(&[(MAXKB, &maxkb.url())])).await;

    let response = gateway.get("/conversations/maxkb:app-1").await;

    assert_status(&response, 200);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_delete_forwards_user() {
    let sqlbot = MockSqlBot::start().await;
    sqlbot.mock_delete("c-3", TEST_USER).await;
    let gateway = TestGateway::start(config_with(&[(SQLBOT, &sqlbot.url())])).await;

    let response = gateway.delete("/conversations/sqlbot:sales/c-3").await;

    assert_status(&response, 200);
    assert_eq!(json_body(response).await, json!({"code": 0}));
}

/// Deleting a conversation the provider no longer knows still succeeds
#[tokio::test]
async fn test_delete_missing_conversation_is_idempotent() {
    let dify = MockDify::start().await;
    dify.mock_delete_status("gone", 404).await;
    let gateway = TestGateway::start(config_with(&[(DIFY, &dify.url())])).await;

    let first = gateway.delete("/conversations/dify:app/gone").await;
    let second = gateway.delete("/conversations/dify:app/gone").await;

    assert_status(&first, 200);
    assert_status(&second, 200);
    assert_eq!(json_body(second).await, json!({"status": 404}));
}

#[tokio::test]
async fn test_delete_server_error_is_reported() {
    let dify = MockDify::start().await;
    dify.mock_delete_status("c-9", 500).await;
    let gateway = TestGateway::start(config_with(&[(DIFY, &dify.url())])).await;

    let response = gateway.delete("/conversations/dify:app/c-9").await;

    assert_status(&response, 500);
}

/// Percent-encoded slashes in a conversation id stay inside that id upstream
#[tokio::test]
async fn test_conversation_id_cannot_reach_other_endpoints() {
    let sqlbot = MockSqlBot::start().await;
    let gateway = TestGateway::start(config_with(&[(SQLBOT, &sqlbot.url())])).await;

    let response = gateway
        .delete("/conversations/sqlbot:sales/..%2F..%2F..%2Fadmin%2Fusers")
        .await;
    // unmatched requests get 404 from the mock, which delete acknowledges
    assert_status(&response, 200);

    let received = sqlbot.server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0].url.path(),
        "/api/v1/chat/..%2F..%2F..%2Fadmin%2Fusers"
    );
}
