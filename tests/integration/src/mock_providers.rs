//! Mock provider backends for integration testing
//!
//! Wiremock servers that speak the MaxKB, Dify, RAGFlow and SQLBot APIs the
//! adapters call.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// SSE body with one `answer` event per fragment and a closing `done` event
pub fn answer_events(fragments: &[&str]) -> String {
    let mut body: String = fragments
        .iter()
        .map(|fragment| format!("data: {}\n\n", json!({ "answer": fragment })))
        .collect();
    body.push_str("data: {\"done\":true}\n\n");
    body
}

fn sse(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body.into())
}

/// Mock MaxKB server
pub struct MockMaxKb {
    /// Underlying server
    pub server: MockServer,
}

impl MockMaxKb {
    /// Start the mock
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mock
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Stream `fragments` for a chat from `user`
    pub async fn mock_chat(&self, user: &str, fragments: &[&str]) {
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(body_partial_json(json!({ "user_id": user })))
            .respond_with(sse(answer_events(fragments)))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Stream a raw body, possibly malformed
    pub async fn mock_chat_raw(&self, body: &str) {
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(sse(body))
            .mount(&self.server)
            .await;
    }

    /// Fail chats with a status
    pub async fn mock_chat_status(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({"message": "upstream exploded"})),
            )
            .mount(&self.server)
            .await;
    }

    /// Any listing call fails the test
    pub async fn forbid_listing(&self) {
        Mock::given(method("GET"))
            .and(path("/api/v1/conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&self.server)
            .await;
    }
}

/// Mock Dify server
pub struct MockDify {
    /// Underlying server
    pub server: MockServer,
}

impl MockDify {
    /// Start the mock
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mock
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Stream `fragments` for any chat
    pub async fn mock_chat(&self, fragments: &[&str]) {
        Mock::given(method("POST"))
            .and(path("/chat-messages"))
            .and(body_partial_json(json!({ "response_mode": "streaming" })))
            .respond_with(sse(answer_events(fragments)))
            .mount(&self.server)
            .await;
    }

    /// History of one conversation
    pub async fn mock_history(&self, conversation_id: &str, user: &str, history: Value) {
        Mock::given(method("GET"))
            .and(path("/messages"))
            .and(query_param("conversation_id", conversation_id))
            .and(query_param("user", user))
            .respond_with(ResponseTemplate::new(200).set_body_json(history))
            .mount(&self.server)
            .await;
    }

    /// History lookups fail with a status
    pub async fn mock_history_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Conversation listing for `user`
    pub async fn mock_list(&self, user: &str, listing: Value) {
        Mock::given(method("GET"))
            .and(path("/conversations"))
            .and(query_param("user", user))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing))
            .mount(&self.server)
            .await;
    }

    /// Delete answering with a status and empty body
    pub async fn mock_delete_status(&self, conversation_id: &str, status: u16) {
        Mock::given(method("DELETE"))
            .and(path(format!("/conversations/{conversation_id}")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}

/// Mock RAGFlow server
pub struct MockRagFlow {
    /// Underlying server
    pub server: MockServer,
}

impl MockRagFlow {
    /// Start the mock
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mock
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Stream plain text for a chat assistant
    pub async fn mock_chat_text(&self, chat_id: &str, text: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/api/v1/chats/{chat_id}/completions")))
            .and(body_partial_json(json!({ "stream": true })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string(text),
            )
            .mount(&self.server)
            .await;
    }

    /// Session listing of a chat assistant
    pub async fn mock_sessions(&self, chat_id: &str, listing: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/chats/{chat_id}/sessions")))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing))
            .mount(&self.server)
            .await;
    }
}

/// Mock SQLBot server
pub struct MockSqlBot {
    /// Underlying server
    pub server: MockServer,
}

impl MockSqlBot {
    /// Start the mock
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mock
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Complete JSON answer for questions to `assistant`
    pub async fn mock_question(&self, assistant: &str, answer: Value) {
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/question"))
            .and(body_partial_json(json!({ "assistant": assistant })))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer))
            .mount(&self.server)
            .await;
    }

    /// Answer after a delay
    pub async fn mock_question_delayed(&self, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/question"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"answer": "late"}))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Delete acknowledged with a JSON body
    pub async fn mock_delete(&self, conversation_id: &str, user: &str) {
        Mock::given(method("DELETE"))
            .and(path(format!("/api/v1/chat/{conversation_id}")))
            .and(query_param("user", user))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
            .expect(1)
            .mount(&self.server)
            .await;
    }
}
