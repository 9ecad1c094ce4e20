//! Test helper utilities for integration tests

use gateway_config::GatewayConfig;
use gateway_providers::ProviderRegistry;
use gateway_routing::AssistantRouter;
use gateway_server::{AppState, Server, ServerConfig};
use reqwest::{Client, Response};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// User id sent by the helper requests through the trusted header
pub const TEST_USER: &str = "user-42";

static TRACING: OnceLock<()> = OnceLock::new();

/// Initialize tracing for tests (only once, and only with `TEST_LOG` set)
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        if std::env::var("TEST_LOG").is_ok() {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        }
    });
}

/// Configuration with every provider disabled
pub fn empty_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.providers.maxkb.enabled = false;
    config.providers.dify.enabled = false;
    config.providers.ragflow.enabled = false;
    config.providers.sqlbot.enabled = false;
    config
}

/// Configuration enabling only the given providers, each pointed at a base URL
pub fn config_with(backends: &[(&str, &str)]) -> GatewayConfig {
    let mut config = empty_config();
    for (tag, base_url) in backends {
        let settings = config
            .providers
            .get_mut(tag)
            .unwrap_or_else(|| panic!("unknown provider tag {tag}"));
        settings.enabled = true;
        settings.base_url = Some((*base_url).to_string());
        settings.timeout = Duration::from_secs(2);
    }
    config
}

/// A running gateway bound to an ephemeral port
pub struct TestGateway {
    /// The server address
    pub addr: SocketAddr,
    /// HTTP client for making requests
    pub client: Client,
    /// Base URL for the server
    pub base_url: String,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestGateway {
    /// Start the full gateway stack for a configuration
    pub async fn start(config: GatewayConfig) -> Self {
        init_tracing();

        let registry = ProviderRegistry::from_config(&config.providers).expect("registry");
        let server_config = ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            shutdown_timeout: Duration::from_secs(1),
        };
        let state = AppState::builder()
            .config(config)
            .router(AssistantRouter::new(registry))
            .build()
            .expect("state");

        let listener = TcpListener::bind(&server_config.bind_address)
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            Server::new(server_config, state)
                .serve(listener, async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create client");

        Self {
            addr,
            client,
            base_url: format!("http://{addr}"),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the full URL for a path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET as [`TEST_USER`]
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("x-user-id", TEST_USER)
            .send()
            .await
            .expect("Request failed")
    }

    /// DELETE as [`TEST_USER`]
    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .header("x-user-id", TEST_USER)
            .send()
            .await
            .expect("Request failed")
    }

    /// POST /chat as [`TEST_USER`]
    pub async fn chat(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/chat"))
            .header("x-user-id", TEST_USER)
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    /// Shutdown the gateway
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Read an SSE response to the end and return its `data:` payloads as JSON
pub async fn sse_events(response: Response) -> Vec<Value> {
    let body = response.text().await.expect("Failed to read body");
    body.split("\n\n")
        .filter_map(|frame| frame.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("event is JSON"))
        .collect()
}

/// Parse response body as JSON
pub async fn json_body(response: Response) -> Value {
    response.json().await.expect("Failed to parse JSON")
}

/// Assert that a response has the expected status code
pub fn assert_status(response: &Response, expected: u16) {
    assert_eq!(
        response.status().as_u16(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}
