//! HTTP request handlers for the gateway API.

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::StreamExt;
use gateway_core::{
    AssistantId, ChatFile, ChatProvider, ChatRequest, ChatResult, Conversation, GatewayError,
    GatewayResult, ListingPolicy, NormalizedStream, ProviderStream, UserId,
};
use gateway_telemetry::{provider_span, CallOutcome};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{convert::Infallible, sync::Arc, time::Instant};
use tracing::{debug, info, instrument, warn, Instrument};

use crate::{
    error::ApiError,
    extractors::{JsonBody, RequestId, UserIdentity},
    state::AppState,
};

/// Label used when no provider could be resolved
const UNRESOLVED: &str = "unresolved";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Version
    pub version: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.router.is_empty() {
        (StatusCode::SERVICE_UNAVAILABLE, "no providers available")
    } else {
        (StatusCode::OK, "ready")
    }
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.gather(),
    )
}

/// Registered provider
#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    /// Provider tag, the assistant id prefix
    pub tag: String,
    /// Listing behaviour
    pub listing: ListingPolicy,
}

/// List providers endpoint
pub async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    Json(
        state
            .router
            .adapters()
            .iter()
            .map(|provider| ProviderInfo {
                tag: provider.tag().to_string(),
                listing: provider.listing_policy(),
            })
            .collect(),
    )
}

/// Chat request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    /// Message text
    #[serde(default)]
    pub message: String,
    /// Target assistant, `<providerTag>:<rest>`
    pub assistant_id: String,
    /// Conversation to continue
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Attachments
    #[serde(default)]
    pub files: Vec<ChatFile>,
    /// Opaque provider context
    #[serde(default)]
    pub context: Map<String, Value>,
}

/// Chat endpoint.
///
/// Streams `text/event-stream` when the provider streams, otherwise returns
/// the provider's JSON answer.
#[instrument(skip_all, fields(request_id = %request_id, assistant_id = %body.assistant_id))]
pub async fn chat(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    UserIdentity(user_id): UserIdentity,
    JsonBody(body): JsonBody<ChatBody>,
) -> Result<Response, ApiError> {
    let tag = body
        .assistant_id
        .split_once(':')
        .map_or(UNRESOLVED, |(tag, _)| tag)
        .to_string();

    let prepared = ChatRequest::builder()
        .message(body.message)
        .assistant_id(body.assistant_id)
        .conversation_id(body.conversation_id)
        .user_id(user_id)
        .files(body.files)
        .context(body.context)
        .build()
        .and_then(|request| {
            let provider = state.router.resolve_id(&request.assistant_id)?;
            Ok((request, provider))
        });
    let (request, provider) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            state.metrics.record_request(&tag, "chat", CallOutcome::Rejected);
            return Err(e.into());
        }
    };

    debug!(
        provider = provider.tag(),
        user_id = %request.user_id,
        files = request.files.len(),
        "Dispatching chat"
    );

    if state.config.gateway.resolve_conversation_context {
        if let Some(conversation_id) = request.conversation_id.as_deref() {
            resolve_conversation_context(provider.as_ref(), conversation_id, &request.user_id).await;
        }
    }

    let started = Instant::now();
    let result = provider
        .chat(&request)
        .instrument(provider_span!(provider.tag(), "chat"))
        .await;
    record_call(&state, provider.tag(), "chat", started, &result);

    match result? {
        ChatResult::Complete(payload) => Ok(Json(payload).into_response()),
        ChatResult::Stream(stream) => Ok(stream_response(&state, stream)),
    }
}

/// Fetch history before a chat; failures never block the chat
async fn resolve_conversation_context(
    provider: &dyn ChatProvider,
    conversation_id: &str,
    user_id: &UserId,
) {
    match provider.get_history(conversation_id, user_id).await {
        Ok(_) => debug!(conversation_id, "Conversation history resolved"),
        Err(e) => {
            let err = GatewayError::history_lookup(conversation_id, &e);
            warn!(error = %err, "Continuing without conversation history");
        }
    }
}

/// Pipe a provider stream through the normalizer as SSE
fn stream_response(state: &AppState, stream: ProviderStream) -> Response {
    let mut guard = state.metrics.stream_opened(&stream.provider);
    info!(provider = %stream.provider, format = %stream.format, "Streaming response");

    let events = NormalizedStream::new(stream).map(move |event| {
        guard.record_event(event.kind());
        Ok::<_, Infallible>(Event::default().data(event.to_json()))
    });

    let mut response = Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

/// Conversation history endpoint
#[instrument(skip(state, user_id))]
pub async fn get_history(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
    Path((assistant_id, conversation_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let (_, provider) = resolve(&state, &assistant_id, "history")?;

    let started = Instant::now();
    let result = provider
        .get_history(&conversation_id, &user_id)
        .instrument(provider_span!(provider.tag(), "history"))
        .await;
    record_call(&state, provider.tag(), "history", started, &result);

    Ok(Json(result?))
}

/// Conversation listing endpoint
#[instrument(skip(state, user_id))]
pub async fn list_conversations(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
    Path(assistant_id): Path<String>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    let (assistant_id, provider) = resolve(&state, &assistant_id, "list")?;

    let started = Instant::now();
    let result = provider
        .list_conversations(&user_id, &assistant_id)
        .instrument(provider_span!(provider.tag(), "list"))
        .await;
    record_call(&state, provider.tag(), "list", started, &result);

    Ok(Json(result?))
}

/// Conversation delete endpoint
#[instrument(skip(state, user_id))]
pub async fn delete_conversation(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
    Path((assistant_id, conversation_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let (_, provider) = resolve(&state, &assistant_id, "delete")?;

    let started = Instant::now();
    let result = provider
        .delete_conversation(&conversation_id, &user_id)
        .instrument(provider_span!(provider.tag(), "delete"))
        .await;
    record_call(&state, provider.tag(), "delete", started, &result);

    Ok(Json(result?))
}

fn resolve(
    state: &AppState,
    assistant_id: &str,
    operation: &str,
) -> Result<(AssistantId, Arc<dyn ChatProvider>), ApiError> {
    AssistantId::parse(assistant_id)
        .and_then(|parsed| {
            let provider = state.router.resolve_id(&parsed)?;
            Ok((parsed, provider))
        })
        .map_err(|e| {
            let tag = assistant_id.split_once(':').map_or(UNRESOLVED, |(tag, _)| tag);
            state.metrics.record_request(tag, operation, CallOutcome::Rejected);
            ApiError::from(e)
        })
}

fn record_call<T>(
    state: &AppState,
    provider: &str,
    operation: &str,
    started: Instant,
    result: &GatewayResult<T>,
) {
    state
        .metrics
        .observe_provider_call(provider, operation, started.elapsed());
    let outcome = match result {
        Ok(_) => CallOutcome::Success,
        Err(e) if e.is_client_error() => CallOutcome::Rejected,
        Err(_) => CallOutcome::Failure,
    };
    state.metrics.record_request(provider, operation, outcome);
}
