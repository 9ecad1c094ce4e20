//! Shared HTTP plumbing for provider adapters.
//!
//! Every adapter talks JSON over HTTP with an optional bearer token, so the
//! client, URL joining, timeouts and status handling live here once.

use futures_util::StreamExt;
use gateway_config::ProviderSettings;
use gateway_core::{GatewayError, GatewayResult, ProviderStream, StreamFormat};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Longest provider error body kept in logs
const MAX_LOGGED_BODY: usize = 512;

/// HTTP client bound to one provider backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    provider: String,
    base_url: String,
    base: Url,
    api_key: SecretString,
    timeout: Duration,
    client: Client,
}

impl HttpBackend {
    /// Create a backend.
    ///
    /// # Errors
    /// Returns error if the base URL is not an absolute http(s) URL or the
    /// HTTP client cannot be created
    pub fn new(
        provider: impl Into<String>,
        base_url: &str,
        api_key: SecretString,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> GatewayResult<Self> {
        let provider = provider.into();

        let base = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            GatewayError::configuration(format!("invalid base URL for {provider}: {e}"))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(GatewayError::configuration(format!(
                "base URL for {provider} must use http or https"
            )));
        }

        // No client-wide timeout: it would also cut off long-running streams.
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            base,
            api_key,
            timeout,
            client,
        })
    }

    /// Create a backend from provider settings
    ///
    /// # Errors
    /// Same as [`HttpBackend::new`]
    pub fn from_settings(provider: &str, settings: &ProviderSettings) -> GatewayResult<Self> {
        Self::new(
            provider,
            &settings.base_url_or_default(provider),
            settings.api_key.clone(),
            settings.timeout,
            settings.connect_timeout,
        )
    }

    /// Provider tag used in errors and logs
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-call timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL of a provider path given as segments.
    ///
    /// Each segment is percent-encoded on its own, so ids coming from
    /// callers can never add path levels, a query or a fragment.
    ///
    /// # Errors
    /// Returns `Validation` if a segment is empty, `.` or `..`
    pub fn url(&self, segments: &[&str]) -> GatewayResult<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(GatewayError::validation(
                format!("invalid identifier '{bad}'"),
                None,
            ));
        }

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                GatewayError::configuration(format!(
                    "base URL for {} cannot carry a path",
                    self.provider
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> GatewayResult<RequestBuilder> {
        let builder = self.client.request(method, self.url(segments)?);
        let key = self.api_key.expose_secret();
        if key.is_empty() {
            Ok(builder)
        } else {
            Ok(builder.bearer_auth(key))
        }
    }

    fn call_failed(&self, cause: impl Into<String>, status: Option<u16>) -> GatewayError {
        GatewayError::provider_call(&self.provider, cause, status)
    }

    /// Send a request, bounded by the timeout up to the response headers
    async fn send(&self, builder: RequestBuilder) -> GatewayResult<Response> {
        let response = tokio::time::timeout(self.timeout, builder.send())
            .await
            .map_err(|_| self.call_failed(format!("timed out after {:?}", self.timeout), None))?
            .map_err(|e| self.call_failed(format!("request failed: {e}"), None))?;

        debug!(
            provider = %self.provider,
            status = %response.status(),
            url = %response.url(),
            "Provider responded"
        );
        Ok(response)
    }

    async fn error_from(&self, response: Response) -> GatewayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let logged: String = body.chars().take(MAX_LOGGED_BODY).collect();
        warn!(
            provider = %self.provider,
            status = %status,
            body = %logged,
            "Provider returned an error status"
        );
        self.call_failed(format!("provider returned {status}"), Some(status.as_u16()))
    }

    async fn read_json(&self, response: Response) -> GatewayResult<Value> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.call_failed(format!("failed to read response body: {e}"), None))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(json!({ "status": status.as_u16() }));
        }
        serde_json::from_slice(&body).map_err(|e| {
            self.call_failed(format!("invalid JSON in response: {e}"), Some(status.as_u16()))
        })
    }

    /// Run a full non-streaming exchange within the timeout
    async fn exchange(&self, builder: RequestBuilder, accept: &[StatusCode]) -> GatewayResult<Value> {
        let call = async {
            let response = self.send(builder).await?;
            if response.status().is_success() || accept.contains(&response.status()) {
                self.read_json(response).await
            } else {
                Err(self.error_from(response).await)
            }
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| self.call_failed(format!("timed out after {:?}", self.timeout), None))?
    }

    /// `GET path?query` returning the JSON body
    ///
    /// # Errors
    /// Returns `ProviderCallFailed` on transport errors, timeouts, non-2xx
    /// statuses and malformed JSON
    pub async fn get_json(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> GatewayResult<Value> {
        self.exchange(self.request(Method::GET, segments)?.query(query), &[])
            .await
    }

    /// `POST path` with a JSON body, returning the JSON body
    ///
    /// # Errors
    /// Same as [`HttpBackend::get_json`]
    pub async fn post_json<B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> GatewayResult<Value> {
        self.exchange(self.request(Method::POST, segments)?.json(body), &[])
            .await
    }

    /// `POST path` with a JSON body and return the live response body.
    ///
    /// Only the time to response headers is bounded; the body streams for as
    /// long as the provider keeps it open.
    ///
    /// # Errors
    /// Returns `ProviderCallFailed` on transport errors, timeouts and non-2xx
    /// statuses
    pub async fn post_stream<B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
        format: StreamFormat,
    ) -> GatewayResult<ProviderStream> {
        let builder = self
            .request(Method::POST, segments)?
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(body);
        let response = self.send(builder).await?;
        if !response.status().is_success() {
            return Err(self.error_from(response).await);
        }

        let provider = self.provider.clone();
        let body = response
            .bytes_stream()
            .map(move |chunk| {
                chunk.map_err(|e| {
                    GatewayError::provider_call(&provider, format!("stream read failed: {e}"), None)
                })
            })
            .boxed();

        Ok(ProviderStream::new(self.provider.clone(), format, body))
    }

    /// `DELETE path?query`, optionally with a JSON body.
    ///
    /// `404` and `410` mean the conversation is already gone and are returned
    /// as the acknowledgement. An empty body becomes `{"status": <code>}`.
    ///
    /// # Errors
    /// Same as [`HttpBackend::get_json`], except for `404`/`410`
    pub async fn delete(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> GatewayResult<Value> {
        let mut builder = self.request(Method::DELETE, segments)?.query(query);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.exchange(builder, &[StatusCode::NOT_FOUND, StatusCode::GONE])
            .await
    }
}
