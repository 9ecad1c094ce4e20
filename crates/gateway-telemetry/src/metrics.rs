//! Prometheus metrics.
//!
//! Metrics live in their own [`Registry`] so several gateways (e.g. in tests)
//! can coexist in one process.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Result of one provider operation, used as a metric label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The provider answered successfully
    Success,
    /// Rejected before reaching a provider
    Rejected,
    /// The provider call failed
    Failure,
}

impl CallOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Rejected => "rejected",
            Self::Failure => "failure",
        }
    }
}

/// Gateway metrics
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    provider_call_duration: HistogramVec,
    stream_events: IntCounterVec,
    active_streams: IntGauge,
}

impl Metrics {
    /// Create and register all gateway metrics
    ///
    /// # Errors
    /// Returns error if a metric cannot be created or registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new_custom(Some("gateway".to_string()), None)?;

        let requests = IntCounterVec::new(
            Opts::new("requests_total", "Requests handled, by provider, operation and outcome"),
            &["provider", "operation", "outcome"],
        )?;
        let provider_call_duration = HistogramVec::new(
            HistogramOpts::new(
                "provider_call_duration_seconds",
                "Latency of provider calls (time to first byte for streams)",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["provider", "operation"],
        )?;
        let stream_events = IntCounterVec::new(
            Opts::new("stream_events_total", "Normalized stream events sent to clients"),
            &["provider", "kind"],
        )?;
        let active_streams = IntGauge::new("active_streams", "Streams currently open to clients")?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(provider_call_duration.clone()))?;
        registry.register(Box::new(stream_events.clone()))?;
        registry.register(Box::new(active_streams.clone()))?;

        Ok(Self {
            registry,
            requests,
            provider_call_duration,
            stream_events,
            active_streams,
        })
    }

    /// Count one handled request
    pub fn record_request(&self, provider: &str, operation: &str, outcome: CallOutcome) {
        self.requests
            .with_label_values(&[provider, operation, outcome.as_str()])
            .inc();
    }

    /// Observe the latency of a provider call
    pub fn observe_provider_call(&self, provider: &str, operation: &str, elapsed: Duration) {
        self.provider_call_duration
            .with_label_values(&[provider, operation])
            .observe(elapsed.as_secs_f64());
    }

    /// Count one event sent on a stream
    pub fn record_stream_event(&self, provider: &str, kind: &str) {
        self.stream_events.with_label_values(&[provider, kind]).inc();
    }

    /// Mark a stream as open until the returned guard is dropped
    #[must_use]
    pub fn stream_opened(self: &Arc<Self>, provider: &str) -> StreamGuard {
        self.active_streams.inc();
        StreamGuard {
            metrics: Arc::clone(self),
            provider: provider.to_string(),
            events: 0,
        }
    }

    /// Number of streams currently open
    #[must_use]
    pub fn active_streams(&self) -> i64 {
        self.active_streams.get()
    }

    /// Render all metrics in the Prometheus text format
    #[must_use]
    pub fn gather(&self) -> String {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        if TextEncoder::new().encode(&families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("active_streams", &self.active_streams.get())
            .finish_non_exhaustive()
    }
}

/// One open client stream.
///
/// Counts the events sent on the stream and decrements the active stream
/// gauge when dropped, whether the stream completed or the client went away.
#[derive(Debug)]
pub struct StreamGuard {
    metrics: Arc<Metrics>,
    provider: String,
    events: u64,
}

impl StreamGuard {
    /// Count one event of the given kind
    pub fn record_event(&mut self, kind: &str) {
        self.events += 1;
        self.metrics.record_stream_event(&self.provider, kind);
    }

    /// Events counted so far
    #[must_use]
    pub fn events(&self) -> u64 {
        self.events
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.metrics.active_streams.dec();
        debug!(provider = %self.provider, events = self.events, "Stream closed");
    }
}

/// Metrics setup error
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Prometheus rejected a metric definition
    #[error("Failed to register metrics: {0}")]
    Prometheus(#[from] prometheus::Error),
}
