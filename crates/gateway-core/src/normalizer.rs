//! Stream normalization.
//!
//! Providers stream their answers as raw bytes, chunked however the
//! transport likes. [`StreamNormalizer`] turns those chunks into the canonical
//! [`StreamEvent`] sequence and [`NormalizedStream`] drives it over a live
//! provider stream.
//!
//! For [`StreamFormat::EventFramed`] providers the bytes look like
//!
//! ```text
//! data: {"answer": "Hel"}
//!
//! data: {"answer": "lo"}
//!
//! data: {"done": true}
//!
//! ```
//!
//! Events are separated by a blank line and may span several `data:` lines,
//! which are concatenated. A payload that is not JSON is passed through as
//! text. [`StreamFormat::RawText`] providers send plain text and every chunk
//! becomes one text event, minus any multi-byte character cut off at its end,
//! which is held back for the next chunk.
//!
//! Guarantees of the produced sequence:
//! - at most one terminal event (`done` or `error`), always last
//! - exactly one terminal event once the upstream has ended or failed
//! - nothing is emitted after the terminal event

use crate::error::GatewayError;
use crate::response::{ByteStream, ProviderStream};
use crate::streaming::{StreamEvent, StreamFormat};
use futures::stream::{FusedStream, Stream};
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, trace, warn};

/// Message sent to clients when a provider payload cannot be processed
pub const STREAM_PROCESSING_ERROR: &str = "stream processing error";

/// Message sent to clients when the provider transport fails mid-stream
pub const UPSTREAM_STREAM_ERROR: &str = "upstream stream error";

/// Largest incomplete event held while waiting for its delimiter
pub const MAX_PENDING_EVENT: usize = 1024 * 1024;

/// Chunk-by-chunk stream parser.
///
/// Holds the bytes of the event currently being received. Decoding to text
/// only happens once an event is complete, so multi-byte characters split
/// across chunks survive intact.
#[derive(Debug, Clone)]
pub struct StreamNormalizer {
    format: StreamFormat,
    pending: Vec<u8>,
    // prefix of `pending` already known to hold no delimiter
    scanned: usize,
    terminated: bool,
}

impl StreamNormalizer {
    /// Create a normalizer for one stream
    #[must_use]
    pub fn new(format: StreamFormat) -> Self {
        Self {
            format,
            pending: Vec::new(),
            scanned: 0,
            terminated: false,
        }
    }

    /// Framing this normalizer expects
    #[must_use]
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// Bytes of the incomplete trailing event or character
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Whether a terminal event has been produced
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Feed one transport chunk, returning the events it completes
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.terminated {
            trace!(bytes = chunk.len(), "Ignoring chunk after stream termination");
            return Vec::new();
        }

        match self.format {
            StreamFormat::RawText => self.push_raw(chunk),
            StreamFormat::EventFramed => self.push_framed(chunk),
        }
    }

    /// Signal upstream end-of-stream.
    ///
    /// Returns the synthetic `done` event unless the stream already
    /// terminated. An incomplete trailing event is discarded.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        if self.terminated {
            return None;
        }
        if self.pending.iter().any(|b| !b.is_ascii_whitespace()) {
            debug!(
                bytes = self.pending.len(),
                "Discarding incomplete trailing event at end of stream"
            );
        }
        self.terminate();
        Some(StreamEvent::Done)
    }

    /// Signal an upstream transport failure.
    ///
    /// Returns an `error` event unless the stream already terminated.
    pub fn fail(&mut self, error: &GatewayError) -> Option<StreamEvent> {
        if self.terminated {
            return None;
        }
        warn!(error = %error, "Provider stream failed");
        self.terminate();
        Some(StreamEvent::error(UPSTREAM_STREAM_ERROR))
    }

    fn terminate(&mut self) {
        self.terminated = true;
        self.pending = Vec::new();
        self.scanned = 0;
    }

    fn push_raw(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.pending.extend_from_slice(chunk);

        let complete = self.pending.len() - incomplete_utf8_tail(&self.pending);
        if complete == 0 {
            return Vec::new();
        }
        let text: Vec<u8> = self.pending.drain(..complete).collect();
        vec![StreamEvent::text(String::from_utf8_lossy(&text))]
    }

    fn push_framed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((end, delimiter_len)) = find_delimiter(&self.pending, self.scanned) {
            self.scanned = 0;
            let block: Vec<u8> = self.pending.drain(..end + delimiter_len).collect();
            let block = String::from_utf8_lossy(&block[..end]);

            match decode_event(&block) {
                Ok(decoded) => {
                    for event in decoded {
                        let terminal = event.is_terminal();
                        events.push(event);
                        if terminal {
                            self.terminate();
                            return events;
                        }
                    }
                }
                Err(error) => {
                    warn!(error = %error, "Malformed event in provider stream");
                    events.push(StreamEvent::error(STREAM_PROCESSING_ERROR));
                    self.terminate();
                    return events;
                }
            }
        }

        // a delimiter split across chunks starts in the last 3 bytes at most
        self.scanned = self.pending.len().saturating_sub(3);

        if self.pending.len() > MAX_PENDING_EVENT {
            let error = GatewayError::stream_protocol(format!(
                "event exceeds {MAX_PENDING_EVENT} bytes without a delimiter"
            ));
            warn!(error = %error, "Oversized event in provider stream");
            events.push(StreamEvent::error(STREAM_PROCESSING_ERROR));
            self.terminate();
        }

        events
    }
}

/// Position and length of the first blank-line delimiter at or after `from`
fn find_delimiter(buffer: &[u8], from: usize) -> Option<(usize, usize)> {
    let tail = buffer.get(from..)?;
    let lf = tail
        .windows(2)
        .position(|w| w == b"\n\n")
        .map(|pos| (from + pos, 2));
    let crlf = tail
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| (from + pos, 4));

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Length of a multi-byte character cut off at the end of `bytes`
fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let byte = bytes[bytes.len() - back];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back { back } else { 0 };
    }
    0
}

/// Concatenated `data:` payload of one complete event
fn collect_data(block: &str) -> String {
    block
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .collect()
}

/// Turn one complete event block into zero or more stream events
fn decode_event(block: &str) -> Result<Vec<StreamEvent>, GatewayError> {
    let data = collect_data(block);
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let object = match serde_json::from_str::<Value>(&data) {
        Ok(Value::Object(object)) => object,
        // not structured data: pass it through as literal text
        Ok(_) | Err(_) => return Ok(vec![StreamEvent::Text(data)]),
    };

    let mut events = Vec::with_capacity(2);

    let answer = object.get("answer").or_else(|| object.get("text"));
    match answer {
        None | Some(Value::Null | Value::Bool(false)) => {}
        Some(Value::String(text)) => {
            if !text.is_empty() {
                events.push(StreamEvent::text(text.as_str()));
            }
        }
        Some(scalar @ (Value::Number(_) | Value::Bool(true))) => {
            events.push(StreamEvent::text(scalar.to_string()));
        }
        Some(other) => {
            return Err(GatewayError::stream_protocol(format!(
                "answer field must be a string or scalar, got {other}"
            )));
        }
    }

    if object.get("done").and_then(Value::as_bool) == Some(true) {
        events.push(StreamEvent::Done);
    }

    Ok(events)
}

/// Lazy, cancellable sequence of [`StreamEvent`]s over a provider stream.
///
/// The upstream byte stream is dropped as soon as a terminal event has been
/// produced, when [`NormalizedStream::cancel`] is called, or when this value
/// is dropped, e.g. because the client disconnected.
pub struct NormalizedStream {
    provider: String,
    upstream: Option<ByteStream>,
    normalizer: StreamNormalizer,
    queued: VecDeque<StreamEvent>,
    finished: bool,
}

impl NormalizedStream {
    /// Normalize a provider stream
    #[must_use]
    pub fn new(stream: ProviderStream) -> Self {
        Self {
            provider: stream.provider,
            upstream: Some(stream.body),
            normalizer: StreamNormalizer::new(stream.format),
            queued: VecDeque::new(),
            finished: false,
        }
    }

    /// Provider the stream comes from
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Whether the upstream provider stream is still held
    #[must_use]
    pub fn is_upstream_open(&self) -> bool {
        self.upstream.is_some()
    }

    /// Stop consuming the provider stream.
    ///
    /// Releases the upstream immediately; the sequence ends without a
    /// terminal event since nobody is listening any more.
    pub fn cancel(&mut self) {
        if self.upstream.take().is_some() {
            debug!(provider = %self.provider, "Provider stream cancelled");
        }
        self.queued.clear();
        self.finished = true;
    }

    fn release_upstream(&mut self) {
        if self.upstream.take().is_some() {
            trace!(provider = %self.provider, "Provider stream released");
        }
        self.finished = true;
    }
}

impl Stream for NormalizedStream {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.queued.pop_front() {
                return Poll::Ready(Some(event));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            let Some(upstream) = this.upstream.as_mut() else {
                this.finished = true;
                return Poll::Ready(None);
            };

            match upstream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    let events = this.normalizer.push_chunk(&chunk);
                    this.queued.extend(events);
                }
                Poll::Ready(Some(Err(error))) => {
                    this.queued.extend(this.normalizer.fail(&error));
                }
                Poll::Ready(None) => {
                    this.queued.extend(this.normalizer.finish());
                }
                Poll::Pending => return Poll::Pending,
            }

            if this.normalizer.is_terminated() {
                this.release_upstream();
            }
        }
    }
}

impl FusedStream for NormalizedStream {
    fn is_terminated(&self) -> bool {
        self.finished && self.queued.is_empty()
    }
}

impl std::fmt::Debug for NormalizedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedStream")
            .field("provider", &self.provider)
            .field("format", &self.normalizer.format())
            .field("upstream_open", &self.upstream.is_some())
            .field("queued", &self.queued.len())
            .field("finished", &self.finished)
            .finish()
    }
}
