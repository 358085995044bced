//! Server-Sent Events relay for chat completions.
//!
//! The upstream body is split into lines and every non-blank line is
//! re-emitted downstream as one SSE frame, in order, without interpreting
//! the payload. Once the response headers are sent the HTTP status can no
//! longer change, so every outcome of the relay is a [`RelayEvent`] on the
//! output stream: data frames, at most one error frame, then the end marker.

use crate::api::disconnect::DisconnectStream;
use crate::api::models::ChatRequest;
use crate::core::{get_metrics, get_request_id, StreamCancelHandle};
use crate::services::UpstreamClient;
use async_stream::stream;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use futures::stream::{Stream, StreamExt};
use serde_json::json;
use std::convert::Infallible;

/// SSE field prefix that marks an already-framed upstream line.
pub const DATA_PREFIX: &str = "data: ";

/// One item on the relay's output channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A complete, blank-line-terminated SSE frame.
    Data(String),
    /// Terminal failure, reported in-band as `{"error": ...}`.
    Error(String),
    /// Upstream finished (or failed); nothing follows.
    End,
}

impl RelayEvent {
    /// Bytes written downstream for this event; `None` for [`RelayEvent::End`].
    pub fn into_frame(self) -> Option<Bytes> {
        match self {
            RelayEvent::Data(frame) => Some(Bytes::from(frame)),
            RelayEvent::Error(message) => Some(Bytes::from(error_frame(&message))),
            RelayEvent::End => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RelayEvent::Data(_) => "data",
            RelayEvent::Error(_) => "error",
            RelayEvent::End => "end",
        }
    }
}

/// Format an in-band error frame.
pub fn error_frame(message: &str) -> String {
    format!("{}{}\n\n", DATA_PREFIX, json!({ "error": message }))
}

/// Reframe one upstream line as an SSE frame.
///
/// Lines already carrying the `data: ` prefix keep it; other non-blank lines
/// get it prepended. Blank or whitespace-only lines produce no frame.
pub fn reframe_line(line: &str) -> Option<String> {
    if line.starts_with(DATA_PREFIX) {
        Some(format!("{}\n\n", line))
    } else if !line.trim().is_empty() {
        Some(format!("{}{}\n\n", DATA_PREFIX, line))
    } else {
        None
    }
}

/// Incremental newline splitter over a chunked byte stream.
///
/// Bytes are buffered until a `\n` arrives, so a line (or a multi-byte UTF-8
/// character) split across chunks is reassembled before decoding. A trailing
/// `\r` is stripped from every line.
///
/// Only `\n` ends a line. A lone `\r` that is not followed by `\n` is kept
/// as content, so a `\r`-only body relays as a single line rather than being
/// split the way universal-newline readers split it.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            lines.push(decode_line(&self.buffer[start..end]));
            start = end + 1;
        }
        self.buffer.drain(..start);
        lines
    }

    /// Flush the unterminated tail left when the body ends.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = decode_line(&self.buffer);
        self.buffer.clear();
        Some(line)
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Relay an upstream byte stream as a sequence of events.
///
/// Data frames follow upstream line order. A transport error ends the
/// sequence with one error event. The last item is always [`RelayEvent::End`].
pub fn relay_lines<S, E>(upstream: S) -> impl Stream<Item = RelayEvent> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    stream! {
        futures::pin_mut!(upstream);
        let mut lines = LineSplitter::new();

        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(bytes) => {
                    for line in lines.push(&bytes) {
                        if let Some(frame) = reframe_line(&line) {
                            yield RelayEvent::Data(frame);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Upstream stream failed mid-response");
                    yield RelayEvent::Error(e.to_string());
                    yield RelayEvent::End;
                    return;
                }
            }
        }

        if let Some(frame) = lines.finish().and_then(|line| reframe_line(&line)) {
            yield RelayEvent::Data(frame);
        }
        yield RelayEvent::End;
    }
}

/// Open the upstream chat stream and relay it.
///
/// The outbound call happens on first poll, after the downstream headers are
/// committed, so a rejected upstream request also surfaces in-band.
pub fn relay_chat(
    client: UpstreamClient,
    token: String,
    request: ChatRequest,
) -> impl Stream<Item = RelayEvent> + Send {
    stream! {
        let response = match client.open_chat_stream(&token, &request).await {
            Ok(response) => response,
            Err(e) => {
                get_metrics()
                    .upstream_errors
                    .with_label_values(&["chat", "transport"])
                    .inc();
                yield RelayEvent::Error(e.to_string());
                yield RelayEvent::End;
                return;
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            get_metrics()
                .upstream_errors
                .with_label_values(&["chat", "status"])
                .inc();
            let message = match response.text().await {
                Ok(body) => body,
                Err(e) => e.to_string(),
            };
            tracing::warn!(upstream_status = status.as_u16(), "Upstream rejected chat request");
            yield RelayEvent::Error(message);
            yield RelayEvent::End;
            return;
        }

        let events = relay_lines(response.bytes_stream());
        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            yield event;
        }
    }
}

/// Serialize relay events into the downstream body stream.
///
/// Stops at [`RelayEvent::End`] and marks the cancel handle completed so
/// that dropping the body afterwards is not counted as a disconnect.
pub fn into_body_stream<S>(
    events: S,
    cancel_handle: StreamCancelHandle,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send
where
    S: Stream<Item = RelayEvent> + Send + 'static,
{
    let request_id = get_request_id();

    stream! {
        futures::pin_mut!(events);
        let mut frames = 0usize;

        while let Some(event) = events.next().await {
            let kind = event.kind();
            match event.into_frame() {
                Some(frame) => {
                    frames += 1;
                    get_metrics().stream_frames.with_label_values(&[kind]).inc();
                    yield Ok(frame);
                }
                None => break,
            }
        }

        cancel_handle.mark_completed();
        tracing::debug!(request_id = %request_id, frames, "Relay stream finished");
    }
}

/// Wrap a body stream in an SSE response.
///
/// Declares `text/event-stream`, disables caching and proxy buffering, and
/// keeps the connection open for the stream's lifetime.
pub fn sse_response<S>(body_stream: S, cancel_handle: StreamCancelHandle) -> Response
where
    S: Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    let body = Body::from_stream(DisconnectStream::new(Box::pin(body_stream), cancel_handle));

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}

/// Build the full `/chat` streaming response.
pub fn create_sse_stream(client: UpstreamClient, token: String, request: ChatRequest) -> Response {
    let cancel_handle = StreamCancelHandle::new();
    let events = relay_chat(client, token, request);
    sse_response(into_body_stream(events, cancel_handle.clone()), cancel_handle)
}
