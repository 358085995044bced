use crate::core::{get_metrics, StreamCancelHandle};
use axum::body::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A body stream wrapper that observes the end of a relay stream.
///
/// Dropping it drops the inner stream, which releases the upstream
/// connection. If the relay had not completed at that point the client went
/// away early and the disconnect is logged and counted.
pub struct DisconnectStream<S> {
    stream: S,
    cancel_handle: StreamCancelHandle,
}

impl<S> DisconnectStream<S> {
    pub fn new(stream: S, cancel_handle: StreamCancelHandle) -> Self {
        get_metrics().active_streams.inc();
        Self {
            stream,
            cancel_handle,
        }
    }
}

impl<S, E> Stream for DisconnectStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.stream).poll_next(cx)
    }
}

impl<S> Drop for DisconnectStream<S> {
    fn drop(&mut self) {
        let metrics = get_metrics();
        metrics.active_streams.dec();

        if self.cancel_handle.cancel() {
            metrics.client_disconnects.inc();
            tracing::info!("Client disconnected - upstream stream released");
        }
    }
}
