use bytes::Bytes;
use futures::StreamExt;
use llm_chat_relay::api::streaming::{into_body_stream, relay_lines, sse_response};
use llm_chat_relay::core::{init_metrics, StreamCancelHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Flags when the upstream stream it belongs to is dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// An upstream that sends one line and then stalls forever.
fn stalled_upstream(
    dropped: Arc<AtomicBool>,
) -> impl futures::Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let flag = DropFlag(dropped);
    futures::stream::iter(vec![Ok(Bytes::from("data: first\n"))])
        .chain(futures::stream::pending())
        .map(move |chunk| {
            let _keep = &flag;
            chunk
        })
}

#[tokio::test]
async fn test_client_disconnect_releases_upstream() {
    init_metrics();
    let dropped = Arc::new(AtomicBool::new(false));
    let handle = StreamCancelHandle::new();

    let events = relay_lines(stalled_upstream(dropped.clone()));
    let response = sse_response(into_body_stream(events, handle.clone()), handle.clone());

    let mut body = response.into_body().into_data_stream();
    let first = body.next().await.unwrap().unwrap();
    assert_eq!(first, Bytes::from("data: first\n\n"));
    assert!(!dropped.load(Ordering::SeqCst));

    // Client goes away mid-stream.
    drop(body);

    assert!(dropped.load(Ordering::SeqCst));
    assert!(handle.is_cancelled());
}

#[tokio::test]
async fn test_completed_stream_is_not_a_disconnect() {
    init_metrics();
    let handle = StreamCancelHandle::new();
    let upstream = futures::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from(
        "data: one\ndata: [DONE]\n",
    ))]);

    let response = sse_response(into_body_stream(relay_lines(upstream), handle.clone()), handle.clone());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    assert_eq!(body, Bytes::from("data: one\n\ndata: [DONE]\n\n"));
    assert!(handle.is_completed());
    assert!(!handle.is_cancelled());
}

#[tokio::test]
async fn test_stream_error_ends_with_single_error_frame() {
    init_metrics();
    let handle = StreamCancelHandle::new();
    let upstream = futures::stream::iter(vec![
        Ok(Bytes::from("data: partial\n")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset")),
        Ok(Bytes::from("data: never\n")),
    ]);

    let response = sse_response(into_body_stream(relay_lines(upstream), handle.clone()), handle.clone());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    assert_eq!(
        body,
        Bytes::from("data: partial\n\ndata: {\"error\":\"connection reset\"}\n\n")
    );
    assert!(handle.is_completed());
}
