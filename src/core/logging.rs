//! Logging utilities with request context support.
//!
//! Tracing subscriber setup for the binary plus a task-local request ID so
//! that every log line emitted while handling a request can be correlated.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

tokio::task_local! {
    /// Task-local storage for the current request ID.
    pub static REQUEST_ID: String;
}

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,llm_chat_relay=debug";

/// Get the current request ID from context, if set.
///
/// Returns an empty string if no request ID is set.
pub fn get_request_id() -> String {
    REQUEST_ID.try_with(|id| id.clone()).unwrap_or_default()
}

/// Generate a new unique request ID using UUID v4.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Build the filter string, always appending noise suppression for the HTTP
/// stack so that `RUST_LOG=trace` does not flood the output with frame logs.
pub fn build_filter(base: Option<&str>) -> String {
    let base = base
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER);
    format!("{},hyper=warn,hyper::proto=warn,h2=warn,reqwest=warn", base)
}

/// Timer that prints local time (respects `TZ`).
struct LocalTime;

impl tracing_subscriber::fmt::time::FormatTime for LocalTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Install the global tracing subscriber.
///
/// ANSI colors are disabled when `NO_COLOR` is set (useful for log files).
pub fn init_tracing() {
    let base = std::env::var("RUST_LOG").ok();
    let filter = EnvFilter::new(build_filter(base.as_deref()));
    let no_color = std::env::var("NO_COLOR").is_ok();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LocalTime)
                .with_ansi(!no_color),
        )
        .init();
}
