//! LLM Chat Relay - a small streaming relay in front of an LLM aggregation API
//!
//! The relay exposes three endpoints to browser or desktop clients:
//!
//! - `GET /health`: liveness
//! - `GET /models`: the upstream model catalogue, reduced to a summary per model
//! - `POST /chat`: a chat completion relayed from the upstream as Server-Sent Events
//!
//! The caller's bearer token is forwarded upstream untouched; nothing is
//! stored between requests.
//!
//! # Architecture
//!
//! - [`core`]: configuration, errors, logging, metrics, middleware
//! - [`api`]: HTTP handlers, request/response models, the SSE relay
//! - [`services`]: the outbound upstream client
//!
//! # Configuration
//!
//! All settings have defaults. Optional environment variables:
//! - `RELAY_CONFIG`: path to a YAML config file
//! - `HOST` / `PORT`: bind address (default: 0.0.0.0:8000)
//! - `UPSTREAM_BASE_URL`: upstream API base (default: https://openrouter.ai/api/v1)
//! - `UPSTREAM_REFERER` / `UPSTREAM_TITLE`: identification headers
//! - `MODELS_TIMEOUT_SECS` / `CHAT_TIMEOUT_SECS`: per-call timeouts (default: 30 / 120)
//! - `VERIFY_SSL`: verify upstream certificates (default: true)

pub mod api;
pub mod core;
pub mod services;

// Re-export commonly used types for convenience
pub use api::{build_router, AppState, ChatRequest, Message, ModelSummary, RelayEvent};
pub use core::{AppConfig, AppError, Result};
pub use services::UpstreamClient;
