//! API layer for the chat relay.
//!
//! This module contains the HTTP handlers, request/response models, bearer
//! token extraction and the SSE relay, plus the router that wires them up.

pub mod auth;
pub mod disconnect;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod streaming;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::core::{request_id_middleware, MetricsMiddleware};

// Re-export commonly used types
pub use docs::RelayApiDoc;
pub use handlers::{chat, health, list_models, metrics_handler, AppState};
pub use models::{ChatRequest, Message, ModelList, ModelSummary};
pub use streaming::{create_sse_stream, reframe_line, LineSplitter, RelayEvent};

/// Build the router with all endpoints and middleware.
///
/// CORS is fully open: any origin (mirrored, so credentials work), any
/// method, any header.
pub fn build_router(state: Arc<AppState>) -> Router {
    let swagger_ui = SwaggerUi::new("/docs").url("/openapi.json", RelayApiDoc::openapi());

    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/models", get(list_models))
        .route("/chat", post(chat))
        .layer(axum::middleware::from_fn(MetricsMiddleware::track_metrics))
        .with_state(state);

    Router::new()
        .merge(swagger_ui)
        .merge(api_routes)
        .route("/metrics", get(metrics_handler))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}
