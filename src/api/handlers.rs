//! HTTP request handlers for the relay API.
//!
//! This module contains the endpoint handlers: health, model listing, the
//! streaming chat relay, and the Prometheus scrape endpoint.

use crate::api::auth::extract_token;
use crate::api::models::*;
use crate::api::streaming::create_sse_stream;
use crate::core::{AppError, Result};
use crate::services::UpstreamClient;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(upstream: UpstreamClient) -> Self {
        Self { upstream }
    }
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// List upstream models.
///
/// Fetches the upstream catalogue with the caller's token and returns a
/// reduced summary of each model, in upstream order.
#[utoipa::path(
    get,
    path = "/models",
    tag = "models",
    responses(
        (status = 200, description = "Available models", body = ModelList),
        (status = 401, description = "Authorization header missing", body = ErrorResponse),
        (status = 500, description = "Upstream unreachable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_models(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ModelList>> {
    let token = extract_token(&headers)?;
    let models = state.upstream.list_models(&token).await?;
    Ok(Json(models))
}

/// Relay a chat completion as Server-Sent Events.
///
/// Authorization and body shape are checked before the stream starts;
/// anything that fails afterwards is reported as an in-band
/// `data: {"error": ...}` frame.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "SSE stream of upstream chunks", content_type = "text/event-stream", body = String),
        (status = 401, description = "Authorization header missing", body = ErrorResponse),
        (status = 422, description = "Malformed request body", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let token = extract_token(&headers)?;
    let request = ChatRequest::from_body(&body)?;

    tracing::info!(
        model = %request.model,
        messages = request.messages.len(),
        "Relaying chat completion"
    );

    Ok(create_sse_stream(state.upstream.clone(), token, request))
}

/// Prometheus scrape endpoint.
pub async fn metrics_handler() -> Result<Response> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response())
}
