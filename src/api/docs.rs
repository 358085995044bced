//! OpenAPI document for the relay endpoints.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health,
        crate::api::handlers::list_models,
        crate::api::handlers::chat,
    ),
    components(
        schemas(
            crate::api::models::Message,
            crate::api::models::ChatRequest,
            crate::api::models::ModelSummary,
            crate::api::models::ModelList,
            crate::api::models::HealthResponse,
            crate::api::models::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "models", description = "Upstream model catalogue"),
        (name = "chat", description = "Streaming chat relay")
    ),
    info(
        title = "LLM Chat Relay API",
        version = "0.1.0",
        description = "Relays model listing and streaming chat completions to an OpenAI-compatible aggregation API."
    ),
    modifiers(&SecurityAddon)
)]
pub struct RelayApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
