//! API request and response models.
//!
//! This module defines the inbound chat request, the reduced model summary
//! returned by `/models`, and the small health/error bodies.

use crate::core::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"role": "user", "content": "Hello!"}))]
pub struct Message {
    /// Role: "system", "user", or "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

/// Inbound chat request relayed to the upstream chat-completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "model": "openai/gpt-4",
    "messages": [
        {"role": "system", "content": "You are a helpful assistant."},
        {"role": "user", "content": "Hello!"}
    ]
}))]
pub struct ChatRequest {
    /// Upstream model identifier
    pub model: String,

    /// Conversation messages, in order
    pub messages: Vec<Message>,
}

impl ChatRequest {
    /// Parse and shape-check a raw request body.
    ///
    /// Any failure, including a body that is not JSON at all, is a
    /// [`AppError::Validation`].
    pub fn from_body(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| AppError::Validation(e.to_string()))
    }

    /// Body sent upstream: the same model and messages with streaming on.
    pub fn upstream_body(&self) -> UpstreamChatBody<'_> {
        UpstreamChatBody {
            model: &self.model,
            messages: &self.messages,
            stream: true,
        }
    }
}

/// Serialized form of the outbound chat-completion request.
#[derive(Debug, Serialize)]
pub struct UpstreamChatBody<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,
}

/// Reduced view of an upstream model record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "openai/gpt-4",
    "name": "OpenAI: GPT-4",
    "description": "OpenAI's flagship model",
    "context_length": 8191,
    "pricing": {"prompt": "0.00003", "completion": "0.00006"},
    "top_provider": {"is_moderated": true}
}))]
pub struct ModelSummary {
    #[schema(value_type = Option<String>)]
    pub id: Value,
    #[schema(value_type = Option<String>)]
    pub name: Value,
    #[schema(value_type = String)]
    pub description: Value,
    #[schema(value_type = u64)]
    pub context_length: Value,
    #[schema(value_type = Object)]
    pub pricing: Value,
    #[schema(value_type = Object)]
    pub top_provider: Value,
}

impl ModelSummary {
    /// Select and default fields from one upstream record.
    ///
    /// Selected values are copied as-is, whatever their JSON type. Absent and
    /// `null` fields degrade to defaults; a record that is not an object
    /// yields a summary made only of defaults.
    pub fn from_upstream(record: &Value) -> Self {
        let field = |key: &str| record.get(key).filter(|v| !v.is_null()).cloned();

        let id = field("id").unwrap_or(Value::Null);
        let name = field("name").unwrap_or_else(|| id.clone());

        Self {
            id,
            name,
            description: field("description").unwrap_or_else(|| Value::String(String::new())),
            context_length: field("context_length").unwrap_or_else(|| Value::from(0)),
            pricing: field("pricing").unwrap_or_else(|| Value::Object(Map::new())),
            top_provider: field("top_provider").unwrap_or_else(|| Value::Object(Map::new())),
        }
    }
}

/// Response body of `/models`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelList {
    pub models: Vec<ModelSummary>,
}

impl ModelList {
    /// Reshape an upstream `/models` body, preserving upstream order.
    ///
    /// A missing or non-array `data` field is treated as empty.
    pub fn from_upstream(body: &Value) -> Self {
        let models = body
            .get("data")
            .and_then(Value::as_array)
            .map(|records| records.iter().map(ModelSummary::from_upstream).collect())
            .unwrap_or_default();
        Self { models }
    }
}

/// Response body of `/health`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"status": "healthy"}))]
pub struct HealthResponse {
    pub status: String,
}

/// Error body for failures raised before a response starts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"detail": "Authorization header required"}))]
pub struct ErrorResponse {
    pub detail: String,
}
