//! Outbound client for the upstream LLM aggregation API.
//!
//! Both relay operations go through [`UpstreamClient`]: it owns the shared
//! `reqwest::Client`, the base URL, and the two identification headers sent
//! with every call. Each call makes exactly one attempt.

use crate::api::models::{ChatRequest, ModelList};
use crate::core::config::{AppConfig, UpstreamConfig};
use crate::core::{get_metrics, AppError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::error::Error;

/// Outbound HTTP client bound to one upstream base URL.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(http: reqwest::Client, config: UpstreamConfig) -> Self {
        Self { http, config }
    }

    /// Build the shared HTTP client with connection pooling.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_keepalive(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self::new(http, config.upstream.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    fn identification_headers(&self, token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            headers.insert(AUTHORIZATION, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.config.referer) {
            headers.insert("http-referer", value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.config.title) {
            headers.insert("x-title", value);
        }
        headers
    }

    /// Fetch the upstream model catalogue and reshape it.
    ///
    /// Non-200 answers become [`AppError::Upstream`] with the raw body;
    /// network failures become [`AppError::Transport`].
    pub async fn list_models(&self, token: &str) -> Result<ModelList> {
        let url = self.url("models");

        let response = self
            .http
            .get(&url)
            .headers(self.identification_headers(token))
            .timeout(self.config.models_timeout())
            .send()
            .await
            .map_err(|e| transport_error("models", &url, e))?;

        let status = response.status();
        tracing::debug!(url = %url, status = %status, method = "GET", "Upstream request completed");

        if status != reqwest::StatusCode::OK {
            let body = response
                .text()
                .await
                .map_err(|e| transport_error("models", &url, e))?;
            get_metrics()
                .upstream_errors
                .with_label_values(&["models", "status"])
                .inc();
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error("models", &url, e))?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        let models = ModelList::from_upstream(&body);

        tracing::debug!(count = models.models.len(), "Model list fetched");
        Ok(models)
    }

    /// Open the streaming chat-completion request.
    ///
    /// Returns as soon as the upstream status line and headers arrive; the
    /// body is left unread for the caller to stream. The timeout covers the
    /// whole exchange including the body.
    pub async fn open_chat_stream(
        &self,
        token: &str,
        request: &ChatRequest,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let url = self.url("chat/completions");

        let response = self
            .http
            .post(&url)
            .headers(self.identification_headers(token))
            .header(CONTENT_TYPE, "application/json")
            .json(&request.upstream_body())
            .timeout(self.config.chat_timeout())
            .send()
            .await
            .map_err(|e| {
                log_transport_error(&url, &e);
                e
            })?;

        tracing::debug!(
            url = %url,
            status = %response.status(),
            model = %request.model,
            messages = request.messages.len(),
            method = "POST",
            "Upstream stream opened"
        );

        Ok(response)
    }
}

fn log_transport_error(url: &str, e: &reqwest::Error) {
    tracing::error!(
        url = %url,
        error = %e,
        error_source = ?e.source(),
        is_timeout = e.is_timeout(),
        is_connect = e.is_connect(),
        "HTTP request failed to upstream"
    );
}

fn transport_error(operation: &str, url: &str, e: reqwest::Error) -> AppError {
    log_transport_error(url, &e);
    get_metrics()
        .upstream_errors
        .with_label_values(&[operation, "transport"])
        .inc();
    AppError::Transport(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Message;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(base_url: String) -> UpstreamClient {
        UpstreamClient::new(
            reqwest::Client::new(),
            UpstreamConfig {
                base_url,
                ..UpstreamConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_list_models_sends_identification_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("http-referer", "http://localhost:3000"))
            .and(header("x-title", "AI Chatbot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "openai/gpt-4"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let models = client_for(server.uri()).list_models("sk-test").await.unwrap();
        assert_eq!(models.models.len(), 1);
        assert_eq!(models.models[0].name, serde_json::json!("openai/gpt-4"));
    }

    #[tokio::test]
    async fn test_list_models_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(401).set_body_string("No auth credentials found"))
            .mount(&server)
            .await;

        let err = client_for(server.uri()).list_models("bad").await.unwrap_err();
        match err {
            AppError::Upstream { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "No auth credentials found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_models_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(server.uri()).list_models("t").await.unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_list_models_transport_error() {
        let err = client_for("http://127.0.0.1:1".to_string())
            .list_models("t")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[tokio::test]
    async fn test_open_chat_stream_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "model": "openai/gpt-4",
                "messages": [{"role": "user", "content": "Hello"}],
                "stream": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("data: [DONE]\n\n"))
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatRequest {
            model: "openai/gpt-4".to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
        };

        let response = client_for(server.uri())
            .open_chat_stream("sk-test", &request)
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "data: [DONE]\n\n");
    }
}
