//! Configuration management for the chat relay.
//!
//! Configuration starts from built-in defaults, is optionally replaced by a
//! YAML file (with environment variable expansion), and is finally
//! overridden field by field from environment variables.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Environment variable naming an optional YAML configuration file.
pub const CONFIG_PATH_ENV: &str = "RELAY_CONFIG";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port)
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream API configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Whether to verify SSL certificates for upstream requests
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Where the relay forwards to and how it identifies itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the OpenAI-compatible aggregation API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `HTTP-Referer` identification header
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Value of the `X-Title` identification header
    #[serde(default = "default_title")]
    pub title: String,

    /// Timeout for the model listing call
    #[serde(default = "default_models_timeout")]
    pub models_timeout_secs: u64,

    /// Timeout for the whole chat exchange, body included
    #[serde(default = "default_chat_timeout")]
    pub chat_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            verify_ssl: default_verify_ssl(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            referer: default_referer(),
            title: default_title(),
            models_timeout_secs: default_models_timeout(),
            chat_timeout_secs: default_chat_timeout(),
        }
    }
}

impl UpstreamConfig {
    pub fn models_timeout(&self) -> Duration {
        Duration::from_secs(self.models_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_referer() -> String {
    "http://localhost:3000".to_string()
}

fn default_title() -> String {
    "AI Chatbot".to_string()
}

fn default_models_timeout() -> u64 {
    30
}

fn default_chat_timeout() -> u64 {
    120
}

fn default_verify_ssl() -> bool {
    true
}

impl AppConfig {
    /// Build the configuration from the environment.
    ///
    /// If `RELAY_CONFIG` names a file it is loaded first, otherwise defaults
    /// are used; individual environment variables then take precedence.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(&path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a YAML file.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use llm_chat_relay::core::config::AppConfig;
    ///
    /// let config = AppConfig::load("relay.yaml").expect("Failed to load config");
    /// ```
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let expanded = expand_env_vars(&content);

        let mut config: AppConfig = serde_yaml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        config.normalize();

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }

        if let Some(port) = env_parse::<u16>("PORT") {
            self.server.port = port;
        }

        if let Ok(base_url) = std::env::var("UPSTREAM_BASE_URL") {
            self.upstream.base_url = base_url;
        }

        if let Ok(referer) = std::env::var("UPSTREAM_REFERER") {
            self.upstream.referer = referer;
        }

        if let Ok(title) = std::env::var("UPSTREAM_TITLE") {
            self.upstream.title = title;
        }

        if let Some(secs) = env_parse::<u64>("MODELS_TIMEOUT_SECS") {
            self.upstream.models_timeout_secs = secs;
        }

        if let Some(secs) = env_parse::<u64>("CHAT_TIMEOUT_SECS") {
            self.upstream.chat_timeout_secs = secs;
        }

        if let Ok(verify_ssl_str) = std::env::var("VERIFY_SSL") {
            self.verify_ssl = str_to_bool(&verify_ssl_str);
        }

        self.normalize();
    }

    fn normalize(&mut self) {
        let trimmed = self.upstream.base_url.trim_end_matches('/').len();
        self.upstream.base_url.truncate(trimmed);
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

/// Expand environment variables in configuration content.
///
/// Supports patterns: ${VAR}, ${VAR:-default}, ${VAR:default}
fn expand_env_vars(content: &str) -> String {
    let re = Regex::new(r#"\$\{([^}:]+)(?::-?([^}]*))?\}"#).expect("valid env var pattern");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
    })
    .to_string()
}

/// Convert string to boolean.
///
/// Accepts: "true", "1", "yes", "on" (case-insensitive)
fn str_to_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
