use std::time::Duration;

use async_trait::async_trait;
use reia_models::chat::{ChatRequest, ChatResponse, ModelList};
use reia_models::config::ApiConfig;
use tracing::{debug, warn};

use crate::error::ClientError;

/// One request/response exchange with the completion service. Mockable for testing.
///
/// Implementations classify failures into [`ClientError`] variants; retry
/// decisions are made by the caller.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Identifiers of the models the service currently offers.
    async fn list_models(&self) -> Result<Vec<String>, ClientError>;

    /// A single chat completion attempt.
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError>;
}

/// Transport for OpenAI-compatible HTTP endpoints (Groq by default).
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
    models_timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig, api_key: String) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
            models_timeout: Duration::from_secs(config.models_timeout_seconds),
        })
    }

    /// Build from configuration, reading the key from `config.api_key_env`.
    pub fn from_env(config: &ApiConfig) -> Result<Self, ClientError> {
        let api_key = config.api_key().ok_or_else(|| {
            ClientError::NotConfigured(format!("set the {} env var", config.api_key_env))
        })?;
        Self::new(config, api_key)
    }

    fn map_send_error(&self, e: reqwest::Error, timeout: Duration) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(timeout.as_secs())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn list_models(&self) -> Result<Vec<String>, ClientError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.models_timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, self.models_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => ClientError::Unauthorized(body),
                _ => ClientError::Transport(format!("HTTP {status}: {body}")),
            });
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("model list: {e}")))?;
        Ok(list.ids())
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %request.model, messages = request.messages.len(), "Sending chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, self.request_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let header_hint = parse_retry_after_header(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => {
                    let retry_after = header_hint.or_else(|| parse_retry_after_body(&body));
                    warn!(model = %request.model, ?retry_after, "Rate limited");
                    ClientError::RateLimited { retry_after }
                }
                400 | 404 => ClientError::ModelUnavailable {
                    model: request.model.clone(),
                    status: status.as_u16(),
                    body,
                },
                401 | 403 => ClientError::Unauthorized(body),
                _ => ClientError::Transport(format!("HTTP {status}: {body}")),
            });
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("chat completion: {e}")))
    }
}

/// Numeric `Retry-After` header, in seconds (fractions allowed).
fn parse_retry_after_header(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let value = headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()?;
    seconds(value)
}

/// `retry_after_ms` or `retry_after` (seconds) from a JSON error body.
fn parse_retry_after_body(body: &str) -> Option<Duration> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error").unwrap_or(&value);
    if let Some(ms) = error.get("retry_after_ms").and_then(|v| v.as_u64()) {
        return Some(Duration::from_millis(ms));
    }
    error
        .get("retry_after")
        .and_then(|v| v.as_f64())
        .and_then(seconds)
}

/// Non-negative seconds as a `Duration`. Values too large to represent are dropped.
fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
