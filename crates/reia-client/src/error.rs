use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No model available: the catalog is empty")]
    NoModelAvailable,

    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Model {model} unavailable (HTTP {status}): {body}")]
    ModelUnavailable {
        model: String,
        status: u16,
        body: String,
    },

    #[error("Authentication rejected: {0}")]
    Unauthorized(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("All attempts failed after {attempts} tries (models: {}): {last_error}", models.join(", "))]
    ExhaustedRetries {
        attempts: u32,
        models: Vec<String>,
        last_error: String,
    },

    #[error("Client not configured: {0}")]
    NotConfigured(String),
}
