use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid property: {0}")]
    InvalidProperty(String),

    #[error("Duplicate property id: {0}")]
    DuplicateProperty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
