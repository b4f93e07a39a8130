use thiserror::Error;

#[derive(Error, Debug)]
pub enum FocusError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Service error: {0}")]
    Service(String),
}

pub type Result<T> = std::result::Result<T, FocusError>;
