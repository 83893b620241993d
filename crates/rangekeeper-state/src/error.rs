use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("on-chain read failed while scanning for an orphaned position: {0}")]
    Chain(String),
}

pub type Result<T> = std::result::Result<T, StateError>;
