//! Top-level application error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("chain error: {0}")]
    Chain(#[from] rangekeeper_chain::ChainError),
    #[error("action error: {0}")]
    Action(#[from] rangekeeper_actions::ActionError),
    #[error("state error: {0}")]
    State(#[from] rangekeeper_state::StateError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] rangekeeper_telemetry::TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
