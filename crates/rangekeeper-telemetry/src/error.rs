use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("logging initialization failed: {0}")]
    LoggingInit(String),
    #[error("audit log io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("audit log csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("alert transport error: {0}")]
    Alert(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
