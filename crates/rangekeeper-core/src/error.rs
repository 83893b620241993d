use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid price: {0}")]
    InvalidPrice(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid tick: {0}")]
    InvalidTick(String),
    #[error("invalid token address: {0}")]
    InvalidAddress(String),
    #[error("decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
