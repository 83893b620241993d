use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("provider geo-blocked")]
    GeoBlocked,
    #[error("no candles returned")]
    EmptyCandles,
    #[error("all providers exhausted")]
    AllProvidersExhausted,
}

pub type Result<T> = std::result::Result<T, MarketDataError>;
