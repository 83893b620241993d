use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("twap deviation {deviation_ticks} exceeds limit {limit_ticks}")]
    TwapViolation { deviation_ticks: i32, limit_ticks: i32 },
    #[error("price moved {distance_ticks} ticks from range center, exceeding circuit breaker limit")]
    CircuitBreaker { distance_ticks: i32 },
    #[error("equity ${equity_usd} below hard stop threshold ${threshold_usd}")]
    HardEquityStop { equity_usd: String, threshold_usd: String },
}

pub type Result<T> = std::result::Result<T, RiskError>;
