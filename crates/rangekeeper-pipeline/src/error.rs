//! Every abort point the pipeline can hit, carrying enough context for the
//! control loop to decide whether cash was left mid-rebalance.

use rangekeeper_actions::ActionError;
use rangekeeper_amm::AmmError;
use rangekeeper_market_data::MarketDataError;
use rangekeeper_risk::RiskError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("twap deviation gate failed: {0}")]
    TwapGate(#[from] RiskError),

    #[error("market analytics unavailable: {0}")]
    Analytics(#[from] MarketDataError),

    #[error("range math failed: {0}")]
    Amm(#[from] AmmError),

    #[error("on-chain action failed: {0}")]
    Action(#[from] ActionError),

    #[error("rpc read failed: {0}")]
    Chain(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
