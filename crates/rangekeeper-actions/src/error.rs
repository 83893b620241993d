use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("chain call failed: {0}")]
    Chain(String),
    #[error("swap reverted: {0}")]
    SwapRevert(String),
    #[error("mint reverted: {0}")]
    MintRevert(String),
    #[error("amm math error: {0}")]
    Amm(#[from] rangekeeper_amm::AmmError),
    #[error("no collect event found in receipt")]
    MissingCollectEvent,
    #[error("no transfer event found in receipt")]
    MissingTransferEvent,
}

pub type Result<T> = std::result::Result<T, ActionError>;
