use thiserror::Error;

#[derive(Debug, Error)]
pub enum AmmError {
    #[error("invalid range: tickLower {tick_lower} >= tickUpper {tick_upper}")]
    InvalidRange { tick_lower: i32, tick_upper: i32 },
    #[error("both desired amounts are zero")]
    ZeroDesiredAmounts,
}

pub type Result<T> = std::result::Result<T, AmmError>;
