//! Atomic exit: withdraw all liquidity, collect fees, burn the NFT, all in
//! one multicall so there is no window where the position is partially
//! withdrawn.

use rangekeeper_core::{Amount, Position, TokenRef};
use tracing::info;

use crate::chain_ops::ChainOps;
use crate::error::Result;

/// Exits `position` entirely, returning the collected amounts of token0
/// and token1, decimal-scaled by `token0`/`token1`.
pub async fn atomic_exit<C: ChainOps>(
    ops: &C,
    position: &Position,
    token0: &TokenRef,
    token1: &TokenRef,
) -> Result<(Amount, Amount)> {
    info!(token_id = %position.token_id, liquidity = position.liquidity, "exiting position");
    let (raw0, raw1) = ops.atomic_exit(position.token_id, position.liquidity).await?;
    Ok((
        Amount::from_raw(raw0, token0.decimals),
        Amount::from_raw(raw1, token1.decimals),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_ops::mock::MockChainOps;
    use alloy::primitives::{address, U256};

    fn sample_tokens() -> (TokenRef, TokenRef) {
        (
            TokenRef::new(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), 6, "USDC"),
            TokenRef::new(address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), 18, "WETH"),
        )
    }

    #[tokio::test]
    async fn atomic_exit_scales_raw_amounts_by_decimals() {
        let ops = MockChainOps::new();
        *ops.exit_result.write() = Some((1_000_000, 500_000_000_000_000_000));
        let (token0, token1) = sample_tokens();
        let position = Position {
            token_id: U256::from(7),
            tick_lower: -100,
            tick_upper: 100,
            liquidity: 1000,
            tokens_owed0: 0,
            tokens_owed1: 0,
        };
        let (a0, a1) = atomic_exit(&ops, &position, &token0, &token1).await.unwrap();
        assert_eq!(a0.inner(), rust_decimal::Decimal::new(1, 0));
        assert_eq!(a1.inner(), rust_decimal::Decimal::new(5, 1));
    }
}
