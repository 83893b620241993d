//! Minting the replacement range.

use alloy::primitives::U256;
use rangekeeper_amm::PositionMath;
use rangekeeper_core::PoolSnapshot;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};

use crate::chain_ops::ChainOps;
use crate::error::{ActionError, Result};

/// Safety buffer applied to wallet balances before minting, covering
/// precision loss and any balance-read lag across rotating RPC endpoints.
const MINT_BALANCE_SAFETY_FACTOR: Decimal = dec!(0.99);

/// Reads both token balances, applies the safety buffer, computes mint
/// parameters for `[tick_lower, tick_upper]`, and submits. Returns `"0"`
/// (via `U256::ZERO`) if both desired amounts end up zero.
pub async fn mint_max_liquidity<C: ChainOps, M: PositionMath>(
    ops: &C,
    pool: &PoolSnapshot,
    math: &M,
    tick_lower: i32,
    tick_upper: i32,
    wallet: alloy::primitives::Address,
    slippage_tolerance: Decimal,
) -> Result<U256> {
    let balance0 = ops.balance_of(pool.token0.address, wallet).await?;
    let balance1 = ops.balance_of(pool.token1.address, wallet).await?;

    let amount0_desired = (Decimal::from(balance0) * MINT_BALANCE_SAFETY_FACTOR)
        .trunc()
        .to_string()
        .parse::<u128>()
        .unwrap_or(0);
    let amount1_desired = (Decimal::from(balance1) * MINT_BALANCE_SAFETY_FACTOR)
        .trunc()
        .to_string()
        .parse::<u128>()
        .unwrap_or(0);

    if amount0_desired == 0 && amount1_desired == 0 {
        warn!("both desired mint amounts are zero, aborting mint");
        return Ok(U256::ZERO);
    }

    let amount0 = rangekeeper_core::Amount::from_raw(amount0_desired, pool.token0.decimals);
    let amount1 = rangekeeper_core::Amount::from_raw(amount1_desired, pool.token1.decimals);
    let params = math.mint_params(pool, tick_lower, tick_upper, amount0, amount1, slippage_tolerance)?;

    let scale0 = Decimal::from(10u128.pow(pool.token0.decimals as u32));
    let scale1 = Decimal::from(10u128.pow(pool.token1.decimals as u32));
    let amount0_min = (params.amount0_min.inner() * scale0).trunc().to_string().parse::<u128>().unwrap_or(0);
    let amount1_min = (params.amount1_min.inner() * scale1).trunc().to_string().parse::<u128>().unwrap_or(0);

    info!(tick_lower, tick_upper, amount0_desired, amount1_desired, "minting new range");

    ops.mint(
        pool.token0.address,
        pool.token1.address,
        tick_lower,
        tick_upper,
        amount0_desired,
        amount1_desired,
        amount0_min,
        amount1_min,
    )
    .await
    .map_err(|e| ActionError::MintRevert(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_ops::mock::MockChainOps;
    use alloy::primitives::address;
    use rangekeeper_amm::UniswapV3Math;
    use rangekeeper_core::TokenRef;

    fn sample_pool() -> PoolSnapshot {
        PoolSnapshot {
            sqrt_price_x96: alloy::primitives::U256::from(79_228_162_514_264_337_593_543_950_336u128),
            tick: 0,
            liquidity: 1_000_000,
            tick_spacing: 10,
            token0: TokenRef::new(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), 6, "USDC"),
            token1: TokenRef::new(address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), 18, "WETH"),
        }
    }

    #[tokio::test]
    async fn mint_aborts_when_both_balances_zero() {
        let ops = MockChainOps::new();
        let pool = sample_pool();
        let math = UniswapV3Math;
        let token_id = mint_max_liquidity(&ops, &pool, &math, -500, 500, address!("0000000000000000000000000000000000000001"), dec!(0.005))
            .await
            .unwrap();
        assert_eq!(token_id, U256::ZERO);
    }

    #[tokio::test]
    async fn mint_succeeds_with_nonzero_balances() {
        let ops = MockChainOps::new();
        ops.balances.write().insert(
            address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            1_000_000_000,
        );
        ops.balances.write().insert(
            address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            1_000_000_000_000_000_000,
        );
        let pool = sample_pool();
        let math = UniswapV3Math;
        let token_id = mint_max_liquidity(&ops, &pool, &math, -500, 500, address!("0000000000000000000000000000000000000001"), dec!(0.005))
            .await
            .unwrap();
        assert_ne!(token_id, U256::ZERO);
    }

    #[tokio::test]
    async fn mint_propagates_revert() {
        let ops = MockChainOps::new();
        *ops.fail_mint.write() = true;
        ops.balances.write().insert(
            address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            1_000_000_000,
        );
        let pool = sample_pool();
        let math = UniswapV3Math;
        let result = mint_max_liquidity(&ops, &pool, &math, -500, 500, address!("0000000000000000000000000000000000000001"), dec!(0.005)).await;
        assert!(matches!(result, Err(ActionError::MintRevert(_))));
    }
}
