//! The facade callers actually use: `Decimal`-denominated amounts in,
//! `Decimal`-denominated amounts out, with the raw `f64` tick math of
//! `math.rs` kept as an internal implementation detail.

use rangekeeper_core::{Amount, PoolSnapshot};
use rust_decimal::Decimal;

use crate::error::{AmmError, Result};
use crate::math::{amounts_for_liquidity, liquidity_from_amounts};

#[derive(Debug, Clone, Copy)]
pub struct MintParams {
    pub amount0_desired: Amount,
    pub amount1_desired: Amount,
    pub amount0_min: Amount,
    pub amount1_min: Amount,
}

/// The concentrated-liquidity math this crate wraps. A single reference
/// implementation is provided ([`UniswapV3Math`]); the trait boundary
/// exists so the rebalance pipeline and action library depend on behavior,
/// not a concrete pool-math implementation.
pub trait PositionMath {
    fn amounts_for_liquidity(
        &self,
        pool: &PoolSnapshot,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
    ) -> (Amount, Amount);

    fn amounts_from_amounts(
        &self,
        pool: &PoolSnapshot,
        tick_lower: i32,
        tick_upper: i32,
        amount0_max: Amount,
        amount1_max: Amount,
    ) -> Result<(Amount, Amount)>;

    fn mint_params(
        &self,
        pool: &PoolSnapshot,
        tick_lower: i32,
        tick_upper: i32,
        amount0_desired: Amount,
        amount1_desired: Amount,
        slippage_tolerance: Decimal,
    ) -> Result<MintParams>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UniswapV3Math;

fn check_range(tick_lower: i32, tick_upper: i32) -> Result<()> {
    if tick_lower >= tick_upper {
        return Err(AmmError::InvalidRange {
            tick_lower,
            tick_upper,
        });
    }
    Ok(())
}

impl PositionMath for UniswapV3Math {
    fn amounts_for_liquidity(
        &self,
        pool: &PoolSnapshot,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
    ) -> (Amount, Amount) {
        let (a0, a1) = amounts_for_liquidity(pool, tick_lower, tick_upper, liquidity);
        (
            Amount::from_raw(a0.max(0.0) as u128, pool.token0.decimals),
            Amount::from_raw(a1.max(0.0) as u128, pool.token1.decimals),
        )
    }

    fn amounts_from_amounts(
        &self,
        pool: &PoolSnapshot,
        tick_lower: i32,
        tick_upper: i32,
        amount0_max: Amount,
        amount1_max: Amount,
    ) -> Result<(Amount, Amount)> {
        check_range(tick_lower, tick_upper)?;
        let scale0 = 10f64.powi(pool.token0.decimals as i32);
        let scale1 = 10f64.powi(pool.token1.decimals as i32);
        let raw0: f64 = amount0_max.inner().to_string().parse().unwrap_or(0.0);
        let raw1: f64 = amount1_max.inner().to_string().parse().unwrap_or(0.0);

        let (_, a0, a1) =
            liquidity_from_amounts(pool, tick_lower, tick_upper, raw0 * scale0, raw1 * scale1);

        Ok((
            Amount::from_raw(a0.max(0.0) as u128, pool.token0.decimals),
            Amount::from_raw(a1.max(0.0) as u128, pool.token1.decimals),
        ))
    }

    fn mint_params(
        &self,
        pool: &PoolSnapshot,
        tick_lower: i32,
        tick_upper: i32,
        amount0_desired: Amount,
        amount1_desired: Amount,
        slippage_tolerance: Decimal,
    ) -> Result<MintParams> {
        check_range(tick_lower, tick_upper)?;
        if amount0_desired.is_zero() && amount1_desired.is_zero() {
            return Err(AmmError::ZeroDesiredAmounts);
        }
        let one = Decimal::ONE;
        let factor = one - slippage_tolerance;
        Ok(MintParams {
            amount0_desired,
            amount1_desired,
            amount0_min: amount0_desired * factor,
            amount1_min: amount1_desired * factor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, U256};
    use rangekeeper_core::TokenRef;
    use rust_decimal_macros::dec;

    fn sample_pool() -> PoolSnapshot {
        PoolSnapshot {
            sqrt_price_x96: U256::from(79_228_162_514_264_337_593_543_950_336u128),
            tick: 0,
            liquidity: 1_000_000,
            tick_spacing: 10,
            token0: TokenRef::new(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), 6, "USDC"),
            token1: TokenRef::new(address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), 18, "WETH"),
        }
    }

    #[test]
    fn mint_params_rejects_inverted_range() {
        let math = UniswapV3Math;
        let pool = sample_pool();
        let result = math.mint_params(&pool, 100, -100, Amount::new(dec!(1)), Amount::new(dec!(1)), dec!(0.005));
        assert!(matches!(result, Err(AmmError::InvalidRange { .. })));
    }

    #[test]
    fn mint_params_rejects_zero_desired_amounts() {
        let math = UniswapV3Math;
        let pool = sample_pool();
        let result = math.mint_params(&pool, -100, 100, Amount::ZERO, Amount::ZERO, dec!(0.005));
        assert!(matches!(result, Err(AmmError::ZeroDesiredAmounts)));
    }

    #[test]
    fn mint_params_applies_slippage_tolerance_to_minimums() {
        let math = UniswapV3Math;
        let pool = sample_pool();
        let params = math
            .mint_params(&pool, -100, 100, Amount::new(dec!(100)), Amount::new(dec!(1)), dec!(0.01))
            .unwrap();
        assert_eq!(params.amount0_min.inner(), dec!(99.00));
        assert_eq!(params.amount1_min.inner(), dec!(0.99));
    }

    #[test]
    fn amounts_from_amounts_returns_nonnegative_amounts() {
        let math = UniswapV3Math;
        let pool = sample_pool();
        let (a0, a1) = math
            .amounts_from_amounts(&pool, -500, 500, Amount::new(dec!(1000)), Amount::new(dec!(1)))
            .unwrap();
        assert!(a0.inner() >= dec!(0));
        assert!(a1.inner() >= dec!(0));
    }
}
