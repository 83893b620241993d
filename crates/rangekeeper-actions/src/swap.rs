//! Target-ratio swap ahead of a mint, and the full-sweep-to-stable used by
//! stop-loss paths.

use rangekeeper_amm::PositionMath;
use rangekeeper_core::{Amount, PoolSnapshot};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::chain_ops::ChainOps;
use crate::error::{ActionError, Result};

/// Swaps whichever side of the wallet is in excess toward the ratio the new
/// range wants, skipping the swap entirely if the required amount is below
/// `dust_threshold` for that side.
pub async fn smart_swap<C: ChainOps, M: PositionMath>(
    ops: &C,
    pool: &PoolSnapshot,
    math: &M,
    tick_lower: i32,
    tick_upper: i32,
    wallet_token0: Amount,
    wallet_token1: Amount,
    usdc_dust_threshold: Amount,
    weth_dust_threshold: Amount,
    slippage_tolerance: Decimal,
) -> Result<()> {
    let (ideal0, ideal1) = math.amounts_from_amounts(
        pool,
        tick_lower,
        tick_upper,
        Amount::new(Decimal::MAX / Decimal::from(2)),
        Amount::new(Decimal::MAX / Decimal::from(2)),
    )?;

    let price0 = pool.price_token0_in_token1();
    let total_value_in_token1 =
        wallet_token1.inner() + wallet_token0.inner() * price0;

    let target0 = if ideal0.is_zero() {
        Decimal::ZERO
    } else {
        let ratio = ideal1.inner() / ideal0.inner();
        total_value_in_token1 / (price0 + ratio)
    };

    let delta0 = wallet_token0.inner() - target0;

    if ideal0.is_zero() {
        // Single-sided range entirely in token1: sell all of token0.
        return execute_swap(ops, pool, wallet_token0, true, usdc_dust_threshold, slippage_tolerance).await;
    }
    if ideal1.is_zero() {
        // Single-sided range entirely in token0: sell all of token1.
        return execute_swap(ops, pool, wallet_token1, false, weth_dust_threshold, slippage_tolerance).await;
    }

    if delta0 > Decimal::ZERO {
        let amount = Amount::new(delta0);
        if amount.is_dust(usdc_dust_threshold) {
            info!(amount = %amount, "swap amount below dust threshold, skipping");
            return Ok(());
        }
        execute_swap(ops, pool, amount, true, usdc_dust_threshold, slippage_tolerance).await
    } else if delta0 < Decimal::ZERO {
        let amount0_equiv = Amount::new(-delta0);
        let amount1 = Amount::new(amount0_equiv.inner() * price0);
        if amount1.is_dust(weth_dust_threshold) {
            info!(amount = %amount1, "swap amount below dust threshold, skipping");
            return Ok(());
        }
        execute_swap(ops, pool, amount1, false, weth_dust_threshold, slippage_tolerance).await
    } else {
        Ok(())
    }
}

/// Converts the entire `weth_balance` to token0 (the stable side), skipped
/// below `dust_threshold`.
pub async fn sweep_to_stable<C: ChainOps>(
    ops: &C,
    pool: &PoolSnapshot,
    weth_balance: Amount,
    dust_threshold: Amount,
    slippage_tolerance: Decimal,
) -> Result<()> {
    if weth_balance.is_dust(dust_threshold) {
        info!(balance = %weth_balance, "weth balance below dust threshold, skipping sweep");
        return Ok(());
    }
    execute_swap(ops, pool, weth_balance, false, dust_threshold, slippage_tolerance).await
}

async fn execute_swap<C: ChainOps>(
    ops: &C,
    pool: &PoolSnapshot,
    amount_in: Amount,
    token0_to_token1: bool,
    dust_threshold: Amount,
    slippage_tolerance: Decimal,
) -> Result<()> {
    if amount_in.is_dust(dust_threshold) {
        return Ok(());
    }
    let (token_in, token_out, decimals_in) = if token0_to_token1 {
        (pool.token0.address, pool.token1.address, pool.token0.decimals)
    } else {
        (pool.token1.address, pool.token0.address, pool.token1.decimals)
    };

    let raw_amount_in = (amount_in.inner() * Decimal::from(10u128.pow(decimals_in as u32)))
        .trunc()
        .to_string()
        .parse::<u128>()
        .unwrap_or(0);

    let quote = ops
        .quote_exact_input_single(token_in, token_out, raw_amount_in)
        .await?;
    let min_out = (Decimal::from(quote) * (Decimal::ONE - slippage_tolerance))
        .trunc()
        .to_string()
        .parse::<u128>()
        .unwrap_or(0);

    match ops
        .exact_input_single(token_in, token_out, raw_amount_in, min_out)
        .await
    {
        Ok(_) => Ok(()),
        Err(e) => {
            warn!(error = %e, "swap failed");
            Err(ActionError::SwapRevert(e.to_string()))
        }
    }
}
