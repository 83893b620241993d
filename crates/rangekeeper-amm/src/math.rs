//! Raw concentrated-liquidity math (Uniswap-v3 style), kept in plain `f64`
//! internally. Tick/liquidity math does not need `Decimal`'s exactness —
//! only the token amounts that cross a transaction boundary do, and those
//! are converted back to `Decimal`-backed [`rangekeeper_core::Amount`] at
//! the call sites in `position_math.rs`.

use rangekeeper_core::PoolSnapshot;

/// `sqrt(1.0001^tick)`, i.e. the pool's internal unscaled sqrt-price ratio
/// at `tick` (not multiplied by `2^96`).
#[must_use]
pub fn sqrt_ratio_at_tick(tick: i32) -> f64 {
    1.0001_f64.powf(f64::from(tick) / 2.0)
}

/// The pool's current unscaled sqrt-price ratio, derived from `sqrtPriceX96`.
#[must_use]
pub fn pool_sqrt_ratio(pool: &PoolSnapshot) -> f64 {
    let sqrt_price_x96: f64 = pool.sqrt_price_x96.to_string().parse().unwrap_or(0.0);
    sqrt_price_x96 / 2f64.powi(96)
}

/// Token amounts backing `liquidity` over `[tick_lower, tick_upper]` at the
/// pool's current tick, in raw (undecimaled) base units.
#[must_use]
pub fn amounts_for_liquidity(
    pool: &PoolSnapshot,
    tick_lower: i32,
    tick_upper: i32,
    liquidity: u128,
) -> (f64, f64) {
    let l = liquidity as f64;
    let sqrt_p = pool_sqrt_ratio(pool);
    let sqrt_a = sqrt_ratio_at_tick(tick_lower);
    let sqrt_b = sqrt_ratio_at_tick(tick_upper);

    if pool.tick <= tick_lower {
        (l * (1.0 / sqrt_a - 1.0 / sqrt_b), 0.0)
    } else if pool.tick >= tick_upper {
        (0.0, l * (sqrt_b - sqrt_a))
    } else {
        let amount0 = l * (1.0 / sqrt_p - 1.0 / sqrt_b);
        let amount1 = l * (sqrt_p - sqrt_a);
        (amount0, amount1)
    }
}

/// The maximum liquidity obtainable from `amount0_max`/`amount1_max` at the
/// pool's current price, and the (<=) amounts it actually consumes.
#[must_use]
pub fn liquidity_from_amounts(
    pool: &PoolSnapshot,
    tick_lower: i32,
    tick_upper: i32,
    amount0_max: f64,
    amount1_max: f64,
) -> (f64, f64, f64) {
    let sqrt_p = pool_sqrt_ratio(pool);
    let sqrt_a = sqrt_ratio_at_tick(tick_lower);
    let sqrt_b = sqrt_ratio_at_tick(tick_upper);

    let liquidity = if pool.tick <= tick_lower {
        amount0_max * (sqrt_a * sqrt_b) / (sqrt_b - sqrt_a)
    } else if pool.tick >= tick_upper {
        amount1_max / (sqrt_b - sqrt_a)
    } else {
        let l0 = amount0_max * (sqrt_p * sqrt_b) / (sqrt_b - sqrt_p);
        let l1 = amount1_max / (sqrt_p - sqrt_a);
        l0.min(l1)
    };

    let (amount0, amount1) = amounts_for_liquidity(pool, tick_lower, tick_upper, liquidity as u128);
    (liquidity, amount0, amount1)
}
