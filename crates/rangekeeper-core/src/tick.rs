//! Tick arithmetic shared by the AMM math facade, the rebalance pipeline and
//! the risk gates. Kept free of any pool-specific state so every crate that
//! needs "round this tick to a valid range boundary" uses the same rules.

/// Minimum tick supported by a Uniswap-v3-style pool.
pub const MIN_TICK: i32 = -887_272;
/// Maximum tick supported by a Uniswap-v3-style pool.
pub const MAX_TICK: i32 = 887_272;

/// Rounds `tick` down to the nearest multiple of `spacing` (floor, not
/// truncation — negative ticks round further negative, matching the pool's
/// own tick-spacing rule).
#[must_use]
pub fn floor_to_spacing(tick: i32, spacing: i32) -> i32 {
    tick.div_euclid(spacing) * spacing
}

/// Clamps `tick` into `[MIN_TICK, MAX_TICK]`.
#[must_use]
pub fn clamp_tick(tick: i32) -> i32 {
    tick.clamp(MIN_TICK, MAX_TICK)
}

/// Euclidean (floor) division, used for TWAP tick averaging so a negative
/// cumulative-tick delta does not get truncated toward zero.
#[must_use]
pub fn floor_div_i64(numerator: i64, denominator: i64) -> i64 {
    numerator.div_euclid(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_to_spacing_rounds_toward_negative_infinity() {
        assert_eq!(floor_to_spacing(7, 10), 0);
        assert_eq!(floor_to_spacing(-7, 10), -10);
        assert_eq!(floor_to_spacing(-10, 10), -10);
    }

    #[test]
    fn clamp_tick_bounds() {
        assert_eq!(clamp_tick(MIN_TICK - 100), MIN_TICK);
        assert_eq!(clamp_tick(MAX_TICK + 100), MAX_TICK);
        assert_eq!(clamp_tick(0), 0);
    }

    #[test]
    fn floor_div_matches_spec_twap_semantics() {
        // cumulative delta of -1 over a 300s window should floor to -1, not 0.
        assert_eq!(floor_div_i64(-1, 300), -1);
        assert_eq!(floor_div_i64(-300, 300), -1);
        assert_eq!(floor_div_i64(300, 300), 1);
    }
}
