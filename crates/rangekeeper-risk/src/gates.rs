//! Ordered safety gates evaluated before any on-chain mutation. Each gate
//! is a pure function over already-sampled data — none of them perform
//! RPC calls themselves, so a gate result is always consistent with the
//! snapshot it was computed from.

use rangekeeper_core::{floor_div_i64, Position};
use rust_decimal::Decimal;

use crate::error::{RiskError, Result};

/// Checks the 300-second time-weighted average tick against `current_tick`.
/// `cumulative_tick_start`/`cumulative_tick_end` are the pool's
/// `observe([window_secs, 0])` results.
pub fn check_twap_deviation(
    current_tick: i32,
    cumulative_tick_start: i64,
    cumulative_tick_end: i64,
    window_secs: i64,
    max_deviation_ticks: i32,
) -> Result<()> {
    let twap_tick = floor_div_i64(cumulative_tick_end - cumulative_tick_start, window_secs) as i32;
    let deviation = (current_tick - twap_tick).abs();
    if deviation > max_deviation_ticks {
        return Err(RiskError::TwapViolation {
            deviation_ticks: deviation,
            limit_ticks: max_deviation_ticks,
        });
    }
    Ok(())
}

/// Checks how far the current tick has drifted from the position's center
/// relative to its own width; a large drift means the range is deeply
/// out-of-the-money and waiting for hysteresis would compound losses.
pub fn check_circuit_breaker(
    position: &Position,
    current_tick: i32,
    deviation_factor: Decimal,
) -> Result<()> {
    let distance = position.distance_from_center(current_tick);
    let width = position.width_ticks();
    let limit = (Decimal::from(width) * deviation_factor)
        .trunc()
        .to_string()
        .parse::<i32>()
        .unwrap_or(i32::MAX);
    if distance > limit {
        return Err(RiskError::CircuitBreaker {
            distance_ticks: distance,
        });
    }
    Ok(())
}

/// Checks total equity against the hard stop threshold.
pub fn check_hard_equity_stop(total_usd: Decimal, threshold_usd: Decimal) -> Result<()> {
    if total_usd < threshold_usd {
        return Err(RiskError::HardEquityStop {
            equity_usd: total_usd.to_string(),
            threshold_usd: threshold_usd.to_string(),
        });
    }
    Ok(())
}

/// Dynamic hysteresis buffer: wider when recent volatility (ATR as a
/// percent of price) is higher, so the position doesn't rebalance on every
/// minor wobble during choppy markets.
#[must_use]
pub fn buffer_ticks(position_width: i32, vol_percent: Decimal, base_factor: Decimal, scaling: Decimal) -> i32 {
    let factor = (base_factor + vol_percent * scaling).clamp(Decimal::new(1, 1), Decimal::new(8, 1));
    (Decimal::from(position_width) * factor)
        .trunc()
        .to_string()
        .parse::<i32>()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use rust_decimal_macros::dec;

    fn sample_position(tl: i32, tu: i32) -> Position {
        Position {
            token_id: U256::from(1),
            tick_lower: tl,
            tick_upper: tu,
            liquidity: 1000,
            tokens_owed0: 0,
            tokens_owed1: 0,
        }
    }

    #[test]
    fn twap_within_limit_passes() {
        assert!(check_twap_deviation(100, 0, 30_000, 300, 200).is_ok());
    }

    #[test]
    fn twap_beyond_limit_aborts() {
        let result = check_twap_deviation(1000, 0, 30_000, 300, 200);
        assert!(matches!(result, Err(RiskError::TwapViolation { .. })));
    }

    #[test]
    fn twap_negative_cumulative_delta_uses_floor_division() {
        // cumulative delta of -1 over 300s floors to twap tick -1, not 0,
        // so a current tick of 0 is already 1 tick away from the twap.
        let result = check_twap_deviation(0, 0, -1, 300, 0);
        assert!(matches!(result, Err(RiskError::TwapViolation { deviation_ticks: 1, .. })));
    }

    #[test]
    fn circuit_breaker_within_limit_passes() {
        let pos = sample_position(-100, 100);
        assert!(check_circuit_breaker(&pos, 50, dec!(3.0)).is_ok());
    }

    #[test]
    fn circuit_breaker_beyond_limit_trips() {
        let pos = sample_position(-100, 100);
        let result = check_circuit_breaker(&pos, 1000, dec!(3.0));
        assert!(matches!(result, Err(RiskError::CircuitBreaker { .. })));
    }

    #[test]
    fn hard_equity_stop_trips_below_threshold() {
        let result = check_hard_equity_stop(dec!(50), dec!(100));
        assert!(matches!(result, Err(RiskError::HardEquityStop { .. })));
    }

    #[test]
    fn hard_equity_stop_passes_above_threshold() {
        assert!(check_hard_equity_stop(dec!(150), dec!(100)).is_ok());
    }

    #[test]
    fn buffer_ticks_clamped_to_bounds() {
        let narrow = buffer_ticks(1000, dec!(0), dec!(0.1), dec!(0.01));
        let wide = buffer_ticks(1000, dec!(1000), dec!(0.1), dec!(0.01));
        assert_eq!(narrow, 100);
        assert_eq!(wide, 800);
    }
}
