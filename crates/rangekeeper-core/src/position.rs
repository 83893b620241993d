//! The on-chain liquidity position and the transient plan used to mint a
//! replacement range during a rebalance.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::tick::{clamp_tick, floor_to_spacing, MAX_TICK, MIN_TICK};

/// A concentrated-liquidity NFT position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub token_id: U256,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

impl Position {
    #[must_use]
    pub fn width_ticks(&self) -> i32 {
        self.tick_upper - self.tick_lower
    }

    #[must_use]
    pub fn center_tick(&self) -> i32 {
        (self.tick_lower + self.tick_upper) / 2
    }

    /// Absolute distance in ticks from `current_tick` to the position's
    /// center — used by the circuit breaker.
    #[must_use]
    pub fn distance_from_center(&self, current_tick: i32) -> i32 {
        (current_tick - self.center_tick()).abs()
    }

    #[must_use]
    pub fn is_in_range(&self, current_tick: i32) -> bool {
        current_tick >= self.tick_lower && current_tick <= self.tick_upper
    }
}

/// Skew of a new range relative to the current price, driven by RSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeSkew {
    /// Range sits mostly below spot (overbought — expect mean reversion down).
    Low,
    /// Symmetric range around spot.
    Balanced,
    /// Range sits mostly above spot (oversold — expect mean reversion up).
    High,
}

impl RangeSkew {
    /// Fraction of `totalSpan` allocated above the current tick.
    #[must_use]
    pub fn upper_fraction(&self) -> rust_decimal::Decimal {
        use rust_decimal_macros::dec;
        match self {
            RangeSkew::Low => dec!(0.3),
            RangeSkew::Balanced => dec!(0.5),
            RangeSkew::High => dec!(0.7),
        }
    }

    #[must_use]
    pub fn from_rsi(rsi: rust_decimal::Decimal) -> Self {
        use rust_decimal_macros::dec;
        if rsi > dec!(75) {
            RangeSkew::Low
        } else if rsi < dec!(25) {
            RangeSkew::High
        } else {
            RangeSkew::Balanced
        }
    }
}

/// A proposed new range, not yet minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePlan {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub skew: RangeSkew,
    pub width_ticks: i32,
}

impl RangePlan {
    /// Builds a valid, spacing-aligned, bounds-clamped range plan from a
    /// raw width and skew around `current_tick`.
    #[must_use]
    pub fn build(current_tick: i32, tick_spacing: i32, width_ticks: i32, skew: RangeSkew) -> Self {
        let total_span = width_ticks * 2;
        let upper_fraction = skew.upper_fraction();
        let upper_diff = (rust_decimal::Decimal::from(total_span) * upper_fraction)
            .trunc()
            .to_string()
            .parse::<i32>()
            .unwrap_or(total_span / 2);
        let lower_diff = total_span - upper_diff;

        let mut tick_lower = floor_to_spacing(current_tick - lower_diff, tick_spacing);
        let mut tick_upper = floor_to_spacing(current_tick + upper_diff, tick_spacing);

        tick_lower = clamp_tick(tick_lower).max(MIN_TICK);
        tick_upper = clamp_tick(tick_upper).min(MAX_TICK);

        if tick_lower >= tick_upper {
            tick_upper = clamp_tick(tick_lower + tick_spacing);
            if tick_lower >= tick_upper {
                tick_lower = clamp_tick(tick_upper - tick_spacing);
            }
        }

        Self {
            tick_lower,
            tick_upper,
            skew,
            width_ticks,
        }
    }
}
