//! Pool and token value types sampled fresh on every read — never mutated
//! in place, never cached across a suspension point that could see the
//! underlying pool move.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// An ERC-20 token as referenced by the pool, address-normalized to its
/// canonical lowercase form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRef {
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
}

impl TokenRef {
    #[must_use]
    pub fn new(address: Address, decimals: u8, symbol: impl Into<String>) -> Self {
        Self {
            address,
            decimals,
            symbol: symbol.into(),
        }
    }
}

/// A point-in-time read of pool state. Immutable: every field is sampled
/// together from `slot0`/`liquidity`/`tickSpacing` in one call so the tick
/// and price never drift apart within the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
    pub tick_spacing: i32,
    pub token0: TokenRef,
    pub token1: TokenRef,
}

impl PoolSnapshot {
    /// Price of one unit of `token0` expressed in `token1`, derived from
    /// `sqrtPriceX96` (`price = (sqrtPriceX96 / 2^96)^2`, decimal-adjusted).
    #[must_use]
    pub fn price_token0_in_token1(&self) -> rust_decimal::Decimal {
        use rust_decimal::prelude::*;

        let sqrt_price = self.sqrt_price_x96.to_string().parse::<f64>().unwrap_or(0.0);
        let q96 = 2f64.powi(96);
        let raw_price = (sqrt_price / q96).powi(2);
        let decimals_adj = 10f64.powi(self.token0.decimals as i32 - self.token1.decimals as i32);
        Decimal::from_f64(raw_price * decimals_adj).unwrap_or(Decimal::ZERO)
    }
}
