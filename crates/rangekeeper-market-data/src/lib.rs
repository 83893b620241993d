//! Market data client with provider failover and RSI/ATR derivation.

pub mod candles;
pub mod client;
pub mod error;
pub mod indicators;

pub use candles::{Candles, Provider};
pub use client::MarketDataClient;
pub use error::{MarketDataError, Result};
pub use indicators::{atr, rsi};
