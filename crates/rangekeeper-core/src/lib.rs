//! Core domain types for the rangekeeper liquidity-rebalancing agent.
//!
//! This crate provides the fundamental value types shared by every other
//! crate in the workspace:
//! - `Price`, `Amount`: precision-safe decimal newtypes
//! - `PoolSnapshot`, `TokenRef`: immutable pool reads
//! - `Position`, `RangePlan`, `RangeSkew`: the on-chain position and the
//!   proposed replacement range
//! - `PersistedState`, `OperatingMode`, `EquitySnapshot`: cross-restart and
//!   point-in-time accounting state

pub mod decimal;
pub mod error;
pub mod pool;
pub mod position;
pub mod state;
pub mod tick;

pub use decimal::{Amount, Price};
pub use error::{CoreError, Result};
pub use pool::{PoolSnapshot, TokenRef};
pub use position::{Position, RangePlan, RangeSkew};
pub use state::{EquitySnapshot, OperatingMode, PersistedState};
pub use tick::{clamp_tick, floor_div_i64, floor_to_spacing, MAX_TICK, MIN_TICK};
