//! Safety gates: TWAP deviation, circuit breaker, dynamic hysteresis
//! buffer, hard equity stop, and the terminal Safe Mode latch.

pub mod error;
pub mod gates;
pub mod hard_stop;

pub use error::{RiskError, Result};
pub use gates::{buffer_ticks, check_circuit_breaker, check_hard_equity_stop, check_twap_deviation};
pub use hard_stop::{SafeModeLatch, SafeModeReason};
