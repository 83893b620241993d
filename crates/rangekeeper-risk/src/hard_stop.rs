//! The Safe Mode latch.
//!
//! Once tripped, `OperatingMode::Safe` is terminal for the lifetime of the
//! process: the strategy loop stops acting on every block (beyond a
//! keep-alive log line) until an operator restarts after investigating.
//! Unlike the circuit breaker, this latch never resets itself.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{error, warn};

/// Why Safe Mode was entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafeModeReason {
    HardEquityStopAtEntry,
    HardEquityStopInPosition,
    Manual { message: String },
}

impl std::fmt::Display for SafeModeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HardEquityStopAtEntry => write!(f, "hard equity stop tripped before any position was open"),
            Self::HardEquityStopInPosition => write!(f, "hard equity stop tripped with an open position"),
            Self::Manual { message } => write!(f, "manual: {message}"),
        }
    }
}

/// A one-way latch: `trigger` only ever transitions `false -> true`, never
/// back. Safe for concurrent callers via a CAS on the underlying flag.
pub struct SafeModeLatch {
    triggered: AtomicBool,
    reason: RwLock<Option<SafeModeReason>>,
}

impl Default for SafeModeLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl SafeModeLatch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            triggered: AtomicBool::new(false),
            reason: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    pub fn trigger(&self, reason: SafeModeReason) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            *self.reason.write() = Some(reason.clone());
            error!(reason = %reason, "SAFE MODE TRIGGERED");
        } else {
            warn!(new_reason = %reason, "safe mode already triggered, ignoring new reason");
        }
    }

    #[must_use]
    pub fn reason(&self) -> Option<SafeModeReason> {
        if self.is_triggered() {
            self.reason.read().clone()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_untriggered() {
        let latch = SafeModeLatch::new();
        assert!(!latch.is_triggered());
        assert!(latch.reason().is_none());
    }

    #[test]
    fn trigger_sets_reason() {
        let latch = SafeModeLatch::new();
        latch.trigger(SafeModeReason::HardEquityStopAtEntry);
        assert!(latch.is_triggered());
        assert_eq!(latch.reason(), Some(SafeModeReason::HardEquityStopAtEntry));
    }

    #[test]
    fn second_trigger_preserves_first_reason() {
        let latch = SafeModeLatch::new();
        latch.trigger(SafeModeReason::HardEquityStopAtEntry);
        latch.trigger(SafeModeReason::Manual {
            message: "operator override".to_string(),
        });
        assert_eq!(latch.reason(), Some(SafeModeReason::HardEquityStopAtEntry));
    }
}
