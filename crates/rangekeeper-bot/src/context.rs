//! The loop's mutable state, collapsed into one struct owned by
//! [`crate::app::Application`] and touched only from inside the block
//! handler — never shared, never locked.

use std::time::Instant;

use rust_decimal::Decimal;

/// Tracked across blocks so the hysteresis buffer doesn't refetch ATR on
/// every single block.
pub struct LoopContext {
    is_processing: bool,
    last_run_at: Option<Instant>,
    cached_atr: Option<Decimal>,
    last_atr_update: Option<Instant>,
    pub blocks_seen: u64,
}

impl Default for LoopContext {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_processing: false,
            last_run_at: None,
            cached_atr: None,
            last_atr_update: None,
            blocks_seen: 0,
        }
    }

    /// Tries to acquire the single-flight latch. `false` means a block
    /// handler invocation is already in flight and this block should be
    /// dropped, not queued.
    #[must_use]
    pub fn try_begin(&mut self) -> bool {
        if self.is_processing {
            return false;
        }
        self.is_processing = true;
        true
    }

    pub fn end(&mut self) {
        self.is_processing = false;
        self.last_run_at = Some(Instant::now());
    }

    /// True if fewer than `min_interval_ms` have elapsed since the last
    /// completed run.
    #[must_use]
    pub fn within_min_interval(&self, min_interval_ms: u64) -> bool {
        match self.last_run_at {
            Some(last) => last.elapsed().as_millis() < u128::from(min_interval_ms),
            None => false,
        }
    }

    /// Returns the cached ATR if it was refreshed within
    /// `refresh_interval_secs`, else `None` so the caller refetches.
    #[must_use]
    pub fn fresh_atr(&self, refresh_interval_secs: u64) -> Option<Decimal> {
        match (self.cached_atr, self.last_atr_update) {
            (Some(atr), Some(updated)) if updated.elapsed().as_secs() < refresh_interval_secs => Some(atr),
            _ => None,
        }
    }

    pub fn cache_atr(&mut self, atr: Decimal) {
        self.cached_atr = Some(atr);
        self.last_atr_update = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn second_begin_fails_while_first_is_in_flight() {
        let mut ctx = LoopContext::new();
        assert!(ctx.try_begin());
        assert!(!ctx.try_begin());
        ctx.end();
        assert!(ctx.try_begin());
    }

    #[test]
    fn within_min_interval_false_before_any_run() {
        let ctx = LoopContext::new();
        assert!(!ctx.within_min_interval(3000));
    }

    #[test]
    fn within_min_interval_true_immediately_after_a_run() {
        let mut ctx = LoopContext::new();
        ctx.end();
        assert!(ctx.within_min_interval(3000));
    }

    #[test]
    fn fresh_atr_absent_before_first_cache() {
        let ctx = LoopContext::new();
        assert!(ctx.fresh_atr(300).is_none());
    }

    #[test]
    fn fresh_atr_returns_cached_value_within_window() {
        let mut ctx = LoopContext::new();
        ctx.cache_atr(dec!(12.5));
        assert_eq!(ctx.fresh_atr(300), Some(dec!(12.5)));
    }
}
