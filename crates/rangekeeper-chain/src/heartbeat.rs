//! Liveness tracking for the currently connected RPC endpoint.
//!
//! Every probe here is a single synchronous round trip (`eth_blockNumber`,
//! the cheapest read the chain exposes) issued and awaited inline by the
//! connection supervisor — there's no asynchronous pong frame arriving on a
//! separate channel to wait on, so the only state worth keeping is "how
//! long ago did a probe last succeed."

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

pub struct HeartbeatManager {
    poll_interval_ms: u64,
    stale_after_ms: u64,
    last_success: Arc<RwLock<DateTime<Utc>>>,
}

impl HeartbeatManager {
    #[must_use]
    pub fn new(poll_interval_ms: u64, stale_after_ms: u64) -> Self {
        Self {
            poll_interval_ms,
            stale_after_ms,
            last_success: Arc::new(RwLock::new(Utc::now())),
        }
    }

    /// Resets the staleness clock; called right after a successful (re)connect.
    pub fn reset(&self) {
        *self.last_success.write() = Utc::now();
    }

    /// Records that a probe round trip just completed successfully.
    pub fn record_success(&self) {
        *self.last_success.write() = Utc::now();
    }

    #[must_use]
    pub fn time_since_last_success_ms(&self) -> i64 {
        (Utc::now() - *self.last_success.read()).num_milliseconds()
    }

    /// True once the endpoint has gone longer than `stale_after_ms` without
    /// a successful probe — the signal the supervisor rotates on.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.time_since_last_success_ms() > self.stale_after_ms as i64
    }

    pub async fn wait_for_next_poll(&self) {
        tokio::time::sleep(Duration::from_millis(self.poll_interval_ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_manager_is_not_stale() {
        let hb = HeartbeatManager::new(30_000, 10_000);
        assert!(!hb.is_stale());
    }

    #[test]
    fn record_success_keeps_it_fresh() {
        let hb = HeartbeatManager::new(30_000, 10_000);
        hb.record_success();
        assert!(!hb.is_stale());
    }

    #[test]
    fn reset_refreshes_the_clock() {
        let hb = HeartbeatManager::new(30_000, 10_000);
        hb.reset();
        assert!(hb.time_since_last_success_ms() < 1_000);
    }
}
