//! Monotonic nonce tracking for the operator wallet.
//!
//! Every action-library call that submits a transaction draws its nonce
//! from here so that a pipeline run's sequential transactions (exit, swap,
//! mint) never race each other onto the mempool out of order, and never
//! collide with each other even if two pipeline steps happen to fire their
//! RPC calls concurrently for some other reason.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{error, warn};

use crate::error::{ChainError, Result};

/// Abstracts wall-clock time so nonce-drift tests don't need to sleep.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Nonce-unit drift at or above which a resync is treated as a hard error
/// rather than a routine catch-up (it most likely means a second signer is
/// racing this process against the same account).
const DRIFT_ERROR_THRESHOLD: u64 = 5;

/// Tracks the next nonce to use, guaranteeing strict monotonicity via a
/// compare-and-swap loop even if the wall clock or chain nonce regresses.
pub struct NonceManager<C: Clock = SystemClock> {
    next: AtomicU64,
    clock: C,
    last_sync_ms: AtomicU64,
}

impl NonceManager<SystemClock> {
    #[must_use]
    pub fn new(starting_nonce: u64) -> Self {
        Self::with_clock(starting_nonce, SystemClock)
    }
}

impl<C: Clock> NonceManager<C> {
    #[must_use]
    pub fn with_clock(starting_nonce: u64, clock: C) -> Self {
        Self {
            next: AtomicU64::new(starting_nonce),
            clock,
            last_sync_ms: AtomicU64::new(0),
        }
    }

    /// Draws the next nonce and advances the counter. Safe for concurrent
    /// callers: a CAS loop, not a simple `fetch_add`, so a caller can never
    /// observe the post-increment value of another caller's in-flight draw.
    pub fn next(&self) -> u64 {
        loop {
            let current = self.next.load(Ordering::Acquire);
            let candidate = current + 1;
            if self
                .next
                .compare_exchange(current, candidate, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return current;
            }
        }
    }

    /// Reconciles the local counter with the chain's reported transaction
    /// count after a reconnect or at startup. Large drift is logged; very
    /// large drift is treated as an error since it likely indicates stale
    /// local state racing a second signer against the same account.
    pub fn sync_with_server(&self, server_nonce: u64) -> Result<()> {
        let local = self.next.load(Ordering::Acquire);
        let drift = server_nonce as i64 - local as i64;
        self.last_sync_ms.store(self.clock.now_ms(), Ordering::Release);

        if drift.unsigned_abs() >= DRIFT_ERROR_THRESHOLD {
            error!(local, server_nonce, "large nonce drift detected");
            return Err(ChainError::NonceDrift {
                local,
                server: server_nonce,
            });
        }
        if drift != 0 {
            warn!(local, server_nonce, drift, "nonce drift detected, resyncing");
            self.next.store(server_nonce, Ordering::Release);
        }
        Ok(())
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        self.next.load(Ordering::Acquire)
    }
}
