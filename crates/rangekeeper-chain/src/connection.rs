//! Multi-endpoint RPC connection supervisor.
//!
//! Holds an ordered, non-empty ring of endpoints. Exposes exactly one live
//! client at a time; on failure it tears down the current client, debounces,
//! advances to the next endpoint in ring order, and notifies every
//! registered dependent so they can rebind (wallet, contract bindings, event
//! subscriptions all go stale across a rotation).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::{ChainError, Result};
use crate::heartbeat::HeartbeatManager;

const HEARTBEAT_INTERVAL_MS: u64 = 30_000;
const HEARTBEAT_TIMEOUT_MS: u64 = 10_000;
const ROTATE_DEBOUNCE: Duration = Duration::from_secs(2);

/// A rebind callback, invoked after every successful rotation. Dependents
/// must not cache anything across an `.await` boundary that would survive a
/// rotation — they re-fetch the client from the supervisor each time.
pub type OnSwitch = Arc<dyn Fn() + Send + Sync>;

fn is_websocket(endpoint: &str) -> bool {
    endpoint.starts_with("ws://") || endpoint.starts_with("wss://")
}

async fn build_client(endpoint: &str) -> Result<DynProvider> {
    if is_websocket(endpoint) {
        let ws = WsConnect::new(endpoint);
        let provider = ProviderBuilder::new()
            .connect_ws(ws)
            .await
            .map_err(|e| ChainError::Provider(format!("ws connect {endpoint}: {e}")))?;
        Ok(DynProvider::new(provider))
    } else {
        let url = endpoint
            .parse()
            .map_err(|e| ChainError::Provider(format!("invalid http url {endpoint}: {e}")))?;
        let provider = ProviderBuilder::new().connect_http(url);
        Ok(DynProvider::new(provider))
    }
}

/// The ordered endpoint list plus the currently live client.
pub struct ConnectionSupervisor {
    endpoints: Vec<String>,
    current_index: AtomicUsize,
    client: RwLock<Option<DynProvider>>,
    client_tx: watch::Sender<u64>,
    heartbeat: HeartbeatManager,
    on_switch: RwLock<Vec<OnSwitch>>,
    rotation_count: AtomicUsize,
}

impl ConnectionSupervisor {
    /// # Errors
    /// Returns [`ChainError::NoEndpoints`] if `endpoints` is empty.
    pub fn new(endpoints: Vec<String>) -> Result<Arc<Self>> {
        if endpoints.is_empty() {
            return Err(ChainError::NoEndpoints);
        }
        let (client_tx, _) = watch::channel(0);
        Ok(Arc::new(Self {
            endpoints,
            current_index: AtomicUsize::new(0),
            client: RwLock::new(None),
            client_tx,
            heartbeat: HeartbeatManager::new(HEARTBEAT_INTERVAL_MS, HEARTBEAT_TIMEOUT_MS),
            on_switch: RwLock::new(Vec::new()),
            rotation_count: AtomicUsize::new(0),
        }))
    }

    /// Registers a callback invoked after every successful rotation.
    pub fn register_on_switch(&self, cb: OnSwitch) {
        self.on_switch.write().push(cb);
    }

    /// A watch channel dependents can subscribe to instead of a raw
    /// callback; the value is a monotonically increasing rotation counter.
    #[must_use]
    pub fn subscribe_rotations(&self) -> watch::Receiver<u64> {
        self.client_tx.subscribe()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index.load(Ordering::Acquire) % self.endpoints.len()
    }

    #[must_use]
    pub fn current_endpoint(&self) -> &str {
        &self.endpoints[self.current_index()]
    }

    #[must_use]
    pub fn rotation_count(&self) -> usize {
        self.rotation_count.load(Ordering::Acquire)
    }

    /// Connects to the current endpoint if not already connected, returning
    /// the live client.
    pub async fn connect(self: &Arc<Self>) -> Result<DynProvider> {
        if let Some(client) = self.client.read().clone() {
            return Ok(client);
        }
        self.install_current_endpoint().await
    }

    async fn install_current_endpoint(self: &Arc<Self>) -> Result<DynProvider> {
        let endpoint = self.current_endpoint().to_string();
        info!(endpoint = %endpoint, "connecting rpc endpoint");
        let client = build_client(&endpoint).await?;
        *self.client.write() = Some(client.clone());
        self.heartbeat.reset();
        Ok(client)
    }

    /// Returns the currently live client, connecting if necessary.
    pub async fn current_client(self: &Arc<Self>) -> Result<DynProvider> {
        self.connect().await
    }

    /// Tears down the current client and advances to the next endpoint in
    /// ring order. Callers that race onto this are not deduplicated here —
    /// in practice it's only ever driven by the heartbeat loop or a single
    /// retrying call site at a time, never both concurrently.
    pub async fn rotate(self: &Arc<Self>) -> Result<DynProvider> {
        self.do_rotate().await
    }

    async fn do_rotate(self: &Arc<Self>) -> Result<DynProvider> {
        warn!(endpoint = %self.current_endpoint(), "rotating rpc endpoint");
        *self.client.write() = None;
        tokio::time::sleep(ROTATE_DEBOUNCE).await;

        let n = self.endpoints.len();
        let next = (self.current_index.load(Ordering::Acquire) + 1) % n;
        self.current_index.store(next, Ordering::Release);

        let client = self.install_current_endpoint().await?;
        let count = self.rotation_count.fetch_add(1, Ordering::AcqRel) as u64 + 1;
        let _ = self.client_tx.send(count);

        for cb in self.on_switch.read().iter() {
            cb();
        }
        info!(endpoint = %self.current_endpoint(), rotation = count, "rotated to new endpoint");
        Ok(client)
    }

    /// True if `err`'s message indicates endpoint instability worth
    /// rotating away from (HTTP endpoints have no heartbeat, so callers
    /// signal instability explicitly via this check).
    #[must_use]
    pub fn looks_unstable(err: &str) -> bool {
        let lowered = err.to_lowercase();
        lowered.contains("429")
            || lowered.contains("too many requests")
            || lowered.contains("timeout")
            || lowered.contains("connection closed")
            || lowered.contains("bad_data")
    }

    /// Runs the heartbeat probe loop for the currently connected endpoint,
    /// rotating once it's gone stale. Intended to be spawned as a
    /// background task alongside the block poll; WebSocket endpoints only
    /// (an HTTP endpoint has no persistent connection to go quiet on —
    /// its instability surfaces through `looks_unstable` at call sites
    /// instead).
    pub async fn run_heartbeat_loop(self: Arc<Self>) {
        loop {
            self.heartbeat.wait_for_next_poll().await;
            if !is_websocket(self.current_endpoint()) {
                continue;
            }
            let client = match self.client.read().clone() {
                Some(c) => c,
                None => continue,
            };
            match client.get_block_number().await {
                Ok(_) => self.heartbeat.record_success(),
                Err(e) => error!(?e, "heartbeat probe failed"),
            }
            if self.heartbeat.is_stale() {
                error!("endpoint stale, rotating");
                if let Err(e) = self.rotate().await {
                    error!(?e, "rotation after stale heartbeat failed");
                }
            }
        }
    }

    /// Rotates to the next endpoint if `err`'s message indicates transient
    /// instability. Called from RPC call sites after a failed read/write so
    /// HTTP endpoints — which have no persistent connection for the
    /// heartbeat loop to monitor — still fail over. Errors from the rotation
    /// itself are logged, not propagated: the caller's own error is what the
    /// retry/caller surfaces.
    pub async fn rotate_if_unstable(self: &Arc<Self>, err: &str) {
        if !Self::looks_unstable(err) {
            return;
        }
        warn!(error = %err, "rpc error looks unstable, rotating endpoint");
        if let Err(e) = self.rotate().await {
            error!(?e, "rotation after unstable rpc call failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_endpoint_list() {
        let result = ConnectionSupervisor::new(vec![]);
        assert!(matches!(result, Err(ChainError::NoEndpoints)));
    }

    #[test]
    fn is_websocket_detects_scheme() {
        assert!(is_websocket("wss://example.com"));
        assert!(is_websocket("ws://example.com"));
        assert!(!is_websocket("https://example.com"));
    }

    #[test]
    fn looks_unstable_matches_known_transient_errors() {
        assert!(ConnectionSupervisor::looks_unstable("429 Too Many Requests"));
        assert!(ConnectionSupervisor::looks_unstable("request timeout"));
        assert!(!ConnectionSupervisor::looks_unstable("invalid signature"));
    }

    #[tokio::test]
    async fn current_endpoint_starts_at_index_zero() {
        let sup = ConnectionSupervisor::new(vec![
            "https://a.example".to_string(),
            "https://b.example".to_string(),
        ])
        .unwrap();
        assert_eq!(sup.current_endpoint(), "https://a.example");
    }
}
