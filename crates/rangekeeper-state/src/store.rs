//! Persisted position state: atomic load/save plus orphan recovery.
//!
//! Mirrors the write-to-temp-then-rename discipline of a daily rotating
//! file writer, but over a single small JSON document instead of an
//! append-only log — there is only ever one "current position" to record.

use std::path::{Path, PathBuf};

use alloy::primitives::{Address, U256};
use rangekeeper_actions::ChainOps;
use rangekeeper_core::PersistedState;
use tracing::{info, warn};

use crate::error::Result;

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the default state (`tokenId == "0"`) if the file is absent
    /// or fails to parse — a corrupt state file must never block startup.
    pub fn load(&self) -> PersistedState {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(error = %e, path = %self.path.display(), "state file unreadable, starting from none");
                PersistedState::none()
            }),
            Err(_) => PersistedState::none(),
        }
    }

    /// Writes `{tokenId, lastCheck: now}` atomically: serialize to a sibling
    /// temp file, `fsync`, then rename over the target. A crash mid-write
    /// never leaves a truncated or half-written state file behind.
    pub fn save(&self, token_id: &str, now_ms: i64) -> Result<()> {
        let state = PersistedState {
            token_id: token_id.to_string(),
            last_check: now_ms,
        };
        let json = serde_json::to_string_pretty(&state)?;

        let tmp_path = tmp_path_for(&self.path);
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        info!(token_id, path = %self.path.display(), "persisted state");
        Ok(())
    }

    /// If the local record says "no position" but the wallet actually holds
    /// position NFTs (e.g. after a crash between mint success and save),
    /// adopts the highest-indexed one with positive liquidity. Ties among
    /// multiple owned NFTs are broken by whichever call returns last in the
    /// owner's enumeration order, which for a position manager is the most
    /// recently minted.
    pub async fn scan_orphans<C: ChainOps>(&self, ops: &C, wallet: Address) -> Result<PersistedState> {
        let current = self.load();
        if current.has_position() {
            return Ok(current);
        }

        let owned = ops
            .owned_position_token_ids(wallet)
            .await
            .map_err(|e| crate::error::StateError::Chain(e.to_string()))?;

        for token_id in owned.into_iter().rev() {
            let liquidity = ops
                .position_liquidity(token_id)
                .await
                .map_err(|e| crate::error::StateError::Chain(e.to_string()))?;
            if liquidity > 0 {
                info!(%token_id, liquidity, "adopted orphaned position");
                self.save(&token_id.to_string(), 0)?;
                return Ok(PersistedState {
                    token_id: token_id.to_string(),
                    last_check: 0,
                });
            }
        }

        Ok(current)
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use rangekeeper_actions::chain_ops::mock::MockChainOps;
    use tempfile::tempdir;

    #[test]
    fn load_missing_file_returns_none_state() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let state = store.load();
        assert_eq!(state.token_id, "0");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store.save("42", 1000).unwrap();
        let state = store.load();
        assert_eq!(state.token_id, "42");
        assert_eq!(state.last_check, 1000);
    }

    #[test]
    fn load_corrupt_file_returns_none_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        let store = StateStore::new(path);
        let state = store.load();
        assert_eq!(state.token_id, "0");
    }

    #[test]
    fn save_does_not_leave_a_temp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = StateStore::new(&path);
        store.save("7", 0).unwrap();
        assert!(!tmp_path_for(&path).exists());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn scan_orphans_keeps_existing_position() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store.save("9", 0).unwrap();
        let ops = MockChainOps::new();
        let state = store
            .scan_orphans(&ops, address!("0000000000000000000000000000000000000001"))
            .await
            .unwrap();
        assert_eq!(state.token_id, "9");
    }

    #[tokio::test]
    async fn scan_orphans_adopts_highest_indexed_liquid_position() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let ops = MockChainOps::new();
        *ops.owned_token_ids.write() = vec![U256::from(3), U256::from(8)];
        ops.position_liquidity_result.write().insert(U256::from(8), 500);
        ops.position_liquidity_result.write().insert(U256::from(3), 0);

        let state = store
            .scan_orphans(&ops, address!("0000000000000000000000000000000000000001"))
            .await
            .unwrap();
        assert_eq!(state.token_id, "8");
        assert_eq!(store.load().token_id, "8");
    }

    #[tokio::test]
    async fn scan_orphans_finds_nothing_when_all_positions_are_empty() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let ops = MockChainOps::new();
        *ops.owned_token_ids.write() = vec![U256::from(3)];
        ops.position_liquidity_result.write().insert(U256::from(3), 0);

        let state = store
            .scan_orphans(&ops, address!("0000000000000000000000000000000000000001"))
            .await
            .unwrap();
        assert_eq!(state.token_id, "0");
    }
}
