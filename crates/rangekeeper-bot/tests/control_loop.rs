//! Integration tests for the control-loop decisions `Application` wires
//! together: the rebalance pipeline, the risk gates, and the persisted
//! state store acting in concert, driven through the same
//! [`rangekeeper_actions::chain_ops::mock::MockChainOps`] fixture the
//! lower-level crates use.

use alloy::primitives::{address, U256};
use rangekeeper_actions::chain_ops::mock::MockChainOps;
use rangekeeper_amm::UniswapV3Math;
use rangekeeper_core::{Amount, Position};
use rangekeeper_market_data::MarketDataClient;
use rangekeeper_pipeline::{run_rebalance, PipelineConfig, PipelineOutcome};
use rangekeeper_risk::{check_circuit_breaker, check_hard_equity_stop};
use rangekeeper_state::StateStore;
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn wallet() -> alloy::primitives::Address {
    address!("0000000000000000000000000000000000000001")
}

fn pipeline_cfg() -> PipelineConfig {
    PipelineConfig {
        twap_deviation_ticks: 200,
        twap_window_secs: 300,
        atr_safety_factor: dec!(1.5),
        width_ticks_min: 200,
        width_ticks_max: 4000,
        rebalance_threshold_usdc: Amount::new(dec!(1)),
        rebalance_threshold_weth: Amount::new(dec!(0.001)),
        slippage_tolerance: dec!(0.005),
        analytics_interval: "15m".to_string(),
        analytics_period: 14,
        sync_sleep_ms: 0,
    }
}

/// Cold start: no position on record, wallet holds dust-only balances, so
/// the pipeline mints nothing and the state store is left at "0".
#[tokio::test]
async fn cold_start_with_no_funds_stays_at_zero() {
    let ops = MockChainOps::new();
    *ops.cumulative_ticks_result.write() = (0, 0);

    let math = UniswapV3Math;
    let market_data = MarketDataClient::new("ETHUSDT");
    let cfg = pipeline_cfg();

    let outcome = run_rebalance(&ops, &math, &market_data, None, wallet(), &cfg).await;

    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    match outcome {
        Ok(PipelineOutcome::Minted { token_id, .. }) => {
            store.save(&token_id.to_string(), 0).unwrap();
        }
        Err(_) => store.save("0", 0).unwrap(),
    }

    assert_eq!(store.load().token_id, "0");
}

/// A rebalance abort (e.g. a dead analytics provider) must never touch the
/// persisted state — the old position record stays authoritative.
#[tokio::test]
async fn aborted_rebalance_leaves_existing_state_untouched() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    store.save("7", 0).unwrap();

    let ops = MockChainOps::new();
    // TWAP far outside the deviation limit forces an abort at the first gate.
    *ops.cumulative_ticks_result.write() = (0, 300_000);

    let math = UniswapV3Math;
    let market_data = MarketDataClient::new("ETHUSDT");
    let cfg = pipeline_cfg();

    let position = Position {
        token_id: U256::from(7),
        tick_lower: -100,
        tick_upper: 100,
        liquidity: 1_000_000,
        tokens_owed0: 0,
        tokens_owed1: 0,
    };

    let outcome = run_rebalance(&ops, &math, &market_data, Some(&position), wallet(), &cfg).await;
    assert!(matches!(outcome, Err(_)));
    assert_eq!(store.load().token_id, "7");
}

/// A position far enough from center trips the circuit breaker ahead of
/// the pipeline ever running, independent of the hysteresis buffer.
#[test]
fn circuit_breaker_trips_before_hysteresis_is_considered() {
    let position = Position {
        token_id: U256::from(1),
        tick_lower: -100,
        tick_upper: 100,
        liquidity: 1_000_000,
        tokens_owed0: 0,
        tokens_owed1: 0,
    };

    // Center is 0, width is 200; a current tick of 2000 is 10x the width away.
    let result = check_circuit_breaker(&position, 2000, dec!(3.0));
    assert!(result.is_err());
}

/// Equity below the hard stop threshold is caught regardless of whether a
/// position is currently open.
#[test]
fn hard_equity_stop_trips_at_and_above_entry() {
    assert!(check_hard_equity_stop(dec!(499), dec!(500)).is_err());
    assert!(check_hard_equity_stop(dec!(500), dec!(500)).is_ok());
}

/// Orphan recovery adopts the highest-indexed liquid NFT once the local
/// record is cleared, mirroring what the control loop does after it
/// detects an externally-closed position.
#[tokio::test]
async fn orphan_scan_adopts_replacement_after_state_is_cleared() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    store.save("3", 0).unwrap();

    let ops = MockChainOps::new();
    *ops.owned_token_ids.write() = vec![U256::from(3), U256::from(11)];
    ops.position_liquidity_result.write().insert(U256::from(3), 0);
    ops.position_liquidity_result.write().insert(U256::from(11), 500);

    // Simulates the control loop noticing `position_liquidity(3) == 0` and
    // clearing the stale record before scanning.
    store.save("0", 0).unwrap();
    let reconciled = store.scan_orphans(&ops, wallet()).await.unwrap();

    assert_eq!(reconciled.token_id, "11");
    assert_eq!(store.load().token_id, "11");
}
