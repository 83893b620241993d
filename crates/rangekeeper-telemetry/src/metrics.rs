//! Prometheus metrics for the connection supervisor, rebalance pipeline,
//! and strategy control loop.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally: a duplicate metric
//! name is a programming error that should fail fast at startup, not limp
//! along with half the metrics missing.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, register_int_counter,
    register_int_gauge, CounterVec, Gauge, HistogramVec, IntCounter, IntGauge,
};

pub static RPC_ENDPOINT_INDEX: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "rangekeeper_rpc_endpoint_index",
        "Index of the currently active RPC endpoint in the ring"
    )
    .unwrap()
});

pub static RPC_ROTATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "rangekeeper_rpc_rotations_total",
        "Total endpoint rotations performed by the connection supervisor"
    )
    .unwrap()
});

pub static PIPELINE_RUNS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rangekeeper_pipeline_runs_total",
        "Rebalance pipeline runs, labeled by terminal outcome",
        &["outcome"]
    )
    .unwrap()
});

pub static PIPELINE_ABORTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rangekeeper_pipeline_aborts_total",
        "Rebalance pipeline aborts, labeled by stage",
        &["stage"]
    )
    .unwrap()
});

pub static PIPELINE_DURATION_SECS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "rangekeeper_pipeline_duration_seconds",
        "Wall-clock duration of a rebalance pipeline run",
        &["outcome"],
        vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]
    )
    .unwrap()
});

pub static EQUITY_USD: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "rangekeeper_equity_usd",
        "Total portfolio equity in USD at last block evaluation"
    )
    .unwrap()
});

pub static SAFE_MODE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "rangekeeper_safe_mode",
        "1 if the safe-mode latch is triggered, 0 otherwise"
    )
    .unwrap()
});

pub static BLOCKS_PROCESSED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "rangekeeper_blocks_processed_total",
        "Total blocks that ran the strategy control loop body"
    )
    .unwrap()
});

pub static BLOCKS_SKIPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rangekeeper_blocks_skipped_total",
        "Blocks dropped by a concurrency guard, labeled by reason",
        &["reason"]
    )
    .unwrap()
});

pub struct Metrics;

impl Metrics {
    pub fn rpc_endpoint_rotated(new_index: usize) {
        RPC_ENDPOINT_INDEX.set(new_index as i64);
        RPC_ROTATIONS_TOTAL.inc();
    }

    pub fn pipeline_minted() {
        PIPELINE_RUNS_TOTAL.with_label_values(&["minted"]).inc();
    }

    pub fn pipeline_aborted(stage: &str) {
        PIPELINE_RUNS_TOTAL.with_label_values(&["aborted"]).inc();
        PIPELINE_ABORTS_TOTAL.with_label_values(&[stage]).inc();
    }

    pub fn pipeline_duration(outcome: &str, secs: f64) {
        PIPELINE_DURATION_SECS.with_label_values(&[outcome]).observe(secs);
    }

    pub fn equity_usd(value: f64) {
        EQUITY_USD.set(value);
    }

    pub fn safe_mode_triggered() {
        SAFE_MODE.set(1);
    }

    pub fn block_processed() {
        BLOCKS_PROCESSED_TOTAL.inc();
    }

    pub fn block_skipped(reason: &str) {
        BLOCKS_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
    }
}
