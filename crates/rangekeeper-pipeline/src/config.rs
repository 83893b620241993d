//! Thresholds the pipeline itself needs. The full tunable set (including
//! control-loop-only knobs) is assembled in the bot binary's `AppConfig`;
//! this is the subset `run_rebalance` reads directly.

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub twap_deviation_ticks: i32,
    pub twap_window_secs: i64,
    pub atr_safety_factor: Decimal,
    pub width_ticks_min: i32,
    pub width_ticks_max: i32,
    pub rebalance_threshold_usdc: rangekeeper_core::Amount,
    pub rebalance_threshold_weth: rangekeeper_core::Amount,
    pub slippage_tolerance: Decimal,
    pub analytics_interval: String,
    pub analytics_period: usize,
    pub sync_sleep_ms: u64,
}
