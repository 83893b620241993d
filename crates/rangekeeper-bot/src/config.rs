//! Tunable strategy thresholds, loaded from an optional TOML file layered
//! over typed defaults — every field has a default, so a missing config
//! file (or a partial one) is never a startup error.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_twap_deviation_ticks")]
    pub twap_deviation_ticks: i32,
    #[serde(default = "default_twap_window_secs")]
    pub twap_window_secs: i64,
    #[serde(default = "default_circuit_breaker_deviation_factor")]
    pub circuit_breaker_deviation_factor: Decimal,
    #[serde(default = "default_hard_stop_loss_threshold_usd")]
    pub hard_stop_loss_threshold_usd: Decimal,
    #[serde(default = "default_base_buffer_factor")]
    pub base_buffer_factor: Decimal,
    #[serde(default = "default_atr_buffer_scaling")]
    pub atr_buffer_scaling: Decimal,
    #[serde(default = "default_atr_safety_factor")]
    pub atr_safety_factor: Decimal,
    #[serde(default = "default_width_ticks_min")]
    pub width_ticks_min: i32,
    #[serde(default = "default_width_ticks_max")]
    pub width_ticks_max: i32,
    #[serde(default = "default_rebalance_threshold_usdc")]
    pub rebalance_threshold_usdc: Decimal,
    #[serde(default = "default_rebalance_threshold_weth")]
    pub rebalance_threshold_weth: Decimal,
    #[serde(default = "default_slippage_tolerance")]
    pub slippage_tolerance: Decimal,
    #[serde(default = "default_analytics_interval")]
    pub analytics_interval: String,
    #[serde(default = "default_analytics_period")]
    pub analytics_period: usize,
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_tx_timeout_ms")]
    pub tx_timeout_ms: u64,
    #[serde(default = "default_sync_sleep_ms")]
    pub sync_sleep_ms: u64,
    #[serde(default = "default_atr_refresh_interval_secs")]
    pub atr_refresh_interval_secs: u64,
}

fn default_twap_deviation_ticks() -> i32 {
    200
}
fn default_twap_window_secs() -> i64 {
    300
}
fn default_circuit_breaker_deviation_factor() -> Decimal {
    dec!(3.0)
}
fn default_hard_stop_loss_threshold_usd() -> Decimal {
    dec!(500)
}
fn default_base_buffer_factor() -> Decimal {
    dec!(0.1)
}
fn default_atr_buffer_scaling() -> Decimal {
    dec!(0.02)
}
fn default_atr_safety_factor() -> Decimal {
    dec!(1.5)
}
fn default_width_ticks_min() -> i32 {
    200
}
fn default_width_ticks_max() -> i32 {
    4000
}
fn default_rebalance_threshold_usdc() -> Decimal {
    dec!(1)
}
fn default_rebalance_threshold_weth() -> Decimal {
    dec!(0.001)
}
fn default_slippage_tolerance() -> Decimal {
    dec!(0.005)
}
fn default_analytics_interval() -> String {
    "15m".to_string()
}
fn default_analytics_period() -> usize {
    14
}
fn default_min_interval_ms() -> u64 {
    3000
}
fn default_max_retries() -> u32 {
    3
}
fn default_tx_timeout_ms() -> u64 {
    60_000
}
fn default_sync_sleep_ms() -> u64 {
    2000
}
fn default_atr_refresh_interval_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            twap_deviation_ticks: default_twap_deviation_ticks(),
            twap_window_secs: default_twap_window_secs(),
            circuit_breaker_deviation_factor: default_circuit_breaker_deviation_factor(),
            hard_stop_loss_threshold_usd: default_hard_stop_loss_threshold_usd(),
            base_buffer_factor: default_base_buffer_factor(),
            atr_buffer_scaling: default_atr_buffer_scaling(),
            atr_safety_factor: default_atr_safety_factor(),
            width_ticks_min: default_width_ticks_min(),
            width_ticks_max: default_width_ticks_max(),
            rebalance_threshold_usdc: default_rebalance_threshold_usdc(),
            rebalance_threshold_weth: default_rebalance_threshold_weth(),
            slippage_tolerance: default_slippage_tolerance(),
            analytics_interval: default_analytics_interval(),
            analytics_period: default_analytics_period(),
            min_interval_ms: default_min_interval_ms(),
            max_retries: default_max_retries(),
            tx_timeout_ms: default_tx_timeout_ms(),
            sync_sleep_ms: default_sync_sleep_ms(),
            atr_refresh_interval_secs: default_atr_refresh_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Loads from `path` if given, else `RANGEKEEPER_CONFIG`, else
    /// `config/default.toml`. A missing file is not an error — it just
    /// means every field falls back to its typed default.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let config_path = path
            .map(ToString::to_string)
            .or_else(|| std::env::var("RANGEKEEPER_CONFIG").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        if std::path::Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("failed to read config: {e}")))?;
        toml::from_str(&content).map_err(|e| AppError::Config(format!("failed to parse config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.twap_deviation_ticks, 200);
        assert_eq!(cfg.twap_window_secs, 300);
        assert_eq!(cfg.width_ticks_min, 200);
        assert_eq!(cfg.width_ticks_max, 4000);
        assert_eq!(cfg.slippage_tolerance, dec!(0.005));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults_for_missing_fields() {
        let cfg: AppConfig = toml::from_str("twap_deviation_ticks = 50\n").unwrap();
        assert_eq!(cfg.twap_deviation_ticks, 50);
        assert_eq!(cfg.width_ticks_min, 200);
    }

    #[test]
    fn load_falls_back_to_defaults_when_file_missing() {
        let cfg = AppConfig::load(Some("/nonexistent/path/default.toml")).unwrap();
        assert_eq!(cfg.twap_deviation_ticks, 200);
    }
}
