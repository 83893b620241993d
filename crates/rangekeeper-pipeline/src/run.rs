//! Orchestrates a single rebalance from a fresh pool read through to a
//! minted replacement range, per the state machine in [`crate::stage`].

use alloy::primitives::U256;
use rangekeeper_actions::ChainOps;
use rangekeeper_amm::PositionMath;
use rangekeeper_core::{Amount, Position, RangePlan, RangeSkew};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::analytics::Analytics;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::stage::{AbortReason, ExitReceipt, PipelineOutcome, Stage};

/// `None` `position` means no open position (`tokenId == "0"`): the pipeline
/// skips straight to the swap/mint steps with the wallet's existing balances.
#[allow(clippy::too_many_arguments)]
pub async fn run_rebalance<C: ChainOps, M: PositionMath, A: Analytics>(
    ops: &C,
    math: &M,
    analytics: &A,
    position: Option<&Position>,
    wallet: alloy::primitives::Address,
    cfg: &PipelineConfig,
) -> Result<PipelineOutcome, AbortReason> {
    let pool = ops
        .pool_snapshot()
        .await
        .map_err(|e| abort(Stage::CheckingTwap, PipelineError::Action(e)))?;

    let (cum_start, cum_end) = ops
        .cumulative_ticks(cfg.twap_window_secs as u32)
        .await
        .map_err(|e| abort(Stage::CheckingTwap, PipelineError::Action(e)))?;

    rangekeeper_risk::check_twap_deviation(
        pool.tick,
        cum_start,
        cum_end,
        cfg.twap_window_secs,
        cfg.twap_deviation_ticks,
    )
    .map_err(|e| abort(Stage::CheckingTwap, PipelineError::TwapGate(e)))?;

    let (atr, rsi) = tokio::try_join!(
        analytics.atr(&cfg.analytics_interval, cfg.analytics_period),
        analytics.rsi(&cfg.analytics_interval, cfg.analytics_period),
    )
    .map_err(|e| abort(Stage::FetchingData, e))?;

    let mut exit_receipt = None;
    if let Some(position) = position {
        let (a0, a1) = rangekeeper_actions::atomic_exit(ops, position, &pool.token0, &pool.token1)
            .await
            .map_err(|e| abort(Stage::Exiting, PipelineError::Action(e)))?;
        info!(amount0 = %a0, amount1 = %a1, "exited old position");
        exit_receipt = Some(ExitReceipt { amount0: a0, amount1: a1 });
    }

    let pool = ops
        .pool_snapshot()
        .await
        .map_err(|e| abort(Stage::Exiting, PipelineError::Action(e)))?;

    let price = pool.price_token0_in_token1();
    let vol_percent = if price.is_zero() { Decimal::ZERO } else { atr / price * Decimal::from(100) };
    let dynamic_width = (vol_percent * Decimal::from(100) * cfg.atr_safety_factor)
        .trunc()
        .to_string()
        .parse::<i32>()
        .unwrap_or(cfg.width_ticks_min);
    let width_ticks = dynamic_width.clamp(cfg.width_ticks_min, cfg.width_ticks_max);
    let skew = RangeSkew::from_rsi(rsi);
    let plan = RangePlan::build(pool.tick, pool.tick_spacing, width_ticks, skew);

    let wallet_token0 = Amount::from_raw(
        ops.balance_of(pool.token0.address, wallet)
            .await
            .map_err(|e| abort(Stage::Swapping, PipelineError::Action(e)))?,
        pool.token0.decimals,
    );
    let wallet_token1 = Amount::from_raw(
        ops.balance_of(pool.token1.address, wallet)
            .await
            .map_err(|e| abort(Stage::Swapping, PipelineError::Action(e)))?,
        pool.token1.decimals,
    );

    rangekeeper_actions::smart_swap(
        ops,
        &pool,
        math,
        plan.tick_lower,
        plan.tick_upper,
        wallet_token0,
        wallet_token1,
        cfg.rebalance_threshold_usdc,
        cfg.rebalance_threshold_weth,
        cfg.slippage_tolerance,
    )
    .await
    .map_err(|e| abort(Stage::Swapping, PipelineError::Action(e)))?;

    tokio::time::sleep(std::time::Duration::from_millis(cfg.sync_sleep_ms)).await;

    let pool = ops
        .pool_snapshot()
        .await
        .map_err(|e| abort(Stage::WaitSync, PipelineError::Action(e)))?;

    let token_id = rangekeeper_actions::mint_max_liquidity(
        ops,
        &pool,
        math,
        plan.tick_lower,
        plan.tick_upper,
        wallet,
        cfg.slippage_tolerance,
    )
    .await
    .map_err(|e| abort(Stage::Minting, PipelineError::Action(e)))?;

    if token_id == U256::ZERO {
        warn!("mint produced no position, balances were dust after swap");
    }

    Ok(PipelineOutcome::Minted {
        token_id,
        plan,
        exit: exit_receipt,
    })
}

fn abort(stage: Stage, source: PipelineError) -> AbortReason {
    AbortReason { stage, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::mock::MockAnalytics;
    use alloy::primitives::address;
    use rangekeeper_actions::chain_ops::mock::MockChainOps;
    use rangekeeper_amm::UniswapV3Math;
    use rust_decimal_macros::dec;

    fn sample_config() -> PipelineConfig {
        PipelineConfig {
            twap_deviation_ticks: 200,
            twap_window_secs: 300,
            atr_safety_factor: dec!(1.0),
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

    #[tokio::test]
    async fn cold_start_mints_without_an_exit() {
        let ops = MockChainOps::new();
        ops.balances.write().insert(
            address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            1_000_000_000,
        );
        ops.balances.write().insert(
            address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            1_000_000_000_000_000_000,
        );
        let math = UniswapV3Math;
        let analytics = MockAnalytics::new(dec!(20), dec!(50));
        let cfg = sample_config();

        let outcome = run_rebalance(
            &ops,
            &math,
            &analytics,
            None,
            address!("0000000000000000000000000000000000000001"),
            &cfg,
        )
        .await
        .unwrap();

        match outcome {
            PipelineOutcome::Minted { exit, token_id, .. } => {
                assert!(exit.is_none());
                assert_ne!(token_id, U256::ZERO);
            }
            PipelineOutcome::Aborted(reason) => panic!("unexpected abort: {reason}"),
        }
    }

    #[tokio::test]
    async fn twap_violation_aborts_before_any_mutation() {
        let ops = MockChainOps::new();
        *ops.cumulative_ticks_result.write() = (0, 300_000);
        let math = UniswapV3Math;
        let analytics = MockAnalytics::new(dec!(20), dec!(50));
        let mut cfg = sample_config();
        cfg.twap_deviation_ticks = 0;

        let result = run_rebalance(
            &ops,
            &math,
            &analytics,
            None,
            address!("0000000000000000000000000000000000000001"),
            &cfg,
        )
        .await;

        match result {
            Err(reason) => assert_eq!(reason.stage, Stage::CheckingTwap),
            Ok(_) => panic!("expected twap abort"),
        }
    }

    #[tokio::test]
    async fn missing_analytics_aborts_at_fetching_data() {
        let ops = MockChainOps::new();
        let math = UniswapV3Math;
        let analytics = MockAnalytics::unavailable();
        let cfg = sample_config();

        let result = run_rebalance(
            &ops,
            &math,
            &analytics,
            None,
            address!("0000000000000000000000000000000000000001"),
            &cfg,
        )
        .await;

        match result {
            Err(reason) => assert_eq!(reason.stage, Stage::FetchingData),
            Ok(_) => panic!("expected analytics abort"),
        }
    }

    #[tokio::test]
    async fn swap_revert_aborts_at_swapping() {
        let ops = MockChainOps::new();
        ops.balances.write().insert(
            address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            1_000_000_000,
        );
        *ops.fail_swap.write() = true;
        let math = UniswapV3Math;
        let analytics = MockAnalytics::new(dec!(20), dec!(50));
        let cfg = sample_config();

        let result = run_rebalance(
            &ops,
            &math,
            &analytics,
            None,
            address!("0000000000000000000000000000000000000001"),
            &cfg,
        )
        .await;

        match result {
            Err(reason) => assert_eq!(reason.stage, Stage::Swapping),
            Ok(_) => panic!("expected swap abort"),
        }
    }

    #[tokio::test]
    async fn mint_revert_leaves_state_ready_for_retry() {
        let ops = MockChainOps::new();
        ops.balances.write().insert(
            address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            1_000_000_000,
        );
        *ops.fail_mint.write() = true;
        let math = UniswapV3Math;
        let analytics = MockAnalytics::new(dec!(20), dec!(50));
        let cfg = sample_config();

        let result = run_rebalance(
            &ops,
            &math,
            &analytics,
            None,
            address!("0000000000000000000000000000000000000001"),
            &cfg,
        )
        .await;

        match result {
            Err(reason) => assert_eq!(reason.stage, Stage::Minting),
            Ok(_) => panic!("expected mint abort"),
        }
    }
}
