//! The strategy control loop: owns every long-lived dependency and the
//! block handler that drives the rebalance pipeline.

use std::sync::Arc;
use std::time::Instant;

use alloy::primitives::U256;
use chrono::Utc;
use rangekeeper_actions::ChainOps;
use rangekeeper_amm::{PositionMath, UniswapV3Math};
use rangekeeper_chain::{ConnectionSupervisor, KeySource, Wallet};
use rangekeeper_core::{Amount, EquitySnapshot, PersistedState, Position, PoolSnapshot, Price};
use rangekeeper_market_data::MarketDataClient;
use rangekeeper_pipeline::{run_rebalance, PipelineConfig, PipelineOutcome};
use rangekeeper_risk::{buffer_ticks, check_circuit_breaker, check_hard_equity_stop, SafeModeLatch, SafeModeReason};
use rangekeeper_state::StateStore;
use rangekeeper_telemetry::{
    AlertMessage, Alerter, AuditKind, AuditRecord, AuditWriter, Metrics, NoOpAlerter, SmtpAlerter,
};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::chain_ops::RealChainOps;
use crate::config::AppConfig;
use crate::constants::{ContractAddresses, Network};
use crate::context::LoopContext;
use crate::error::{AppError, AppResult};

/// The single currency pair this build trades, used as the candle-provider
/// symbol for ATR/RSI.
const MARKET_DATA_SYMBOL: &str = "ETHUSDT";

pub struct Application {
    config: AppConfig,
    chain_ops: RealChainOps,
    math: UniswapV3Math,
    market_data: MarketDataClient,
    state_store: StateStore,
    audit: AuditWriter,
    alerter: Box<dyn Alerter>,
    safe_mode: Arc<SafeModeLatch>,
    ctx: LoopContext,
    last_block: u64,
    heartbeat_handle: tokio::task::JoinHandle<()>,
}

impl Application {
    /// Resolves `RPC_URL`/`PRIVATE_KEY`/`NETWORK`/`STATE_FILE`/`AUDIT_LOG_PATH`
    /// and the `EMAIL_*` alert credentials from the environment, connects the
    /// wallet's nonce tracker to the chain's reported count, and wires every
    /// dependency together. Does not perform any RPC beyond that nonce sync.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let network = Network::from_env_str(&std::env::var("NETWORK").unwrap_or_default());
        let addresses = ContractAddresses::for_network(network);

        let rpc_url = std::env::var("RPC_URL").map_err(|_| AppError::Config("RPC_URL not set".to_string()))?;
        let endpoints: Vec<String> = rpc_url.split(',').map(str::trim).map(str::to_string).collect();
        let supervisor = ConnectionSupervisor::new(endpoints)?;
        let metrics_supervisor = Arc::clone(&supervisor);
        supervisor.register_on_switch(Arc::new(move || {
            Metrics::rpc_endpoint_rotated(metrics_supervisor.current_index());
        }));
        let heartbeat_handle = tokio::spawn(Arc::clone(&supervisor).run_heartbeat_loop());

        let wallet = Arc::new(Wallet::load(
            KeySource::EnvVar {
                var_name: "PRIVATE_KEY".to_string(),
            },
            None,
            0,
        )?);

        let client = supervisor.connect().await?;
        let chain_nonce = client
            .get_transaction_count(wallet.address())
            .await
            .map_err(|e| AppError::Config(format!("failed to read starting nonce: {e}")))?;
        wallet.nonce_manager.sync_with_server(chain_nonce)?;

        let chain_ops = RealChainOps::new(
            supervisor,
            wallet,
            addresses,
            config.max_retries,
            config.tx_timeout_ms,
        );

        let state_file = std::env::var("STATE_FILE").unwrap_or_else(|_| "./state.json".to_string());
        let audit_log_path = std::env::var("AUDIT_LOG_PATH").unwrap_or_else(|_| "./audit.csv".to_string());

        let alerter: Box<dyn Alerter> = match SmtpAlerter::from_env() {
            Some(smtp) => Box::new(smtp),
            None => Box::new(NoOpAlerter),
        };

        Ok(Self {
            config,
            chain_ops,
            math: UniswapV3Math,
            market_data: MarketDataClient::new(MARKET_DATA_SYMBOL),
            state_store: StateStore::new(state_file),
            audit: AuditWriter::new(audit_log_path)?,
            alerter,
            safe_mode: Arc::new(SafeModeLatch::new()),
            ctx: LoopContext::new(),
            last_block: 0,
            heartbeat_handle,
        })
    }

    /// Polls the chain head once a second and runs the block handler on
    /// every new block number, until `SIGINT`/`SIGTERM`.
    pub async fn run(&mut self) -> AppResult<()> {
        info!("strategy control loop starting");
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received, exiting after current block");
                    self.heartbeat_handle.abort();
                    return Ok(());
                }
                _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {
                    if let Err(e) = self.poll_once().await {
                        error!(error = %e, "poll cycle failed, will retry next tick");
                    }
                }
            }
        }
    }

    async fn poll_once(&mut self) -> AppResult<()> {
        let block_number = self.chain_ops.block_number().await?;
        if block_number <= self.last_block {
            return Ok(());
        }
        self.last_block = block_number;
        self.handle_block(block_number).await
    }

    async fn handle_block(&mut self, block_number: u64) -> AppResult<()> {
        if self.ctx.within_min_interval(self.config.min_interval_ms) {
            Metrics::block_skipped("min_interval");
            return Ok(());
        }
        if !self.ctx.try_begin() {
            Metrics::block_skipped("in_flight");
            return Ok(());
        }

        let result = self.handle_block_inner(block_number).await;
        self.ctx.end();
        Metrics::block_processed();

        if let Err(ref e) = result {
            error!(block = block_number, error = %e, "block handler failed");
        }
        result
    }

    async fn handle_block_inner(&mut self, block_number: u64) -> AppResult<()> {
        if self.safe_mode.is_triggered() {
            if block_number % 100 == 0 {
                warn!(block = block_number, reason = ?self.safe_mode.reason(), "safe mode active, holding");
            }
            return Ok(());
        }

        let state = self.state_store.load();
        let pool = self.chain_ops.pool_snapshot().await?;

        let equity = self.compute_equity(&pool, &state).await?;
        let total_usd = equity.total_usd();
        Metrics::equity_usd(decimal_to_f64(total_usd.inner()));

        if check_hard_equity_stop(total_usd.inner(), self.config.hard_stop_loss_threshold_usd).is_err() {
            return self.handle_hard_equity_stop(&pool, &state, total_usd, block_number).await;
        }

        let Some(token_id) = token_id_from_state(&state) else {
            return self.run_pipeline(&pool, None, block_number).await;
        };

        let liquidity = self.chain_ops.position_liquidity(token_id).await?;
        if liquidity == 0 {
            // Position was closed externally (e.g. an operator-run manual
            // exit): clear the stale record first so `scan_orphans` actually
            // looks for a replacement instead of trusting the stale one.
            self.state_store.save("0", now_ms())?;
            let reconciled = self
                .state_store
                .scan_orphans(&self.chain_ops, self.chain_ops.wallet_address())
                .await?;
            if reconciled.has_position() {
                info!(token_id = %reconciled.token_id, "adopted orphaned position after external close");
            }
            return Ok(());
        }

        let (tick_lower, tick_upper) = self.chain_ops.position_ticks(token_id).await?;
        let position = Position {
            token_id,
            tick_lower,
            tick_upper,
            liquidity,
            tokens_owed0: 0,
            tokens_owed1: 0,
        };

        if let Err(e) = check_circuit_breaker(&position, pool.tick, self.config.circuit_breaker_deviation_factor) {
            warn!(block = block_number, %e, "circuit breaker tripped");
            return self.handle_circuit_breaker(&pool, &position, block_number).await;
        }

        let buffer = self.hysteresis_buffer(&pool, &position).await;
        if pool.tick < position.tick_lower - buffer || pool.tick > position.tick_upper + buffer {
            info!(
                block = block_number,
                tick = pool.tick,
                tick_lower = position.tick_lower,
                tick_upper = position.tick_upper,
                buffer,
                "tick outside hysteresis band, rebalancing"
            );
            self.run_pipeline(&pool, Some(&position), block_number).await
        } else {
            Ok(())
        }
    }

    async fn compute_equity(&mut self, pool: &PoolSnapshot, state: &PersistedState) -> AppResult<EquitySnapshot> {
        let wallet = self.chain_ops.wallet_address();
        let wallet_usdc = Amount::from_raw(
            self.chain_ops.balance_of(pool.token0.address, wallet).await?,
            pool.token0.decimals,
        );
        let wallet_weth = Amount::from_raw(
            self.chain_ops.balance_of(pool.token1.address, wallet).await?,
            pool.token1.decimals,
        );

        let (position_usdc, position_weth, pending_fees0, pending_fees1) =
            if let Some(token_id) = token_id_from_state(state) {
                let liquidity = self.chain_ops.position_liquidity(token_id).await?;
                let (tick_lower, tick_upper) = self.chain_ops.position_ticks(token_id).await?;
                let (p0, p1) = self.math.amounts_for_liquidity(pool, tick_lower, tick_upper, liquidity);
                let (f0_raw, f1_raw) = self.chain_ops.pending_fees(token_id).await.unwrap_or((0, 0));
                (
                    p0,
                    p1,
                    Amount::from_raw(f0_raw, pool.token0.decimals),
                    Amount::from_raw(f1_raw, pool.token1.decimals),
                )
            } else {
                (Amount::ZERO, Amount::ZERO, Amount::ZERO, Amount::ZERO)
            };

        Ok(EquitySnapshot {
            wallet_weth,
            wallet_usdc,
            position_weth,
            position_usdc,
            pending_fees0,
            pending_fees1,
            price_usd_per_weth: price_usd_per_weth(pool),
        })
    }

    /// Refreshes the cached ATR every `atr_refresh_interval_secs` and
    /// derives the dynamic hysteresis buffer from it.
    async fn hysteresis_buffer(&mut self, pool: &PoolSnapshot, position: &Position) -> i32 {
        let atr = match self.ctx.fresh_atr(self.config.atr_refresh_interval_secs) {
            Some(atr) => atr,
            None => match self.market_data.atr(&self.config.analytics_interval, self.config.analytics_period).await {
                Ok(atr) => {
                    self.ctx.cache_atr(atr);
                    atr
                }
                Err(e) => {
                    warn!(%e, "atr refresh failed, reusing last known volatility as zero");
                    Decimal::ZERO
                }
            },
        };

        let price = pool.price_token0_in_token1();
        let vol_percent = if price.is_zero() { Decimal::ZERO } else { atr / price * Decimal::from(100) };
        buffer_ticks(position.width_ticks(), vol_percent, self.config.base_buffer_factor, self.config.atr_buffer_scaling)
    }

    async fn handle_hard_equity_stop(
        &mut self,
        pool: &PoolSnapshot,
        state: &PersistedState,
        total_usd: Price,
        block_number: u64,
    ) -> AppResult<()> {
        error!(block = block_number, equity_usd = %total_usd, "hard equity stop triggered");
        self.audit.record(&AuditRecord {
            timestamp: Utc::now(),
            block: block_number,
            kind: AuditKind::StopLoss,
            price: pool.price_token0_in_token1(),
            tick: pool.tick,
            details: sanitize(&format!("hard equity stop: equity ${total_usd} below threshold")),
        })?;

        let reason = if let Some(token_id) = token_id_from_state(state) {
            let liquidity = self.chain_ops.position_liquidity(token_id).await.unwrap_or(0);
            let position = Position {
                token_id,
                tick_lower: 0,
                tick_upper: 0,
                liquidity,
                tokens_owed0: 0,
                tokens_owed1: 0,
            };
            if let Err(e) = rangekeeper_actions::atomic_exit(&self.chain_ops, &position, &pool.token0, &pool.token1).await {
                warn!(%e, "atomic exit failed during hard equity stop, continuing to sweep");
            }
            self.sweep_weth(pool).await;
            let _ = self.state_store.save("0", now_ms());
            SafeModeReason::HardEquityStopInPosition
        } else {
            SafeModeReason::HardEquityStopAtEntry
        };

        self.safe_mode.trigger(reason);
        Metrics::safe_mode_triggered();
        self.send_alert("Hard equity stop", &format!("Equity fell to ${total_usd}, strategy latched to safe mode."));
        Ok(())
    }

    async fn handle_circuit_breaker(&mut self, pool: &PoolSnapshot, position: &Position, block_number: u64) -> AppResult<()> {
        let distance = position.distance_from_center(pool.tick);
        self.audit.record(&AuditRecord {
            timestamp: Utc::now(),
            block: block_number,
            kind: AuditKind::StopLoss,
            price: pool.price_token0_in_token1(),
            tick: pool.tick,
            details: sanitize(&format!("circuit breaker: distance {distance} ticks from center")),
        })?;

        if let Err(e) = rangekeeper_actions::atomic_exit(&self.chain_ops, position, &pool.token0, &pool.token1).await {
            warn!(%e, "atomic exit failed during circuit breaker, continuing to sweep");
        }
        self.sweep_weth(pool).await;
        let _ = self.state_store.save("0", now_ms());

        self.send_alert("Circuit breaker tripped", &format!("Position closed, {distance} ticks from center."));
        Ok(())
    }

    async fn sweep_weth(&self, pool: &PoolSnapshot) {
        let balance_raw = self
            .chain_ops
            .balance_of(pool.token1.address, self.chain_ops.wallet_address())
            .await
            .unwrap_or(0);
        let balance = Amount::from_raw(balance_raw, pool.token1.decimals);
        if let Err(e) = rangekeeper_actions::sweep_to_stable(
            &self.chain_ops,
            pool,
            balance,
            Amount::new(self.config.rebalance_threshold_weth),
            self.config.slippage_tolerance,
        )
        .await
        {
            warn!(%e, "sweep to stable failed");
        }
    }

    async fn run_pipeline(&mut self, pool: &PoolSnapshot, position: Option<&Position>, block_number: u64) -> AppResult<()> {
        let cfg = PipelineConfig {
            twap_deviation_ticks: self.config.twap_deviation_ticks,
            twap_window_secs: self.config.twap_window_secs,
            atr_safety_factor: self.config.atr_safety_factor,
            width_ticks_min: self.config.width_ticks_min,
            width_ticks_max: self.config.width_ticks_max,
            rebalance_threshold_usdc: Amount::new(self.config.rebalance_threshold_usdc),
            rebalance_threshold_weth: Amount::new(self.config.rebalance_threshold_weth),
            slippage_tolerance: self.config.slippage_tolerance,
            analytics_interval: self.config.analytics_interval.clone(),
            analytics_period: self.config.analytics_period,
            sync_sleep_ms: self.config.sync_sleep_ms,
        };

        let start = Instant::now();
        let wallet = self.chain_ops.wallet_address();
        let outcome = run_rebalance(&self.chain_ops, &self.math, &self.market_data, position, wallet, &cfg).await;

        match outcome {
            Ok(PipelineOutcome::Minted { token_id, plan, exit }) => {
                Metrics::pipeline_minted();
                Metrics::pipeline_duration("minted", start.elapsed().as_secs_f64());
                self.state_store.save(&token_id.to_string(), now_ms())?;
                if let Some(exit) = exit {
                    info!(amount0 = %exit.amount0, amount1 = %exit.amount1, "exited prior range");
                }
                self.audit.record(&AuditRecord {
                    timestamp: Utc::now(),
                    block: block_number,
                    kind: AuditKind::Rebalance,
                    price: pool.price_token0_in_token1(),
                    tick: pool.tick,
                    details: sanitize(&format!("minted {token_id} range [{}, {}]", plan.tick_lower, plan.tick_upper)),
                })?;
            }
            Err(reason) => {
                Metrics::pipeline_aborted(&reason.stage.to_string());
                Metrics::pipeline_duration("aborted", start.elapsed().as_secs_f64());
                warn!(block = block_number, %reason, "rebalance pipeline aborted");
                self.audit.record(&AuditRecord {
                    timestamp: Utc::now(),
                    block: block_number,
                    kind: AuditKind::Error,
                    price: pool.price_token0_in_token1(),
                    tick: pool.tick,
                    details: sanitize(&reason.to_string()),
                })?;
                self.send_alert("Rebalance aborted", &reason.to_string());
            }
        }
        Ok(())
    }

    fn send_alert(&self, subject: &str, body: &str) {
        if let Err(e) = self.alerter.send(&AlertMessage::new(subject, body)) {
            warn!(%e, "alert send failed");
        }
    }
}

fn token_id_from_state(state: &PersistedState) -> Option<U256> {
    if !state.has_position() {
        return None;
    }
    match U256::from_str_radix(&state.token_id, 10) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(token_id = %state.token_id, error = %e, "persisted token id unparsable, treating as no position");
            None
        }
    }
}

fn price_usd_per_weth(pool: &PoolSnapshot) -> Price {
    let weth_per_usdc = pool.price_token0_in_token1();
    if weth_per_usdc.is_zero() {
        Price::ZERO
    } else {
        Price::new(Decimal::ONE / weth_per_usdc)
    }
}

fn sanitize(details: &str) -> String {
    details.replace(',', ";").replace('"', "'")
}

fn decimal_to_f64(value: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().unwrap_or(0.0)
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}
