//! One-shot operator escape hatch: closes whatever position is on record
//! and sweeps stray WETH back to USDC, independent of the strategy loop.
//! Exits 0 if state now reflects no position, 1 otherwise.

use alloy::primitives::U256;
use anyhow::{anyhow, Result};
use rangekeeper_actions::ChainOps;
use rangekeeper_bot::{AppConfig, ContractAddresses, Network, RealChainOps};
use rangekeeper_chain::{ConnectionSupervisor, KeySource, Wallet};
use rangekeeper_core::Position;
use rangekeeper_state::StateStore;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    rangekeeper_telemetry::init_logging()?;
    let config = AppConfig::load(None)?;

    let network = Network::from_env_str(&std::env::var("NETWORK").unwrap_or_default());
    let addresses = ContractAddresses::for_network(network);

    let rpc_url = std::env::var("RPC_URL").map_err(|_| anyhow!("RPC_URL not set"))?;
    let endpoints: Vec<String> = rpc_url.split(',').map(str::trim).map(str::to_string).collect();
    let supervisor = ConnectionSupervisor::new(endpoints)?;

    let wallet = std::sync::Arc::new(Wallet::load(
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
        .map_err(|e| anyhow!("failed to read starting nonce: {e}"))?;
    wallet.nonce_manager.sync_with_server(chain_nonce)?;

    let chain_ops = RealChainOps::new(supervisor, wallet, addresses, config.max_retries, config.tx_timeout_ms);

    let state_file = std::env::var("STATE_FILE").unwrap_or_else(|_| "./state.json".to_string());
    let state_store = StateStore::new(state_file);
    let state = state_store.load();

    if !state.has_position() {
        info!("no position on record, nothing to exit");
        return Ok(());
    }

    let pool = chain_ops.pool_snapshot().await?;
    let token_id = U256::from_str_radix(&state.token_id, 10).map_err(|e| anyhow!("unparsable token id {}: {e}", state.token_id))?;
    let liquidity = chain_ops.position_liquidity(token_id).await.unwrap_or(0);

    let position = Position {
        token_id,
        tick_lower: 0,
        tick_upper: 0,
        liquidity,
        tokens_owed0: 0,
        tokens_owed1: 0,
    };

    if liquidity > 0 {
        if let Err(e) = rangekeeper_actions::atomic_exit(&chain_ops, &position, &pool.token0, &pool.token1).await {
            warn!(%e, "atomic exit failed, continuing to sweep");
        }
    }

    let weth_balance_raw = chain_ops.balance_of(pool.token1.address, chain_ops.wallet_address()).await.unwrap_or(0);
    let weth_balance = rangekeeper_core::Amount::from_raw(weth_balance_raw, pool.token1.decimals);
    if let Err(e) = rangekeeper_actions::sweep_to_stable(
        &chain_ops,
        &pool,
        weth_balance,
        rangekeeper_core::Amount::new(config.rebalance_threshold_weth),
        config.slippage_tolerance,
    )
    .await
    {
        warn!(%e, "sweep to stable failed");
    }

    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64;
    state_store.save("0", now_ms)?;

    let remaining = chain_ops.position_liquidity(token_id).await.unwrap_or(0);
    if remaining > 0 {
        error!(token_id = %token_id, remaining, "position still holds liquidity after manual exit");
        std::process::exit(1);
    }

    info!("manual exit complete");
    Ok(())
}
