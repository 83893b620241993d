//! The production [`ChainOps`] implementation: typed contract bindings
//! over a [`ConnectionSupervisor`]-managed client, transactions signed by
//! the nonce-tracked operator [`Wallet`].

use std::future::Future;
use std::sync::Arc;

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::aliases::U160;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy::sol;
use alloy::sol_types::SolCall;
use rangekeeper_actions::{ActionError, ChainOps, Result as ActionResult};
use rangekeeper_chain::{with_retry, ChainError, ConnectionSupervisor, Wallet};
use rangekeeper_core::{PoolSnapshot, TokenRef};

use crate::constants::ContractAddresses;

sol! {
    #[sol(rpc)]
    interface IUniswapV3Pool {
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked);
        function liquidity() external view returns (uint128);
        function tickSpacing() external view returns (int24);
        function observe(uint32[] calldata secondsAgos) external view returns (int56[] memory tickCumulatives, uint160[] memory secondsPerLiquidityCumulativeX128s);
    }

    struct MintParams {
        address token0;
        address token1;
        uint24 fee;
        int24 tickLower;
        int24 tickUpper;
        uint256 amount0Desired;
        uint256 amount1Desired;
        uint256 amount0Min;
        uint256 amount1Min;
        address recipient;
        uint256 deadline;
    }

    struct DecreaseLiquidityParams {
        uint256 tokenId;
        uint128 liquidity;
        uint256 amount0Min;
        uint256 amount1Min;
        uint256 deadline;
    }

    struct CollectParams {
        uint256 tokenId;
        address recipient;
        uint128 amount0Max;
        uint128 amount1Max;
    }

    #[sol(rpc)]
    interface INonfungiblePositionManager {
        function positions(uint256 tokenId) external view returns (uint96 nonce, address operator, address token0, address token1, uint24 fee, int24 tickLower, int24 tickUpper, uint128 liquidity, uint256 feeGrowthInside0LastX128, uint256 feeGrowthInside1LastX128, uint128 tokensOwed0, uint128 tokensOwed1);
        function balanceOf(address owner) external view returns (uint256);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
        function mint(MintParams calldata params) external payable returns (uint256 tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
        function decreaseLiquidity(DecreaseLiquidityParams calldata params) external payable returns (uint256 amount0, uint256 amount1);
        function collect(CollectParams calldata params) external payable returns (uint256 amount0, uint256 amount1);
        function burn(uint256 tokenId) external payable;
        function multicall(bytes[] calldata data) external payable returns (bytes[] memory results);

        event Collect(uint256 indexed tokenId, address recipient, uint256 amount0, uint256 amount1);
    }

    struct ExactInputSingleParams {
        address tokenIn;
        address tokenOut;
        uint24 fee;
        address recipient;
        uint256 deadline;
        uint256 amountIn;
        uint256 amountOutMinimum;
        uint160 sqrtPriceLimitX96;
    }

    #[sol(rpc)]
    interface ISwapRouter {
        function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut);
    }

    struct QuoteExactInputSingleParams {
        address tokenIn;
        address tokenOut;
        uint256 amountIn;
        uint24 fee;
        uint160 sqrtPriceLimitX96;
    }

    #[sol(rpc)]
    interface IQuoterV2 {
        function quoteExactInputSingle(QuoteExactInputSingleParams memory params) external returns (uint256 amountOut, uint160 sqrtPriceX96After, uint32 initializedTicksCrossed, uint256 gasEstimate);
    }

    #[sol(rpc)]
    interface IERC20Minimal {
        function balanceOf(address account) external view returns (uint256);
    }
}

fn chain(e: ChainError) -> ActionError {
    ActionError::Chain(e.to_string())
}

/// The pool's fee tier (0.05%), fixed for the single pool this bot targets.
const POOL_FEE: u32 = 500;

pub struct RealChainOps {
    supervisor: Arc<ConnectionSupervisor>,
    wallet: Arc<Wallet>,
    addresses: ContractAddresses,
    max_retries: u32,
    tx_timeout_ms: u64,
}

impl RealChainOps {
    #[must_use]
    pub fn new(
        supervisor: Arc<ConnectionSupervisor>,
        wallet: Arc<Wallet>,
        addresses: ContractAddresses,
        max_retries: u32,
        tx_timeout_ms: u64,
    ) -> Self {
        Self {
            supervisor,
            wallet,
            addresses,
            max_retries,
            tx_timeout_ms,
        }
    }

    async fn read_client(&self) -> ActionResult<DynProvider> {
        self.supervisor.current_client().await.map_err(chain)
    }

    /// Builds a fresh wallet-filled provider against the currently live
    /// endpoint. Built per call (not cached) so a rotation mid-pipeline is
    /// picked up on the very next mutating call.
    async fn write_client(&self) -> ActionResult<DynProvider> {
        let endpoint = self.supervisor.current_endpoint().to_string();
        let wallet = EthereumWallet::from(self.wallet.signer().clone());
        let provider = if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
            let ws = WsConnect::new(&endpoint);
            DynProvider::new(
                ProviderBuilder::new()
                    .wallet(wallet)
                    .connect_ws(ws)
                    .await
                    .map_err(|e| ActionError::Chain(format!("ws connect {endpoint}: {e}")))?,
            )
        } else {
            let url = endpoint
                .parse()
                .map_err(|e| ActionError::Chain(format!("invalid url {endpoint}: {e}")))?;
            DynProvider::new(ProviderBuilder::new().wallet(wallet).connect_http(url))
        };
        Ok(provider)
    }

    async fn confirm(&self, provider: &DynProvider, tx_hash: alloy::primitives::TxHash) -> ActionResult<()> {
        rangekeeper_chain::wait_for_confirmation(provider, tx_hash, self.tx_timeout_ms)
            .await
            .map(|_| ())
            .map_err(chain)
    }

    /// Retries a read, rotating the live endpoint mid-retry if an attempt's
    /// error looks like endpoint instability (`ConnectionSupervisor::looks_unstable`)
    /// rather than a genuine revert — HTTP endpoints have no heartbeat loop
    /// watching them, so this is the only path that fails them over.
    async fn with_retry_and_rotate<T, F, Fut>(&self, op: F) -> ActionResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, String>>,
    {
        with_retry(
            || async {
                match op().await {
                    Ok(v) => Ok(v),
                    Err(msg) => {
                        self.supervisor.rotate_if_unstable(&msg).await;
                        Err(ChainError::Provider(msg))
                    }
                }
            },
            self.max_retries,
        )
        .await
        .map_err(chain)
    }
}

impl ChainOps for RealChainOps {
    async fn pool_snapshot(&self) -> ActionResult<PoolSnapshot> {
        let client = self.read_client().await?;
        let pool = IUniswapV3Pool::new(self.addresses.pool, client.clone());

        let slot0 = self.with_retry_and_rotate(|| async { pool.slot0().call().await.map_err(|e| e.to_string()) }).await?;
        let liquidity = self.with_retry_and_rotate(|| async { pool.liquidity().call().await.map_err(|e| e.to_string()) }).await?;
        let tick_spacing = self
            .with_retry_and_rotate(|| async { pool.tickSpacing().call().await.map_err(|e| e.to_string()) })
            .await?;

        Ok(PoolSnapshot {
            sqrt_price_x96: U256::from(slot0.sqrtPriceX96),
            tick: slot0.tick.as_i32(),
            liquidity,
            tick_spacing: tick_spacing.as_i32(),
            token0: TokenRef::new(self.addresses.usdc, 6, "USDC"),
            token1: TokenRef::new(self.addresses.weth, 18, "WETH"),
        })
    }

    async fn cumulative_ticks(&self, window_secs: u32) -> ActionResult<(i64, i64)> {
        let client = self.read_client().await?;
        let pool = IUniswapV3Pool::new(self.addresses.pool, client);
        let seconds_ago = vec![window_secs, 0];
        let result = self
            .with_retry_and_rotate(|| async { pool.observe(seconds_ago.clone()).call().await.map_err(|e| e.to_string()) })
            .await?;

        let start = result.tickCumulatives[0].as_i64();
        let end = result.tickCumulatives[1].as_i64();
        Ok((start, end))
    }

    /// Submits decreaseLiquidity, collect and burn as a single `multicall`
    /// transaction and recovers the collected amounts from the `Collect`
    /// event the position manager emits, rather than from a second
    /// `collect` static-call (which would see the already-drained
    /// `tokensOwed` and return zero).
    async fn atomic_exit(&self, token_id: U256, liquidity: u128) -> ActionResult<(u128, u128)> {
        let client = self.write_client().await?;
        let pm = INonfungiblePositionManager::new(self.addresses.position_manager, client.clone());
        let deadline = U256::from(deadline_secs());

        let mut calls: Vec<Bytes> = Vec::with_capacity(3);
        if liquidity > 0 {
            calls.push(Bytes::from(
                INonfungiblePositionManager::decreaseLiquidityCall {
                    params: DecreaseLiquidityParams {
                        tokenId: token_id,
                        liquidity,
                        amount0Min: U256::ZERO,
                        amount1Min: U256::ZERO,
                        deadline,
                    },
                }
                .abi_encode(),
            ));
        }
        calls.push(Bytes::from(
            INonfungiblePositionManager::collectCall {
                params: CollectParams {
                    tokenId: token_id,
                    recipient: self.wallet.address(),
                    amount0Max: u128::MAX,
                    amount1Max: u128::MAX,
                },
            }
            .abi_encode(),
        ));
        calls.push(Bytes::from(INonfungiblePositionManager::burnCall { tokenId: token_id }.abi_encode()));

        let pending = pm.multicall(calls).nonce(self.wallet.nonce_manager.next());
        let tx = pending.send().await.map_err(|e| ActionError::Chain(e.to_string()))?;
        let tx_hash = *tx.tx_hash();
        self.confirm(&client, tx_hash).await?;

        let receipt = client
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ActionError::Chain(e.to_string()))?
            .ok_or_else(|| ActionError::Chain("multicall receipt missing after confirmation".to_string()))?;

        for log in receipt.inner.logs() {
            if let Ok(collect) = log.log_decode::<INonfungiblePositionManager::Collect>() {
                let event = collect.inner.data;
                return Ok((event.amount0.to::<u128>(), event.amount1.to::<u128>()));
            }
        }

        Err(ActionError::Chain("multicall receipt contained no Collect event".to_string()))
    }

    async fn pending_fees(&self, token_id: U256) -> ActionResult<(u128, u128)> {
        let client = self.read_client().await?;
        let pm = INonfungiblePositionManager::new(self.addresses.position_manager, client);
        let result = pm
            .collect(CollectParams {
                tokenId: token_id,
                recipient: self.wallet.address(),
                amount0Max: u128::MAX,
                amount1Max: u128::MAX,
            })
            .call()
            .await
            .map_err(|e| ActionError::Chain(e.to_string()))?;
        Ok((result.amount0.to::<u128>(), result.amount1.to::<u128>()))
    }

    async fn quote_exact_input_single(&self, token_in: Address, token_out: Address, amount_in: u128) -> ActionResult<u128> {
        let client = self.read_client().await?;
        let quoter = IQuoterV2::new(self.addresses.quoter, client);
        let result = quoter
            .quoteExactInputSingle(QuoteExactInputSingleParams {
                tokenIn: token_in,
                tokenOut: token_out,
                amountIn: U256::from(amount_in),
                fee: POOL_FEE,
                sqrtPriceLimitX96: U160::ZERO,
            })
            .call()
            .await
            .map_err(|e| ActionError::Chain(e.to_string()))?;
        Ok(result.amountOut.to::<u128>())
    }

    async fn exact_input_single(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: u128,
        amount_out_minimum: u128,
    ) -> ActionResult<u128> {
        let client = self.write_client().await?;
        let router = ISwapRouter::new(self.addresses.swap_router, client.clone());
        let pending = router
            .exactInputSingle(ExactInputSingleParams {
                tokenIn: token_in,
                tokenOut: token_out,
                fee: POOL_FEE,
                recipient: self.wallet.address(),
                deadline: U256::from(deadline_secs()),
                amountIn: U256::from(amount_in),
                amountOutMinimum: U256::from(amount_out_minimum),
                sqrtPriceLimitX96: U160::ZERO,
            })
            .nonce(self.wallet.nonce_manager.next());
        let tx = pending.send().await.map_err(|e| ActionError::SwapRevert(e.to_string()))?;
        self.confirm(&client, *tx.tx_hash()).await?;
        Ok(amount_out_minimum)
    }

    #[allow(clippy::too_many_arguments)]
    async fn mint(
        &self,
        token0: Address,
        token1: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_desired: u128,
        amount1_desired: u128,
        amount0_min: u128,
        amount1_min: u128,
    ) -> ActionResult<U256> {
        let client = self.write_client().await?;
        let pm = INonfungiblePositionManager::new(self.addresses.position_manager, client.clone());
        let pending = pm
            .mint(MintParams {
                token0,
                token1,
                fee: POOL_FEE,
                tickLower: tick_lower,
                tickUpper: tick_upper,
                amount0Desired: U256::from(amount0_desired),
                amount1Desired: U256::from(amount1_desired),
                amount0Min: U256::from(amount0_min),
                amount1Min: U256::from(amount1_min),
                recipient: self.wallet.address(),
                deadline: U256::from(deadline_secs()),
            })
            .nonce(self.wallet.nonce_manager.next());
        let tx = pending.send().await.map_err(|e| ActionError::MintRevert(e.to_string()))?;
        self.confirm(&client, *tx.tx_hash()).await?;

        let balance = pm
            .balanceOf(self.wallet.address())
            .call()
            .await
            .map_err(|e| ActionError::Chain(e.to_string()))?;
        let last_index = balance.saturating_sub(U256::from(1u8));
        let token_id = pm
            .tokenOfOwnerByIndex(self.wallet.address(), last_index)
            .call()
            .await
            .map_err(|e| ActionError::Chain(e.to_string()))?;
        Ok(token_id)
    }

    async fn balance_of(&self, token: Address, owner: Address) -> ActionResult<u128> {
        let client = self.read_client().await?;
        let erc20 = IERC20Minimal::new(token, client);
        let balance = self
            .with_retry_and_rotate(|| async { erc20.balanceOf(owner).call().await.map_err(|e| e.to_string()) })
            .await?;
        Ok(balance.to::<u128>())
    }

    async fn owned_position_token_ids(&self, owner: Address) -> ActionResult<Vec<U256>> {
        let client = self.read_client().await?;
        let pm = INonfungiblePositionManager::new(self.addresses.position_manager, client);
        let balance = pm.balanceOf(owner).call().await.map_err(|e| ActionError::Chain(e.to_string()))?;
        let count: u64 = balance.to::<u64>();
        let mut ids = Vec::with_capacity(count as usize);
        for index in 0..count {
            let id = pm
                .tokenOfOwnerByIndex(owner, U256::from(index))
                .call()
                .await
                .map_err(|e| ActionError::Chain(e.to_string()))?;
            ids.push(id);
        }
        Ok(ids)
    }

    async fn position_liquidity(&self, token_id: U256) -> ActionResult<u128> {
        let client = self.read_client().await?;
        let pm = INonfungiblePositionManager::new(self.addresses.position_manager, client);
        let position = pm.positions(token_id).call().await.map_err(|e| ActionError::Chain(e.to_string()))?;
        Ok(position.liquidity)
    }
}

impl RealChainOps {
    /// Outside the `ChainOps` surface (the action library never needs a
    /// position's range): reads `[tickLower, tickUpper]` for the control
    /// loop's circuit-breaker and hysteresis math.
    pub async fn position_ticks(&self, token_id: U256) -> ActionResult<(i32, i32)> {
        let client = self.read_client().await?;
        let pm = INonfungiblePositionManager::new(self.addresses.position_manager, client);
        let position = pm.positions(token_id).call().await.map_err(|e| ActionError::Chain(e.to_string()))?;
        Ok((position.tickLower.as_i32(), position.tickUpper.as_i32()))
    }

    /// Current chain head, used by the control loop to detect a new block
    /// without a full event-subscription layer.
    pub async fn block_number(&self) -> ActionResult<u64> {
        let client = self.read_client().await?;
        client.get_block_number().await.map_err(|e| ActionError::Chain(e.to_string()))
    }

    pub fn wallet_address(&self) -> Address {
        self.wallet.address()
    }
}

fn deadline_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() + 600
}
