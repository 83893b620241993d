//! The on-chain contract surface the action library needs, behind a trait
//! so tests never touch a real RPC endpoint. The production implementation
//! (in the `rangekeeper-bot` binary) wires this to alloy contract bindings
//! over a [`rangekeeper_chain::ConnectionSupervisor`]-managed client.

use alloy::primitives::{Address, U256};
use rangekeeper_core::PoolSnapshot;

use crate::error::Result;

/// Raw on-chain operations, amounts always in the token's base units
/// (undecimaled) — callers scale with [`rangekeeper_core::Amount::from_raw`].
pub trait ChainOps: Send + Sync {
    /// Samples `slot0`, `liquidity` and `tickSpacing` together.
    fn pool_snapshot(&self) -> impl std::future::Future<Output = Result<PoolSnapshot>> + Send;

    /// `observe([window_secs, 0])`, returning the raw cumulative tick at the
    /// start and end of the window.
    fn cumulative_ticks(
        &self,
        window_secs: u32,
    ) -> impl std::future::Future<Output = Result<(i64, i64)>> + Send;

    /// `decreaseLiquidity(all) -> collect(max,max) -> burn` as one multicall.
    /// Returns the collected `(amount0, amount1)`. Skips `decreaseLiquidity`
    /// when `liquidity == 0` (a position that's already fully withdrawn but
    /// not yet burned).
    fn atomic_exit(
        &self,
        token_id: U256,
        liquidity: u128,
    ) -> impl std::future::Future<Output = Result<(u128, u128)>> + Send;

    /// Static-calls `collect(max,max)` without submitting a transaction, to
    /// read pending fees without mutating state.
    fn pending_fees(
        &self,
        token_id: U256,
    ) -> impl std::future::Future<Output = Result<(u128, u128)>> + Send;

    /// Quoter static call: expected output for an exact-input swap.
    fn quote_exact_input_single(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: u128,
    ) -> impl std::future::Future<Output = Result<u128>> + Send;

    /// Executes an exact-input swap, returning the amount of `token_out`
    /// actually received.
    fn exact_input_single(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: u128,
        amount_out_minimum: u128,
    ) -> impl std::future::Future<Output = Result<u128>> + Send;

    /// Mints a new position, returning its `tokenId`.
    #[allow(clippy::too_many_arguments)]
    fn mint(
        &self,
        token0: Address,
        token1: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_desired: u128,
        amount1_desired: u128,
        amount0_min: u128,
        amount1_min: u128,
    ) -> impl std::future::Future<Output = Result<U256>> + Send;

    fn balance_of(
        &self,
        token: Address,
        owner: Address,
    ) -> impl std::future::Future<Output = Result<u128>> + Send;

    /// `tokenOfOwnerByIndex` over the position manager's ERC-721 enumeration,
    /// for every index `0..balanceOf(owner)`. Used by orphan recovery only.
    fn owned_position_token_ids(
        &self,
        owner: Address,
    ) -> impl std::future::Future<Output = Result<Vec<U256>>> + Send;

    /// Raw `positions(tokenId).liquidity`.
    fn position_liquidity(
        &self,
        token_id: U256,
    ) -> impl std::future::Future<Output = Result<u128>> + Send;
}

#[cfg(any(test, feature = "test-util"))]
pub mod mock {
    use super::ChainOps;
    use crate::error::Result;
    use alloy::primitives::{address, Address, U256};
    use parking_lot::RwLock;
    use rangekeeper_core::{PoolSnapshot, TokenRef};
    use std::collections::HashMap;

    /// A fully in-memory fake used by action-library tests.
    pub struct MockChainOps {
        pub balances: RwLock<HashMap<Address, u128>>,
        pub exit_result: RwLock<Option<(u128, u128)>>,
        pub pending_fees_result: RwLock<(u128, u128)>,
        pub quote_rate_bps: RwLock<u128>,
        pub next_token_id: RwLock<u64>,
        pub fail_mint: RwLock<bool>,
        pub fail_swap: RwLock<bool>,
        pub pool: RwLock<PoolSnapshot>,
        pub cumulative_ticks_result: RwLock<(i64, i64)>,
        pub owned_token_ids: RwLock<Vec<U256>>,
        pub position_liquidity_result: RwLock<HashMap<U256, u128>>,
    }

    impl Default for MockChainOps {
        fn default() -> Self {
            Self {
                balances: RwLock::default(),
                exit_result: RwLock::default(),
                pending_fees_result: RwLock::default(),
                quote_rate_bps: RwLock::new(10_000),
                next_token_id: RwLock::new(1),
                fail_mint: RwLock::default(),
                fail_swap: RwLock::default(),
                pool: RwLock::new(PoolSnapshot {
                    sqrt_price_x96: U256::from(79_228_162_514_264_337_593_543_950_336u128),
                    tick: 0,
                    liquidity: 1_000_000,
                    tick_spacing: 10,
                    token0: TokenRef::new(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), 6, "USDC"),
                    token1: TokenRef::new(address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), 18, "WETH"),
                }),
                cumulative_ticks_result: RwLock::new((0, 0)),
                owned_token_ids: RwLock::default(),
                position_liquidity_result: RwLock::default(),
            }
        }
    }

    impl MockChainOps {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl ChainOps for MockChainOps {
        async fn pool_snapshot(&self) -> Result<PoolSnapshot> {
            Ok(self.pool.read().clone())
        }

        async fn cumulative_ticks(&self, _window_secs: u32) -> Result<(i64, i64)> {
            Ok(*self.cumulative_ticks_result.read())
        }

        async fn atomic_exit(&self, _token_id: U256, _liquidity: u128) -> Result<(u128, u128)> {
            Ok(self.exit_result.read().unwrap_or((0, 0)))
        }

        async fn pending_fees(&self, _token_id: U256) -> Result<(u128, u128)> {
            Ok(*self.pending_fees_result.read())
        }

        async fn quote_exact_input_single(
            &self,
            _token_in: Address,
            _token_out: Address,
            amount_in: u128,
        ) -> Result<u128> {
            let bps = *self.quote_rate_bps.read();
            Ok(amount_in * bps / 10_000)
        }

        async fn exact_input_single(
            &self,
            _token_in: Address,
            _token_out: Address,
            amount_in: u128,
            amount_out_minimum: u128,
        ) -> Result<u128> {
            if *self.fail_swap.read() {
                return Err(crate::error::ActionError::SwapRevert("mock swap failure".to_string()));
            }
            let bps = *self.quote_rate_bps.read();
            let out = amount_in * bps / 10_000;
            if out < amount_out_minimum {
                return Err(crate::error::ActionError::SwapRevert("slippage".to_string()));
            }
            Ok(out)
        }

        async fn mint(
            &self,
            _token0: Address,
            _token1: Address,
            _tick_lower: i32,
            _tick_upper: i32,
            _amount0_desired: u128,
            _amount1_desired: u128,
            _amount0_min: u128,
            _amount1_min: u128,
        ) -> Result<U256> {
            if *self.fail_mint.read() {
                return Err(crate::error::ActionError::MintRevert("mock mint failure".to_string()));
            }
            let mut next = self.next_token_id.write();
            let id = *next;
            *next += 1;
            Ok(U256::from(id))
        }

        async fn balance_of(&self, token: Address, _owner: Address) -> Result<u128> {
            Ok(*self.balances.read().get(&token).unwrap_or(&0))
        }

        async fn owned_position_token_ids(&self, _owner: Address) -> Result<Vec<U256>> {
            Ok(self.owned_token_ids.read().clone())
        }

        async fn position_liquidity(&self, token_id: U256) -> Result<u128> {
            Ok(*self.position_liquidity_result.read().get(&token_id).unwrap_or(&0))
        }
    }
}
