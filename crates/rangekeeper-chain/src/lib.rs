//! Chain connectivity: multi-endpoint connection supervision, bounded-retry
//! RPC calls, nonce-tracked signing, and heartbeat health probing.

pub mod connection;
pub mod error;
pub mod heartbeat;
pub mod nonce;
pub mod retry;
pub mod signer;

pub use connection::{ConnectionSupervisor, OnSwitch};
pub use error::{ChainError, Result};
pub use heartbeat::HeartbeatManager;
pub use nonce::{Clock, NonceManager, SystemClock};
pub use retry::{wait_for_confirmation, with_retry};
pub use signer::{KeySource, Wallet};
