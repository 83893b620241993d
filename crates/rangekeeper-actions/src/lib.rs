//! The action library: atomic exit, target-ratio swap, sweep-to-stable,
//! and mint, each a typed wrapper around the [`ChainOps`] contract surface.

pub mod chain_ops;
pub mod error;
pub mod exit;
pub mod mint;
pub mod swap;

pub use chain_ops::ChainOps;
pub use error::{ActionError, Result};
pub use exit::atomic_exit;
pub use mint::mint_max_liquidity;
pub use swap::{smart_swap, sweep_to_stable};
