//! The rebalance pipeline: safety gate, market analytics, exit, swap, and
//! mint, sequenced as an explicit state machine so an abort at any step
//! never leaves the position half-migrated.

pub mod analytics;
pub mod config;
pub mod error;
pub mod run;
pub mod stage;

pub use analytics::Analytics;
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use run::run_rebalance;
pub use stage::{AbortReason, ExitReceipt, PipelineOutcome, Stage};
