//! The pipeline's explicit state-machine view, reported to telemetry as the
//! rebalance progresses. Purely descriptive — the actual control flow lives
//! in [`crate::run::run_rebalance`]; this enum exists so callers can render
//! "where did it die" without parsing an error string.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    CheckingTwap,
    FetchingData,
    Exiting,
    Swapping,
    WaitSync,
    Minting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::CheckingTwap => "checking_twap",
            Stage::FetchingData => "fetching_data",
            Stage::Exiting => "exiting",
            Stage::Swapping => "swapping",
            Stage::WaitSync => "wait_sync",
            Stage::Minting => "minting",
        };
        f.write_str(name)
    }
}

/// Why a rebalance stopped short of minting the replacement range.
#[derive(Debug)]
pub struct AbortReason {
    pub stage: Stage,
    pub source: crate::error::PipelineError,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aborted at {}: {}", self.stage, self.source)
    }
}

/// Collected amounts from the old position, reported once the rebalance
/// reaches a terminal state either way.
#[derive(Debug, Clone, Copy)]
pub struct ExitReceipt {
    pub amount0: rangekeeper_core::Amount,
    pub amount1: rangekeeper_core::Amount,
}

/// The rebalance pipeline's terminal result.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// A new position was minted; `token_id == U256::ZERO` means both
    /// desired mint amounts were dust and no position was opened.
    Minted {
        token_id: alloy::primitives::U256,
        plan: rangekeeper_core::RangePlan,
        exit: Option<ExitReceipt>,
    },
    Aborted(AbortReason),
}
