//! Error taxonomy for the training orchestrator.

use lrnet_common::DataError;
use thiserror::Error;

/// Errors surfaced by the epoch loop and the branch scheduler.
///
/// Configuration problems (empty streams, bad block geometry, unknown branch
/// names) are caught before or at the start of a run and never leave a
/// partial checkpoint behind. Numeric and device failures abort the branch
/// mid-run; the training log stays intact up to the last completed epoch.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Empty {stream} batch stream: at least one batch is required")]
    EmptyBatchStream { stream: &'static str },

    #[error("Unknown branch selection {0:?}: expected g1, g2, or all")]
    InvalidBranch(String),

    #[error(transparent)]
    Data(#[from] DataError),

    /// The probability-NLL loss requires strictly positive model outputs;
    /// a NaN/Inf loss means that precondition broke or training diverged.
    #[error("Non-finite loss {loss} in epoch {epoch}")]
    NonFiniteLoss { epoch: usize, loss: f32 },

    #[error("Tensor operation failed: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Checkpoint I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
