//! Loss strategies over the model's output.
//!
//! The epoch loop never inspects model outputs itself; what the final layer
//! must emit is a contract between the model and the strategy chosen here.

use candle_core::{Result, Tensor};
use candle_nn::loss;

/// Maps a model output batch and integer labels to a scalar mean loss.
pub trait LossStrategy {
    /// `output` is `(batch, classes)`, `labels` is `(batch,)` u32 indices.
    fn loss(&self, output: &Tensor, labels: &Tensor) -> Result<Tensor>;
}

/// Negative log likelihood over an already-normalised probability output:
/// elementwise log, then NLL.
///
/// Precondition: every output value is strictly positive (a softmax final
/// layer guarantees this). Zeros or negatives produce a NaN/Inf loss, which
/// the epoch loop rejects as a non-finite-loss error.
pub struct ProbabilityNll;

impl LossStrategy for ProbabilityNll {
    fn loss(&self, output: &Tensor, labels: &Tensor) -> Result<Tensor> {
        let log_probs = output.log()?;
        loss::nll(&log_probs, labels)
    }
}

/// Cross-entropy over raw scores: log-softmax, then NLL. Drop-in substitute
/// for models whose final layer emits unnormalised logits.
pub struct LogitCrossEntropy;

impl LossStrategy for LogitCrossEntropy {
    fn loss(&self, output: &Tensor, labels: &Tensor) -> Result<Tensor> {
        loss::cross_entropy(output, labels)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
