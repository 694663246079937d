//! Running metrics over one epoch's batch stream.

use candle_core::{DType, Result, Tensor, D};

use crate::error::TrainError;

/// Per-epoch record: mean training loss, training accuracy, test accuracy.
/// Immutable once appended to a [`TrainingLog`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochMetric {
    pub loss: f64,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
}

/// One branch's training history, one entry per completed epoch.
/// Append-only: entries are never rewritten, truncated, or reordered.
pub type TrainingLog = Vec<EpochMetric>;

// ── MetricAccumulator ───────────────────────────────────────────────────────

/// Batch-size-weighted running sums of loss and correct predictions.
///
/// Weighting by batch size makes the epoch mean invariant to the batch-size
/// choice and to a smaller final batch.
#[derive(Debug, Default)]
pub struct MetricAccumulator {
    loss_sum: f64,
    correct_sum: f64,
    count_sum: usize,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch into the running sums. `loss` is the batch's mean
    /// loss; `output` is `(batch, classes)`, `labels` is `(batch,)`.
    pub fn update(&mut self, loss: f32, output: &Tensor, labels: &Tensor) -> Result<()> {
        let batch_size = labels.dim(0)?;
        self.loss_sum += loss as f64 * batch_size as f64;
        self.correct_sum += correct_count(output, labels)? as f64;
        self.count_sum += batch_size;
        Ok(())
    }

    /// Samples folded in so far.
    pub fn count(&self) -> usize {
        self.count_sum
    }

    /// `(mean_loss, mean_accuracy)` over everything seen.
    ///
    /// An empty stream has no mean; `stream` names the offender in the
    /// resulting configuration error.
    pub fn finalize(&self, stream: &'static str) -> std::result::Result<(f64, f64), TrainError> {
        if self.count_sum == 0 {
            return Err(TrainError::EmptyBatchStream { stream });
        }
        let n = self.count_sum as f64;
        Ok((self.loss_sum / n, self.correct_sum / n))
    }
}

/// Number of argmax predictions agreeing with the labels.
pub fn correct_count(output: &Tensor, labels: &Tensor) -> Result<f32> {
    let predictions = output.argmax(D::Minus1)?;
    predictions
        .eq(labels)?
        .to_dtype(DType::F32)?
        .sum_all()?
        .to_scalar::<f32>()
}

// ── Tests ───────────────────────────────────────────────────────────────────
