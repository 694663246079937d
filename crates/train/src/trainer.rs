//! Trainer: the epoch-level training/evaluation loop for one branch.
//!
//! One [`Trainer`] owns a model, its `VarMap`, the optimiser, the loss
//! strategy, and the best-score state for a single run. [`Trainer::train`]
//! drives the whole loop: per epoch one full training pass, one full
//! evaluation pass, a checkpoint decision, and a structured progress record.

use std::path::PathBuf;

use candle_core::Device;
use candle_nn::{AdamW, ModuleT, Optimizer, ParamsAdamW, VarMap};

use lrnet_common::{batch_to_tensors, Batch, BatchProvider};

use crate::error::TrainError;
use crate::loss::LossStrategy;
use crate::metrics::{correct_count, EpochMetric, MetricAccumulator, TrainingLog};
use crate::policy::CheckpointPolicy;

// ── Config ──────────────────────────────────────────────────────────────────

/// Training knobs for one branch run.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub weight_decay: f64,
    /// Fixed checkpoint path; every save fully overwrites it.
    pub checkpoint_path: PathBuf,
}

// ── Trainer ─────────────────────────────────────────────────────────────────

/// The training engine for one branch. Owns the model, the optimiser, the
/// loss strategy, and the best-score state for the duration of the run;
/// the next branch gets a fresh instance.
pub struct Trainer<M: ModuleT> {
    model: M,
    varmap: VarMap,
    optimizer: AdamW,
    loss: Box<dyn LossStrategy>,
    policy: CheckpointPolicy,
    config: TrainerConfig,
    device: Device,
}

impl<M: ModuleT> Trainer<M> {
    /// Wrap a freshly built model. `varmap` must be the map the model's
    /// parameters were created through: the optimiser binds to its vars and
    /// checkpoints snapshot it.
    pub fn new(
        model: M,
        varmap: VarMap,
        loss: Box<dyn LossStrategy>,
        config: TrainerConfig,
        device: Device,
    ) -> Result<Self, TrainError> {
        let optimizer = AdamW::new(
            varmap.all_vars(),
            ParamsAdamW {
                lr: config.learning_rate,
                weight_decay: config.weight_decay,
                ..Default::default()
            },
        )?;
        Ok(Self {
            model,
            varmap,
            optimizer,
            loss,
            policy: CheckpointPolicy::new(),
            config,
            device,
        })
    }

    /// One full epoch: a training pass, then an evaluation pass.
    ///
    /// Both streams are consumed exactly once, in iterator order. Candle
    /// builds a fresh gradient store per backward call, so no explicit
    /// gradient zeroing precedes the optimiser step.
    pub fn run_epoch<A, B>(
        &mut self,
        epoch: usize,
        train_batches: A,
        test_batches: B,
    ) -> Result<EpochMetric, TrainError>
    where
        A: Iterator<Item = Batch>,
        B: Iterator<Item = Batch>,
    {
        let mut metrics = MetricAccumulator::new();
        for batch in train_batches {
            let (features, labels) = batch_to_tensors(&batch, &self.device)?;
            let output = self.model.forward_t(&features, true)?;
            let loss = self.loss.loss(&output, &labels)?;
            let loss_value = loss.to_scalar::<f32>()?;
            if !loss_value.is_finite() {
                return Err(TrainError::NonFiniteLoss {
                    epoch,
                    loss: loss_value,
                });
            }
            let grads = loss.backward()?;
            self.optimizer.step(&grads)?;
            metrics.update(loss_value, &output, &labels)?;
        }
        let (loss, train_accuracy) = metrics.finalize("training")?;
        let test_accuracy = self.evaluate(test_batches)?;
        Ok(EpochMetric {
            loss,
            train_accuracy,
            test_accuracy,
        })
    }

    /// Forward-only pass: the fraction of correctly classified blocks.
    pub fn evaluate<B>(&self, batches: B) -> Result<f64, TrainError>
    where
        B: Iterator<Item = Batch>,
    {
        let mut correct = 0.0f64;
        let mut total = 0usize;
        for batch in batches {
            let (features, labels) = batch_to_tensors(&batch, &self.device)?;
            let output = self.model.forward_t(&features, false)?;
            correct += correct_count(&output, &labels)? as f64;
            total += batch.size;
        }
        if total == 0 {
            return Err(TrainError::EmptyBatchStream {
                stream: "evaluation",
            });
        }
        Ok(correct / total as f64)
    }

    /// The full run: `config.epochs` epochs, fresh batch streams per epoch,
    /// best-so-far checkpointing, one log entry per completed epoch.
    ///
    /// An epoch budget of 0 is valid: the log comes back empty and the
    /// checkpoint path is never touched.
    pub fn train<P, Q>(
        &mut self,
        train_data: &P,
        test_data: &Q,
    ) -> Result<TrainingLog, TrainError>
    where
        P: BatchProvider + ?Sized,
        Q: BatchProvider + ?Sized,
    {
        let mut log = TrainingLog::new();
        for epoch in 1..=self.config.epochs {
            let metric = self.run_epoch(epoch, train_data.batches(), test_data.batches())?;
            let saved = self.policy.should_save(metric.test_accuracy);
            if saved {
                self.save_checkpoint()?;
                self.policy.record_save(metric.test_accuracy);
            }
            tracing::info!(
                epoch,
                loss = format!("{:.4}", metric.loss),
                train_accuracy = format!("{:.4}", metric.train_accuracy),
                test_accuracy = format!("{:.4}", metric.test_accuracy),
                best_score = format!("{:.4}", self.policy.best()),
                saved,
                "epoch complete"
            );
            log.push(metric);
        }
        Ok(log)
    }

    /// Persist the current parameter snapshot, fully overwriting the
    /// branch's checkpoint file.
    pub fn save_checkpoint(&self) -> Result<(), TrainError> {
        if let Some(parent) = self.config.checkpoint_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.varmap.save(&self.config.checkpoint_path)?;
        Ok(())
    }

    /// Best test accuracy seen so far in this run.
    pub fn best_score(&self) -> f64 {
        self.policy.best()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
