//! # lrnet-train — The Epoch Engine
//!
//! Training loop, checkpointing, and branch scheduling for the detector:
//!
//! * **[`Trainer`]** — owns model + optimiser + checkpoint policy. One call
//!   to [`Trainer::train`] runs the full epoch loop: train pass, eval pass,
//!   checkpoint decision, progress record.
//! * **[`MetricAccumulator`]** — batch-size-weighted loss/accuracy means.
//! * **[`CheckpointPolicy`]** — save whenever the score ties or beats the
//!   best seen so far.
//! * **[`train_branches`]** — runs g1 / g2 / both, each with fresh state.

pub mod error;
pub mod loss;
pub mod metrics;
pub mod policy;
pub mod scheduler;
pub mod trainer;

pub use error::TrainError;
pub use loss::{LogitCrossEntropy, LossStrategy, ProbabilityNll};
pub use metrics::{EpochMetric, MetricAccumulator, TrainingLog};
pub use policy::CheckpointPolicy;
pub use scheduler::{train_branches, Branch, BranchOutcome, BranchSelection};
pub use trainer::{Trainer, TrainerConfig};
