//! Branch scheduling: train g1, g2, or both, each with fresh state.

use std::path::Path;

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};

use lrnet_common::{BlockEncoding, LandmarkCorpus, LrNetConfig, Split};
use lrnet_core::{param_count, LrNet};

use crate::error::TrainError;
use crate::loss::ProbabilityNll;
use crate::metrics::TrainingLog;
use crate::trainer::{Trainer, TrainerConfig};

// ── Branches ────────────────────────────────────────────────────────────────

/// One independently trained branch of the detector. Both branches share
/// the architecture; they differ in input encoding and epoch budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Raw landmark blocks.
    G1,
    /// Frame-difference (motion) blocks.
    G2,
}

impl Branch {
    pub fn name(&self) -> &'static str {
        match self {
            Branch::G1 => "g1",
            Branch::G2 => "g2",
        }
    }

    pub fn encoding(&self) -> BlockEncoding {
        match self {
            Branch::G1 => BlockEncoding::Raw,
            Branch::G2 => BlockEncoding::Motion,
        }
    }

    /// Checkpoint file name under the weights directory.
    pub fn checkpoint_file(&self) -> String {
        format!("{}.safetensors", self.name())
    }

    pub fn epoch_budget(&self, config: &LrNetConfig) -> usize {
        match self {
            Branch::G1 => config.epochs_g1,
            Branch::G2 => config.epochs_g2,
        }
    }
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which branches one invocation trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSelection {
    G1,
    G2,
    All,
}

impl BranchSelection {
    /// Selected branches in result order: g1 always precedes g2.
    pub fn branches(&self) -> &'static [Branch] {
        match self {
            BranchSelection::G1 => &[Branch::G1],
            BranchSelection::G2 => &[Branch::G2],
            BranchSelection::All => &[Branch::G1, Branch::G2],
        }
    }
}

impl std::str::FromStr for BranchSelection {
    type Err = TrainError;

    /// Anything outside `g1`/`g2`/`all` is rejected here, before any data
    /// is read or any model is built.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "g1" => Ok(BranchSelection::G1),
            "g2" => Ok(BranchSelection::G2),
            "all" => Ok(BranchSelection::All),
            other => Err(TrainError::InvalidBranch(other.to_string())),
        }
    }
}

// ── Scheduling ──────────────────────────────────────────────────────────────

/// One branch's completed run.
#[derive(Debug)]
pub struct BranchOutcome {
    pub branch: Branch,
    pub log: TrainingLog,
    pub best_score: f64,
}

/// Train every selected branch sequentially, g1 before g2.
///
/// Each branch gets a fresh model, optimiser, loss strategy, and best-score
/// state, plus its own checkpoint file `{weights_dir}/{branch}.safetensors`;
/// nothing is shared across branches. An empty split or a block geometry the
/// branch's encoding cannot cut is rejected before the branch's model is
/// built, leaving no files behind.
pub fn train_branches(
    selection: BranchSelection,
    corpus: &LandmarkCorpus,
    config: &LrNetConfig,
    device: &Device,
    weights_dir: &Path,
) -> Result<Vec<BranchOutcome>, TrainError> {
    let mut outcomes = Vec::with_capacity(selection.branches().len());
    for &branch in selection.branches() {
        let train_blocks = corpus.blocks(Split::Train, branch.encoding(), config)?;
        let test_blocks = corpus.blocks(Split::Test, branch.encoding(), config)?;
        if train_blocks.num_blocks() == 0 {
            return Err(TrainError::EmptyBatchStream { stream: "training" });
        }
        if test_blocks.num_blocks() == 0 {
            return Err(TrainError::EmptyBatchStream {
                stream: "evaluation",
            });
        }
        tracing::info!(
            branch = branch.name(),
            train_blocks = train_blocks.num_blocks(),
            test_blocks = test_blocks.num_blocks(),
            params = param_count(config),
            epochs = branch.epoch_budget(config),
            "starting branch"
        );

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let model = LrNet::new(vb, config)?;
        let trainer_config = TrainerConfig {
            epochs: branch.epoch_budget(config),
            learning_rate: config.learning_rate,
            weight_decay: config.weight_decay,
            checkpoint_path: weights_dir.join(branch.checkpoint_file()),
        };
        let mut trainer = Trainer::new(
            model,
            varmap,
            Box::new(ProbabilityNll),
            trainer_config,
            device.clone(),
        )?;
        let log = trainer.train(&train_blocks, &test_blocks)?;
        outcomes.push(BranchOutcome {
            branch,
            log,
            best_score: trainer.best_score(),
        });
    }
    Ok(outcomes)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use lrnet_common::{FrameSequence, FAKE_LABEL, REAL_LABEL};

    fn tiny_config() -> LrNetConfig {
        LrNetConfig {
            feature_dim: 2,
            block_size: 4,
            block_stride: Some(2),
            batch_size: 8,
            rnn_units: 6,
            bidirectional: false,
            input_dropout: 0.0,
            dropout_rate: 0.0,
            learning_rate: 1e-2,
            epochs_g1: 2,
            epochs_g2: 1,
            ..Default::default()
        }
    }

    fn constant_video(value: f32, frames: usize, label: u32) -> FrameSequence {
        FrameSequence {
            frames: vec![value; 2 * frames],
            label,
        }
    }

    fn tiny_corpus() -> LandmarkCorpus {
        let videos = vec![
            constant_video(0.1, 12, REAL_LABEL),
            constant_video(0.9, 12, FAKE_LABEL),
        ];
        LandmarkCorpus::from_sequences(videos.clone(), videos, 2)
    }

    #[test]
    fn selection_parses_and_orders_g1_first() {
        assert_eq!(
            "g1".parse::<BranchSelection>().unwrap(),
            BranchSelection::G1
        );
        assert_eq!(
            "g2".parse::<BranchSelection>().unwrap(),
            BranchSelection::G2
        );
        assert_eq!(
            "all".parse::<BranchSelection>().unwrap(),
            BranchSelection::All
        );
        assert_eq!(BranchSelection::All.branches(), &[Branch::G1, Branch::G2]);
    }

    #[test]
    fn unknown_selection_is_rejected() {
        let err = "g3".parse::<BranchSelection>().unwrap_err();
        assert!(matches!(err, TrainError::InvalidBranch(ref s) if s == "g3"));
    }

    #[test]
    fn all_trains_both_branches_with_own_budgets_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = tiny_config();
        let corpus = tiny_corpus();

        let outcomes = train_branches(
            BranchSelection::All,
            &corpus,
            &config,
            &Device::Cpu,
            dir.path(),
        )
        .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].branch, Branch::G1);
        assert_eq!(outcomes[1].branch, Branch::G2);
        assert_eq!(outcomes[0].log.len(), 2);
        assert_eq!(outcomes[1].log.len(), 1);
        assert!(dir.path().join("g1.safetensors").exists());
        assert!(dir.path().join("g2.safetensors").exists());
    }

    #[test]
    fn best_scores_are_disjoint_per_branch() {
        let dir = tempfile::tempdir().unwrap();
        let config = tiny_config();
        let corpus = tiny_corpus();

        let outcomes = train_branches(
            BranchSelection::All,
            &corpus,
            &config,
            &Device::Cpu,
            dir.path(),
        )
        .unwrap();

        // Each branch's best score is the maximum of its own log, never a
        // carry-over from the other branch.
        for outcome in &outcomes {
            let own_max = outcome
                .log
                .iter()
                .map(|m| m.test_accuracy)
                .fold(0.0f64, f64::max);
            assert!((outcome.best_score - own_max).abs() < 1e-12);
        }
    }

    #[test]
    fn single_branch_selection_leaves_the_other_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let config = tiny_config();
        let corpus = tiny_corpus();

        let outcomes = train_branches(
            BranchSelection::G2,
            &corpus,
            &config,
            &Device::Cpu,
            dir.path(),
        )
        .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].branch, Branch::G2);
        assert!(!dir.path().join("g1.safetensors").exists());
        assert!(dir.path().join("g2.safetensors").exists());
    }

    #[test]
    fn empty_corpus_fails_before_any_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let config = tiny_config();
        let corpus = LandmarkCorpus::from_sequences(vec![], vec![], 2);

        let err = train_branches(
            BranchSelection::All,
            &corpus,
            &config,
            &Device::Cpu,
            dir.path(),
        )
        .unwrap_err();

        assert!(matches!(err, TrainError::EmptyBatchStream { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn degenerate_block_size_fails_before_any_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        // A zero block size can never be cut into blocks; a config file can
        // still carry one, so the scheduler must refuse it cleanly.
        let config = LrNetConfig {
            block_size: 0,
            ..tiny_config()
        };
        let corpus = tiny_corpus();

        let err = train_branches(
            BranchSelection::All,
            &corpus,
            &config,
            &Device::Cpu,
            dir.path(),
        )
        .unwrap_err();

        assert!(matches!(err, TrainError::Data(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
