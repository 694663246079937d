//! Hyper-parameter configuration for LRNet.
//!
//! Serialised as JSON for reproducible runs. Every field has a default
//! matching the reference detector, so a minimal `{}` JSON trains the
//! standard model on FaceForensics++-style landmark dumps.

use serde::{Deserialize, Serialize};

/// Configuration for the GRU block classifier and its training run.
///
/// Stored alongside weights. Backwards-compatible: missing fields fall back
/// to their `#[serde(default)]` values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LrNetConfig {
    // ── Input geometry ──────────────────────────────────────────────────────
    /// Landmark features per frame (68 points × 2 coordinates).
    #[serde(default = "default_feature_dim")]
    pub feature_dim: usize,
    /// Frames per block fed to the recurrent stack.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Frame stride between consecutive blocks cut from one video.
    /// `None` means `block_size` (disjoint blocks).
    #[serde(default)]
    pub block_stride: Option<usize>,
    /// Output classes (real = 0, fake = 1).
    #[serde(default = "default_num_classes")]
    pub num_classes: usize,

    // ── Architecture ────────────────────────────────────────────────────────
    /// GRU hidden size, also the width of the dense head.
    #[serde(default = "default_rnn_units")]
    pub rnn_units: usize,
    /// Run a second GRU over the time-reversed block and concatenate the
    /// final hidden states.
    #[serde(default = "default_true")]
    pub bidirectional: bool,
    /// Dropout applied to raw landmark frames before the recurrent stack.
    #[serde(default = "default_input_dropout")]
    pub input_dropout: f32,
    /// Dropout applied between the recurrent state and each dense layer.
    #[serde(default = "default_dropout_rate")]
    pub dropout_rate: f32,

    // ── Optimisation ────────────────────────────────────────────────────────
    /// Blocks per mini-batch; the final batch of an epoch may be smaller.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub weight_decay: f64,
    /// Epoch budget for the g1 branch (raw landmark blocks).
    #[serde(default = "default_epochs_g1")]
    pub epochs_g1: usize,
    /// Epoch budget for the g2 branch (frame-difference blocks).
    #[serde(default = "default_epochs_g2")]
    pub epochs_g2: usize,
}

// ── Default value functions ─────────────────────────────────────────────────

fn default_feature_dim() -> usize {
    136
}
fn default_block_size() -> usize {
    60
}
fn default_num_classes() -> usize {
    2
}
fn default_rnn_units() -> usize {
    64
}
fn default_true() -> bool {
    true
}
fn default_input_dropout() -> f32 {
    0.25
}
fn default_dropout_rate() -> f32 {
    0.5
}
fn default_batch_size() -> usize {
    1024
}
fn default_learning_rate() -> f64 {
    5e-3
}
fn default_epochs_g1() -> usize {
    400
}
fn default_epochs_g2() -> usize {
    300
}

// ── Impl ────────────────────────────────────────────────────────────────────

impl Default for LrNetConfig {
    fn default() -> Self {
        Self {
            feature_dim: 136,
            block_size: 60,
            block_stride: None,
            num_classes: 2,
            rnn_units: 64,
            bidirectional: true,
            input_dropout: 0.25,
            dropout_rate: 0.5,
            batch_size: 1024,
            learning_rate: 5e-3,
            weight_decay: 0.0,
            epochs_g1: 400,
            epochs_g2: 300,
        }
    }
}

impl LrNetConfig {
    /// Effective stride between blocks (`block_stride` or `block_size`).
    pub fn stride(&self) -> usize {
        self.block_stride.unwrap_or(self.block_size)
    }

    /// Width of the recurrent state handed to the dense head.
    pub fn recurrent_dim(&self) -> usize {
        if self.bidirectional {
            2 * self.rnn_units
        } else {
            self.rnn_units
        }
    }

    /// Save config to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
