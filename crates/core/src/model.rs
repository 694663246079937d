//! LRNet: recurrent block classifier over facial-landmark sequences.
//!
//! Stack: input dropout → GRU (optionally bidirectional) → dropout →
//! dense + ReLU → dropout → dense → softmax. The output is a strictly
//! positive, row-normalised probability distribution; the training loss
//! takes its logarithm, so the final softmax is load-bearing.

use candle_core::{Error, Result, Tensor, D};
use candle_nn::ops::softmax;
use candle_nn::{gru, linear, Dropout, GRU, GRUConfig, Linear, Module, ModuleT, RNN, VarBuilder};

use lrnet_common::LrNetConfig;

// ── LrNet ───────────────────────────────────────────────────────────────────

/// GRU block classifier. One instance per branch; the g1 and g2 branches
/// share this architecture and differ only in their input encoding.
pub struct LrNet {
    input_dropout: Dropout,
    gru_fwd: GRU,
    /// Second GRU over the time-reversed block when `config.bidirectional`.
    gru_bwd: Option<GRU>,
    state_dropout: Dropout,
    dense1: Linear,
    dense_dropout: Dropout,
    dense2: Linear,
}

impl LrNet {
    pub fn new(vb: VarBuilder, config: &LrNetConfig) -> Result<Self> {
        let gru_fwd = gru(
            config.feature_dim,
            config.rnn_units,
            GRUConfig::default(),
            vb.pp("gru_fwd"),
        )?;
        let gru_bwd = if config.bidirectional {
            Some(gru(
                config.feature_dim,
                config.rnn_units,
                GRUConfig::default(),
                vb.pp("gru_bwd"),
            )?)
        } else {
            None
        };
        let dense1 = linear(config.recurrent_dim(), config.rnn_units, vb.pp("dense1"))?;
        let dense2 = linear(config.rnn_units, config.num_classes, vb.pp("dense2"))?;

        Ok(Self {
            input_dropout: Dropout::new(config.input_dropout),
            gru_fwd,
            gru_bwd,
            state_dropout: Dropout::new(config.dropout_rate),
            dense1,
            dense_dropout: Dropout::new(config.dropout_rate),
            dense2,
        })
    }
}

impl ModuleT for LrNet {
    /// `(batch, block_len, feature_dim)` → `(batch, num_classes)` class
    /// probabilities. `train` gates every dropout layer.
    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let xs = self.input_dropout.forward(xs, train)?;
        let mut state = final_hidden(&self.gru_fwd, &xs)?;
        if let Some(bwd) = &self.gru_bwd {
            let reversed = reverse_time(&xs)?;
            let back = final_hidden(bwd, &reversed)?;
            state = Tensor::cat(&[&state, &back], D::Minus1)?;
        }
        let state = self.state_dropout.forward(&state, train)?;
        let hidden = self.dense1.forward(&state)?.relu()?;
        let hidden = self.dense_dropout.forward(&hidden, train)?;
        let logits = self.dense2.forward(&hidden)?;
        softmax(&logits, D::Minus1)
    }
}

// ── Parameter accounting ────────────────────────────────────────────────────

/// Trainable parameter count, from config alone (no model instance needed).
pub fn param_count(config: &LrNetConfig) -> usize {
    let h = config.rnn_units;
    let f = config.feature_dim;
    let directions = if config.bidirectional { 2 } else { 1 };
    // Per direction: w_ih (3h×f), w_hh (3h×h), b_ih (3h), b_hh (3h).
    let gru = directions * (3 * h * (f + h) + 2 * 3 * h);
    let dense1 = config.recurrent_dim() * h + h;
    let dense2 = h * config.num_classes + config.num_classes;
    gru + dense1 + dense2
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Run a GRU over `(batch, seq, features)` and return the final hidden state
/// `(batch, hidden)`.
fn final_hidden(gru: &GRU, xs: &Tensor) -> Result<Tensor> {
    let states = gru.seq(xs)?;
    match states.last() {
        Some(state) => Ok(state.h().clone()),
        None => Err(Error::Msg("cannot classify an empty block".to_string())),
    }
}

/// Reverse a `(batch, seq, features)` tensor along the time axis.
fn reverse_time(xs: &Tensor) -> Result<Tensor> {
    let (_, seq_len, _) = xs.dims3()?;
    let indices: Vec<u32> = (0..seq_len as u32).rev().collect();
    let indices = Tensor::from_vec(indices, seq_len, xs.device())?;
    xs.index_select(&indices, 1)
}

// ── Tests ───────────────────────────────────────────────────────────────────
