//! Landmark data pipeline: corpus loading, block windowing, batching.
//!
//! Landmark dumps are plain text, one frame per line, `feature_dim`
//! whitespace-separated floats per line (the upstream extractor aligns and
//! normalises them; that stage is not part of this workspace). Layout:
//!
//! ```text
//! {root}/{dataset}/{level}/{train|test}/{real|fake}/*.txt
//! ```
//!
//! * **[`LandmarkCorpus`]** — per-video frame sequences for both splits.
//! * **[`BlockDataset`]** — fixed-length blocks for one (split, encoding);
//!   [`BlockDataset::batches`] starts a fresh pass on every call.
//! * **[`batch_to_tensors`]** — raw batch → Candle tensors.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result as AnyhowResult};
use candle_core::{Device, Result, Tensor};
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::config::LrNetConfig;

/// Class index for untouched videos.
pub const REAL_LABEL: u32 = 0;
/// Class index for manipulated videos.
pub const FAKE_LABEL: u32 = 1;

/// Rejected dataset geometry.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Block size {block_size} is too small for {encoding:?} blocks (minimum {min})")]
    BlockTooSmall {
        block_size: usize,
        encoding: BlockEncoding,
        min: usize,
    },
}

/// Input encoding consumed by one branch of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEncoding {
    /// Raw landmark frames, `block_size` rows per block (the g1 branch).
    Raw,
    /// First-order frame differences, `block_size - 1` rows per block
    /// (the g2 branch; captures landmark motion rather than position).
    Motion,
}

impl BlockEncoding {
    /// Smallest `block_size` that still yields a non-empty block: motion
    /// encoding drops one row per block, so it needs one frame more.
    pub fn min_block_size(&self) -> usize {
        match self {
            BlockEncoding::Raw => 1,
            BlockEncoding::Motion => 2,
        }
    }
}

/// Corpus split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

// ── LandmarkCorpus ──────────────────────────────────────────────────────────

/// One video's landmark track with its ground-truth label.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    /// Flattened frames, `num_frames × feature_dim` values.
    pub frames: Vec<f32>,
    pub label: u32,
}

/// All landmark tracks of one dataset at one compression level, loaded into
/// memory as per-video sequences. Blocks are cut lazily per branch via
/// [`blocks`](Self::blocks).
pub struct LandmarkCorpus {
    train: Vec<FrameSequence>,
    test: Vec<FrameSequence>,
    feature_dim: usize,
}

impl LandmarkCorpus {
    /// Load `{root}/{dataset}/{level}` from disk.
    pub fn load(root: &Path, dataset: &str, level: &str, feature_dim: usize) -> AnyhowResult<Self> {
        let base = root.join(dataset).join(level);
        let train = load_split(&base.join("train"), feature_dim)?;
        let test = load_split(&base.join("test"), feature_dim)?;
        Ok(Self {
            train,
            test,
            feature_dim,
        })
    }

    /// Build a corpus from in-memory sequences (tests and synthetic demos).
    pub fn from_sequences(
        train: Vec<FrameSequence>,
        test: Vec<FrameSequence>,
        feature_dim: usize,
    ) -> Self {
        Self {
            train,
            test,
            feature_dim,
        }
    }

    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    pub fn num_videos(&self, split: Split) -> usize {
        match split {
            Split::Train => self.train.len(),
            Split::Test => self.test.len(),
        }
    }

    /// Cut one split into blocks under the given encoding. Training datasets
    /// reshuffle on every pass; test datasets keep file order so evaluation
    /// sees identical batches each epoch.
    ///
    /// A `block_size` below the encoding's minimum is rejected here, before
    /// any windowing runs.
    pub fn blocks(
        &self,
        split: Split,
        encoding: BlockEncoding,
        config: &LrNetConfig,
    ) -> std::result::Result<BlockDataset, DataError> {
        let sequences = match split {
            Split::Train => &self.train,
            Split::Test => &self.test,
        };
        BlockDataset::cut(
            sequences,
            self.feature_dim,
            encoding,
            config,
            split == Split::Train,
        )
    }
}

// ── BlockDataset ────────────────────────────────────────────────────────────

/// One mini-batch of blocks.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Flattened inputs, `size × block_len × feature_dim` values.
    pub features: Vec<f32>,
    /// Class indices, `size` values.
    pub labels: Vec<u32>,
    pub size: usize,
    pub block_len: usize,
    pub feature_dim: usize,
}

/// Materialised fixed-length blocks for one (split, encoding) pair.
#[derive(Debug)]
pub struct BlockDataset {
    blocks: Vec<Vec<f32>>,
    labels: Vec<u32>,
    block_len: usize,
    feature_dim: usize,
    batch_size: usize,
    shuffle: bool,
}

impl BlockDataset {
    fn cut(
        sequences: &[FrameSequence],
        feature_dim: usize,
        encoding: BlockEncoding,
        config: &LrNetConfig,
        shuffle: bool,
    ) -> std::result::Result<Self, DataError> {
        let block_size = config.block_size;
        let min = encoding.min_block_size();
        if block_size < min {
            return Err(DataError::BlockTooSmall {
                block_size,
                encoding,
                min,
            });
        }
        let stride = config.stride().max(1);
        let mut blocks = Vec::new();
        let mut labels = Vec::new();
        for seq in sequences {
            let num_frames = seq.frames.len() / feature_dim;
            let mut start = 0;
            // Videos shorter than one block contribute nothing.
            while start + block_size <= num_frames {
                let window = &seq.frames[start * feature_dim..(start + block_size) * feature_dim];
                blocks.push(encode_block(window, feature_dim, encoding));
                labels.push(seq.label);
                start += stride;
            }
        }
        let block_len = match encoding {
            BlockEncoding::Raw => block_size,
            BlockEncoding::Motion => block_size - 1,
        };
        Ok(Self {
            blocks,
            labels,
            block_len,
            feature_dim,
            batch_size: config.batch_size,
            shuffle,
        })
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Rows per block after encoding.
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Yield mini-batches. Each call starts a fresh pass over the whole
    /// dataset: shuffling datasets draw a new order, others keep file order.
    /// The final batch of a pass may be smaller than `batch_size`.
    pub fn batches(&self) -> impl Iterator<Item = Batch> + '_ {
        let mut order: Vec<usize> = (0..self.blocks.len()).collect();
        if self.shuffle {
            order.shuffle(&mut rand::thread_rng());
        }
        let mut start = 0usize;
        std::iter::from_fn(move || {
            if start >= order.len() {
                return None;
            }
            let end = (start + self.batch_size).min(order.len());
            let size = end - start;
            let mut features = Vec::with_capacity(size * self.block_len * self.feature_dim);
            let mut labels = Vec::with_capacity(size);
            for &i in &order[start..end] {
                features.extend_from_slice(&self.blocks[i]);
                labels.push(self.labels[i]);
            }
            start = end;
            Some(Batch {
                features,
                labels,
                size,
                block_len: self.block_len,
                feature_dim: self.feature_dim,
            })
        })
    }
}

// ── BatchProvider trait ─────────────────────────────────────────────────────

/// Anything that can feed the trainer one epoch of batches at a time.
/// Calling [`batches`](Self::batches) again starts a new, independently
/// ordered pass; a provider is never exhausted by an epoch.
pub trait BatchProvider {
    fn batches(&self) -> Box<dyn Iterator<Item = Batch> + '_>;
}

impl BatchProvider for BlockDataset {
    fn batches(&self) -> Box<dyn Iterator<Item = Batch> + '_> {
        Box::new(self.batches())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Convert a raw batch to Candle tensors on `device`.
///
/// Features become `(size, block_len, feature_dim)` f32, labels `(size,)` u32.
pub fn batch_to_tensors(batch: &Batch, device: &Device) -> Result<(Tensor, Tensor)> {
    let features = Tensor::from_vec(
        batch.features.clone(),
        (batch.size, batch.block_len, batch.feature_dim),
        device,
    )?;
    let labels = Tensor::from_vec(batch.labels.clone(), batch.size, device)?;
    Ok((features, labels))
}

fn encode_block(window: &[f32], feature_dim: usize, encoding: BlockEncoding) -> Vec<f32> {
    match encoding {
        BlockEncoding::Raw => window.to_vec(),
        BlockEncoding::Motion => {
            let rows = window.len() / feature_dim;
            let mut out = Vec::with_capacity(rows.saturating_sub(1) * feature_dim);
            for r in 1..rows {
                let prev = &window[(r - 1) * feature_dim..r * feature_dim];
                let cur = &window[r * feature_dim..(r + 1) * feature_dim];
                for (c, p) in cur.iter().zip(prev) {
                    out.push(c - p);
                }
            }
            out
        }
    }
}

fn load_split(dir: &Path, feature_dim: usize) -> AnyhowResult<Vec<FrameSequence>> {
    let mut out = Vec::new();
    for (class, label) in [("real", REAL_LABEL), ("fake", FAKE_LABEL)] {
        for path in collect_landmark_files(&dir.join(class))? {
            let frames = read_landmark_file(&path, feature_dim)?;
            if !frames.is_empty() {
                out.push(FrameSequence { frames, label });
            }
        }
    }
    Ok(out)
}

/// Collect `.txt` landmark files from a directory, sorted.
fn collect_landmark_files(dir: &Path) -> AnyhowResult<Vec<PathBuf>> {
    let mut out: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("read landmark dir {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().map(|e| e == "txt").unwrap_or(false))
        .collect();
    out.sort();
    Ok(out)
}

fn read_landmark_file(path: &Path, feature_dim: usize) -> AnyhowResult<Vec<f32>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut frames = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let before = frames.len();
        for tok in line.split_whitespace() {
            let v: f32 = tok
                .parse()
                .with_context(|| format!("{}:{}: bad value {tok:?}", path.display(), lineno + 1))?;
            frames.push(v);
        }
        let got = frames.len() - before;
        if got != feature_dim {
            anyhow::bail!(
                "{}:{}: expected {feature_dim} values per frame, got {got}",
                path.display(),
                lineno + 1
            );
        }
    }
    Ok(frames)
}

// ── Tests ───────────────────────────────────────────────────────────────────
