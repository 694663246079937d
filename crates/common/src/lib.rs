//! # lrnet-common — Shared Primitives
//!
//! Types and utilities shared across every crate in the workspace:
//!
//! * **[`LrNetConfig`]** — hyper-parameters (serialised as JSON).
//! * **[`LandmarkCorpus`]** / **[`BlockDataset`]** — landmark loading,
//!   block windowing & batching.
//! * **[`batch_to_tensors`]** — raw batch → Candle tensors.

pub mod config;
pub mod data;

pub use config::LrNetConfig;
pub use data::{
    batch_to_tensors, Batch, BatchProvider, BlockDataset, BlockEncoding, DataError,
    FrameSequence, LandmarkCorpus, Split, FAKE_LABEL, REAL_LABEL,
};
