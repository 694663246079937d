//! # lrnet-core — The Detector Model
//!
//! The recurrent block classifier behind both branches of the landmark
//! forgery detector:
//!
//! * **[`LrNet`]** — input dropout → GRU (optionally bidirectional) →
//!   dense head → softmax, built from an
//!   [`LrNetConfig`](lrnet_common::LrNetConfig).
//! * **[`param_count`]** — trainable parameter count from config alone.
//!
//! Everything goes through `candle-core`/`candle-nn`, so the same model runs
//! on CPU and CUDA unchanged.

pub mod model;

pub use model::{param_count, LrNet};
