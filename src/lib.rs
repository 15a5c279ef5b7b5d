//! Self-training sentiment classification for short free-text input.
//!
//! Powered by [Candle](https://github.com/huggingface/candle). The pipeline
//! builds its own vocabulary from a labeled corpus, fits a small recurrent
//! classifier, persists the trained state through a pluggable store, and then
//! answers single-text queries with positive/negative/neutral labels.

#![deny(missing_docs)]

// ============ Internal API ============

pub(crate) mod pipelines;

// ============ Public API ============

pub mod error;

pub use pipelines::sentiment;
