//! Sentiment analysis pipeline.
//!
//! Classify text as `positive`, `negative`, or `neutral` with a small
//! recurrent model the pipeline trains itself from a labeled corpus. Both
//! class scores come back alongside the label.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sentiment_pipeline::sentiment::SentimentPipelineBuilder;
//!
//! # fn main() -> sentiment_pipeline::error::Result<()> {
//! let pipeline = SentimentPipelineBuilder::new().build()?;
//!
//! // First call trains (or restores) the model.
//! pipeline.ensure_ready()?;
//!
//! let output = pipeline.predict("I absolutely love this product!")?;
//! println!(
//!     "sentiment: {} (positive: {:.2})",
//!     output.prediction.label, output.prediction.positive_score
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Persistence
//!
//! Attach a [`FsModelStore`] to skip retraining across runs; any version or
//! architecture mismatch in the saved record triggers a fresh fit:
//!
//! ```rust,no_run
//! # use sentiment_pipeline::sentiment::{FsModelStore, SentimentPipelineBuilder};
//! # fn main() -> sentiment_pipeline::error::Result<()> {
//! let pipeline = SentimentPipelineBuilder::new()
//!     .store(FsModelStore::new("sentiment-model"))
//!     .build()?;
//! pipeline.ensure_ready()?;
//! # Ok(())
//! # }
//! ```

// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod corpus;
pub(crate) mod encode;
pub(crate) mod model;
pub(crate) mod pipeline;
pub(crate) mod store;
pub(crate) mod train;
pub(crate) mod vocab;

// ============ Public API ============

pub use crate::pipelines::stats::PipelineStats;
pub use builder::{SentimentConfig, SentimentPipelineBuilder};
pub use corpus::{builtin_corpus, TrainingExample};
pub use encode::encode;
pub use pipeline::{
    BatchOutput, BatchResult, Output, PipelineState, Prediction, SentimentLabel,
    SentimentPipeline, MODEL_VERSION,
};
pub use store::{FsModelStore, Manifest, MemoryStore, ModelStore};
pub use train::ProgressListener;
pub use vocab::{Vocabulary, PAD, UNK};
