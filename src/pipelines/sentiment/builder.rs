use super::corpus::{builtin_corpus, TrainingExample};
use super::pipeline::SentimentPipeline;
use super::store::{MemoryStore, ModelStore};
use super::train::ProgressListener;
use crate::error::{PipelineError, Result};

/// Tunable pipeline parameters. The defaults match the shipped model.
#[derive(Debug, Clone)]
pub struct SentimentConfig {
    /// Maximum vocabulary entries, reserved slots included.
    pub vocab_size: usize,
    /// Fixed encoded sequence length.
    pub max_len: usize,
    /// Full passes over the training data.
    pub epochs: usize,
    /// Mini-batch size.
    pub batch_size: usize,
    /// AdamW learning rate.
    pub learning_rate: f64,
    /// Trailing fraction of the shuffled data held out for validation.
    pub validation_split: f32,
    /// Shuffle seed. `None` (the default) draws one from the OS, so weight
    /// values are not reproducible run-to-run; set a seed for deterministic
    /// tests.
    pub seed: Option<u64>,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            vocab_size: 2000,
            max_len: 100,
            epochs: 30,
            batch_size: 16,
            learning_rate: 0.01,
            validation_split: 0.2,
            seed: None,
        }
    }
}

/// Builder for [`SentimentPipeline`].
///
/// # Example
///
/// ```rust,no_run
/// use sentiment_pipeline::sentiment::SentimentPipelineBuilder;
///
/// # fn main() -> sentiment_pipeline::error::Result<()> {
/// let pipeline = SentimentPipelineBuilder::new()
///     .progress(|epoch: usize, accuracy: f32| {
///         println!("epoch {} - accuracy {:.0}%", epoch + 1, accuracy * 100.0);
///     })
///     .build()?;
///
/// pipeline.ensure_ready()?;
/// let output = pipeline.predict("I love this!")?;
/// println!("{}", output.prediction.label);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SentimentPipelineBuilder {
    config: SentimentConfig,
    corpus: Option<Vec<TrainingExample>>,
    store: Option<Box<dyn ModelStore>>,
    listener: Option<Box<dyn ProgressListener>>,
}

impl SentimentPipelineBuilder {
    /// Starts a builder with default configuration, the built-in corpus, and
    /// a non-durable in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum vocabulary entries, reserved slots included.
    pub fn vocab_size(mut self, vocab_size: usize) -> Self {
        self.config.vocab_size = vocab_size;
        self
    }

    /// Fixed encoded sequence length.
    pub fn max_len(mut self, max_len: usize) -> Self {
        self.config.max_len = max_len;
        self
    }

    /// Full passes over the training data.
    pub fn epochs(mut self, epochs: usize) -> Self {
        self.config.epochs = epochs;
        self
    }

    /// Mini-batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// AdamW learning rate.
    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    /// Trailing fraction of the shuffled data held out for validation.
    pub fn validation_split(mut self, validation_split: f32) -> Self {
        self.config.validation_split = validation_split;
        self
    }

    /// Fixes the shuffle seed for deterministic training order.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Replaces the built-in training corpus.
    pub fn corpus(mut self, corpus: Vec<TrainingExample>) -> Self {
        self.corpus = Some(corpus);
        self
    }

    /// Sets the persistence backend. Without one, trained state lives only in
    /// memory for the lifetime of the pipeline.
    pub fn store(mut self, store: impl ModelStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Registers a listener for per-epoch training progress.
    pub fn progress(mut self, listener: impl ProgressListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Validates the configuration and assembles the pipeline.
    ///
    /// No loading or training happens here; call
    /// [`ensure_ready`](SentimentPipeline::ensure_ready) for that.
    pub fn build(self) -> Result<SentimentPipeline> {
        let config = self.config;
        if config.vocab_size < 3 {
            return Err(PipelineError::Config(
                "vocab_size must leave room for at least one word beyond PAD/UNK".into(),
            ));
        }
        if config.max_len == 0 {
            return Err(PipelineError::Config("max_len must be at least 1".into()));
        }
        if config.epochs == 0 || config.batch_size == 0 {
            return Err(PipelineError::Config(
                "epochs and batch_size must be at least 1".into(),
            ));
        }
        if !(0.0..1.0).contains(&config.validation_split) {
            return Err(PipelineError::Config(
                "validation_split must be in [0, 1)".into(),
            ));
        }

        let corpus = self.corpus.unwrap_or_else(builtin_corpus);
        if corpus.is_empty() {
            return Err(PipelineError::Training("training corpus is empty".into()));
        }
        if corpus.iter().any(|example| example.label > 1) {
            return Err(PipelineError::Training(
                "training labels must be 0 or 1".into(),
            ));
        }

        let store = self
            .store
            .unwrap_or_else(|| Box::new(MemoryStore::new()));

        Ok(SentimentPipeline::new(config, corpus, store, self.listener))
    }
}
