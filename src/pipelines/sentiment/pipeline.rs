use std::fmt;
use std::sync::{Mutex, RwLock};

use candle_core::{Device, Tensor};
use candle_nn::ops::sigmoid;
use tracing::{debug, warn};

use super::builder::SentimentConfig;
use super::corpus::TrainingExample;
use super::encode::encode;
use super::model::{self, SentimentNet};
use super::store::{Manifest, ModelStore};
use super::train::{self, FitOptions, ProgressListener};
use super::vocab::Vocabulary;
use crate::error::{PipelineError, Result};
use crate::pipelines::stats::PipelineStats;

/// Cache-validity tag for persisted state. Bump it to invalidate every
/// previously saved model; not a semantic version.
pub const MODEL_VERSION: &str = "v1";

// ============ Output types ============

/// Sentiment classes derived from the positive-probability score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLabel {
    /// Positive score above 0.6.
    Positive,
    /// Positive score below 0.4.
    Negative,
    /// Positive score inside the inclusive 0.4..=0.6 band.
    Neutral,
}

impl SentimentLabel {
    /// Applies the decision rule: `> 0.6` positive, `< 0.4` negative,
    /// everything in the inclusive `0.4..=0.6` band neutral.
    pub fn from_score(positive_score: f32) -> Self {
        if positive_score > 0.6 {
            SentimentLabel::Positive
        } else if positive_score < 0.4 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        };
        write!(f, "{name}")
    }
}

/// A sentiment prediction with label and both class scores.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// The predicted sentiment class.
    pub label: SentimentLabel,
    /// P(positive) from the sigmoid head, in `(0, 1)`.
    pub positive_score: f32,
    /// Complement score, always `1.0 - positive_score`.
    pub negative_score: f32,
}

/// Single-text output from [`SentimentPipeline::predict`].
#[derive(Debug)]
pub struct Output {
    /// Sentiment prediction.
    pub prediction: Prediction,
    /// Execution statistics.
    pub stats: PipelineStats,
}

/// Single result in batch output.
#[derive(Debug)]
pub struct BatchResult {
    /// Input text.
    pub text: String,
    /// Prediction or error for this input.
    pub prediction: Result<Prediction>,
}

/// Batch output from [`SentimentPipeline::predict_batch`].
#[derive(Debug)]
pub struct BatchOutput {
    /// Results for each input.
    pub results: Vec<BatchResult>,
    /// Execution statistics.
    pub stats: PipelineStats,
}

// ============ State machine ============

/// Lifecycle of a pipeline instance.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    /// No model yet; [`SentimentPipeline::ensure_ready`] has not run.
    Uninitialized,
    /// Restore from the store is in progress.
    Loading,
    /// A fresh model is being fitted.
    Training {
        /// Zero-based index of the most recently finished epoch.
        epoch: usize,
        /// Training accuracy of that epoch.
        accuracy: f32,
    },
    /// Model and vocabulary are installed; predictions are served.
    Ready,
}

struct ReadyModel {
    net: SentimentNet,
    vocab: Vocabulary,
}

// ============ Pipeline ============

/// Classifies text sentiment (positive, negative, neutral) with a model it
/// trains itself.
///
/// Construct with [`SentimentPipelineBuilder`](super::SentimentPipelineBuilder).
/// On [`ensure_ready`](Self::ensure_ready) the pipeline first tries to restore
/// persisted state; on a miss, a stale version tag, or unreadable data it
/// builds the vocabulary, fits the classifier on the configured corpus, and
/// saves the result back best-effort. Once `Ready`, any number of concurrent
/// `predict` calls share the read-only parameters.
pub struct SentimentPipeline {
    config: SentimentConfig,
    corpus: Vec<TrainingExample>,
    store: Box<dyn ModelStore>,
    listener: Option<Box<dyn ProgressListener>>,
    device: Device,
    state: Mutex<PipelineState>,
    ready: RwLock<Option<ReadyModel>>,
    // Serializes ensure_ready so at most one restore/train is in flight.
    init_gate: Mutex<()>,
}

impl SentimentPipeline {
    pub(crate) fn new(
        config: SentimentConfig,
        corpus: Vec<TrainingExample>,
        store: Box<dyn ModelStore>,
        listener: Option<Box<dyn ProgressListener>>,
    ) -> Self {
        Self {
            config,
            corpus,
            store,
            listener,
            device: Device::Cpu,
            state: Mutex::new(PipelineState::Uninitialized),
            ready: RwLock::new(None),
            init_gate: Mutex::new(()),
        }
    }

    /// Current lifecycle state; while training it carries the latest epoch
    /// index and accuracy, so callers can poll it for progress.
    pub fn status(&self) -> PipelineState {
        self.state.lock().unwrap().clone()
    }

    /// Returns the device the model runs on.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Loads-or-trains until the pipeline is `Ready`. Idempotent: once a
    /// model is installed this returns immediately.
    ///
    /// A missing, corrupt, or version-mismatched persisted record is never an
    /// error here; it falls back to a full retrain. An unusable training
    /// corpus is fatal and surfaces as [`PipelineError::Training`].
    pub fn ensure_ready(&self) -> Result<()> {
        let _gate = self.init_gate.lock().unwrap();
        if self.ready.read().unwrap().is_some() {
            return Ok(());
        }

        self.set_state(PipelineState::Loading);
        if let Some(model) = self.try_restore() {
            debug!("model restored from store");
            self.install(model);
            return Ok(());
        }

        match self.train_fresh() {
            Ok(model) => {
                self.install(model);
                Ok(())
            }
            Err(e) => {
                self.set_state(PipelineState::Uninitialized);
                Err(e)
            }
        }
    }

    /// Classifies a single text.
    ///
    /// Fails with [`PipelineError::NotReady`] before `Ready` and
    /// [`PipelineError::Input`] for empty or whitespace-only text; neither
    /// mutates any state.
    pub fn predict(&self, text: &str) -> Result<Output> {
        let stats = PipelineStats::start();
        let guard = self.ready.read().unwrap();
        let model = guard.as_ref().ok_or(PipelineError::NotReady)?;
        let prediction = self.predict_one(model, text)?;
        Ok(Output {
            prediction,
            stats: stats.finish(1),
        })
    }

    /// Classifies several texts, reporting a per-text prediction or error.
    pub fn predict_batch(&self, texts: &[&str]) -> Result<BatchOutput> {
        let stats = PipelineStats::start();
        let guard = self.ready.read().unwrap();
        let model = guard.as_ref().ok_or(PipelineError::NotReady)?;
        let results = texts
            .iter()
            .map(|text| BatchResult {
                text: (*text).to_string(),
                prediction: self.predict_one(model, text),
            })
            .collect();
        Ok(BatchOutput {
            results,
            stats: stats.finish(texts.len()),
        })
    }

    fn predict_one(&self, model: &ReadyModel, text: &str) -> Result<Prediction> {
        if text.trim().is_empty() {
            return Err(PipelineError::Input(
                "input text is empty; provide some text to analyze".into(),
            ));
        }

        let sequence = encode(text, &model.vocab, self.config.max_len);
        let input = Tensor::from_vec(sequence, (1, self.config.max_len), &self.device)?;
        let logits = model.net.forward(&input, false)?;
        let scores = sigmoid(&logits)?.flatten_all()?.to_vec1::<f32>()?;
        let positive_score = scores
            .first()
            .copied()
            .ok_or_else(|| PipelineError::Unexpected("forward pass produced no score".into()))?;

        Ok(Prediction {
            label: SentimentLabel::from_score(positive_score),
            positive_score,
            negative_score: 1.0 - positive_score,
        })
    }

    fn try_restore(&self) -> Option<ReadyModel> {
        let (manifest, weights) = match self.store.load(&self.device) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "model store load failed; retraining");
                return None;
            }
        };

        if manifest.version != MODEL_VERSION
            || manifest.architecture != model::ARCHITECTURE
            || manifest.vocab_size != self.config.vocab_size
            || manifest.max_len != self.config.max_len
            // More pairs than embedding rows would map words to indices the
            // restored model has no row for.
            || manifest.vocab.len() > manifest.vocab_size
        {
            debug!(
                stored = %manifest.version,
                current = MODEL_VERSION,
                "persisted model is stale; retraining"
            );
            return None;
        }

        let vocab = match Vocabulary::from_pairs(&manifest.vocab) {
            Ok(vocab) => vocab,
            Err(e) => {
                warn!(error = %e, "persisted vocabulary rejected; retraining");
                return None;
            }
        };
        match model::restore(self.config.vocab_size, &weights, &self.device) {
            Ok(net) => Some(ReadyModel { net, vocab }),
            Err(e) => {
                warn!(error = %e, "persisted weights rejected; retraining");
                None
            }
        }
    }

    fn train_fresh(&self) -> Result<ReadyModel> {
        if self.corpus.is_empty() {
            return Err(PipelineError::Training("training corpus is empty".into()));
        }
        self.set_state(PipelineState::Training {
            epoch: 0,
            accuracy: 0.0,
        });

        let vocab = Vocabulary::build(
            self.corpus.iter().map(|example| example.text.as_str()),
            self.config.vocab_size,
        );
        let sequences: Vec<Vec<u32>> = self
            .corpus
            .iter()
            .map(|example| encode(&example.text, &vocab, self.config.max_len))
            .collect();
        let labels: Vec<f32> = self
            .corpus
            .iter()
            .map(|example| f32::from(example.label))
            .collect();

        let options = FitOptions {
            epochs: self.config.epochs,
            batch_size: self.config.batch_size,
            learning_rate: self.config.learning_rate,
            validation_split: self.config.validation_split,
            seed: self.config.seed,
        };
        let state = &self.state;
        let user_listener = self.listener.as_deref();
        let progress = move |epoch: usize, accuracy: f32| {
            *state.lock().unwrap() = PipelineState::Training { epoch, accuracy };
            if let Some(listener) = user_listener {
                listener.on_epoch(epoch, accuracy);
            }
        };

        let fitted = train::fit(
            &sequences,
            &labels,
            self.config.vocab_size,
            self.config.max_len,
            &options,
            &self.device,
            Some(&progress),
        )?;

        let manifest = Manifest {
            version: MODEL_VERSION.to_string(),
            architecture: model::ARCHITECTURE.to_string(),
            vocab_size: self.config.vocab_size,
            max_len: self.config.max_len,
            vocab: vocab.to_pairs(),
        };
        // Durability is lost on failure but the in-memory model stays usable.
        if let Err(e) = self.store.save(&manifest, &fitted.weights) {
            warn!(error = %e, "model store save failed");
        }

        Ok(ReadyModel {
            net: fitted.net,
            vocab,
        })
    }

    fn install(&self, model: ReadyModel) {
        *self.ready.write().unwrap() = Some(model);
        self.set_state(PipelineState::Ready);
    }

    fn set_state(&self, state: PipelineState) {
        *self.state.lock().unwrap() = state;
    }
}
