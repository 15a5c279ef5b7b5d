use std::collections::HashMap;

use candle_core::{DType, Device, Tensor};
use candle_nn::loss::binary_cross_entropy_with_logit;
use candle_nn::ops::sigmoid;
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::model::{self, SentimentNet};
use crate::error::{PipelineError, Result};

/// Observer invoked synchronously at each epoch boundary.
///
/// Purely observational: implementations must not assume any effect on the
/// training outcome, and should return quickly.
pub trait ProgressListener: Send + Sync {
    /// Called after each epoch with the zero-based epoch index and that
    /// epoch's training accuracy in `[0, 1]`.
    fn on_epoch(&self, epoch: usize, accuracy: f32);
}

impl<F: Fn(usize, f32) + Send + Sync> ProgressListener for F {
    fn on_epoch(&self, epoch: usize, accuracy: f32) {
        self(epoch, accuracy)
    }
}

pub(crate) struct FitOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub validation_split: f32,
    pub seed: Option<u64>,
}

#[derive(Debug)]
pub(crate) struct Fitted {
    pub net: SentimentNet,
    pub weights: HashMap<String, Tensor>,
}

/// Fits the classifier on pre-encoded sequences.
///
/// The data is permuted once up front; the tail `validation_split` fraction
/// of that permutation is held out to monitor generalization and never
/// updates parameters. Each epoch reshuffles the training portion and runs
/// mini-batches through AdamW on binary cross-entropy. All tensors built
/// here stay scoped to this call.
pub(crate) fn fit(
    sequences: &[Vec<u32>],
    labels: &[f32],
    vocab_size: usize,
    max_len: usize,
    options: &FitOptions,
    device: &Device,
    listener: Option<&dyn ProgressListener>,
) -> Result<Fitted> {
    if sequences.is_empty() || sequences.len() != labels.len() {
        return Err(PipelineError::Training(
            "training corpus is empty or labels do not match sequences".into(),
        ));
    }

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut order: Vec<usize> = (0..sequences.len()).collect();
    order.shuffle(&mut rng);
    let n_val = (order.len() as f32 * options.validation_split).round() as usize;
    let n_train = order.len() - n_val;
    if n_train == 0 {
        return Err(PipelineError::Training(
            "no training examples remain after the validation split".into(),
        ));
    }
    let (train_idx, val_idx) = order.split_at(n_train);
    let mut train_idx = train_idx.to_vec();

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
    let net = SentimentNet::new(vocab_size, vb)?;
    let mut optimizer = AdamW::new(
        varmap.all_vars(),
        ParamsAdamW {
            lr: options.learning_rate,
            ..Default::default()
        },
    )?;

    for epoch in 0..options.epochs {
        train_idx.shuffle(&mut rng);
        let mut correct = 0usize;

        for chunk in train_idx.chunks(options.batch_size) {
            let (xs, ys) = batch(sequences, labels, chunk, max_len, device)?;
            // Clamp keeps the sigmoid inside (0, 1) in f32; a saturated
            // probability would turn the BCE log term into NaN.
            let logits = net.forward(&xs, true)?.clamp(-16.0, 16.0)?;
            let loss = binary_cross_entropy_with_logit(&logits, &ys)?;
            optimizer.backward_step(&loss)?;

            let probs = sigmoid(&logits)?.flatten_all()?.to_vec1::<f32>()?;
            for (prob, &idx) in probs.iter().zip(chunk) {
                if (*prob >= 0.5) == (labels[idx] >= 0.5) {
                    correct += 1;
                }
            }
        }

        let accuracy = correct as f32 / n_train as f32;
        if val_idx.is_empty() {
            debug!(epoch, accuracy, "epoch finished");
        } else {
            let (xs, ys) = batch(sequences, labels, val_idx, max_len, device)?;
            let logits = net.forward(&xs, false)?.clamp(-16.0, 16.0)?;
            let val_loss = binary_cross_entropy_with_logit(&logits, &ys)?.to_scalar::<f32>()?;
            debug!(epoch, accuracy, val_loss, "epoch finished");
        }

        if let Some(listener) = listener {
            listener.on_epoch(epoch, accuracy);
        }
    }

    let weights = model::export_weights(&varmap);
    Ok(Fitted { net, weights })
}

fn batch(
    sequences: &[Vec<u32>],
    labels: &[f32],
    indices: &[usize],
    max_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let mut flat = Vec::with_capacity(indices.len() * max_len);
    let mut ys = Vec::with_capacity(indices.len());
    for &i in indices {
        flat.extend_from_slice(&sequences[i]);
        ys.push(labels[i]);
    }
    let xs = Tensor::from_vec(flat, (indices.len(), max_len), device)?;
    let ys = Tensor::from_vec(ys, (indices.len(), 1), device)?;
    Ok((xs, ys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn options(epochs: usize) -> FitOptions {
        FitOptions {
            epochs,
            batch_size: 2,
            learning_rate: 0.01,
            validation_split: 0.25,
            seed: Some(11),
        }
    }

    #[test]
    fn listener_fires_once_per_epoch() {
        let sequences = vec![vec![2u32, 3, 0, 0], vec![4, 5, 0, 0], vec![2, 5, 0, 0], vec![3, 4, 0, 0]];
        let labels = vec![1.0, 0.0, 1.0, 0.0];
        let calls = AtomicUsize::new(0);
        let listener = |_epoch: usize, _accuracy: f32| {
            calls.fetch_add(1, Ordering::SeqCst);
        };

        fit(&sequences, &labels, 8, 4, &options(3), &Device::Cpu, Some(&listener)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn empty_corpus_is_a_training_error() {
        let err = fit(&[], &[], 8, 4, &options(1), &Device::Cpu, None).unwrap_err();
        assert!(matches!(err, PipelineError::Training(_)));
    }

    #[test]
    fn mismatched_labels_are_a_training_error() {
        let sequences = vec![vec![2u32, 3]];
        let err = fit(&sequences, &[], 8, 2, &options(1), &Device::Cpu, None).unwrap_err();
        assert!(matches!(err, PipelineError::Training(_)));
    }
}
