use std::collections::HashMap;

use candle_core::{DType, Device, Tensor};
use candle_nn::{
    embedding, linear, lstm, Dropout, Embedding, Linear, LSTMConfig, Module, VarBuilder, VarMap,
    LSTM, RNN,
};

use crate::error::{PipelineError, Result};

pub(crate) const EMBED_DIM: usize = 32;
pub(crate) const LSTM_UNITS: usize = 32;
pub(crate) const DENSE_UNITS: usize = 16;
pub(crate) const DROPOUT_RATE: f32 = 0.3;

/// Identifier of the fixed layer stack; persisted alongside the weights and
/// checked on restore.
pub(crate) const ARCHITECTURE: &str = "embed32-lstm32-dense16-sigmoid";

/// The recurrent classifier: embedding → LSTM (final hidden state only) →
/// dense ReLU → dropout (training only) → dense logit.
///
/// The final layer emits a logit; inference applies a sigmoid to obtain
/// P(positive). Parameters are only mutated through the optimizer during
/// fitting; a built network is safe to share across concurrent readers.
#[derive(Debug)]
pub(crate) struct SentimentNet {
    embedding: Embedding,
    lstm: LSTM,
    fc1: Linear,
    dropout: Dropout,
    fc2: Linear,
}

impl SentimentNet {
    pub fn new(vocab_size: usize, vb: VarBuilder) -> Result<Self> {
        let embedding = embedding(vocab_size, EMBED_DIM, vb.pp("embedding"))?;
        let lstm = lstm(EMBED_DIM, LSTM_UNITS, LSTMConfig::default(), vb.pp("lstm"))?;
        let fc1 = linear(LSTM_UNITS, DENSE_UNITS, vb.pp("fc1"))?;
        let fc2 = linear(DENSE_UNITS, 1, vb.pp("fc2"))?;

        Ok(Self {
            embedding,
            lstm,
            fc1,
            dropout: Dropout::new(DROPOUT_RATE),
            fc2,
        })
    }

    /// Forward pass over `(batch, max_len)` U32 indices, returning
    /// `(batch, 1)` logits.
    pub fn forward(&self, input_ids: &Tensor, train: bool) -> Result<Tensor> {
        let embedded = self.embedding.forward(input_ids)?;
        let states = self.lstm.seq(&embedded)?;
        let hidden = states
            .last()
            .ok_or_else(|| {
                PipelineError::Unexpected("LSTM produced no states for the input sequence".into())
            })?
            .h()
            .clone();
        let hidden = self.fc1.forward(&hidden)?.relu()?;
        let hidden = self.dropout.forward(&hidden, train)?;
        self.fc2.forward(&hidden).map_err(Into::into)
    }
}

/// Snapshots the trained parameters as named tensors for persistence.
pub(crate) fn export_weights(varmap: &VarMap) -> HashMap<String, Tensor> {
    varmap
        .data()
        .lock()
        .unwrap()
        .iter()
        .map(|(name, var)| (name.clone(), var.as_tensor().clone()))
        .collect()
}

/// Rebuilds a network and overwrites every parameter from `weights`.
///
/// Fails with a persistence error when a tensor is missing; shape or dtype
/// mismatches surface from the assignment itself.
pub(crate) fn restore(
    vocab_size: usize,
    weights: &HashMap<String, Tensor>,
    device: &Device,
) -> Result<SentimentNet> {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
    let net = SentimentNet::new(vocab_size, vb)?;

    let data = varmap.data().lock().unwrap();
    for (name, var) in data.iter() {
        let tensor = weights.get(name).ok_or_else(|| {
            PipelineError::Persistence(format!("saved weights are missing tensor '{name}'"))
        })?;
        var.set(tensor)?;
    }
    drop(data);

    Ok(net)
}
