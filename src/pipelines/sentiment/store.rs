use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Persisted description of a trained model.
///
/// The weights themselves travel separately as named tensors; the manifest
/// carries everything needed to validate and rebuild them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Cache-validity tag. Any mismatch with the running constant forces a
    /// full rebuild; this is not a semantic version.
    pub version: String,
    /// Identifier of the fixed layer stack the weights belong to.
    pub architecture: String,
    /// Embedding table rows the weights were trained with.
    pub vocab_size: usize,
    /// Sequence length the weights were trained with.
    pub max_len: usize,
    /// Vocabulary as ordered `(word, index)` pairs, reserved entries first.
    pub vocab: Vec<(String, u32)>,
}

/// Storage backend for `{weights, vocabulary, version}` records.
///
/// `load` reports missing, corrupt, or undeserializable state as `Ok(None)`.
/// The pipeline treats that, and any `Err`, as a cache miss and retrains.
pub trait ModelStore: Send + Sync {
    /// Persists the manifest and named weight tensors, replacing any
    /// previously saved record.
    fn save(&self, manifest: &Manifest, weights: &HashMap<String, Tensor>) -> Result<()>;

    /// Restores the most recently saved record, if a readable one exists.
    fn load(&self, device: &Device) -> Result<Option<(Manifest, HashMap<String, Tensor>)>>;
}

/// Directory-backed store: `manifest.json` plus `weights.safetensors`.
#[derive(Debug, Clone)]
pub struct FsModelStore {
    dir: PathBuf,
}

impl FsModelStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join("manifest.json")
    }

    fn weights_path(&self) -> PathBuf {
        self.dir.join("weights.safetensors")
    }
}

impl ModelStore for FsModelStore {
    fn save(&self, manifest: &Manifest, weights: &HashMap<String, Tensor>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.manifest_path(), serde_json::to_vec_pretty(manifest)?)?;
        candle_core::safetensors::save(weights, self.weights_path())?;
        Ok(())
    }

    fn load(&self, device: &Device) -> Result<Option<(Manifest, HashMap<String, Tensor>)>> {
        let manifest_bytes = match std::fs::read(self.manifest_path()) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(error = %e, "no readable manifest");
                return Ok(None);
            }
        };
        let manifest: Manifest = match serde_json::from_slice(&manifest_bytes) {
            Ok(manifest) => manifest,
            Err(e) => {
                debug!(error = %e, "manifest failed to parse");
                return Ok(None);
            }
        };
        let weights = match candle_core::safetensors::load(self.weights_path(), device) {
            Ok(weights) => weights,
            Err(e) => {
                debug!(error = %e, "weights failed to load");
                return Ok(None);
            }
        };
        Ok(Some((manifest, weights)))
    }
}

/// In-memory store with no durability.
///
/// The default when the builder gets no store; clones share the same record,
/// which also makes it convenient for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    record: Arc<Mutex<Option<(Manifest, HashMap<String, Tensor>)>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelStore for MemoryStore {
    fn save(&self, manifest: &Manifest, weights: &HashMap<String, Tensor>) -> Result<()> {
        *self.record.lock().unwrap() = Some((manifest.clone(), weights.clone()));
        Ok(())
    }

    fn load(&self, _device: &Device) -> Result<Option<(Manifest, HashMap<String, Tensor>)>> {
        Ok(self.record.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        Manifest {
            version: "v1".to_string(),
            architecture: "test-arch".to_string(),
            vocab_size: 8,
            max_len: 4,
            vocab: vec![("<PAD>".to_string(), 0), ("<UNK>".to_string(), 1)],
        }
    }

    fn weights() -> HashMap<String, Tensor> {
        let mut weights = HashMap::new();
        weights.insert(
            "w".to_string(),
            Tensor::from_vec(vec![1.0f32, 2.0, 3.0], (3,), &Device::Cpu).unwrap(),
        );
        weights
    }

    #[test]
    fn fs_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsModelStore::new(dir.path());

        assert!(store.load(&Device::Cpu).unwrap().is_none());
        store.save(&manifest(), &weights()).unwrap();

        let (loaded_manifest, loaded_weights) = store.load(&Device::Cpu).unwrap().unwrap();
        assert_eq!(loaded_manifest.version, "v1");
        assert_eq!(loaded_manifest.vocab.len(), 2);
        let w = loaded_weights["w"].to_vec1::<f32>().unwrap();
        assert_eq!(w, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn fs_store_treats_corrupt_manifest_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsModelStore::new(dir.path());
        store.save(&manifest(), &weights()).unwrap();

        std::fs::write(dir.path().join("manifest.json"), b"not json").unwrap();
        assert!(store.load(&Device::Cpu).unwrap().is_none());
    }

    #[test]
    fn memory_store_clones_share_the_record() {
        let store = MemoryStore::new();
        let view = store.clone();
        store.save(&manifest(), &weights()).unwrap();
        assert!(view.load(&Device::Cpu).unwrap().is_some());
    }
}
