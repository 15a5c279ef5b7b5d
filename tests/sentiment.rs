use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use candle_core::{Device, Tensor};
use sentiment_pipeline::error::{PipelineError, Result};
use sentiment_pipeline::sentiment::{
    FsModelStore, Manifest, MemoryStore, ModelStore, PipelineState, SentimentLabel,
    SentimentPipelineBuilder, MODEL_VERSION,
};

/// Small configuration so tests that do not care about model quality train in
/// a fraction of the default cost.
fn quick_builder() -> SentimentPipelineBuilder {
    SentimentPipelineBuilder::new()
        .vocab_size(300)
        .max_len(12)
        .epochs(3)
        .batch_size(8)
        .seed(7)
}

#[test]
fn trains_and_classifies_reviews() -> Result<()> {
    let pipeline = SentimentPipelineBuilder::new().seed(42).build()?;
    pipeline.ensure_ready()?;
    assert_eq!(pipeline.status(), PipelineState::Ready);

    // Near-verbatim training examples must land confidently on their side.
    let output = pipeline.predict("I love this product it is amazing")?;
    assert!(
        output.prediction.positive_score > 0.6,
        "expected positive score > 0.6, got {}",
        output.prediction.positive_score
    );
    assert_eq!(output.prediction.label, SentimentLabel::Positive);

    let output = pipeline.predict("This is terrible do not buy")?;
    assert!(
        output.prediction.positive_score < 0.4,
        "expected positive score < 0.4, got {}",
        output.prediction.positive_score
    );
    assert_eq!(output.prediction.label, SentimentLabel::Negative);

    Ok(())
}

#[test]
fn scores_are_complementary() -> Result<()> {
    let pipeline = quick_builder().build()?;
    pipeline.ensure_ready()?;

    let texts = &[
        "great quality and fast shipping",
        "complete waste of money",
        "the weather is mild today",
    ];
    let output = pipeline.predict_batch(texts)?;
    assert_eq!(output.results.len(), texts.len());
    assert_eq!(output.stats.items_processed, texts.len());
    for result in output.results {
        let p = result.prediction?;
        assert!((p.positive_score + p.negative_score - 1.0).abs() < 1e-6);
        assert!(p.positive_score > 0.0 && p.positive_score < 1.0);
    }
    Ok(())
}

#[test]
fn predict_before_ready_is_rejected() -> Result<()> {
    let pipeline = quick_builder().build()?;
    assert_eq!(pipeline.status(), PipelineState::Uninitialized);

    let err = pipeline.predict("anything at all").unwrap_err();
    assert!(matches!(err, PipelineError::NotReady));
    // The failed call must not have moved the state machine.
    assert_eq!(pipeline.status(), PipelineState::Uninitialized);
    Ok(())
}

#[test]
fn empty_input_is_rejected_without_disruption() -> Result<()> {
    let pipeline = quick_builder().build()?;
    pipeline.ensure_ready()?;

    let err = pipeline.predict("   \t  ").unwrap_err();
    assert!(matches!(err, PipelineError::Input(_)));

    // Subsequent requests keep working.
    assert!(pipeline.predict("really good product").is_ok());
    Ok(())
}

#[test]
fn ensure_ready_is_idempotent() -> Result<()> {
    let epochs_seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&epochs_seen);
    let pipeline = quick_builder()
        .progress(move |_epoch: usize, _accuracy: f32| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()?;

    pipeline.ensure_ready()?;
    pipeline.ensure_ready()?;
    assert_eq!(epochs_seen.load(Ordering::SeqCst), 3);
    Ok(())
}

#[test]
fn restore_skips_training_and_reproduces_scores() -> Result<()> {
    let store = MemoryStore::new();

    let first = quick_builder().store(store.clone()).build()?;
    first.ensure_ready()?;
    let reference = first.predict("love it works perfectly")?.prediction;

    let epochs_seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&epochs_seen);
    let second = quick_builder()
        .store(store.clone())
        .progress(move |_epoch: usize, _accuracy: f32| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()?;
    second.ensure_ready()?;

    assert_eq!(epochs_seen.load(Ordering::SeqCst), 0, "restore must not retrain");
    let restored = second.predict("love it works perfectly")?.prediction;
    assert!((restored.positive_score - reference.positive_score).abs() < 1e-6);
    assert_eq!(restored.label, reference.label);
    Ok(())
}

#[test]
fn stale_version_tag_forces_retrain() -> Result<()> {
    let store = MemoryStore::new();
    let first = quick_builder().store(store.clone()).build()?;
    first.ensure_ready()?;

    // Tamper with the persisted version tag.
    let (mut manifest, weights) = store.load(&Device::Cpu)?.unwrap();
    manifest.version = "v0".to_string();
    store.save(&manifest, &weights)?;

    let epochs_seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&epochs_seen);
    let second = quick_builder()
        .store(store.clone())
        .progress(move |_epoch: usize, _accuracy: f32| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()?;
    second.ensure_ready()?;

    assert!(
        epochs_seen.load(Ordering::SeqCst) > 0,
        "a stale version tag must trigger a fresh training run"
    );
    let (manifest, _) = store.load(&Device::Cpu)?.unwrap();
    assert_eq!(manifest.version, MODEL_VERSION);
    Ok(())
}

#[test]
fn oversized_persisted_vocabulary_forces_retrain() -> Result<()> {
    let store = MemoryStore::new();
    let first = quick_builder().store(store.clone()).build()?;
    first.ensure_ready()?;

    // Pad the persisted vocabulary past vocab_size with contiguous indices,
    // so every per-pair check still holds.
    let (mut manifest, weights) = store.load(&Device::Cpu)?.unwrap();
    let mut next = manifest.vocab.len() as u32;
    while manifest.vocab.len() <= manifest.vocab_size {
        manifest.vocab.push((format!("zz{next}"), next));
        next += 1;
    }
    store.save(&manifest, &weights)?;

    let epochs_seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&epochs_seen);
    let second = quick_builder()
        .store(store.clone())
        .progress(move |_epoch: usize, _accuracy: f32| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()?;
    second.ensure_ready()?;

    assert!(
        epochs_seen.load(Ordering::SeqCst) > 0,
        "a vocabulary larger than the embedding must trigger a fresh training run"
    );
    let (manifest, _) = store.load(&Device::Cpu)?.unwrap();
    assert!(manifest.vocab.len() <= manifest.vocab_size);
    Ok(())
}

/// Store whose saves always fail; loads see nothing.
#[derive(Debug, Clone, Default)]
struct FullDiskStore;

impl ModelStore for FullDiskStore {
    fn save(&self, _manifest: &Manifest, _weights: &HashMap<String, Tensor>) -> Result<()> {
        Err(PipelineError::Persistence("no space left on device".into()))
    }

    fn load(&self, _device: &Device) -> Result<Option<(Manifest, HashMap<String, Tensor>)>> {
        Ok(None)
    }
}

#[test]
fn failed_save_keeps_the_session_ready() -> Result<()> {
    let pipeline = quick_builder().store(FullDiskStore).build()?;

    // Durability is lost but the freshly trained model must still serve.
    pipeline.ensure_ready()?;
    assert_eq!(pipeline.status(), PipelineState::Ready);
    assert!(pipeline.predict("works fine without a store").is_ok());
    Ok(())
}

#[test]
fn file_backed_store_round_trips_across_pipelines() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();

    let first = quick_builder()
        .store(FsModelStore::new(dir.path()))
        .build()?;
    first.ensure_ready()?;
    let reference = first.predict("worst purchase ever made")?.prediction;

    let epochs_seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&epochs_seen);
    let second = quick_builder()
        .store(FsModelStore::new(dir.path()))
        .progress(move |_epoch: usize, _accuracy: f32| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()?;
    second.ensure_ready()?;

    assert_eq!(epochs_seen.load(Ordering::SeqCst), 0);
    let restored = second.predict("worst purchase ever made")?.prediction;
    assert!((restored.positive_score - reference.positive_score).abs() < 1e-6);
    Ok(())
}

#[test]
fn training_progress_reports_every_epoch_in_order() -> Result<()> {
    let epochs = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&epochs);
    let pipeline = quick_builder()
        .progress(move |epoch: usize, accuracy: f32| {
            assert!((0.0..=1.0).contains(&accuracy));
            sink.lock().unwrap().push(epoch);
        })
        .build()?;
    pipeline.ensure_ready()?;

    assert_eq!(*epochs.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(pipeline.status(), PipelineState::Ready);
    Ok(())
}
