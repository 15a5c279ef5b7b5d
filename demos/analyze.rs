use sentiment_pipeline::error::Result;
use sentiment_pipeline::sentiment::{FsModelStore, SentimentPipelineBuilder};

fn main() -> Result<()> {
    println!("Preparing pipeline (first run trains the model)...");

    let pipeline = SentimentPipelineBuilder::new()
        .store(FsModelStore::new("target/sentiment-model"))
        .progress(|epoch: usize, accuracy: f32| {
            println!(
                "Training... epoch {}/30 - accuracy {:.0}%",
                epoch + 1,
                accuracy * 100.0
            );
        })
        .build()?;

    pipeline.ensure_ready()?;

    let text = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "I love my new car".to_string());

    let output = pipeline.predict(&text)?;

    println!("\n=== Sentiment Analysis Result ===");
    println!("Text: \"{}\"", text);
    println!(
        "Sentiment: {} (positive {:.1}%, negative {:.1}%)",
        output.prediction.label,
        output.prediction.positive_score * 100.0,
        output.prediction.negative_score * 100.0
    );
    println!(
        "Completed in {:.2}ms",
        output.stats.total_time.as_secs_f64() * 1000.0
    );

    println!("\n=== Batch Inference ===");
    let texts = &[
        "This product is amazing!",
        "Terrible experience, would not recommend.",
        "It's okay, nothing special.",
    ];

    let output = pipeline.predict_batch(texts)?;

    for r in output.results {
        let p = r.prediction?;
        println!("{} -> {} ({:.2})", r.text, p.label, p.positive_score);
    }

    Ok(())
}
