//! Basic scoring example using the mock backend.
//!
//! This example shows how to:
//! - Create a scorer with a backend
//! - Submit items for scoring
//! - Read scores and reasons from the result
//!
//! Run with: cargo run --example basic_score

use scorepipe::backends::MockBackend;
use scorepipe::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Basic Scoring Example ===\n");

    // A mock backend with a few scripted opinions
    let backend = MockBackend::new()
        .with_score_for("post1", 92, "directly about async Rust")
        .with_score_for("post2", 8, "unrelated to the topic")
        .with_score_for("post3", 55, "tangentially related");

    let scorer = Scorer::builder().with_backend(backend).build()?;

    let items = vec![
        Item::new("post1", "Designing backpressure for async Rust services"),
        Item::new("post2", "Top ten celebrity diets this summer"),
        Item::new("post3", "A history of message queues").with_metadata("lang", "en"),
    ];

    let context = ScoreContext::new()
        .with_request_id("demo-1")
        .with_source("basic_score");

    let scored = scorer.score(items, context).await?;

    println!("Results:");
    for s in &scored {
        println!("  {:<6} {:>3}  {}", s.item.id, s.score, s.reason);
    }

    let health = scorer.health();
    println!("\nPipeline health: {health}");

    Ok(())
}
