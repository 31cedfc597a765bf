//! Custom backend example.
//!
//! This example shows how to implement the `ScoreBackend` trait for your
//! own provider and run it through the full pipeline, retry and circuit
//! breaker included.
//!
//! Run with: cargo run --example custom_backend

use async_trait::async_trait;
use scorepipe::prelude::*;

/// A toy backend that scores items by keyword overlap instead of calling
/// out to a model.
#[derive(Debug)]
struct KeywordBackend {
    keywords: Vec<String>,
}

impl KeywordBackend {
    fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

#[async_trait]
impl ScoreBackend for KeywordBackend {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScorePayload, ScoreError> {
        let mut payload = ScorePayload::new();

        for item in &request.batch.items {
            let content = item.content.to_lowercase();
            let hits = self
                .keywords
                .iter()
                .filter(|k| content.contains(k.as_str()))
                .count();

            let score = ((hits * 100) / self.keywords.len().max(1)).min(100) as i64;
            let reason = format!("{hits} of {} keywords matched", self.keywords.len());
            payload = payload.with_entry(&item.id, score, reason);
        }

        Ok(payload)
    }

    async fn health_check(&self) -> Result<(), ScoreError> {
        Ok(())
    }

    fn max_batch_size(&self) -> Option<usize> {
        Some(50)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Custom Backend Example ===\n");

    let backend = KeywordBackend::new(&["rust", "async", "tokio"]);

    let scorer = Scorer::builder()
        .with_backend(backend)
        .with_config(ScorerConfig::new().with_max_batch_size(5))
        .build()?;

    let items = vec![
        Item::new("a", "Building async services in Rust with tokio"),
        Item::new("b", "Gardening tips for the spring"),
        Item::new("c", "Why Rust ownership makes concurrency safer"),
    ];

    let scored = scorer
        .score(items, ScoreContext::new().with_source("custom_backend"))
        .await?;

    for s in &scored {
        println!("  {:<3} {:>3}  {}", s.item.id, s.score, s.reason);
    }

    Ok(())
}
