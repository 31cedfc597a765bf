//! Circuit breaker example demonstrating resilience patterns.
//!
//! This example shows how to:
//! - Wrap a backend with a circuit breaker
//! - Configure trip thresholds and the open timeout
//! - Handle open-circuit rejections
//! - Monitor breaker state and counters
//!
//! Run with: cargo run --example with_circuit_breaker

use scorepipe::backends::MockBackend;
use scorepipe::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use scorepipe::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Circuit Breaker Example ===\n");

    // A backend that fails for a while before recovering
    let failing_backend = MockBackend::new()
        .with_name("unreliable-llm")
        .with_error_sequence(
            (0..3)
                .map(|i| ScoreError::server_error("unreliable-llm", 500, format!("outage {i}")))
                .collect(),
        );

    // Trip after 3 consecutive failures, stay open for 2 seconds
    let cb_config = CircuitBreakerConfig::default()
        .with_trip_consecutive_failures(3)
        .with_timeout(Duration::from_secs(2));

    println!("Circuit Breaker Configuration:");
    println!("  Consecutive-failure trip: {}", cb_config.trip_consecutive_failures);
    println!("  Open timeout: {:?}", cb_config.timeout);
    println!("  Half-open trial cap: {}", cb_config.max_requests);
    println!();

    let protected = CircuitBreaker::new(failing_backend, cb_config);

    let items = vec![Item::new("post1", "does this service still work?")];
    let batch = split_into_batches(&items, 10).remove(0);
    let request = ScoreRequest::new(batch, "score this", CancelToken::none());

    println!("Sending requests to trigger the circuit breaker...\n");

    for i in 1..=8 {
        let snapshot = protected.snapshot();
        println!(
            "Request #{i}: state={} consecutive_failures={}",
            snapshot.state, snapshot.counts.consecutive_failures
        );

        match protected.score(&request).await {
            Ok(payload) => println!("  -> scored {} item(s)", payload.scores.len()),
            Err(ScoreError::CircuitOpen { recovery_hint, .. }) => {
                println!("  -> rejected: circuit open ({recovery_hint:?})");
            }
            Err(e) => println!("  -> failed: {e}"),
        }

        if i == 6 {
            println!("\nWaiting for the open timeout to elapse...\n");
            tokio::time::sleep(Duration::from_millis(2100)).await;
        }
    }

    let snapshot = protected.snapshot();
    println!("\nFinal state: {} ({:?})", snapshot.state, snapshot.counts);

    Ok(())
}
