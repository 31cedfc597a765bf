//! # Scorepipe
//!
//! A resilient batch-scoring pipeline over remote LLM backends, with
//! retries, circuit breaking, bounded concurrency, and structured audit
//! logging.
//!
//! ## Overview
//!
//! Scorepipe scores arbitrary text items for relevance through a remote
//! LLM API, returning a 0–100 score and explanation per item. It lets you:
//!
//! - Submit items for scoring through a consistent API
//! - Split input into bounded batches dispatched with bounded concurrency
//! - Retry transient failures with constant, exponential, or Fibonacci
//!   backoff
//! - Stop calling a failing backend via a shared circuit breaker
//! - Map structured responses back onto items, with clamping and default
//!   fill for anything the model missed
//! - Observe the pipeline through structured audit events and a health
//!   snapshot
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scorepipe::{Item, ScoreContext, Scorer};
//! use scorepipe::backends::MockBackend;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a backend
//!     let backend = MockBackend::new();
//!
//!     // Create the scorer
//!     let scorer = Scorer::builder()
//!         .with_backend(backend)
//!         .build()?;
//!
//!     // Score some items
//!     let items = vec![
//!         Item::new("post1", "Async Rust patterns for production services"),
//!         Item::new("post2", "Top ten celebrity diets"),
//!     ];
//!     let scored = scorer.score(items, ScoreContext::new()).await?;
//!
//!     for s in &scored {
//!         println!("{}: {} ({})", s.item.id, s.score, s.reason);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - The core pipeline with the mock backend
//! - `openai` - OpenAI-compatible chat-completions backend
//!
//! ## Architecture
//!
//! The library is organized into several layers:
//!
//! - **Core**: Fundamental types, traits, batching, response mapping, and
//!   error handling
//! - **Backends**: Individual backend implementations
//! - **Retry**: Backoff-based retry decorator
//! - **Circuit Breaker**: Shared-state protection against failing backends
//! - **Scorer**: Orchestration of batches across bounded workers
//! - **Audit**: Structured logging of job lifecycles

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod backends;
pub mod circuit_breaker;
pub mod core;
pub mod retry;
pub mod scorer;

// Re-export commonly used types at the crate root
pub use crate::core::{
    split_into_batches, Batch, CancelHandle, CancelToken, HealthStatus, Item, ScoreBackend,
    ScoreContext, ScoreError, ScorePayload, ScoreRequest, ScoredItem,
};

pub use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use crate::retry::{BackoffStrategy, Retry, RetryConfig};
pub use crate::scorer::{Scorer, ScorerBuilder, ScorerConfig};

/// Prelude module for convenient imports.
///
/// ```rust
/// use scorepipe::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        split_into_batches, Batch, CancelHandle, CancelToken, HealthStatus, Item, ScoreBackend,
        ScoreContext, ScoreError, ScorePayload, ScoreRequest, ScoredItem,
    };
    pub use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
    pub use crate::retry::{BackoffStrategy, Retry, RetryConfig};
    pub use crate::scorer::{Scorer, ScorerBuilder, ScorerConfig};
}
