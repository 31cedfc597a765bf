//! Retry with backoff for scoring backends.
//!
//! The [`Retry`] decorator wraps any [`crate::core::ScoreBackend`] and
//! re-issues calls that fail with retryable errors, waiting between
//! attempts according to a configurable [`BackoffStrategy`]. Waits observe
//! the call's cancellation token.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scorepipe::retry::{BackoffStrategy, Retry, RetryConfig};
//! use scorepipe::backends::MockBackend;
//! use std::time::Duration;
//!
//! let config = RetryConfig::default()
//!     .with_max_attempts(5)
//!     .with_strategy(BackoffStrategy::Fibonacci)
//!     .with_initial_delay(Duration::from_millis(250));
//!
//! let resilient = Retry::new(MockBackend::new(), config);
//! ```

mod backoff;
mod decorator;

pub use backoff::{BackoffStrategy, RetryConfig};
pub use decorator::Retry;
