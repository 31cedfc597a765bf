//! Circuit breaker for backend protection.
//!
//! The circuit breaker pattern prevents cascading failures by temporarily
//! stopping traffic to a failing backend and periodically probing it to
//! detect recovery. State and counters are shared across every concurrent
//! worker through a single [`CircuitCore`], so trip decisions are always
//! made from a consistent view.
//!
//! ## States
//!
//! - **Closed**: Normal operation; calls pass through.
//! - **Open**: Backend is failing; calls are rejected immediately.
//! - **Half-Open**: Probing the backend to see if it has recovered.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scorepipe::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use scorepipe::backends::MockBackend;
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig::default()
//!     .with_trip_consecutive_failures(5)
//!     .with_timeout(Duration::from_secs(30));
//!
//! let protected = CircuitBreaker::new(MockBackend::new(), config);
//! ```

mod breaker;
mod config;
mod state;

pub use breaker::{CircuitBreaker, CircuitCore};
pub use config::{CircuitBreakerConfig, FailurePolicy};
pub use state::{CircuitSnapshot, CircuitState, Counts};
