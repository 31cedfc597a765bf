//! Core types and traits for the scorepipe library.
//!
//! This module provides the fundamental building blocks used throughout
//! the library:
//!
//! - [`types`] - Common types like `Item`, `ScoredItem`, `ScoreContext`
//! - [`traits`] - The `ScoreBackend` trait and the request type
//! - [`error`] - Structured error types and retry classification
//! - [`batch`] - Order-preserving batch splitting
//! - [`response`] - The structured response schema and its parsing
//! - [`mapper`] - Mapping responses back onto items with default-fill
//! - [`cancel`] - Cancellation signalling for in-flight calls

pub mod batch;
pub mod cancel;
pub mod error;
pub mod mapper;
pub mod response;
pub mod traits;
pub mod types;

// Re-export commonly used types at the core level
pub use batch::{split_into_batches, Batch};
pub use cancel::{CancelHandle, CancelToken};
pub use error::ScoreError;
pub use mapper::{map_payload, NO_SCORE_REASON};
pub use response::{ScoreEntry, ScorePayload, PAYLOAD_VERSION};
pub use traits::{ArcBackend, BoxedBackend, ScoreBackend, ScoreRequest};
pub use types::{HealthStatus, Item, ScoreContext, ScoredItem};
