//! Core traits for the scorepipe library.
//!
//! This module defines the `ScoreBackend` trait that all scoring backends
//! must implement, and the request type they receive.

use crate::core::batch::Batch;
use crate::core::cancel::CancelToken;
use crate::core::error::ScoreError;
use crate::core::response::ScorePayload;

use async_trait::async_trait;
use std::fmt::Debug;

/// One scoring request: a batch, its rendered prompt, and the cancellation
/// token the call must observe.
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    /// The batch of items to score.
    pub batch: Batch,

    /// The rendered prompt representing the batch.
    pub prompt: String,

    /// Cancellation token for this call.
    pub cancel: CancelToken,
}

impl ScoreRequest {
    /// Creates a request for the given batch and prompt.
    pub fn new(batch: Batch, prompt: impl Into<String>, cancel: CancelToken) -> Self {
        Self {
            batch,
            prompt: prompt.into(),
            cancel,
        }
    }
}

/// The core trait for scoring backends.
///
/// A backend performs one remote scoring call per batch and returns the
/// parsed structured payload, or a classified [`ScoreError`]. The retry and
/// circuit-breaker decorators implement this same trait and wrap an inner
/// instance, so any composition of them can stand in for a bare backend.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync` for use in async contexts.
/// - `score` must observe `request.cancel` at its suspension points and
///   return [`ScoreError::Cancelled`] promptly once it fires.
/// - Implementations should never panic; all failures are `ScoreError`s.
/// - Backends are stateless across calls apart from connection pooling.
#[async_trait]
pub trait ScoreBackend: Send + Sync + Debug {
    /// Returns the name of this backend.
    ///
    /// This should be a stable, human-readable identifier like "openai"
    /// or "mock".
    fn name(&self) -> &str;

    /// Performs one scoring call for one batch.
    ///
    /// # Errors
    ///
    /// Returns a `ScoreError` for the failure modes the resilience layers
    /// classify: transport errors, non-2xx statuses, timeouts, rate limits,
    /// and malformed or empty structured output.
    async fn score(&self, request: &ScoreRequest) -> Result<ScorePayload, ScoreError>;

    /// Performs a lightweight reachability check on the backend.
    async fn health_check(&self) -> Result<(), ScoreError>;

    /// Returns the largest batch this backend accepts, if it imposes one.
    fn max_batch_size(&self) -> Option<usize> {
        None
    }
}

#[async_trait]
impl<B: ScoreBackend + ?Sized> ScoreBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScorePayload, ScoreError> {
        (**self).score(request).await
    }

    async fn health_check(&self) -> Result<(), ScoreError> {
        (**self).health_check().await
    }

    fn max_batch_size(&self) -> Option<usize> {
        (**self).max_batch_size()
    }
}

#[async_trait]
impl<B: ScoreBackend + ?Sized> ScoreBackend for std::sync::Arc<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScorePayload, ScoreError> {
        (**self).score(request).await
    }

    async fn health_check(&self) -> Result<(), ScoreError> {
        (**self).health_check().await
    }

    fn max_batch_size(&self) -> Option<usize> {
        (**self).max_batch_size()
    }
}

/// A boxed backend for type-erased storage.
pub type BoxedBackend = Box<dyn ScoreBackend>;

/// An arc-wrapped backend for shared ownership.
pub type ArcBackend = std::sync::Arc<dyn ScoreBackend>;
