//! Retry decorator for scoring backends.

use crate::core::{ScoreBackend, ScoreError, ScorePayload, ScoreRequest};
use crate::retry::backoff::RetryConfig;

use async_trait::async_trait;

/// A retry wrapper around a scoring backend.
///
/// Re-issues the inner call on retryable failures, waiting between attempts
/// according to the configured backoff strategy. Non-retryable errors
/// terminate after a single attempt; exhausting the attempt budget returns
/// the last observed error.
///
/// The wait between attempts observes the request's cancellation token and
/// returns [`ScoreError::Cancelled`] promptly when it fires, instead of
/// completing the backoff.
///
/// # Example
///
/// ```rust,ignore
/// use scorepipe::backends::MockBackend;
/// use scorepipe::retry::{Retry, RetryConfig};
///
/// let backend = MockBackend::new();
/// let resilient = Retry::new(backend, RetryConfig::default());
///
/// // Use `resilient` as a normal backend
/// let payload = resilient.score(&request).await?;
/// ```
#[derive(Debug)]
pub struct Retry<B: ScoreBackend> {
    /// The wrapped backend.
    inner: B,
    /// Configuration.
    config: RetryConfig,
}

impl<B: ScoreBackend> Retry<B> {
    /// Creates a new retry decorator around the given backend.
    pub fn new(backend: B, config: RetryConfig) -> Self {
        Self {
            inner: backend,
            config,
        }
    }

    /// Creates a retry decorator with default configuration.
    pub fn with_defaults(backend: B) -> Self {
        Self::new(backend, RetryConfig::default())
    }

    /// Returns a reference to the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[async_trait]
impl<B: ScoreBackend> ScoreBackend for Retry<B> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScorePayload, ScoreError> {
        let mut attempt = 1u32;

        loop {
            match self.inner.score(request).await {
                Ok(payload) => {
                    if attempt > 1 {
                        tracing::debug!(
                            backend = self.inner.name(),
                            batch_index = request.batch.index,
                            attempt = attempt,
                            "Scoring call succeeded after retry"
                        );
                    }
                    return Ok(payload);
                }
                Err(e) if !e.is_retryable() => {
                    return Err(e);
                }
                Err(e) => {
                    if !self.config.should_retry(attempt) {
                        tracing::warn!(
                            backend = self.inner.name(),
                            batch_index = request.batch.index,
                            attempts = attempt,
                            error = %e,
                            "Retry budget exhausted"
                        );
                        return Err(e);
                    }

                    let delay = self.config.delay_for_attempt(attempt);
                    tracing::debug!(
                        backend = self.inner.name(),
                        batch_index = request.batch.index,
                        attempt = attempt,
                        max_attempts = self.config.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying scoring call"
                    );

                    tokio::select! {
                        _ = request.cancel.cancelled() => {
                            return Err(ScoreError::Cancelled);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }

                    attempt += 1;
                }
            }
        }
    }

    async fn health_check(&self) -> Result<(), ScoreError> {
        self.inner.health_check().await
    }

    fn max_batch_size(&self) -> Option<usize> {
        self.inner.max_batch_size()
    }
}
