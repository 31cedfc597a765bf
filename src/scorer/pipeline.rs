//! The main scorer implementation.

use crate::audit;
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitCore};
use crate::core::{
    map_payload, split_into_batches, ArcBackend, Batch, BoxedBackend, HealthStatus, Item,
    ScoreBackend, ScoreContext, ScoreError, ScoreRequest, ScoredItem,
};
use crate::retry::{Retry, RetryConfig};
use crate::scorer::prompt::{DefaultPromptRenderer, PromptRenderer};

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Configuration for the scorer.
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    /// Maximum number of items per batch.
    pub max_batch_size: usize,

    /// Maximum number of batches scored concurrently; 1 runs batches
    /// strictly sequentially.
    pub max_concurrent: usize,

    /// Overall timeout for one batch call, spanning all retry attempts.
    pub batch_timeout: Duration,

    /// Retry configuration for the inner decorator.
    pub retry: RetryConfig,

    /// Circuit breaker configuration for the outer decorator.
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 10,
            max_concurrent: 1,
            batch_timeout: Duration::from_secs(120),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl ScorerConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum batch size.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.max(1);
        self
    }

    /// Sets the concurrency bound.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Sets the per-batch timeout.
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the circuit breaker configuration.
    pub fn with_circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = config;
        self
    }
}

/// Builder for creating a [`Scorer`].
pub struct ScorerBuilder {
    backend: Option<BoxedBackend>,
    renderer: Option<Arc<dyn PromptRenderer>>,
    config: ScorerConfig,
}

impl ScorerBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            backend: None,
            renderer: None,
            config: ScorerConfig::default(),
        }
    }

    /// Sets the scoring backend.
    pub fn with_backend<B: ScoreBackend + 'static>(mut self, backend: B) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    /// Sets the prompt renderer.
    pub fn with_renderer<R: PromptRenderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: ScorerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the scorer, composing the resilience decorators.
    ///
    /// Composition order is fixed here and deliberate: retry innermost, so
    /// every retry attempt is individually visible to the circuit breaker,
    /// and an open circuit rejects calls before any retry budget is spent.
    pub fn build(self) -> Result<Scorer, ScoreError> {
        let backend = self
            .backend
            .ok_or_else(|| ScoreError::configuration("a scoring backend is required"))?;

        let circuit = Arc::new(CircuitCore::new(self.config.circuit_breaker.clone()));
        let retried = Retry::new(backend, self.config.retry.clone());
        let decorated: ArcBackend =
            Arc::new(CircuitBreaker::with_core(retried, Arc::clone(&circuit)));

        Ok(Scorer {
            backend: decorated,
            circuit,
            renderer: self
                .renderer
                .unwrap_or_else(|| Arc::new(DefaultPromptRenderer::new())),
            config: self.config,
        })
    }
}

impl Default for ScorerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The main entry point: batches items, dispatches them through the
/// decorated backend with bounded concurrency, and assembles the ordered
/// result.
///
/// A call either returns one [`ScoredItem`] per submitted item, in input
/// order, or a single error identifying the failing batch — never a
/// partial result set.
pub struct Scorer {
    /// The fully decorated backend (circuit breaker over retry).
    backend: ArcBackend,
    /// Shared circuit state, also read by [`Scorer::health`].
    circuit: Arc<CircuitCore>,
    /// Prompt renderer invoked once per batch.
    renderer: Arc<dyn PromptRenderer>,
    /// Configuration.
    config: ScorerConfig,
}

impl Scorer {
    /// Creates a new builder.
    pub fn builder() -> ScorerBuilder {
        ScorerBuilder::new()
    }

    /// Scores all items, preserving input order in the result.
    pub async fn score(
        &self,
        items: Vec<Item>,
        context: ScoreContext,
    ) -> Result<Vec<ScoredItem>, ScoreError> {
        validate_items(&items)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let job_id = Uuid::new_v4().to_string();
        let batches = split_into_batches(&items, self.config.max_batch_size);
        audit::emit_score_started(&job_id, &context, items.len(), batches.len());

        let started = Instant::now();
        let result = if self.config.max_concurrent <= 1 {
            self.score_sequential(&job_id, batches, &context).await
        } else {
            self.score_concurrent(&job_id, batches, &context).await
        };

        match &result {
            Ok(scored) => {
                audit::emit_score_completed(&job_id, &context, scored, started.elapsed());
            }
            Err(e) => {
                audit::emit_score_failed(&job_id, &context, e, started.elapsed());
            }
        }
        result
    }

    /// Returns the health snapshot for monitoring integration.
    pub fn health(&self) -> HealthStatus {
        let snapshot = self.circuit.snapshot();
        HealthStatus {
            healthy: !snapshot.state.is_open(),
            circuit_state: snapshot.state,
            counts: snapshot.counts,
        }
    }

    /// Performs a reachability check against the underlying backend.
    pub async fn check_backend(&self) -> Result<(), ScoreError> {
        self.backend.health_check().await
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    async fn score_sequential(
        &self,
        job_id: &str,
        batches: Vec<Batch>,
        context: &ScoreContext,
    ) -> Result<Vec<ScoredItem>, ScoreError> {
        let mut all = Vec::new();

        for batch in batches {
            if context.cancel.is_cancelled() {
                return Err(ScoreError::Cancelled);
            }

            let index = batch.index;
            match self.score_batch(job_id, batch, context).await {
                Ok(scored) => all.extend(scored),
                Err(e) => return Err(ScoreError::batch_failed(index, e)),
            }
        }

        Ok(all)
    }

    async fn score_concurrent(
        &self,
        job_id: &str,
        batches: Vec<Batch>,
        context: &ScoreContext,
    ) -> Result<Vec<ScoredItem>, ScoreError> {
        let abort = Arc::new(AtomicBool::new(false));

        let jobs = batches.into_iter().map(|batch| {
            let abort = Arc::clone(&abort);
            async move {
                let index = batch.index;
                let offset = batch.offset;

                // A failed or cancelled sibling stops further dispatches;
                // already-running batches are left to finish.
                if abort.load(Ordering::SeqCst) || context.cancel.is_cancelled() {
                    return Err(ScoreError::batch_failed(index, ScoreError::Cancelled));
                }

                match self.score_batch(job_id, batch, context).await {
                    Ok(scored) => Ok((offset, scored)),
                    Err(e) => Err(ScoreError::batch_failed(index, e)),
                }
            }
        });

        let mut outcomes = stream::iter(jobs).buffer_unordered(self.config.max_concurrent);
        let mut first_error: Option<ScoreError> = None;
        let mut chunks: Vec<(usize, Vec<ScoredItem>)> = Vec::new();

        while let Some(outcome) = outcomes.next().await {
            match outcome {
                Ok(chunk) => chunks.push(chunk),
                Err(e) => {
                    if first_error.is_none() {
                        abort.store(true, Ordering::SeqCst);
                        first_error = Some(e);
                    } else {
                        tracing::debug!(error = %e, "Discarding sibling batch failure");
                    }
                }
            }
        }

        if let Some(e) = first_error {
            if !chunks.is_empty() {
                tracing::debug!(
                    job_id = %job_id,
                    discarded_batches = chunks.len(),
                    "Discarding completed sibling batches after failure"
                );
            }
            return Err(e);
        }

        // Batches complete in arbitrary order; the offsets restore it.
        chunks.sort_by_key(|(offset, _)| *offset);
        Ok(chunks.into_iter().flat_map(|(_, scored)| scored).collect())
    }

    async fn score_batch(
        &self,
        job_id: &str,
        batch: Batch,
        context: &ScoreContext,
    ) -> Result<Vec<ScoredItem>, ScoreError> {
        let prompt = self.renderer.render(&batch);
        let request = ScoreRequest::new(batch, prompt, context.cancel.clone());

        let started = Instant::now();
        let payload = match tokio::time::timeout(
            self.config.batch_timeout,
            self.backend.score(&request),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(ScoreError::timeout(
                    self.backend.name(),
                    self.config.batch_timeout,
                ))
            }
        };

        audit::emit_batch_completed(job_id, &request.batch, started.elapsed());
        Ok(map_payload(&request.batch, &payload))
    }
}

impl std::fmt::Debug for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scorer")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}

/// Rejects empty and duplicate item ids before any dispatch.
fn validate_items(items: &[Item]) -> Result<(), ScoreError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.id.is_empty() {
            return Err(ScoreError::invalid_input("item ids must be non-empty"));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(ScoreError::invalid_input(format!(
                "duplicate item id '{}'",
                item.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockBackend;
    use crate::core::{CancelHandle, NO_SCORE_REASON};

    fn items(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| Item::new(format!("post{i}"), format!("content {i}")))
            .collect()
    }

    #[tokio::test]
    async fn test_basic_scoring() {
        let scorer = Scorer::builder()
            .with_backend(MockBackend::new())
            .build()
            .unwrap();

        let scored = scorer.score(items(3), ScoreContext::new()).await.unwrap();

        assert_eq!(scored.len(), 3);
        assert!(scored.iter().all(|s| s.score == 50));
        assert_eq!(scored[0].item.id, "post0");
        assert_eq!(scored[2].item.id, "post2");
    }

    #[tokio::test]
    async fn test_empty_input() {
        let scorer = Scorer::builder()
            .with_backend(MockBackend::new())
            .build()
            .unwrap();

        let scored = scorer.score(Vec::new(), ScoreContext::new()).await.unwrap();
        assert!(scored.is_empty());
    }

    #[tokio::test]
    async fn test_bounded_concurrency_preserves_order() {
        let backend = MockBackend::new().with_latency(Duration::from_millis(25));
        let config = ScorerConfig::new()
            .with_max_batch_size(10)
            .with_max_concurrent(3);

        let scorer = Scorer::builder()
            .with_backend(backend)
            .with_config(config)
            .build()
            .unwrap();

        let input = items(25);
        let expected_ids: Vec<String> = input.iter().map(|i| i.id.clone()).collect();

        let scored = scorer.score(input, ScoreContext::new()).await.unwrap();

        assert_eq!(scored.len(), 25);
        let got_ids: Vec<&str> = scored.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(got_ids, expected_ids);
    }

    #[tokio::test]
    async fn test_concurrency_bound_and_batch_count() {
        let backend = Arc::new(MockBackend::new().with_latency(Duration::from_millis(25)));
        let config = ScorerConfig::new()
            .with_max_batch_size(10)
            .with_max_concurrent(3);

        let scorer = Scorer::builder()
            .with_backend(Arc::clone(&backend))
            .with_config(config)
            .build()
            .unwrap();

        scorer.score(items(25), ScoreContext::new()).await.unwrap();

        assert_eq!(backend.call_count(), 3);
        assert!(backend.max_in_flight() <= 3);
        assert!(backend.max_in_flight() >= 2);
    }

    #[tokio::test]
    async fn test_missing_score_gets_default_fill() {
        let backend = MockBackend::new()
            .with_score_for("post0", 80, "relevant")
            .with_omitted_item("post7");

        let scorer = Scorer::builder().with_backend(backend).build().unwrap();

        let scored = scorer.score(items(8), ScoreContext::new()).await.unwrap();

        assert_eq!(scored[0].score, 80);
        assert_eq!(scored[7].item.id, "post7");
        assert_eq!(scored[7].score, 0);
        assert_eq!(scored[7].reason, NO_SCORE_REASON);
        assert!(scored[1..7].iter().all(|s| s.score == 50));
    }

    #[tokio::test]
    async fn test_sequential_failure_identifies_batch() {
        let backend = MockBackend::new()
            .with_error_sequence(vec![ScoreError::auth_failed("mock", 401, "bad key")]);
        let config = ScorerConfig::new().with_retry(RetryConfig::no_retry());

        let scorer = Scorer::builder()
            .with_backend(backend)
            .with_config(config)
            .build()
            .unwrap();

        let err = scorer.score(items(15), ScoreContext::new()).await.unwrap_err();
        match err {
            ScoreError::BatchFailed { index, source } => {
                assert_eq!(index, 0);
                assert!(matches!(*source, ScoreError::AuthFailed { .. }));
            }
            other => panic!("expected BatchFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_failure_returns_no_partial_results() {
        let backend = MockBackend::new().with_error_sequence(vec![
            ScoreError::server_error("mock", 500, "down"),
            ScoreError::server_error("mock", 500, "down"),
            ScoreError::server_error("mock", 500, "down"),
        ]);
        let config = ScorerConfig::new()
            .with_max_batch_size(10)
            .with_max_concurrent(3)
            .with_retry(RetryConfig::no_retry());

        let scorer = Scorer::builder()
            .with_backend(backend)
            .with_config(config)
            .build()
            .unwrap();

        let err = scorer.score(items(25), ScoreContext::new()).await.unwrap_err();
        assert!(matches!(err, ScoreError::BatchFailed { .. }));
    }

    #[tokio::test]
    async fn test_pre_cancelled_context_makes_no_calls() {
        let backend = Arc::new(MockBackend::new());
        let scorer = Scorer::builder()
            .with_backend(Arc::clone(&backend))
            .build()
            .unwrap();

        let (handle, token) = CancelHandle::new();
        handle.cancel();
        let context = ScoreContext::new().with_cancel_token(token);

        let err = scorer.score(items(5), context).await.unwrap_err();
        assert!(matches!(err, ScoreError::Cancelled));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected() {
        let scorer = Scorer::builder()
            .with_backend(MockBackend::new())
            .build()
            .unwrap();

        let input = vec![Item::new("same", "a"), Item::new("same", "b")];
        let err = scorer.score(input, ScoreContext::new()).await.unwrap_err();
        assert!(matches!(err, ScoreError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_health_reflects_open_circuit() {
        let backend = MockBackend::new()
            .with_error_sequence(vec![ScoreError::server_error("mock", 500, "down")]);
        let config = ScorerConfig::new()
            .with_retry(RetryConfig::no_retry())
            .with_circuit_breaker(
                CircuitBreakerConfig::default().with_trip_consecutive_failures(1),
            );

        let scorer = Scorer::builder()
            .with_backend(backend)
            .with_config(config)
            .build()
            .unwrap();

        assert!(scorer.health().healthy);

        let _ = scorer.score(items(1), ScoreContext::new()).await;

        let health = scorer.health();
        assert!(!health.healthy);
        assert!(health.circuit_state.is_open());
    }

    #[test]
    fn test_builder_requires_backend() {
        let result = Scorer::builder().build();
        assert!(result.is_err());
    }
}
