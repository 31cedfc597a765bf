//! Circuit breaker implementation.

use crate::circuit_breaker::config::CircuitBreakerConfig;
use crate::circuit_breaker::state::{CircuitSnapshot, CircuitState, Counts};
use crate::core::{ScoreBackend, ScoreError, ScorePayload, ScoreRequest};

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Internal state with the data each phase needs.
#[derive(Debug, Clone, Copy)]
enum InnerState {
    /// Normal operation; `interval_started` anchors the rolling counter
    /// window.
    Closed { interval_started: Instant },
    /// Rejecting calls until `until`.
    Open { until: Instant },
    /// Admitting up to `max_requests` trial calls; `in_flight` tracks the
    /// ones currently running.
    HalfOpen { in_flight: u32 },
}

#[derive(Debug)]
struct Cell {
    state: InnerState,
    counts: Counts,
}

/// The shared heart of a circuit breaker: state and counters behind one
/// mutex.
///
/// A `CircuitCore` is created once per scorer and injected into the
/// [`CircuitBreaker`] decorator; the scorer keeps a clone of the `Arc` so
/// health queries read the same counters the workers update. All reads and
/// updates go through the single lock, so trip and reset decisions always
/// see a consistent snapshot even under concurrent load.
#[derive(Debug)]
pub struct CircuitCore {
    config: CircuitBreakerConfig,
    cell: Mutex<Cell>,
}

impl CircuitCore {
    /// Creates a new closed core with the given configuration.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            cell: Mutex::new(Cell {
                state: InnerState::Closed {
                    interval_started: Instant::now(),
                },
                counts: Counts::new(),
            }),
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Returns a consistent point-in-time view of state and counters.
    ///
    /// Time-based transitions (open-period expiry, interval reset) are
    /// applied before the snapshot is taken.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let mut cell = self.lock();
        self.roll(&mut cell);
        CircuitSnapshot {
            state: Self::public_state(&cell.state),
            counts: cell.counts,
        }
    }

    /// Forces the circuit into the open state for a full timeout period.
    pub fn force_open(&self) {
        let mut cell = self.lock();
        cell.state = InnerState::Open {
            until: Instant::now() + self.config.timeout,
        };
        tracing::warn!(circuit_state = "open", "Circuit breaker forced open");
    }

    /// Forces the circuit closed and clears the counters.
    pub fn force_close(&self) {
        let mut cell = self.lock();
        Self::close(&mut cell);
        tracing::info!(circuit_state = "closed", "Circuit breaker forced closed");
    }

    /// Resets the circuit to its initial state.
    pub fn reset(&self) {
        self.force_close();
    }

    /// Admits or rejects a call.
    ///
    /// On rejection, returns how long until the circuit may recover
    /// (`None` when the half-open trial cap is the limiting factor).
    pub(crate) fn try_acquire(&self) -> Result<(), Option<Duration>> {
        let mut cell = self.lock();
        self.roll(&mut cell);

        match cell.state {
            InnerState::Closed { .. } => Ok(()),
            InnerState::Open { until } => Err(Some(until.saturating_duration_since(Instant::now()))),
            InnerState::HalfOpen { in_flight } => {
                if in_flight < self.config.max_requests {
                    cell.state = InnerState::HalfOpen {
                        in_flight: in_flight + 1,
                    };
                    Ok(())
                } else {
                    Err(None)
                }
            }
        }
    }

    /// Records a counted success for an admitted call.
    pub(crate) fn on_success(&self) {
        let mut cell = self.lock();
        match cell.state {
            InnerState::Closed { .. } => cell.counts.on_success(),
            InnerState::HalfOpen { .. } => {
                // A successful trial closes the circuit.
                Self::close(&mut cell);
                tracing::info!(
                    circuit_state = "closed",
                    "Circuit breaker closed after successful trial call"
                );
            }
            InnerState::Open { .. } => {}
        }
    }

    /// Records a counted failure for an admitted call.
    pub(crate) fn on_failure(&self) {
        let mut cell = self.lock();
        match cell.state {
            InnerState::Closed { .. } => {
                cell.counts.on_failure();
                if self.config.should_trip(&cell.counts) {
                    cell.state = InnerState::Open {
                        until: Instant::now() + self.config.timeout,
                    };
                    tracing::warn!(
                        circuit_state = "open",
                        consecutive_failures = cell.counts.consecutive_failures,
                        requests = cell.counts.requests,
                        total_failures = cell.counts.total_failures,
                        "Circuit breaker tripped"
                    );
                }
            }
            InnerState::HalfOpen { .. } => {
                cell.counts.on_failure();
                cell.state = InnerState::Open {
                    until: Instant::now() + self.config.timeout,
                };
                tracing::warn!(
                    circuit_state = "open",
                    "Circuit breaker reopened after failed trial call"
                );
            }
            InnerState::Open { .. } => {}
        }
    }

    /// Records an uncounted outcome for an admitted call.
    ///
    /// Rate limits, timeouts, and cancellations are neither successes nor
    /// failures; the only bookkeeping needed is releasing a half-open trial
    /// slot.
    pub(crate) fn on_neutral(&self) {
        let mut cell = self.lock();
        if let InnerState::HalfOpen { in_flight } = cell.state {
            cell.state = InnerState::HalfOpen {
                in_flight: in_flight.saturating_sub(1),
            };
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Cell> {
        self.cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies time-based transitions: open-period expiry and the rolling
    /// interval reset while closed.
    fn roll(&self, cell: &mut Cell) {
        let now = Instant::now();
        match cell.state {
            InnerState::Open { until } if now >= until => {
                cell.state = InnerState::HalfOpen { in_flight: 0 };
                cell.counts.clear();
                tracing::info!(
                    circuit_state = "half_open",
                    "Circuit breaker probing for recovery"
                );
            }
            InnerState::Closed { interval_started }
                if !self.config.interval.is_zero()
                    && now.duration_since(interval_started) >= self.config.interval =>
            {
                cell.state = InnerState::Closed {
                    interval_started: now,
                };
                cell.counts.clear();
            }
            _ => {}
        }
    }

    fn close(cell: &mut Cell) {
        cell.state = InnerState::Closed {
            interval_started: Instant::now(),
        };
        cell.counts.clear();
    }

    fn public_state(state: &InnerState) -> CircuitState {
        match state {
            InnerState::Closed { .. } => CircuitState::Closed,
            InnerState::Open { .. } => CircuitState::Open,
            InnerState::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }
}

/// A circuit breaker wrapper around a scoring backend.
///
/// The breaker monitors counted failures across all concurrent callers and
/// rejects calls outright once the backend looks down, so a genuine outage
/// does not burn retry budgets or pile up latency.
///
/// # States
///
/// - **Closed**: Normal operation. Calls pass through, failures are counted.
/// - **Open**: Backend assumed down. Calls fail fast with
///   [`ScoreError::CircuitOpen`] and no network I/O.
/// - **Half-Open**: After the open timeout, a limited number of trial calls
///   probe the backend; one success closes the circuit, one counted failure
///   reopens it.
///
/// # Example
///
/// ```rust,ignore
/// use scorepipe::backends::MockBackend;
/// use scorepipe::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
///
/// let backend = MockBackend::new();
/// let protected = CircuitBreaker::new(backend, CircuitBreakerConfig::default());
///
/// // Use `protected` as a normal backend
/// let payload = protected.score(&request).await?;
/// ```
#[derive(Debug)]
pub struct CircuitBreaker<B: ScoreBackend> {
    /// The wrapped backend.
    inner: B,
    /// Shared state, also held by whoever reports health.
    core: Arc<CircuitCore>,
}

impl<B: ScoreBackend> CircuitBreaker<B> {
    /// Creates a new circuit breaker with its own core.
    pub fn new(backend: B, config: CircuitBreakerConfig) -> Self {
        Self {
            inner: backend,
            core: Arc::new(CircuitCore::new(config)),
        }
    }

    /// Creates a circuit breaker around an injected shared core.
    pub fn with_core(backend: B, core: Arc<CircuitCore>) -> Self {
        Self {
            inner: backend,
            core,
        }
    }

    /// Creates a circuit breaker with default configuration.
    pub fn with_defaults(backend: B) -> Self {
        Self::new(backend, CircuitBreakerConfig::default())
    }

    /// Returns the shared core.
    pub fn core(&self) -> Arc<CircuitCore> {
        Arc::clone(&self.core)
    }

    /// Returns a consistent snapshot of state and counters.
    pub fn snapshot(&self) -> CircuitSnapshot {
        self.core.snapshot()
    }

    /// Returns a reference to the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

/// Releases an admission if the call future is dropped before it settles
/// (e.g. an enclosing timeout), so half-open trial slots cannot leak.
struct AdmitGuard<'a> {
    core: &'a CircuitCore,
    settled: bool,
}

impl Drop for AdmitGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.core.on_neutral();
        }
    }
}

#[async_trait]
impl<B: ScoreBackend> ScoreBackend for CircuitBreaker<B> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScorePayload, ScoreError> {
        if let Err(remaining) = self.core.try_acquire() {
            return Err(ScoreError::CircuitOpen {
                backend: self.inner.name().to_string(),
                recovery_hint: remaining.map(|d| format!("circuit may recover in {d:?}")),
            });
        }

        let mut guard = AdmitGuard {
            core: self.core.as_ref(),
            settled: false,
        };

        let result = self.inner.score(request).await;
        match &result {
            Ok(_) => self.core.on_success(),
            Err(e) => {
                if self.core.config().failure_policy.should_count(e) {
                    self.core.on_failure();
                } else {
                    self.core.on_neutral();
                }
            }
        }
        guard.settled = true;
        result
    }

    async fn health_check(&self) -> Result<(), ScoreError> {
        // Health checks bypass the breaker; they are diagnostics, not load.
        self.inner.health_check().await
    }

    fn max_batch_size(&self) -> Option<usize> {
        self.inner.max_batch_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockBackend;
    use crate::core::{split_into_batches, CancelToken, Item};

    fn request() -> ScoreRequest {
        let items = vec![Item::new("post1", "some content")];
        let batch = split_into_batches(&items, 10).remove(0);
        ScoreRequest::new(batch, "score these", CancelToken::none())
    }

    fn server_errors(n: usize) -> Vec<ScoreError> {
        (0..n)
            .map(|i| ScoreError::server_error("mock", 500, format!("outage {i}")))
            .collect()
    }

    #[tokio::test]
    async fn test_passes_through_when_closed() {
        let breaker = CircuitBreaker::with_defaults(MockBackend::new());

        let payload = breaker.score(&request()).await.unwrap();
        assert_eq!(payload.scores.len(), 1);
        assert!(breaker.snapshot().state.is_closed());
        assert_eq!(breaker.snapshot().counts.total_successes, 1);
    }

    #[tokio::test]
    async fn test_trips_after_consecutive_failures() {
        let backend = MockBackend::new().with_error_sequence(server_errors(5));
        let breaker = CircuitBreaker::with_defaults(backend);
        let req = request();

        for _ in 0..5 {
            let err = breaker.score(&req).await.unwrap_err();
            assert!(matches!(err, ScoreError::ServerError { .. }));
        }
        assert!(breaker.snapshot().state.is_open());

        // The sixth call is rejected without reaching the backend.
        let err = breaker.score(&req).await.unwrap_err();
        assert!(matches!(err, ScoreError::CircuitOpen { .. }));
        assert_eq!(breaker.inner().call_count(), 5);
    }

    #[tokio::test]
    async fn test_trips_on_failure_ratio() {
        let core = CircuitCore::new(CircuitBreakerConfig::default());

        // 7 failures over 10 requests without 5 in a row.
        for _ in 0..3 {
            core.on_failure();
            core.on_failure();
            core.on_success();
        }
        core.on_failure();

        assert!(core.snapshot().state.is_open());
    }

    #[tokio::test]
    async fn test_uncounted_errors_do_not_trip() {
        let errors: Vec<ScoreError> =
            (0..6).map(|_| ScoreError::rate_limited("mock", None)).collect();
        let backend = MockBackend::new().with_error_sequence(errors);
        let breaker = CircuitBreaker::with_defaults(backend);
        let req = request();

        for _ in 0..6 {
            let err = breaker.score(&req).await.unwrap_err();
            assert!(matches!(err, ScoreError::RateLimited { .. }));
        }

        let snapshot = breaker.snapshot();
        assert!(snapshot.state.is_closed());
        assert_eq!(snapshot.counts.requests, 0);
    }

    #[tokio::test]
    async fn test_half_open_success_closes() {
        let config = CircuitBreakerConfig::default().with_timeout(Duration::from_millis(40));
        let backend = MockBackend::new().with_error_sequence(server_errors(5));
        let breaker = CircuitBreaker::new(backend, config);
        let req = request();

        for _ in 0..5 {
            let _ = breaker.score(&req).await;
        }
        assert!(breaker.snapshot().state.is_open());

        tokio::time::sleep(Duration::from_millis(60)).await;

        // Script is exhausted, so the trial call succeeds and closes.
        breaker.score(&req).await.unwrap();
        let snapshot = breaker.snapshot();
        assert!(snapshot.state.is_closed());
        assert_eq!(snapshot.counts.requests, 0);
    }

    #[tokio::test]
    async fn test_half_open_failure_reopens() {
        let config = CircuitBreakerConfig::default().with_timeout(Duration::from_millis(40));
        let backend = MockBackend::new().with_error_sequence(server_errors(6));
        let breaker = CircuitBreaker::new(backend, config);
        let req = request();

        for _ in 0..5 {
            let _ = breaker.score(&req).await;
        }
        tokio::time::sleep(Duration::from_millis(60)).await;

        // The trial call pops the sixth scripted error and reopens.
        let err = breaker.score(&req).await.unwrap_err();
        assert!(matches!(err, ScoreError::ServerError { .. }));
        assert!(breaker.snapshot().state.is_open());
    }

    #[tokio::test]
    async fn test_half_open_trial_cap() {
        let config = CircuitBreakerConfig::default().with_timeout(Duration::from_millis(10));
        let core = CircuitCore::new(config);

        core.force_open();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // One trial slot by default.
        assert!(core.try_acquire().is_ok());
        let rejection = core.try_acquire().unwrap_err();
        assert!(rejection.is_none());

        // Releasing the slot admits the next probe.
        core.on_neutral();
        assert!(core.try_acquire().is_ok());
    }

    #[tokio::test]
    async fn test_interval_resets_counters_while_closed() {
        let config = CircuitBreakerConfig::default().with_interval(Duration::from_millis(30));
        let core = CircuitCore::new(config);

        core.on_failure();
        core.on_failure();
        assert_eq!(core.snapshot().counts.consecutive_failures, 2);

        tokio::time::sleep(Duration::from_millis(50)).await;

        let snapshot = core.snapshot();
        assert!(snapshot.state.is_closed());
        assert_eq!(snapshot.counts, Counts::default());
    }

    #[tokio::test]
    async fn test_force_open_and_close() {
        let breaker = CircuitBreaker::with_defaults(MockBackend::new());

        breaker.core().force_open();
        assert!(breaker.snapshot().state.is_open());

        let err = breaker.score(&request()).await.unwrap_err();
        assert!(matches!(err, ScoreError::CircuitOpen { .. }));
        assert_eq!(breaker.inner().call_count(), 0);

        breaker.core().force_close();
        assert!(breaker.snapshot().state.is_closed());
        breaker.score(&request()).await.unwrap();
    }
}
