//! Mock backend for testing.
//!
//! This module provides a configurable mock backend that can be used in
//! tests to simulate scoring outcomes and failure sequences without a real
//! LLM behind it.

use crate::core::{ScoreBackend, ScoreError, ScorePayload, ScoreRequest};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

/// A mock scoring backend for testing purposes.
///
/// The mock scores every item in the batch with a default score unless a
/// per-item override is configured, and can be scripted to fail with a
/// fixed sequence of errors before succeeding — which is what retry and
/// circuit-breaker tests need to be deterministic.
///
/// # Examples
///
/// ```rust
/// use scorepipe::backends::MockBackend;
/// use scorepipe::core::ScoreError;
/// use std::time::Duration;
///
/// // A backend that scores everything 50
/// let backend = MockBackend::new();
///
/// // A backend that rate-limits twice, then succeeds
/// let backend = MockBackend::new().with_error_sequence(vec![
///     ScoreError::rate_limited("mock", None),
///     ScoreError::rate_limited("mock", None),
/// ]);
///
/// // A backend with per-item behavior and simulated latency
/// let backend = MockBackend::new()
///     .with_score_for("post1", 95, "very relevant")
///     .with_omitted_item("post7")
///     .with_latency(Duration::from_millis(20));
/// ```
#[derive(Debug)]
pub struct MockBackend {
    /// Name of this backend instance.
    name: String,
    /// Score given to items without an override.
    default_score: i64,
    /// Reason given to items without an override.
    default_reason: String,
    /// Simulated latency per call.
    latency: Option<Duration>,
    /// Errors returned, in order, before calls start succeeding.
    errors: Mutex<VecDeque<ScoreError>>,
    /// Per-item (score, reason) overrides.
    overrides: RwLock<HashMap<String, (i64, String)>>,
    /// Item ids left out of the response entirely.
    omitted: RwLock<HashSet<String>>,
    /// Number of scoring calls received.
    calls: AtomicU64,
    /// Calls currently executing.
    in_flight: AtomicU64,
    /// High-water mark of concurrently executing calls.
    max_in_flight: AtomicU64,
    /// Whether health checks should fail.
    unhealthy: RwLock<bool>,
}

/// Releases the in-flight slot on every exit path.
struct InFlightGuard<'a>(&'a AtomicU64);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockBackend {
    /// Creates a new mock backend that scores every item 50.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            default_score: 50,
            default_reason: "mock default".to_string(),
            latency: None,
            errors: Mutex::new(VecDeque::new()),
            overrides: RwLock::new(HashMap::new()),
            omitted: RwLock::new(HashSet::new()),
            calls: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
            max_in_flight: AtomicU64::new(0),
            unhealthy: RwLock::new(false),
        }
    }

    /// Sets the name of this backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the default score and reason for items without an override.
    pub fn with_default_score(mut self, score: i64, reason: impl Into<String>) -> Self {
        self.default_score = score;
        self.default_reason = reason.into();
        self
    }

    /// Sets the simulated latency per call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Scripts a sequence of errors returned before calls succeed.
    pub fn with_error_sequence(self, errors: Vec<ScoreError>) -> Self {
        self.errors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(errors);
        self
    }

    /// Sets the response for a specific item id.
    pub fn with_score_for(
        self,
        item_id: impl Into<String>,
        score: i64,
        reason: impl Into<String>,
    ) -> Self {
        self.overrides
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(item_id.into(), (score, reason.into()));
        self
    }

    /// Leaves the given item id out of every response.
    pub fn with_omitted_item(self, item_id: impl Into<String>) -> Self {
        self.omitted
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(item_id.into());
        self
    }

    /// Appends an error to the script (mutable version).
    pub fn push_error(&self, error: ScoreError) {
        self.errors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(error);
    }

    /// Returns the number of scoring calls received.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the highest number of calls that ran concurrently.
    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Sets the health status.
    pub fn set_healthy(&self, healthy: bool) {
        *self
            .unhealthy
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = !healthy;
    }

    /// Makes health checks fail.
    pub fn make_unhealthy(&self) {
        self.set_healthy(false);
    }

    /// Makes health checks pass again.
    pub fn make_healthy(&self) {
        self.set_healthy(true);
    }

    fn pop_scripted_error(&self) -> Option<ScoreError> {
        self.errors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScoreBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScorePayload, ScoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        if request.cancel.is_cancelled() {
            return Err(ScoreError::Cancelled);
        }

        if let Some(latency) = self.latency {
            tokio::select! {
                _ = request.cancel.cancelled() => return Err(ScoreError::Cancelled),
                _ = tokio::time::sleep(latency) => {}
            }
        }

        if let Some(error) = self.pop_scripted_error() {
            return Err(error);
        }

        let overrides = self
            .overrides
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let omitted = self
            .omitted
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut payload = ScorePayload::new();
        for item in &request.batch.items {
            if omitted.contains(&item.id) {
                continue;
            }
            match overrides.get(&item.id) {
                Some((score, reason)) => {
                    payload = payload.with_entry(&item.id, *score, reason.clone());
                }
                None => {
                    payload =
                        payload.with_entry(&item.id, self.default_score, &self.default_reason);
                }
            }
        }

        Ok(payload)
    }

    async fn health_check(&self) -> Result<(), ScoreError> {
        let unhealthy = *self
            .unhealthy
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if unhealthy {
            return Err(ScoreError::connection_failed(
                &self.name,
                "mock backend is unhealthy",
            ));
        }
        Ok(())
    }
}
