//! Circuit breaker states and rolling counters.

use serde::{Deserialize, Serialize};

/// The externally visible state of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Circuit is closed; calls pass through normally.
    Closed,

    /// Circuit is open; calls are rejected without touching the backend.
    Open,

    /// Circuit is half-open; a limited number of trial calls are allowed.
    HalfOpen,
}

impl CircuitState {
    /// Returns `true` if the circuit is closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` if the circuit is open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if the circuit is half-open.
    pub fn is_half_open(&self) -> bool {
        matches!(self, Self::HalfOpen)
    }

    /// Returns the name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Rolling success/failure counters over the current measurement interval.
///
/// Counters track completed calls that the failure policy deems relevant;
/// uncounted outcomes (rate limits, timeouts, cancellations) leave them
/// untouched. They reset when the interval expires while closed, and on the
/// transition back to closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Completed counted calls in this interval.
    pub requests: u32,
    /// Counted successes in this interval.
    pub total_successes: u32,
    /// Counted failures in this interval.
    pub total_failures: u32,
    /// Current run of consecutive successes.
    pub consecutive_successes: u32,
    /// Current run of consecutive failures.
    pub consecutive_failures: u32,
}

impl Counts {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a counted success.
    pub fn on_success(&mut self) {
        self.requests += 1;
        self.total_successes += 1;
        self.consecutive_successes += 1;
        self.consecutive_failures = 0;
    }

    /// Records a counted failure.
    pub fn on_failure(&mut self) {
        self.requests += 1;
        self.total_failures += 1;
        self.consecutive_failures += 1;
        self.consecutive_successes = 0;
    }

    /// Resets all counters to zero.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns the failure rate over this interval (0.0 when idle).
    pub fn failure_ratio(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        f64::from(self.total_failures) / f64::from(self.requests)
    }
}

/// A consistent point-in-time view of the breaker, for health reporting.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CircuitSnapshot {
    /// State at the time of the snapshot.
    pub state: CircuitState,
    /// Counters at the time of the snapshot.
    pub counts: Counts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(CircuitState::Closed.name(), "closed");
        assert_eq!(CircuitState::Open.name(), "open");
        assert_eq!(CircuitState::HalfOpen.name(), "half_open");
        assert!(CircuitState::Closed.is_closed());
        assert!(CircuitState::Open.is_open());
        assert!(CircuitState::HalfOpen.is_half_open());
    }

    #[test]
    fn test_counts_success_failure_runs() {
        let mut counts = Counts::new();

        counts.on_failure();
        counts.on_failure();
        assert_eq!(counts.consecutive_failures, 2);
        assert_eq!(counts.consecutive_successes, 0);

        counts.on_success();
        assert_eq!(counts.consecutive_failures, 0);
        assert_eq!(counts.consecutive_successes, 1);
        assert_eq!(counts.requests, 3);
        assert_eq!(counts.total_failures, 2);
        assert_eq!(counts.total_successes, 1);
    }

    #[test]
    fn test_failure_ratio() {
        let mut counts = Counts::new();
        assert_eq!(counts.failure_ratio(), 0.0);

        counts.on_failure();
        counts.on_failure();
        counts.on_success();
        assert!((counts.failure_ratio() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_clear() {
        let mut counts = Counts::new();
        counts.on_failure();
        counts.clear();
        assert_eq!(counts, Counts::default());
    }
}
