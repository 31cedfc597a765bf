//! Circuit breaker configuration.

use crate::core::ScoreError;
use std::time::Duration;

/// Configuration for a circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Maximum number of trial calls allowed through while half-open.
    pub max_requests: u32,

    /// Length of the rolling measurement interval while closed; counters
    /// reset when it expires.
    pub interval: Duration,

    /// How long to keep the circuit open before transitioning to half-open.
    pub timeout: Duration,

    /// Consecutive counted failures that trip the circuit.
    pub trip_consecutive_failures: u32,

    /// Minimum counted requests in the interval before the failure-ratio
    /// trip condition applies.
    pub trip_min_requests: u32,

    /// Failure ratio above which the circuit trips, once the request
    /// minimum is met.
    pub trip_failure_ratio: f64,

    /// What types of errors count as breaker failures.
    pub failure_policy: FailurePolicy,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_requests: 1,
            interval: Duration::from_secs(60),
            timeout: Duration::from_secs(30),
            trip_consecutive_failures: 5,
            trip_min_requests: 10,
            trip_failure_ratio: 0.6,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl CircuitBreakerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the half-open trial call cap.
    pub fn with_max_requests(mut self, max: u32) -> Self {
        self.max_requests = max.max(1);
        self
    }

    /// Sets the measurement interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the open duration.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the consecutive-failure trip threshold.
    pub fn with_trip_consecutive_failures(mut self, threshold: u32) -> Self {
        self.trip_consecutive_failures = threshold.max(1);
        self
    }

    /// Sets the minimum request count for the ratio trip condition.
    pub fn with_trip_min_requests(mut self, min: u32) -> Self {
        self.trip_min_requests = min.max(1);
        self
    }

    /// Sets the failure-ratio trip threshold.
    pub fn with_trip_failure_ratio(mut self, ratio: f64) -> Self {
        self.trip_failure_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Returns `true` if the given counters meet a trip condition.
    pub fn should_trip(&self, counts: &crate::circuit_breaker::Counts) -> bool {
        counts.consecutive_failures >= self.trip_consecutive_failures
            || (counts.requests >= self.trip_min_requests
                && counts.failure_ratio() > self.trip_failure_ratio)
    }
}

/// Defines what types of errors count as failures for the circuit breaker.
///
/// The default deliberately differs from retry classification: rate limits,
/// timeouts, and cancellations are expected transients handled by retry and
/// do not count, while auth errors, client errors, server errors, transport
/// failures, and malformed responses all do.
#[derive(Debug, Clone)]
pub struct FailurePolicy {
    /// Count server errors (5xx) as failures.
    pub count_server_errors: bool,
    /// Count auth failures (401/403) as failures.
    pub count_auth_failures: bool,
    /// Count rejected requests (400/404) as failures.
    pub count_invalid_requests: bool,
    /// Count transport failures as failures.
    pub count_connection_failures: bool,
    /// Count malformed responses as failures.
    pub count_malformed_responses: bool,
    /// Count rate limiting as failures.
    pub count_rate_limited: bool,
    /// Count timeouts as failures.
    pub count_timeouts: bool,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            count_server_errors: true,
            count_auth_failures: true,
            count_invalid_requests: true,
            count_connection_failures: true,
            count_malformed_responses: true,
            count_rate_limited: false,
            count_timeouts: false,
        }
    }
}

impl FailurePolicy {
    /// Creates a new failure policy with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy that counts every classified error, including rate
    /// limits and timeouts.
    pub fn all_errors() -> Self {
        Self {
            count_server_errors: true,
            count_auth_failures: true,
            count_invalid_requests: true,
            count_connection_failures: true,
            count_malformed_responses: true,
            count_rate_limited: true,
            count_timeouts: true,
        }
    }

    /// Determines if an error should be counted as a breaker failure.
    ///
    /// Cancellation and circuit-open rejections are never counted.
    pub fn should_count(&self, error: &ScoreError) -> bool {
        match error {
            ScoreError::ServerError { .. } => self.count_server_errors,
            ScoreError::AuthFailed { .. } => self.count_auth_failures,
            ScoreError::InvalidRequest { .. } => self.count_invalid_requests,
            ScoreError::ConnectionFailed { .. } => self.count_connection_failures,
            ScoreError::MalformedResponse { .. } => self.count_malformed_responses,
            ScoreError::RateLimited { .. } => self.count_rate_limited,
            ScoreError::Timeout { .. } => self.count_timeouts,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::Counts;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.max_requests, 1);
        assert_eq!(config.trip_consecutive_failures, 5);
        assert_eq!(config.trip_min_requests, 10);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_builder() {
        let config = CircuitBreakerConfig::new()
            .with_max_requests(3)
            .with_timeout(Duration::from_secs(60))
            .with_trip_failure_ratio(0.5);

        assert_eq!(config.max_requests, 3);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.trip_failure_ratio, 0.5);
    }

    #[test]
    fn test_trip_on_consecutive_failures() {
        let config = CircuitBreakerConfig::default();
        let mut counts = Counts::new();

        for _ in 0..4 {
            counts.on_failure();
        }
        assert!(!config.should_trip(&counts));

        counts.on_failure();
        assert!(config.should_trip(&counts));
    }

    #[test]
    fn test_trip_on_failure_ratio() {
        let config = CircuitBreakerConfig::default();
        let mut counts = Counts::new();

        // 7 failures / 10 requests = 0.7 > 0.6, with no run of 5
        for _ in 0..3 {
            counts.on_failure();
            counts.on_failure();
            counts.on_success();
        }
        counts.on_failure();
        assert!(counts.consecutive_failures < 5);
        assert_eq!(counts.requests, 10);
        assert!(config.should_trip(&counts));
    }

    #[test]
    fn test_no_trip_below_min_requests() {
        let config = CircuitBreakerConfig::default();
        let mut counts = Counts::new();

        // 100% failure rate but only 3 requests and no run of 5
        counts.on_failure();
        counts.on_failure();
        counts.on_failure();
        assert!(!config.should_trip(&counts));
    }

    #[test]
    fn test_failure_policy_defaults() {
        let policy = FailurePolicy::default();

        assert!(policy.should_count(&ScoreError::server_error("b", 500, "x")));
        assert!(policy.should_count(&ScoreError::auth_failed("b", 401, "x")));
        assert!(policy.should_count(&ScoreError::invalid_request("b", 400, "x")));
        assert!(policy.should_count(&ScoreError::connection_failed("b", "x")));
        assert!(policy.should_count(&ScoreError::malformed_response("b", "x")));

        assert!(!policy.should_count(&ScoreError::rate_limited("b", None)));
        assert!(!policy.should_count(&ScoreError::timeout("b", Duration::from_secs(1))));
        assert!(!policy.should_count(&ScoreError::Cancelled));
        assert!(!policy.should_count(&ScoreError::CircuitOpen {
            backend: "b".into(),
            recovery_hint: None,
        }));
    }

    #[test]
    fn test_all_errors_policy() {
        let policy = FailurePolicy::all_errors();
        assert!(policy.should_count(&ScoreError::rate_limited("b", None)));
        assert!(policy.should_count(&ScoreError::timeout("b", Duration::from_secs(1))));
        // Cancellation is never a backend failure.
        assert!(!policy.should_count(&ScoreError::Cancelled));
    }
}
