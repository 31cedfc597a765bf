//! Retry configuration and backoff delay computation.

use std::time::Duration;

/// The function mapping a retry attempt number to a wait duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// The same delay before every attempt.
    Constant,

    /// `initial_delay × 2^(attempt-1)`, capped at the maximum delay.
    Exponential,

    /// The Fibonacci sequence seeded at the initial delay, capped at the
    /// maximum delay.
    Fibonacci,
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,

    /// Backoff strategy for computing delays between attempts.
    pub strategy: BackoffStrategy,

    /// Base delay before the first retry.
    pub initial_delay: Duration,

    /// Maximum delay between retries.
    pub max_delay: Duration,

    /// Whether to add jitter to delays.
    ///
    /// Jitter desynchronizes concurrent retriers so they do not hammer the
    /// backend in lockstep; magnitude is up to 10% of the computed delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            strategy: BackoffStrategy::Exponential,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sets the maximum number of attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the backoff strategy.
    pub fn with_strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Computes the delay to wait after the given failed attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let base_ms = self.initial_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;

        let raw_ms = match self.strategy {
            BackoffStrategy::Constant => base_ms,
            BackoffStrategy::Exponential => {
                base_ms.saturating_mul(2u64.saturating_pow(attempt - 1))
            }
            BackoffStrategy::Fibonacci => base_ms.saturating_mul(fibonacci(attempt)),
        };

        let capped_ms = raw_ms.min(max_ms);
        Duration::from_millis(capped_ms.saturating_add(self.jitter_for(capped_ms)))
    }

    /// Returns whether another attempt is allowed after `attempt` failures.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    fn jitter_for(&self, delay_ms: u64) -> u64 {
        if !self.jitter {
            return 0;
        }

        // Up to 10% of the computed delay.
        let jitter_range = delay_ms / 10;
        if jitter_range == 0 {
            return 0;
        }
        use rand::Rng;
        rand::thread_rng().gen_range(0..jitter_range)
    }
}

/// Fibonacci number F(n) with F(1) = F(2) = 1, saturating on overflow.
fn fibonacci(n: u32) -> u64 {
    let (mut prev, mut curr) = (0u64, 1u64);
    for _ in 1..n {
        let next = prev.saturating_add(curr);
        prev = curr;
        curr = next;
    }
    curr
}
