//! Error types for the scorepipe library.
//!
//! This module provides structured, typed errors for all failure scenarios.
//! The library never panics; all errors are returned as `Result` values.
//!
//! Two classifications are derived from these errors:
//!
//! - **Retryability** ([`ScoreError::is_retryable`]) — whether the retry
//!   decorator may re-issue the call.
//! - **Breaker counting** (`FailurePolicy::should_count` in the
//!   `circuit_breaker` module) — whether the failure counts toward tripping
//!   the circuit.
//!
//! The two deliberately disagree for rate limits and timeouts: both are
//! retried, neither opens the circuit.

use std::time::Duration;
use thiserror::Error;

/// The main error type for scoring operations.
///
/// All error variants include context about what failed and why,
/// enabling proper error handling and debugging.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The backend returned a rate-limit signal (HTTP 429).
    #[error("rate limit exceeded on backend '{backend}': retry after {retry_after:?}")]
    RateLimited {
        /// Name of the backend.
        backend: String,
        /// Suggested wait time before retry, if the backend provided one.
        retry_after: Option<Duration>,
    },

    /// The backend returned a server-side error (HTTP 5xx).
    #[error("backend '{backend}' returned server error {status}: {message}")]
    ServerError {
        /// Name of the backend.
        backend: String,
        /// HTTP-equivalent status code.
        status: u16,
        /// Error message from the backend, if any.
        message: String,
    },

    /// The scoring call timed out.
    #[error("scoring call timed out after {elapsed:?} on backend '{backend}'")]
    Timeout {
        /// Name of the backend that timed out.
        backend: String,
        /// How long the operation ran before timing out.
        elapsed: Duration,
    },

    /// Failed to reach the backend at the transport level.
    #[error("connection to backend '{backend}' failed: {message}")]
    ConnectionFailed {
        /// Name of the backend.
        backend: String,
        /// Error message describing the failure.
        message: String,
    },

    /// The backend response could not be parsed into the expected schema,
    /// or carried no payload at all.
    #[error("malformed response from backend '{backend}': {details}")]
    MalformedResponse {
        /// Name of the backend.
        backend: String,
        /// Details about what could not be parsed.
        details: String,
    },

    /// Authentication or authorization failed (HTTP 401/403).
    #[error("authentication failed for backend '{backend}' (status {status}): {reason}")]
    AuthFailed {
        /// Name of the backend.
        backend: String,
        /// HTTP-equivalent status code.
        status: u16,
        /// Reason for the failure.
        reason: String,
    },

    /// The request was rejected as invalid by the backend (HTTP 400/404
    /// and other client errors).
    #[error("backend '{backend}' rejected the request (status {status}): {message}")]
    InvalidRequest {
        /// Name of the backend.
        backend: String,
        /// HTTP-equivalent status code.
        status: u16,
        /// Error message from the backend, if any.
        message: String,
    },

    /// The circuit breaker is open for this backend; no call was made.
    #[error("circuit breaker open for backend '{backend}'")]
    CircuitOpen {
        /// Name of the backend with the open circuit.
        backend: String,
        /// When the circuit might recover, if known.
        recovery_hint: Option<String>,
    },

    /// The scoring call was cancelled.
    #[error("scoring call was cancelled")]
    Cancelled,

    /// The submitted items failed validation before any dispatch.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the validation failure.
        message: String,
    },

    /// A batch failed after retry and circuit-breaker handling.
    ///
    /// This is the call-level wrapper the scheduler returns so callers can
    /// identify the failing batch and its underlying cause.
    #[error("batch {index} failed: {source}")]
    BatchFailed {
        /// Zero-based index of the failing batch.
        index: usize,
        /// The underlying error.
        #[source]
        source: Box<ScoreError>,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An internal error occurred.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl ScoreError {
    /// Returns `true` if the retry decorator may re-issue the call.
    ///
    /// Rate limits, server errors, timeouts, transport failures, and
    /// malformed responses are retryable. Auth failures, invalid requests,
    /// cancellation, and an open circuit terminate immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::ServerError { .. }
                | Self::Timeout { .. }
                | Self::ConnectionFailed { .. }
                | Self::MalformedResponse { .. }
        )
    }

    /// Returns the backend name if this error is associated with one.
    pub fn backend(&self) -> Option<&str> {
        match self {
            Self::RateLimited { backend, .. }
            | Self::ServerError { backend, .. }
            | Self::Timeout { backend, .. }
            | Self::ConnectionFailed { backend, .. }
            | Self::MalformedResponse { backend, .. }
            | Self::AuthFailed { backend, .. }
            | Self::InvalidRequest { backend, .. }
            | Self::CircuitOpen { backend, .. } => Some(backend),
            Self::BatchFailed { source, .. } => source.backend(),
            _ => None,
        }
    }

    /// Creates a `RateLimited` error.
    pub fn rate_limited(backend: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimited {
            backend: backend.into(),
            retry_after,
        }
    }

    /// Creates a `ServerError`.
    pub fn server_error(
        backend: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::ServerError {
            backend: backend.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(backend: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            backend: backend.into(),
            elapsed,
        }
    }

    /// Creates a `ConnectionFailed` error.
    pub fn connection_failed(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Creates a `MalformedResponse` error.
    pub fn malformed_response(backend: impl Into<String>, details: impl Into<String>) -> Self {
        Self::MalformedResponse {
            backend: backend.into(),
            details: details.into(),
        }
    }

    /// Creates an `AuthFailed` error.
    pub fn auth_failed(backend: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Self::AuthFailed {
            backend: backend.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidRequest` error.
    pub fn invalid_request(
        backend: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRequest {
            backend: backend.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates an `InvalidInput` error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wraps an error as a batch-level failure for the given batch index.
    pub fn batch_failed(index: usize, source: ScoreError) -> Self {
        Self::BatchFailed {
            index,
            source: Box::new(source),
        }
    }
}
