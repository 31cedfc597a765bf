//! Structured response schema for scoring backends.
//!
//! Every backend must return its results as JSON conforming to:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "scores": [
//!     {"item_id": "<string>", "score": <integer 0-100>, "reason": "<string>"}
//!   ]
//! }
//! ```
//!
//! All three entry fields are required. `scores` may contain fewer entries
//! than the batch holds items; the mapper fills the gaps with defaults.
//! Wholly unparseable or empty output is a backend-level error, classified
//! like a server error for retry purposes.

use crate::core::error::ScoreError;

use serde::{Deserialize, Serialize};

/// The schema version this crate produces and expects.
pub const PAYLOAD_VERSION: &str = "1.0";

/// One scored entry in a backend response.
///
/// `score` is deliberately wider than the valid range so out-of-range
/// values survive parsing and reach the clamp instead of failing the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Identifier of the item this entry scores.
    pub item_id: String,

    /// Raw score as returned by the model.
    pub score: i64,

    /// Explanation for the score.
    pub reason: String,
}

/// A parsed backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePayload {
    /// Schema version; expected to be [`PAYLOAD_VERSION`].
    pub version: String,

    /// Scored entries. May cover fewer items than were submitted.
    pub scores: Vec<ScoreEntry>,
}

impl ScorePayload {
    /// Creates an empty payload at the current schema version.
    pub fn new() -> Self {
        Self {
            version: PAYLOAD_VERSION.to_string(),
            scores: Vec::new(),
        }
    }

    /// Adds an entry.
    pub fn with_entry(mut self, item_id: impl Into<String>, score: i64, reason: impl Into<String>) -> Self {
        self.scores.push(ScoreEntry {
            item_id: item_id.into(),
            score,
            reason: reason.into(),
        });
        self
    }

    /// Parses raw model output into a payload.
    ///
    /// Empty input and JSON that does not match the schema are reported as
    /// [`ScoreError::MalformedResponse`] attributed to `backend`. An
    /// unexpected `version` is tolerated with a warning; downstream mapping
    /// is best-effort.
    pub fn from_json(raw: &str, backend: &str) -> Result<Self, ScoreError> {
        if raw.trim().is_empty() {
            return Err(ScoreError::malformed_response(backend, "empty response body"));
        }

        let payload: Self = serde_json::from_str(raw)
            .map_err(|e| ScoreError::malformed_response(backend, e.to_string()))?;

        if payload.version != PAYLOAD_VERSION {
            tracing::warn!(
                backend = backend,
                version = %payload.version,
                expected = PAYLOAD_VERSION,
                "Unexpected response schema version, mapping best-effort"
            );
        }

        Ok(payload)
    }
}

impl Default for ScorePayload {
    fn default() -> Self {
        Self::new()
    }
}
