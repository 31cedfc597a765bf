//! Audit event types and emission functions.

use crate::core::{Batch, ScoreContext, ScoreError, ScoredItem, NO_SCORE_REASON};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit record for a completed scoring job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Unique job ID.
    pub job_id: String,

    /// Request ID, if the caller supplied one.
    pub request_id: Option<String>,

    /// Source of the call, if available.
    pub source: Option<String>,

    /// Number of items scored.
    pub item_count: usize,

    /// Number of items that received the fallback score.
    pub fallback_count: usize,

    /// Total job duration in milliseconds.
    pub duration_ms: u64,
}

impl AuditEvent for ScoreAuditEvent {
    fn event_type(&self) -> &'static str {
        "score_completed"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Emits an audit event for a scoring job starting.
pub fn emit_score_started(
    job_id: &str,
    context: &ScoreContext,
    item_count: usize,
    batch_count: usize,
) {
    tracing::info!(
        target: "scorepipe::audit",
        event_type = "score_started",
        job_id = %job_id,
        request_id = ?context.request_id,
        source = ?context.source,
        item_count = item_count,
        batch_count = batch_count,
        "Scoring job started"
    );
}

/// Emits an audit event for one scored batch.
pub fn emit_batch_completed(job_id: &str, batch: &Batch, duration: Duration) {
    tracing::debug!(
        target: "scorepipe::audit",
        event_type = "batch_completed",
        job_id = %job_id,
        batch_index = batch.index,
        batch_size = batch.len(),
        duration_ms = duration.as_millis() as u64,
        "Batch scored"
    );
}

/// Emits an audit event for a completed scoring job.
pub fn emit_score_completed(
    job_id: &str,
    context: &ScoreContext,
    scored: &[ScoredItem],
    duration: Duration,
) {
    let event = ScoreAuditEvent {
        timestamp: Utc::now(),
        job_id: job_id.to_string(),
        request_id: context.request_id.clone(),
        source: context.source.clone(),
        item_count: scored.len(),
        fallback_count: scored
            .iter()
            .filter(|s| s.score == 0 && s.reason == NO_SCORE_REASON)
            .count(),
        duration_ms: duration.as_millis() as u64,
    };

    tracing::info!(
        target: "scorepipe::audit",
        event_type = event.event_type(),
        job_id = %event.job_id,
        request_id = ?event.request_id,
        source = ?event.source,
        item_count = event.item_count,
        fallback_count = event.fallback_count,
        duration_ms = event.duration_ms,
        "Scoring job completed"
    );
}

/// Emits an audit event for a failed scoring job.
pub fn emit_score_failed(
    job_id: &str,
    context: &ScoreContext,
    error: &ScoreError,
    duration: Duration,
) {
    tracing::error!(
        target: "scorepipe::audit",
        event_type = "score_failed",
        job_id = %job_id,
        request_id = ?context.request_id,
        source = ?context.source,
        backend = ?error.backend(),
        duration_ms = duration.as_millis() as u64,
        error = %error,
        "Scoring job failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Item;

    #[test]
    fn test_score_audit_event_counts_fallbacks() {
        let scored = vec![
            ScoredItem::new(Item::new("a", "x"), 80, "relevant"),
            ScoredItem::new(Item::new("b", "y"), 0, NO_SCORE_REASON),
        ];

        let fallback_count = scored
            .iter()
            .filter(|s| s.score == 0 && s.reason == NO_SCORE_REASON)
            .count();
        assert_eq!(fallback_count, 1);
    }

    #[test]
    fn test_event_type() {
        let event = ScoreAuditEvent {
            timestamp: Utc::now(),
            job_id: "job-1".into(),
            request_id: None,
            source: None,
            item_count: 5,
            fallback_count: 0,
            duration_ms: 12,
        };
        assert_eq!(event.event_type(), "score_completed");
    }
}
