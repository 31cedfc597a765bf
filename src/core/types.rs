//! Core types used throughout the scorepipe library.
//!
//! This module defines the fundamental data structures for representing
//! items to score, scored results, call context, and health snapshots.

use crate::core::cancel::CancelToken;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single text item submitted for relevance scoring.
///
/// Items are immutable once submitted. The `id` must be non-empty and
/// unique within one scoring call; it is how backend responses are mapped
/// back onto items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Caller-assigned identifier, unique within a call.
    pub id: String,

    /// The text content to score.
    pub content: String,

    /// Additional custom metadata as key-value pairs.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Item {
    /// Creates a new item with the given id and content.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Adds a custom metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// An item together with its relevance score and explanation.
///
/// One `ScoredItem` is produced per submitted [`Item`], in input order.
/// Items the backend failed to score carry a score of 0 and an explanatory
/// reason instead of a backend-provided one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    /// The original item.
    pub item: Item,

    /// Relevance score in `[0, 100]`.
    pub score: u8,

    /// Explanation for the score.
    pub reason: String,
}

impl ScoredItem {
    /// Creates a new scored item.
    pub fn new(item: Item, score: u8, reason: impl Into<String>) -> Self {
        Self {
            item,
            score,
            reason: reason.into(),
        }
    }
}

/// Context information for a scoring call.
///
/// This carries metadata about who requested the scoring and why, plus the
/// cancellation token that every derived batch call observes.
#[derive(Debug, Clone, Default)]
pub struct ScoreContext {
    /// Request or correlation ID for tracing.
    pub request_id: Option<String>,

    /// Source of the call (e.g., "feed-ranker", "search", "api").
    pub source: Option<String>,

    /// Additional custom metadata as key-value pairs.
    pub metadata: HashMap<String, String>,

    /// Cancellation token observed by every batch dispatched for this call.
    pub cancel: CancelToken,
}

impl ScoreContext {
    /// Creates a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Sets the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a custom metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Sets the cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Read-only health snapshot exposed for monitoring integration.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// `false` while the circuit is open.
    pub healthy: bool,

    /// Current circuit state name ("closed", "open", "half_open").
    pub circuit_state: crate::circuit_breaker::CircuitState,

    /// Rolling counters for the current measurement interval.
    pub counts: crate::circuit_breaker::Counts,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "healthy={} circuit={} requests={} failures={}",
            self.healthy,
            self.circuit_state.name(),
            self.counts.requests,
            self.counts.total_failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_builder() {
        let item = Item::new("post1", "rust async patterns").with_metadata("lang", "en");

        assert_eq!(item.id, "post1");
        assert_eq!(item.content, "rust async patterns");
        assert_eq!(item.metadata.get("lang"), Some(&"en".to_string()));
    }

    #[test]
    fn test_scored_item() {
        let item = Item::new("post1", "content");
        let scored = ScoredItem::new(item.clone(), 87, "highly relevant");

        assert_eq!(scored.item, item);
        assert_eq!(scored.score, 87);
        assert_eq!(scored.reason, "highly relevant");
    }

    #[test]
    fn test_score_context_builder() {
        let ctx = ScoreContext::new()
            .with_request_id("req-42")
            .with_source("feed-ranker")
            .with_metadata("env", "production");

        assert_eq!(ctx.request_id, Some("req-42".into()));
        assert_eq!(ctx.source, Some("feed-ranker".into()));
        assert_eq!(ctx.metadata.get("env"), Some(&"production".to_string()));
        assert!(!ctx.cancel.is_cancelled());
    }
}
