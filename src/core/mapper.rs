//! Maps parsed backend responses back onto the items of a batch.
//!
//! Mapping never fails: per-item problems are recovered locally. Items the
//! backend skipped get a fallback score of 0 with an explanatory reason,
//! out-of-range scores are clamped into `[0, 100]`, and entries referencing
//! unknown item ids are dropped. Each recovery is logged.

use crate::core::batch::Batch;
use crate::core::response::{ScoreEntry, ScorePayload};
use crate::core::types::ScoredItem;

use std::collections::HashMap;

/// Reason attached to items the backend did not score.
pub const NO_SCORE_REASON: &str = "no score provided by model";

/// Maps a payload onto the items of `batch`, in batch order.
///
/// Always returns exactly one [`ScoredItem`] per item in the batch.
pub fn map_payload(batch: &Batch, payload: &ScorePayload) -> Vec<ScoredItem> {
    let mut by_id: HashMap<&str, &ScoreEntry> = HashMap::with_capacity(payload.scores.len());
    for entry in &payload.scores {
        if batch.items.iter().any(|i| i.id == entry.item_id) {
            by_id.insert(entry.item_id.as_str(), entry);
        } else {
            tracing::warn!(
                batch_index = batch.index,
                item_id = %entry.item_id,
                "Response references an item not in the batch, ignoring entry"
            );
        }
    }

    if by_id.len() < batch.len() {
        tracing::warn!(
            batch_index = batch.index,
            expected = batch.len(),
            received = by_id.len(),
            "Backend scored fewer items than submitted, filling defaults"
        );
    }

    batch
        .items
        .iter()
        .map(|item| match by_id.get(item.id.as_str()) {
            Some(entry) => ScoredItem::new(
                item.clone(),
                clamp_score(entry.score, batch.index, &item.id),
                entry.reason.clone(),
            ),
            None => {
                tracing::warn!(
                    batch_index = batch.index,
                    item_id = %item.id,
                    "No score provided for item, using default"
                );
                ScoredItem::new(item.clone(), 0, NO_SCORE_REASON)
            }
        })
        .collect()
}

/// Forces a raw score into `[0, 100]`, logging when it was out of range.
fn clamp_score(raw: i64, batch_index: usize, item_id: &str) -> u8 {
    if !(0..=100).contains(&raw) {
        tracing::warn!(
            batch_index = batch_index,
            item_id = %item_id,
            raw_score = raw,
            "Score out of range, clamping into [0, 100]"
        );
    }
    raw.clamp(0, 100) as u8
}
