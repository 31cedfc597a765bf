//! Prompt rendering seam.
//!
//! Prompt text quality is a concern of the caller; the pipeline only needs
//! *some* rendered prompt per batch. The default renderer serializes the
//! batch items and states the required response schema.

use crate::core::batch::Batch;
use crate::core::response::PAYLOAD_VERSION;

use std::fmt::Debug;

/// Renders the prompt string sent to the backend for one batch.
pub trait PromptRenderer: Send + Sync + Debug {
    /// Produces the prompt representing `batch`.
    fn render(&self, batch: &Batch) -> String;
}

/// Default renderer: scoring criteria, the batch items as JSON, and the
/// response schema requirement.
#[derive(Debug, Clone)]
pub struct DefaultPromptRenderer {
    criteria: String,
}

impl DefaultPromptRenderer {
    /// Creates a renderer with generic relevance criteria.
    pub fn new() -> Self {
        Self {
            criteria: "overall relevance and usefulness to the reader".to_string(),
        }
    }

    /// Sets the scoring criteria sentence.
    pub fn with_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.criteria = criteria.into();
        self
    }
}

impl Default for DefaultPromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer for DefaultPromptRenderer {
    fn render(&self, batch: &Batch) -> String {
        let items = serde_json::to_string_pretty(&batch.items).unwrap_or_else(|_| "[]".into());

        format!(
            "Score each of the following items from 0 to 100 for: {criteria}.\n\
             Give every item a score and a one-sentence reason.\n\n\
             Items:\n{items}\n\n\
             Respond with JSON only, following this schema exactly:\n\
             {{\"version\": \"{version}\", \"scores\": [{{\"item_id\": \"<id>\", \
             \"score\": <integer 0-100>, \"reason\": \"<string>\"}}]}}",
            criteria = self.criteria,
            items = items,
            version = PAYLOAD_VERSION,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{split_into_batches, Item};

    #[test]
    fn test_render_includes_items_and_schema() {
        let items = vec![
            Item::new("post1", "rust async patterns"),
            Item::new("post2", "celebrity gossip"),
        ];
        let batch = split_into_batches(&items, 10).remove(0);

        let prompt = DefaultPromptRenderer::new().render(&batch);

        assert!(prompt.contains("post1"));
        assert!(prompt.contains("rust async patterns"));
        assert!(prompt.contains("post2"));
        assert!(prompt.contains("\"version\": \"1.0\""));
        assert!(prompt.contains("item_id"));
    }

    #[test]
    fn test_custom_criteria() {
        let items = vec![Item::new("a", "x")];
        let batch = split_into_batches(&items, 10).remove(0);

        let prompt = DefaultPromptRenderer::new()
            .with_criteria("relevance to Rust programming")
            .render(&batch);

        assert!(prompt.contains("relevance to Rust programming"));
    }
}
