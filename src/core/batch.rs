//! Batch splitting for scoring input.
//!
//! Batching is a pure partition: for N items and a maximum batch size B the
//! splitter yields exactly ⌈N / B⌉ non-empty batches whose concatenation, in
//! order, reconstructs the input. There is no failure mode.

use crate::core::types::Item;

/// A bounded, ordered, contiguous slice of the scoring input.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Zero-based position of this batch among all batches of the call.
    pub index: usize,

    /// Position of this batch's first item in the original input.
    pub offset: usize,

    /// The items of this batch, in input order. Never empty.
    pub items: Vec<Item>,
}

impl Batch {
    /// Returns the number of items in this batch.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the batch holds no items.
    ///
    /// The splitter never produces empty batches; this exists for
    /// completeness on hand-built values.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the ids of the items in this batch, in order.
    pub fn item_ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.id.as_str()).collect()
    }
}

/// Splits `items` into ordered batches of at most `max_batch_size` items.
///
/// `max_batch_size` is clamped to at least 1. Empty input yields zero
/// batches.
pub fn split_into_batches(items: &[Item], max_batch_size: usize) -> Vec<Batch> {
    let size = max_batch_size.max(1);

    items
        .chunks(size)
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            offset: index * size,
            items: chunk.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| Item::new(format!("item{i}"), format!("content {i}")))
            .collect()
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        assert!(split_into_batches(&[], 10).is_empty());
    }

    #[test]
    fn test_exact_partition_sizes() {
        let input = items(25);
        let batches = split_into_batches(&input, 10);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 10);
        assert_eq!(batches[1].len(), 10);
        assert_eq!(batches[2].len(), 5);
        assert_eq!(batches[0].offset, 0);
        assert_eq!(batches[1].offset, 10);
        assert_eq!(batches[2].offset, 20);
    }

    #[test]
    fn test_concatenation_reconstructs_input() {
        for n in [0usize, 1, 9, 10, 11, 25, 37] {
            for size in [1usize, 2, 5, 10, 12] {
                let input = items(n);
                let batches = split_into_batches(&input, size);

                let expected_count = n.div_ceil(size);
                assert_eq!(batches.len(), expected_count, "n={n} size={size}");

                let rejoined: Vec<Item> =
                    batches.iter().flat_map(|b| b.items.clone()).collect();
                assert_eq!(rejoined, input, "n={n} size={size}");

                for batch in &batches {
                    assert!(!batch.is_empty());
                    assert!(batch.len() <= size);
                }
            }
        }
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        let input = items(3);
        let batches = split_into_batches(&input, 0);

        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() == 1));
    }

    #[test]
    fn test_item_ids() {
        let input = items(2);
        let batches = split_into_batches(&input, 10);

        assert_eq!(batches[0].item_ids(), vec!["item0", "item1"]);
    }
}
