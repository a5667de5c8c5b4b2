//! Maps batch-local statement indexes back to positions in the caller's request sequence.
use crate::bulk::request::WriteRequest;

use std::cmp::Ordering;

/// A run of `count` consecutive batch indexes starting at `index`, mapping onto consecutive
/// original indexes starting at `original_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub index: usize,
    pub original_index: usize,
    pub count: usize,
}

impl IndexRange {
    pub fn new(index: usize, original_index: usize, count: usize) -> IndexRange {
        IndexRange {
            index: index,
            original_index: original_index,
            count: count,
        }
    }

    fn contains(&self, index: usize) -> bool {
        index >= self.index && index < self.index + self.count
    }

    /// Whether the pair directly continues this range.
    fn continues_with(&self, index: usize, original_index: usize) -> bool {
        index == self.index + self.count && original_index == self.original_index + self.count
    }
}

/// Batch index to original index mapping.
///
/// Ordered batches are always one contiguous range. Batches of an unordered bulk write are
/// grouped by request type and may need several ranges, which are looked up by binary search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexMap {
    RangeBased(IndexRange),
    Composite(Vec<IndexRange>),
}

impl Default for IndexMap {
    fn default() -> IndexMap {
        IndexMap::new()
    }
}

impl IndexMap {
    /// An empty mapping.
    pub fn new() -> IndexMap {
        IndexMap::RangeBased(IndexRange::new(0, 0, 0))
    }

    /// A mapping for a single contiguous range.
    pub fn range(index: usize, original_index: usize, count: usize) -> IndexMap {
        IndexMap::RangeBased(IndexRange::new(index, original_index, count))
    }

    /// Builds the mapping for the items of one batch, in batch order.
    pub fn from_requests(requests: &[WriteRequest]) -> IndexMap {
        let mut index_map = IndexMap::new();
        for (index, request) in requests.iter().enumerate() {
            index_map.add(index, request.original_index());
        }
        index_map
    }

    /// Records that batch index `index` came from `original_index`.
    pub fn add(&mut self, index: usize, original_index: usize) {
        let converted = match *self {
            IndexMap::RangeBased(ref mut range) => {
                if range.count == 0 {
                    *range = IndexRange::new(index, original_index, 1);
                    return;
                }

                if range.continues_with(index, original_index) {
                    range.count += 1;
                    return;
                }

                vec![*range, IndexRange::new(index, original_index, 1)]
            }
            IndexMap::Composite(ref mut ranges) => {
                let extends = ranges.last()
                    .map_or(false, |last| last.continues_with(index, original_index));

                if extends {
                    if let Some(last) = ranges.last_mut() {
                        last.count += 1;
                    }
                } else {
                    ranges.push(IndexRange::new(index, original_index, 1));
                }
                return;
            }
        };

        *self = IndexMap::Composite(converted);
    }

    /// Maps a batch index to its original index, or `None` if the index is not part of the
    /// batch.
    pub fn map(&self, index: usize) -> Option<usize> {
        let ranges = match *self {
            IndexMap::RangeBased(ref range) => std::slice::from_ref(range),
            IndexMap::Composite(ref ranges) => &ranges[..],
        };

        // Ranges are added in increasing batch index order and never overlap.
        let position = ranges.binary_search_by(|range| {
            if range.contains(index) {
                Ordering::Equal
            } else if range.index > index {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }).ok()?;

        let range = &ranges[position];
        Some(range.original_index + (index - range.index))
    }

    /// The number of indexes covered.
    pub fn len(&self) -> usize {
        match *self {
            IndexMap::RangeBased(ref range) => range.count,
            IndexMap::Composite(ref ranges) => ranges.iter().map(|range| range.count).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
