//! Pull iteration over write requests with carry-over between batches.
use crate::error::{Error, Result};
use std::vec;

/// An item that did not fit in the previous batch, together with the bytes it was already
/// serialized to so the next batch can reuse them.
#[derive(Debug, Clone, PartialEq)]
pub struct Overflow<T> {
    pub item: T,
    pub state: Vec<u8>,
}

/// A source of items that a serializer consumes one batch at a time.
///
/// A batchable source wraps a live iterator and may be split across any number of batches. A
/// fixed list must be sent as one batch and does not support item-by-item iteration.
pub struct BatchableSource<T, I = vec::IntoIter<T>>
where
    I: Iterator<Item = T>,
{
    items: I,
    can_be_split: bool,
    current: Option<T>,
    overflow: Option<Overflow<T>>,
    has_more: bool,
}

impl<T> BatchableSource<T> {
    /// Wraps a list that must be sent as a single batch.
    pub fn from_list(items: Vec<T>) -> BatchableSource<T> {
        BatchableSource {
            items: items.into_iter(),
            can_be_split: false,
            current: None,
            overflow: None,
            has_more: true,
        }
    }
}

impl<T, I> BatchableSource<T, I>
where
    I: Iterator<Item = T>,
{
    /// Wraps an iterator whose items may be spread over several batches.
    pub fn new(items: I) -> BatchableSource<T, I> {
        BatchableSource {
            items: items,
            can_be_split: true,
            current: None,
            overflow: None,
            has_more: true,
        }
    }

    pub fn can_be_split(&self) -> bool {
        self.can_be_split
    }

    /// Whether another batch remains to be produced.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Advances to the next item, returning whether there was one.
    pub fn move_next(&mut self) -> Result<bool> {
        if !self.can_be_split {
            return Err(Error::OperationError(String::from(
                "A fixed list source cannot be iterated item by item.",
            )));
        }

        self.current = self.items.next();
        Ok(self.current.is_some())
    }

    /// The item most recently produced by `move_next`.
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Takes ownership of the current item.
    pub fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    /// Begins a batch, yielding the item left over from the previous one, if any.
    pub fn start_batch(&mut self) -> Option<Overflow<T>> {
        self.overflow.take()
    }

    /// Ends a batch. The source has more to give exactly when an item overflowed.
    pub fn end_batch(&mut self, overflow: Option<Overflow<T>>) {
        self.has_more = overflow.is_some();
        self.overflow = overflow;
    }

    /// Drains every item not yet placed in a batch, the pending overflow first.
    pub fn get_remaining_items(&mut self) -> Vec<T> {
        let mut remaining = Vec::new();

        if let Some(overflow) = self.overflow.take() {
            remaining.push(overflow.item);
        }

        if let Some(current) = self.current.take() {
            remaining.push(current);
        }

        remaining.extend(&mut self.items);
        self.has_more = false;
        remaining
    }
}
