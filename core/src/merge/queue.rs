//! Priority queue used to pick the next cursor of a merge.
//!
//! Entries live in a vector sorted in descending order, so the minimum sits at
//! the tail and `pop` is O(1). Insertion is a binary search plus a shift, which
//! is cheap for the handful of sorted runs a merge combines, and it lets the
//! queue detect equal priorities exactly: two entries that compare equal are
//! never resident together.

use std::cmp::Ordering;

use super::comparer::KeyComparer;
use super::error::{MergeError, Result};

/// Min-queue ordered by a caller-supplied comparer.
pub struct PriorityQueue<T, C> {
    entries: Vec<T>,
    comparer: C,
}

impl<T, C> PriorityQueue<T, C>
where
    C: KeyComparer<T>,
{
    pub fn new(comparer: C) -> Self {
        Self {
            entries: Vec::new(),
            comparer,
        }
    }

    pub fn with_capacity(comparer: C, capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            comparer,
        }
    }

    /// Slot for `item`, or `None` if an equal entry is already queued.
    fn slot(&self, item: &T) -> Option<usize> {
        // Descending order: a larger probe sits before the item.
        self.entries
            .binary_search_by(|probe| match self.comparer.compare(probe, item) {
                Ordering::Less => Ordering::Greater,
                Ordering::Greater => Ordering::Less,
                Ordering::Equal => Ordering::Equal,
            })
            .err()
    }

    /// Inserts `item`, failing if an entry with an equal priority is queued.
    pub fn push(&mut self, item: T) -> Result<()> {
        self.try_push(item).map_err(|_| MergeError::DuplicateKey)
    }

    /// Inserts `item`, or hands it back when an equal priority is queued.
    pub fn try_push(&mut self, item: T) -> std::result::Result<(), T> {
        match self.slot(&item) {
            Some(idx) => {
                self.entries.insert(idx, item);
                Ok(())
            }
            None => Err(item),
        }
    }

    pub fn peek(&self) -> Result<&T> {
        self.entries.last().ok_or(MergeError::EmptyQueue)
    }

    pub fn pop(&mut self) -> Result<T> {
        self.entries.pop().ok_or(MergeError::EmptyQueue)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry, smallest first.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.entries.drain(..).rev()
    }
}
