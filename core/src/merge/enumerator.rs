//! K-way merge over sorted runs.
//!
//! Each run gets a [`SequenceCursor`]. Cursors wait in a [`PriorityQueue`]
//! ordered by their current element; the queue never holds two cursors on
//! equal keys, so a cursor arriving on a key that is already queued skips it.
//! The enumerator pops the smallest cursor, yields its element, advances it
//! and queues it again.
//!
//! Duplicate handling is positional: the cursor that was queued first for a
//! key wins, and any later element equal to the last yielded one is dropped.
//! During start-up runs are queued in input order, so for keys at the head of
//! several runs the earliest run wins.

use std::iter::FusedIterator;
use std::sync::Arc;

use tracing::{debug, trace};

use super::comparer::KeyComparer;
use super::cursor::{CursorOrder, SequenceCursor};
use super::error::{MergeError, Result};
use super::options::MergeOptions;
use super::queue::PriorityQueue;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeState {
    NotStarted,
    Active,
    Exhausted,
}

/// Counters kept by one enumerator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub yielded: u64,
    /// Elements dropped because an equal key was queued or already yielded.
    pub duplicates: u64,
    /// Elements rejected by the predicate.
    pub filtered: u64,
    pub cursors_opened: u64,
    pub cursors_disposed: u64,
}

/// Where an element stands against the merge bounds and predicate.
enum Placement {
    Ready,
    BelowFirst,
    Filtered,
    PastLast,
}

/// Lazy, single-pass merge of sorted runs into one ascending, de-duplicated
/// sequence.
///
/// Runs are opened on the first call to `next`. Dropping the enumerator (or
/// calling [`dispose`](Self::dispose)) releases every run still open.
pub struct MergeEnumerator<T, I, C>
where
    I: Iterator<Item = T>,
    C: KeyComparer<T>,
{
    pending: Vec<I>,
    queue: PriorityQueue<SequenceCursor<T, I, C>, CursorOrder>,
    comparer: Arc<C>,
    options: MergeOptions<T>,
    state: MergeState,
    last: Option<T>,
    stats: MergeStats,
}

impl<T, I, C> MergeEnumerator<T, I, C>
where
    T: Clone,
    I: Iterator<Item = T>,
    C: KeyComparer<T>,
{
    pub fn new(sources: Vec<I>, comparer: C, options: MergeOptions<T>) -> Self {
        Self::with_shared_comparer(sources, Arc::new(comparer), options)
    }

    pub fn with_shared_comparer(sources: Vec<I>, comparer: Arc<C>, options: MergeOptions<T>) -> Self {
        let capacity = sources.len();
        Self {
            pending: sources,
            queue: PriorityQueue::with_capacity(CursorOrder, capacity),
            comparer,
            options,
            state: MergeState::NotStarted,
            last: None,
            stats: MergeStats::default(),
        }
    }

    pub fn state(&self) -> MergeState {
        self.state
    }

    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    /// Number of runs currently waiting in the queue.
    pub fn resident_cursors(&self) -> usize {
        self.queue.count()
    }

    /// The most recently yielded item.
    pub fn current(&self) -> Result<&T> {
        self.last.as_ref().ok_or(MergeError::NotStarted)
    }

    /// Stops the merge and releases every open run. Further calls to `next`
    /// return `None`.
    pub fn dispose(&mut self) {
        if self.state == MergeState::Exhausted && self.queue.is_empty() && self.pending.is_empty() {
            return;
        }
        self.state = MergeState::Exhausted;

        // Runs that were never opened only need dropping.
        self.pending.clear();
        let mut released = 0;
        for mut cursor in self.queue.drain() {
            cursor.dispose();
            released += 1;
        }
        self.stats.cursors_disposed += released;

        debug!(
            yielded = self.stats.yielded,
            duplicates = self.stats.duplicates,
            filtered = self.stats.filtered,
            cursors_opened = self.stats.cursors_opened,
            cursors_disposed = self.stats.cursors_disposed,
            "merge finished"
        );
    }

    fn initialize(&mut self) {
        self.state = MergeState::Active;
        let sources = std::mem::take(&mut self.pending);
        debug!(
            sources = sources.len(),
            first_key = self.options.first_key.is_some(),
            last_key = self.options.last_key.is_some(),
            filter = self.options.filter.is_some(),
            "starting merge"
        );

        for (index, source) in sources.into_iter().enumerate() {
            let mut cursor = SequenceCursor::new(source, Arc::clone(&self.comparer), index);
            self.stats.cursors_opened += 1;
            if cursor.move_next() {
                self.enqueue(cursor);
            } else {
                self.retire(cursor);
            }
        }
    }

    fn classify(&self, item: &T) -> Placement {
        if let Some(first) = &self.options.first_key {
            if self.comparer.compare(item, first).is_lt() {
                return Placement::BelowFirst;
            }
        }
        if let Some(last) = &self.options.last_key {
            if self.comparer.compare(item, last).is_gt() {
                return Placement::PastLast;
            }
        }
        if !self.options.accepts(item) {
            return Placement::Filtered;
        }
        Placement::Ready
    }

    /// Advances `cursor` to its next element that lies within the bounds and
    /// passes the predicate. Returns false if the run has nothing left to
    /// contribute.
    fn position(&mut self, cursor: &mut SequenceCursor<T, I, C>) -> bool {
        loop {
            let placement = match cursor.peek_current() {
                Some(item) => self.classify(item),
                None => return false,
            };
            match placement {
                Placement::Ready => return true,
                Placement::PastLast => return false,
                Placement::BelowFirst => {}
                Placement::Filtered => self.stats.filtered += 1,
            }
            if !cursor.move_next() {
                return false;
            }
        }
    }

    /// Queues a cursor that sits on an element, skipping elements whose key
    /// is already queued by another run.
    fn enqueue(&mut self, mut cursor: SequenceCursor<T, I, C>) {
        loop {
            if !self.position(&mut cursor) {
                self.retire(cursor);
                return;
            }
            match self.queue.try_push(cursor) {
                Ok(()) => return,
                Err(mut rejected) => {
                    self.stats.duplicates += 1;
                    trace!(source = rejected.index(), "key already queued, skipping");
                    if !rejected.move_next() {
                        self.retire(rejected);
                        return;
                    }
                    cursor = rejected;
                }
            }
        }
    }

    fn retire(&mut self, mut cursor: SequenceCursor<T, I, C>) {
        cursor.dispose();
        self.stats.cursors_disposed += 1;
        trace!(source = cursor.index(), "run released");
    }
}

impl<T, I, C> Iterator for MergeEnumerator<T, I, C>
where
    T: Clone,
    I: Iterator<Item = T>,
    C: KeyComparer<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self.state {
            MergeState::NotStarted => self.initialize(),
            MergeState::Active => {}
            MergeState::Exhausted => return None,
        }

        loop {
            let Ok(mut cursor) = self.queue.pop() else {
                self.dispose();
                return None;
            };
            let Some(candidate) = cursor.take_current() else {
                self.retire(cursor);
                continue;
            };

            if cursor.move_next() {
                self.enqueue(cursor);
            } else {
                self.retire(cursor);
            }

            // Upper bound is checked before the predicate: anything past it
            // ends the merge.
            if let Some(last) = &self.options.last_key {
                if self.comparer.compare(&candidate, last).is_gt() {
                    self.dispose();
                    return None;
                }
            }

            if !self.options.accepts(&candidate) {
                self.stats.filtered += 1;
                continue;
            }

            if let Some(previous) = &self.last {
                let order = self.comparer.compare(previous, &candidate);
                debug_assert!(order.is_le(), "merge input is not sorted");
                if !order.is_lt() {
                    self.stats.duplicates += 1;
                    trace!("duplicate of last yielded key dropped");
                    continue;
                }
            }

            self.last = Some(candidate.clone());
            self.stats.yielded += 1;
            return Some(candidate);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            MergeState::Exhausted => (0, Some(0)),
            _ => (0, None),
        }
    }
}

impl<T, I, C> FusedIterator for MergeEnumerator<T, I, C>
where
    T: Clone,
    I: Iterator<Item = T>,
    C: KeyComparer<T>,
{
}

impl<T, I, C> Drop for MergeEnumerator<T, I, C>
where
    I: Iterator<Item = T>,
    C: KeyComparer<T>,
{
    fn drop(&mut self) {
        if self.state == MergeState::NotStarted {
            return;
        }
        self.pending.clear();
        let mut released = 0;
        for mut cursor in self.queue.drain() {
            cursor.dispose();
            released += 1;
        }
        if released > 0 {
            self.stats.cursors_disposed += released;
            debug!(released, "merge dropped with open runs");
        }
    }
}
