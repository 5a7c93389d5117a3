//! Cursor over one sorted input.

use std::cmp::Ordering;
use std::sync::Arc;

use super::comparer::KeyComparer;
use super::error::{MergeError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CursorState {
    NotStarted,
    Positioned,
    Exhausted,
}

/// Forward-only cursor over one sorted run.
///
/// Holds the run's iterator, the element it last produced and a handle to the
/// merge comparer so cursors can be ordered against each other. The iterator
/// is released as soon as the run is exhausted or the cursor is disposed.
pub struct SequenceCursor<T, I, C> {
    source: Option<I>,
    current: Option<T>,
    state: CursorState,
    comparer: Arc<C>,
    /// Position of the run in the merge input list.
    index: usize,
}

impl<T, I, C> SequenceCursor<T, I, C>
where
    I: Iterator<Item = T>,
    C: KeyComparer<T>,
{
    pub fn new(source: I, comparer: Arc<C>, index: usize) -> Self {
        Self {
            source: Some(source),
            current: None,
            state: CursorState::NotStarted,
            comparer,
            index,
        }
    }

    /// Advances to the next element. Returns false once the run is exhausted;
    /// the cursor then stays exhausted.
    pub fn move_next(&mut self) -> bool {
        let next = match self.source.as_mut() {
            Some(source) => source.next(),
            None => None,
        };
        match next {
            Some(item) => {
                self.current = Some(item);
                self.state = CursorState::Positioned;
                true
            }
            None => {
                self.current = None;
                self.state = CursorState::Exhausted;
                self.source = None;
                false
            }
        }
    }

    pub fn current(&self) -> Result<&T> {
        match (self.state, self.current.as_ref()) {
            (CursorState::NotStarted, _) => Err(MergeError::NotStarted),
            (CursorState::Exhausted, _) => Err(MergeError::Exhausted),
            (CursorState::Positioned, Some(item)) => Ok(item),
            // Element already handed out; the cursor must be advanced first.
            (CursorState::Positioned, None) => Err(MergeError::NotStarted),
        }
    }

    /// Moves the current element out. The cursor must be advanced before it
    /// is compared or queued again.
    pub(crate) fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    pub(crate) fn peek_current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Orders by current element. Cursors without one sort last.
    pub fn compare_to(&self, other: &Self) -> Ordering {
        match (self.current.as_ref(), other.current.as_ref()) {
            (Some(a), Some(b)) => self.comparer.compare(a, b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Releases the underlying iterator. Safe to call more than once.
    pub fn dispose(&mut self) {
        self.source = None;
        self.current = None;
        self.state = CursorState::Exhausted;
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Comparer that orders cursors by their current elements.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct CursorOrder;

impl<T, I, C> KeyComparer<SequenceCursor<T, I, C>> for CursorOrder
where
    I: Iterator<Item = T>,
    C: KeyComparer<T>,
{
    fn compare(&self, a: &SequenceCursor<T, I, C>, b: &SequenceCursor<T, I, C>) -> Ordering {
        a.compare_to(b)
    }
}
