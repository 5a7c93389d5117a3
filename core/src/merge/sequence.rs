//! Input sequences for a merge.
//!
//! A merge may run more than once over the same inputs, so an input is
//! something that can be opened repeatedly, each time yielding a fresh
//! forward-only iterator over its sorted items.

use std::ops::Deref;
use std::sync::Arc;

use super::comparer::KeyComparer;

/// Iterator handed out by [`SortedSequence::open`].
pub type SequenceIter<'a, T> = Box<dyn Iterator<Item = T> + 'a>;

/// A re-openable run of items sorted ascending under the merge comparer.
pub trait SortedSequence<T> {
    /// Opens a fresh iterator positioned before the first item.
    fn open(&self) -> SequenceIter<'_, T>;

    /// Opens an iterator that may skip items below `first_key`.
    ///
    /// Runs that can seek override this. Skipping is only an optimisation:
    /// the merge still checks the lower bound on every item it sees.
    fn open_from(&self, first_key: &T, comparer: &dyn KeyComparer<T>) -> SequenceIter<'_, T> {
        let _ = (first_key, comparer);
        self.open()
    }
}

/// First position in `items` whose element is not below `first_key`.
fn lower_bound<T>(items: &[T], first_key: &T, comparer: &dyn KeyComparer<T>) -> usize {
    items.partition_point(|item| comparer.compare(item, first_key).is_lt())
}

impl<T: Clone> SortedSequence<T> for [T] {
    fn open(&self) -> SequenceIter<'_, T> {
        Box::new(self.iter().cloned())
    }

    fn open_from(&self, first_key: &T, comparer: &dyn KeyComparer<T>) -> SequenceIter<'_, T> {
        let start = lower_bound(self, first_key, comparer);
        Box::new(self[start..].iter().cloned())
    }
}

impl<T: Clone> SortedSequence<T> for Vec<T> {
    fn open(&self) -> SequenceIter<'_, T> {
        self.as_slice().open()
    }

    fn open_from(&self, first_key: &T, comparer: &dyn KeyComparer<T>) -> SequenceIter<'_, T> {
        self.as_slice().open_from(first_key, comparer)
    }
}

impl<T, S> SortedSequence<T> for &S
where
    S: SortedSequence<T> + ?Sized,
{
    fn open(&self) -> SequenceIter<'_, T> {
        (**self).open()
    }

    fn open_from(&self, first_key: &T, comparer: &dyn KeyComparer<T>) -> SequenceIter<'_, T> {
        (**self).open_from(first_key, comparer)
    }
}

/// Immutable sorted run shared between merges.
///
/// Cloning only bumps a reference count, so the same run can be registered
/// with several managers (a snapshot component read by concurrent
/// enumerations, for instance).
#[derive(Debug)]
pub struct SortedRun<T> {
    items: Arc<[T]>,
}

impl<T> SortedRun<T> {
    /// Wraps already sorted items. Order is not checked here; the merge
    /// manager validates inputs when validation is compiled in.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Sorts `items` with `comparer` and drops later duplicates.
    pub fn from_unsorted<C>(mut items: Vec<T>, comparer: &C) -> Self
    where
        C: KeyComparer<T>,
    {
        items.sort_by(|a, b| comparer.compare(a, b));
        items.dedup_by(|later, earlier| comparer.compare(earlier, later).is_eq());
        Self::new(items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Clone for SortedRun<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Deref for SortedRun<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> From<Vec<T>> for SortedRun<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T: Clone> SortedSequence<T> for SortedRun<T> {
    fn open(&self) -> SequenceIter<'_, T> {
        self.items[..].open()
    }

    fn open_from(&self, first_key: &T, comparer: &dyn KeyComparer<T>) -> SequenceIter<'_, T> {
        self.items[..].open_from(first_key, comparer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::comparer::NaturalOrder;
    use std::fs::File;
    use std::io::{BufRead, BufReader, Write};
    use std::path::PathBuf;

    #[test]
    fn test_open_is_repeatable() {
        let run = SortedRun::new(vec![1, 2, 3]);
        let first: Vec<_> = run.open().collect();
        let second: Vec<_> = run.open().collect();
        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_open_from_seeks() {
        let run = SortedRun::new(vec![2, 4, 6, 8]);
        let from_five: Vec<_> = run.open_from(&5, &NaturalOrder).collect();
        assert_eq!(from_five, vec![6, 8]);

        let from_four: Vec<_> = run.open_from(&4, &NaturalOrder).collect();
        assert_eq!(from_four, vec![4, 6, 8]);

        let past_end: Vec<_> = run.open_from(&9, &NaturalOrder).collect();
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_from_unsorted_sorts_and_dedups() {
        let run = SortedRun::from_unsorted(vec![5, 1, 3, 1, 5], &NaturalOrder);
        assert_eq!(&run[..], &[1, 3, 5]);
        assert_eq!(run.len(), 3);
    }

    #[test]
    fn test_clone_shares_items() {
        let run = SortedRun::new(vec![String::from("a"), String::from("b")]);
        let copy = run.clone();
        assert!(std::ptr::eq(run.as_ptr(), copy.as_ptr()));
    }

    /// Run backed by a file with one number per line.
    struct LineFileRun {
        path: PathBuf,
    }

    impl SortedSequence<u64> for LineFileRun {
        fn open(&self) -> SequenceIter<'_, u64> {
            match File::open(&self.path) {
                Ok(file) => Box::new(
                    BufReader::new(file)
                        .lines()
                        .map_while(|line| line.ok())
                        .filter_map(|line| line.trim().parse().ok()),
                ),
                Err(_) => Box::new(std::iter::empty()),
            }
        }
    }

    #[test]
    fn test_file_backed_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run-0");
        let mut file = File::create(&path).unwrap();
        for v in [3u64, 10, 42] {
            writeln!(file, "{}", v).unwrap();
        }
        drop(file);

        let run = LineFileRun { path };
        let items: Vec<_> = run.open().collect();
        assert_eq!(items, vec![3, 10, 42]);
        // Default open_from does not seek.
        let items: Vec<_> = run.open_from(&10, &NaturalOrder).collect();
        assert_eq!(items, vec![3, 10, 42]);
    }
}
