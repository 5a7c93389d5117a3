//! Entry point for merging sorted runs.

use std::sync::Arc;

use super::comparer::KeyComparer;
use super::enumerator::MergeEnumerator;
use super::error::Result;
#[cfg(any(debug_assertions, feature = "validate-input"))]
use super::error::MergeError;
use super::options::MergeOptions;
use super::sequence::{SequenceIter, SortedSequence};

/// Collects sorted runs and hands out merged views over them.
///
/// Each call to [`merge`](Self::merge) opens every run again, so the runs must
/// be re-openable. With validation compiled in (debug builds, or the
/// `validate-input` feature) `add` walks the run once and rejects input that
/// is not strictly ascending.
pub struct MergeManager<'a, T, C> {
    sources: Vec<Box<dyn SortedSequence<T> + 'a>>,
    comparer: Arc<C>,
    options: MergeOptions<T>,
}

impl<'a, T, C> MergeManager<'a, T, C>
where
    T: Clone,
    C: KeyComparer<T>,
{
    pub fn new(comparer: C) -> Self {
        Self::with_options(comparer, MergeOptions::default())
    }

    pub fn with_options(comparer: C, options: MergeOptions<T>) -> Self {
        Self {
            sources: Vec::new(),
            comparer: Arc::new(comparer),
            options,
        }
    }

    pub fn first_key(mut self, key: T) -> Self {
        self.options.first_key = Some(key);
        self
    }

    pub fn last_key(mut self, key: T) -> Self {
        self.options.last_key = Some(key);
        self
    }

    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.options = self.options.filter(filter);
        self
    }

    pub fn options(&self) -> &MergeOptions<T> {
        &self.options
    }

    /// Registers one sorted run.
    pub fn add<S>(&mut self, sequence: S) -> Result<()>
    where
        S: SortedSequence<T> + 'a,
    {
        #[cfg(any(debug_assertions, feature = "validate-input"))]
        self.validate(&sequence)?;

        self.sources.push(Box::new(sequence));
        Ok(())
    }

    #[cfg(any(debug_assertions, feature = "validate-input"))]
    fn validate<S>(&self, sequence: &S) -> Result<()>
    where
        S: SortedSequence<T>,
    {
        let mut previous: Option<T> = None;
        for (index, item) in sequence.open().enumerate() {
            if let Some(prev) = &previous {
                if !self.comparer.compare(prev, &item).is_lt() {
                    return Err(MergeError::UnsortedInput {
                        sequence: self.sources.len(),
                        index,
                    });
                }
            }
            previous = Some(item);
        }
        Ok(())
    }

    /// Starts a new lazy merge over every registered run.
    pub fn merge(&self) -> MergeEnumerator<T, SequenceIter<'_, T>, C> {
        let comparer: &dyn KeyComparer<T> = &*self.comparer;
        let iters = self
            .sources
            .iter()
            .map(|source| match &self.options.first_key {
                Some(first) => (**source).open_from(first, comparer),
                None => (**source).open(),
            })
            .collect();
        MergeEnumerator::with_shared_comparer(iters, Arc::clone(&self.comparer), self.options.clone())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::comparer::{ByteComparer, NaturalOrder};
    use crate::merge::enumerator::MergeState;
    use crate::merge::sequence::SortedRun;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::cell::Cell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Row {
        key: u32,
        payload: &'static str,
    }

    fn row(key: u32, payload: &'static str) -> Row {
        Row { key, payload }
    }

    fn by_key(a: &Row, b: &Row) -> std::cmp::Ordering {
        a.key.cmp(&b.key)
    }

    /// Run that counts how many of its iterators have been dropped.
    struct TrackedRun {
        items: Vec<u32>,
        opened: Rc<Cell<usize>>,
        released: Rc<Cell<usize>>,
    }

    struct TrackedIter {
        inner: std::vec::IntoIter<u32>,
        released: Rc<Cell<usize>>,
    }

    impl Iterator for TrackedIter {
        type Item = u32;

        fn next(&mut self) -> Option<u32> {
            self.inner.next()
        }
    }

    impl Drop for TrackedIter {
        fn drop(&mut self) {
            self.released.set(self.released.get() + 1);
        }
    }

    impl SortedSequence<u32> for TrackedRun {
        fn open(&self) -> SequenceIter<'_, u32> {
            self.opened.set(self.opened.get() + 1);
            Box::new(TrackedIter {
                inner: self.items.clone().into_iter(),
                released: Rc::clone(&self.released),
            })
        }
    }

    #[test]
    fn test_merge_two_runs() {
        let mut manager = MergeManager::new(NaturalOrder);
        manager.add(vec![1u32, 3, 5]).unwrap();
        manager.add(vec![2u32, 3, 4]).unwrap();
        let merged: Vec<_> = manager.merge().collect();
        assert_eq!(merged, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_merge_with_bounds() {
        let mut manager = MergeManager::new(NaturalOrder).first_key(2u32).last_key(2);
        manager.add(vec![1u32, 2, 3]).unwrap();
        assert_eq!(manager.merge().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_merge_with_filter() {
        let mut manager = MergeManager::new(NaturalOrder).filter(|v: &u32| v % 2 == 0);
        manager.add(SortedRun::new(vec![1u32, 2, 3, 4, 5])).unwrap();
        assert_eq!(manager.merge().collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_merge_empty_runs() {
        let mut manager: MergeManager<'_, u32, _> = MergeManager::new(NaturalOrder);
        assert!(manager.merge().next().is_none());

        manager.add(Vec::<u32>::new()).unwrap();
        manager.add(Vec::<u32>::new()).unwrap();
        assert_eq!(manager.len(), 2);
        let mut merge = manager.merge();
        assert_eq!(merge.next(), None);
        assert_eq!(merge.state(), MergeState::Exhausted);
    }

    #[test]
    fn test_same_key_in_three_runs() {
        let mut manager = MergeManager::new(by_key);
        manager.add(vec![row(1, "a"), row(7, "a")]).unwrap();
        manager.add(vec![row(7, "b"), row(9, "b")]).unwrap();
        manager.add(vec![row(7, "c")]).unwrap();

        let merged: Vec<_> = manager.merge().collect();
        let keys: Vec<_> = merged.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![1, 7, 9]);
    }

    #[test]
    fn test_first_registered_run_wins_at_head() {
        let mut manager = MergeManager::new(by_key);
        manager.add(vec![row(7, "first")]).unwrap();
        manager.add(vec![row(7, "second")]).unwrap();
        manager.add(vec![row(7, "third")]).unwrap();

        let merged: Vec<_> = manager.merge().collect();
        assert_eq!(merged, vec![row(7, "first")]);
    }

    #[test]
    fn test_borrowed_runs() {
        let older = SortedRun::new(vec![b"apple".to_vec(), b"cherry".to_vec()]);
        let newer = vec![b"apple".to_vec(), b"banana".to_vec()];

        let mut manager = MergeManager::new(ByteComparer);
        manager.add(&older).unwrap();
        manager.add(&newer).unwrap();

        let merged: Vec<_> = manager.merge().collect();
        assert_eq!(
            merged,
            vec![b"apple".to_vec(), b"banana".to_vec(), b"cherry".to_vec()]
        );
    }

    #[test]
    fn test_remerge_is_idempotent() {
        let mut manager = MergeManager::new(NaturalOrder).first_key(3u32);
        manager.add(SortedRun::new(vec![1u32, 4, 9])).unwrap();
        manager.add(SortedRun::new(vec![3u32, 4, 10])).unwrap();

        let first: Vec<_> = manager.merge().collect();
        let second: Vec<_> = manager.merge().collect();
        assert_eq!(first, vec![3, 4, 9, 10]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_partial_merge_releases_every_run() {
        let opened = Rc::new(Cell::new(0));
        let released = Rc::new(Cell::new(0));
        let mut manager = MergeManager::new(NaturalOrder);
        for items in [vec![1u32, 4, 7], vec![2, 5, 8], vec![3, 6, 9]] {
            manager
                .add(TrackedRun {
                    items,
                    opened: Rc::clone(&opened),
                    released: Rc::clone(&released),
                })
                .unwrap();
        }
        // Validation walks each run once in debug builds.
        let opened_by_add = opened.get();
        released.set(0);

        {
            let mut merge = manager.merge();
            assert_eq!(merge.next(), Some(1));
            assert_eq!(merge.next(), Some(2));
        }
        assert_eq!(opened.get() - opened_by_add, 3);
        assert_eq!(released.get(), 3);
    }

    #[cfg(any(debug_assertions, feature = "validate-input"))]
    #[test]
    fn test_add_rejects_unsorted_run() {
        use crate::merge::error::MergeError;

        let mut manager = MergeManager::new(NaturalOrder);
        manager.add(vec![1u32, 2]).unwrap();
        assert_eq!(
            manager.add(vec![1u32, 5, 4]),
            Err(MergeError::UnsortedInput {
                sequence: 1,
                index: 2
            })
        );
        assert_eq!(
            manager.add(vec![1u32, 1]),
            Err(MergeError::UnsortedInput {
                sequence: 1,
                index: 1
            })
        );
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_random_runs_match_reference() {
        let mut rng = StdRng::seed_from_u64(0x5eed_2024);

        for _ in 0..64 {
            let run_count = rng.gen_range(0..6);
            let runs: Vec<Vec<u32>> = (0..run_count)
                .map(|_| {
                    let len = rng.gen_range(0..40);
                    let keys: BTreeSet<u32> = (0..len).map(|_| rng.gen_range(0..100)).collect();
                    keys.into_iter().collect()
                })
                .collect();
            let first = rng.gen_range(0..50u32);
            let last = first + rng.gen_range(0..60u32);
            let modulus = rng.gen_range(1..4u32);

            let mut manager = MergeManager::new(NaturalOrder)
                .first_key(first)
                .last_key(last)
                .filter(move |v: &u32| v % modulus == 0);
            for run in &runs {
                manager.add(run).unwrap();
            }
            let merged: Vec<_> = manager.merge().collect();

            let expected: Vec<u32> = runs
                .iter()
                .flatten()
                .copied()
                .filter(|v| *v >= first && *v <= last && v % modulus == 0)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            assert_eq!(merged, expected);
            assert!(merged.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
