//! Key comparers.
//!
//! A comparer defines the total order shared by every input of one merge. It
//! orders cursors in the priority queue, decides which items are duplicates
//! and checks the range bounds, so it must be the same order the inputs were
//! sorted with.

use std::cmp::Ordering;

/// Total order over merge items.
pub trait KeyComparer<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T: ?Sized, F> KeyComparer<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Orders items by their own `Ord` impl.
#[derive(Clone, Copy, Debug, Default)]
pub struct NaturalOrder;

impl<T: Ord + ?Sized> KeyComparer<T> for NaturalOrder {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Lexicographic byte order. A proper prefix sorts before the longer key.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByteComparer;

impl<T: AsRef<[u8]> + ?Sized> KeyComparer<T> for ByteComparer {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        let (a, b) = (a.as_ref(), b.as_ref());
        let common = a.len().min(b.len());
        for i in 0..common {
            match a[i].cmp(&b[i]) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        a.len().cmp(&b.len())
    }
}
