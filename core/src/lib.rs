//! Sorted sequence merge engine.
//!
//! Combines several runs, each sorted ascending under one comparer, into a
//! single ascending run without duplicate keys. Optional inclusive bounds and
//! a predicate restrict what comes out. Merging is lazy: nothing is read from
//! a run until the merged view is pulled.

pub mod merge;

pub use merge::{
    ByteComparer, KeyComparer, MergeEnumerator, MergeError, MergeManager, MergeOptions, NaturalOrder,
    SortedRun, SortedSequence,
};
