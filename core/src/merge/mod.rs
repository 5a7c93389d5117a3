//! K-way merge of sorted runs.
//!
//! Architecture:
//! - KeyComparer: Total order shared by every run of one merge
//! - PriorityQueue: Min-queue of cursors, at most one per key
//! - SequenceCursor: Current element and iterator of one run
//! - MergeEnumerator: Pulls cursors in key order, applies bounds, filter and dedup
//! - MergeManager: Registers runs and starts merges over them

mod comparer;
mod cursor;
mod enumerator;
mod error;
mod manager;
mod options;
mod queue;
mod sequence;

pub use comparer::{ByteComparer, KeyComparer, NaturalOrder};
pub use cursor::SequenceCursor;
pub use enumerator::{MergeEnumerator, MergeState, MergeStats};
pub use error::{MergeError, Result};
pub use manager::MergeManager;
pub use options::{KeyFilter, MergeOptions};
pub use queue::PriorityQueue;
pub use sequence::{SequenceIter, SortedRun, SortedSequence};
