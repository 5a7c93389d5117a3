//! Errors raised by the merge engine.
//!
//! Every variant is a caller contract violation: nothing here is transient and
//! nothing is retried internally.

use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, MergeError>;

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum MergeError {
    /// `peek` or `pop` on an empty priority queue.
    #[error("priority queue is empty")]
    EmptyQueue,

    /// Unconditional `push` of an item whose priority is already queued.
    #[error("an item with an equal key is already queued")]
    DuplicateKey,

    /// An added sequence is not strictly ascending.
    #[error("sequence {sequence} is not strictly ascending at index {index}")]
    UnsortedInput { sequence: usize, index: usize },

    /// `current` requested before the first successful advance.
    #[error("enumeration has not started")]
    NotStarted,

    /// `current` requested on a cursor that ran off its sequence.
    #[error("cursor is exhausted")]
    Exhausted,
}
