//! Range bounds and predicate applied while merging.

use std::fmt;
use std::sync::Arc;

/// Predicate an item must satisfy to be yielded.
pub type KeyFilter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Per-merge filtering configuration.
///
/// Both bounds are inclusive. The options are fixed once a merge starts; a
/// manager clones them into every enumerator it creates.
pub struct MergeOptions<T> {
    pub first_key: Option<T>,
    pub last_key: Option<T>,
    pub filter: Option<KeyFilter<T>>,
}

impl<T> MergeOptions<T> {
    pub fn new() -> Self {
        Self {
            first_key: None,
            last_key: None,
            filter: None,
        }
    }

    pub fn first_key(mut self, key: T) -> Self {
        self.first_key = Some(key);
        self
    }

    pub fn last_key(mut self, key: T) -> Self {
        self.last_key = Some(key);
        self
    }

    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub(crate) fn accepts(&self, item: &T) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(item))
    }
}

impl<T> Default for MergeOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for MergeOptions<T> {
    fn clone(&self) -> Self {
        Self {
            first_key: self.first_key.clone(),
            last_key: self.last_key.clone(),
            filter: self.filter.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for MergeOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeOptions")
            .field("first_key", &self.first_key)
            .field("last_key", &self.last_key)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
