use super::TileKey;
use crate::error::{PrefetchError, PrefetchResult};

/// Ordered pending tile keys for one layer, consumed last-in first-out.
///
/// Insertion order is preserved. The set is populated once and only shrinks
/// afterwards; there is no dedup, reordering or priority logic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileKeySet {
    keys: Vec<TileKey>,
}

impl TileKeySet {
    /// Creates an empty key set.
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Parses a key list, one key per line.
    ///
    /// Surrounding whitespace is trimmed; blank lines and lines starting with
    /// `#` are skipped.
    pub fn from_lines(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(TileKey::from)
            .collect()
    }

    /// Number of keys still pending.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no keys remain.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The key that `pop_last` would return next.
    pub fn last(&self) -> Option<&TileKey> {
        self.keys.last()
    }

    /// Removes and returns the most recently added remaining key.
    ///
    /// # Errors
    ///
    /// Returns [`PrefetchError::EmptyQueue`] when the set is empty.
    pub fn pop_last(&mut self) -> PrefetchResult<TileKey> {
        self.keys.pop().ok_or(PrefetchError::EmptyQueue)
    }

    /// Iterates the remaining keys in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TileKey> {
        self.keys.iter()
    }
}

impl FromIterator<TileKey> for TileKeySet {
    fn from_iter<I: IntoIterator<Item = TileKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<TileKey>> for TileKeySet {
    fn from(keys: Vec<TileKey>) -> Self {
        Self { keys }
    }
}
