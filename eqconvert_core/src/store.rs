use crate::protocol::{ContentHash, HashError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entry index {index} out of range (count={count})")]
    IndexOutOfRange { index: usize, count: usize },
}

/// One selected EQ: the backend hash plus the name shown on its tab.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqEntry {
    hash: ContentHash,
    name: String,
}

impl EqEntry {
    /// Fails when `hash` is not exactly 128 characters; a rejected entry is
    /// never stored.
    pub fn new(hash: &str, name: impl Into<String>) -> Result<Self, HashError> {
        Ok(Self {
            hash: ContentHash::parse(hash)?,
            name: name.into(),
        })
    }

    pub fn from_hash(hash: ContentHash, name: impl Into<String>) -> Self {
        Self {
            hash,
            name: name.into(),
        }
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered collection of the currently selected EQs.
///
/// Insertion order is display order is tab order. Duplicate hashes are legal
/// (they produce duplicate tabs). The only way to shrink is `reset`.
#[derive(Debug, Default)]
pub struct SessionStore {
    items: Vec<EqEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.items.clear();
    }

    pub fn append(&mut self, entry: EqEntry) {
        self.items.push(entry);
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn entry_at(&self, index: usize) -> Result<&EqEntry, StoreError> {
        self.items.get(index).ok_or(StoreError::IndexOutOfRange {
            index,
            count: self.items.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &EqEntry> {
        self.items.iter()
    }
}
