use ahash::AHashMap;
use sieve_common::Result;

use crate::reader::{PkLookup, PrimaryKeyReader};
use crate::DocId;

#[derive(Clone, Copy, Debug)]
struct PkEntry {
    doc: DocId,
    deleted: bool,
}

/// Primary key index kept in memory.
///
/// A deleted key remembers the document it last occupied, which is what the
/// "ignore deleted" lookup mode returns.
#[derive(Clone, Debug, Default)]
pub struct MemPrimaryKeyIndex {
    entries: AHashMap<String, PkEntry>,
}

impl MemPrimaryKeyIndex {
    pub fn new() -> MemPrimaryKeyIndex {
        Self::default()
    }

    /// Assigns `key` to `doc`, replacing any previous (live or deleted) entry.
    pub fn insert(&mut self, key: impl Into<String>, doc: DocId) {
        self.entries.insert(
            key.into(),
            PkEntry {
                doc,
                deleted: false,
            },
        );
    }

    /// Marks `key` deleted. Returns `false` when the key was never assigned.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.deleted = true;
                true
            }
            None => false,
        }
    }
}

impl PrimaryKeyReader for MemPrimaryKeyIndex {
    fn lookup(&self, key: &str) -> Result<PkLookup> {
        Ok(match self.entries.get(key) {
            Some(entry) => PkLookup {
                live: (!entry.deleted).then_some(entry.doc),
                last: Some(entry.doc),
            },
            None => PkLookup::default(),
        })
    }
}
