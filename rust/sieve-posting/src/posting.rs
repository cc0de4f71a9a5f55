//! The forward-only posting cursor contract.

use sieve_common::Result;

use crate::DocId;

/// Representation a posting list was built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PostingType {
    /// Compressed sorted list of document ids, possibly truncated to a top-K profile.
    Normal,
    /// Dense bit-vector answering membership in O(1).
    Bitmap,
}

impl PostingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostingType::Normal => "normal",
            PostingType::Bitmap => "bitmap",
        }
    }
}

/// Frequency statistics of a term.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TermMeta {
    /// Number of documents containing the term.
    pub doc_freq: u64,
    /// Total number of occurrences of the term.
    pub total_term_freq: u64,
}

impl TermMeta {
    pub fn new(doc_freq: u64, total_term_freq: u64) -> TermMeta {
        TermMeta {
            doc_freq,
            total_term_freq,
        }
    }
}

/// Forward-only cursor over the sorted document ids of one term.
///
/// A posting iterator never moves backwards: `seek` returns the smallest
/// remaining document id that is `>= target`, and a target at or below the
/// current position returns the current document again. Rewinding is always
/// expressed by cloning a fresh iterator from an unsought template via
/// [`boxed_clone`](Self::boxed_clone).
///
/// Clones share the decoded buffer (list or bitmap) and only duplicate the
/// cursor state, so cloning is cheap.
pub trait PostingIterator: Send + Sync {
    fn posting_type(&self) -> PostingType;

    /// Moves to the first document `>= target` and returns it, or
    /// [`END_DOCID`](crate::END_DOCID) once the posting list is exhausted.
    ///
    /// # Errors
    ///
    /// Returns a `FileIo` or `Decode` error when the posting data cannot be
    /// materialized.
    fn seek(&mut self, target: DocId) -> Result<DocId>;

    /// Direct membership test without moving the cursor.
    ///
    /// Only bitmap-backed postings answer this; other representations return
    /// `false` and must be sought instead.
    fn test(&self, _doc: DocId) -> bool {
        false
    }

    /// Field bitmask of the entry under the cursor, `0` when the posting
    /// carries no field maps or the cursor is not on an entry.
    fn field_map(&self) -> u8 {
        0
    }

    /// Statistics of the untruncated (main chain) posting list.
    fn term_meta(&self) -> TermMeta;

    /// Statistics of the representation this iterator actually walks. For a
    /// truncated or bitmap posting this can be smaller than
    /// [`term_meta`](Self::term_meta).
    fn truncated_term_meta(&self) -> TermMeta {
        self.term_meta()
    }

    /// Cheap clone sharing the decoded data, with independent cursor state.
    fn boxed_clone(&self) -> Box<dyn PostingIterator>;
}
