//! Index reader collaborators.
//!
//! These traits are the seam between query execution and the storage layer.
//! The posting resolver talks to an [`IndexPartitionReader`] to find the
//! [`IndexReader`] of a named index, asks it for posting iterators, obtains the
//! main↔sub [`SubDocJoin`] for nested indexes and reaches the primary key.

use std::ops::Range;
use std::sync::Arc;

use sieve_common::Result;

use crate::join::SubDocJoin;
use crate::posting::{PostingIterator, PostingType};
use crate::term::TermDescriptor;
use crate::DocId;

/// Parameters of one posting lookup.
#[derive(Clone, Copy, Debug)]
pub struct LookupRequest<'a> {
    pub term: &'a TermDescriptor,
    /// Top-K hint for truncated representations.
    pub top_k: u32,
    pub posting_type: PostingType,
    /// Half-open ranges restricting the lookup, or `None` for the whole index.
    pub ranges: Option<&'a [Range<DocId>]>,
}

/// Reads posting lists of one index.
pub trait IndexReader: Send + Sync {
    /// Looks up the posting of `request.term` in the requested representation.
    ///
    /// Returns `Ok(None)` when the term has no posting of that type.
    ///
    /// # Errors
    ///
    /// I/O and decoding failures while locating the posting.
    fn lookup(&self, request: &LookupRequest<'_>) -> Result<Option<Box<dyn PostingIterator>>>;
}

/// Which document space an index covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexScope {
    /// Postings hold main document ids.
    Main,
    /// Postings hold sub (nested) document ids.
    Sub,
}

/// A resolved index reader together with the document space it covers.
#[derive(Clone)]
pub struct ReaderHandle {
    pub reader: Arc<dyn IndexReader>,
    pub scope: IndexScope,
}

/// Result of a primary key lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PkLookup {
    /// The live document holding the key, `None` when absent or deleted.
    pub live: Option<DocId>,
    /// The last document the key was ever assigned, deleted or not.
    pub last: Option<DocId>,
}

pub trait PrimaryKeyReader: Send + Sync {
    fn lookup(&self, key: &str) -> Result<PkLookup>;
}

/// Entry point into one index snapshot (a partition).
pub trait IndexPartitionReader: Send + Sync {
    /// Returns the reader of the index called `index_name`, or `None` when no
    /// such index exists in this partition.
    fn resolve_index_reader(&self, index_name: &str) -> Option<ReaderHandle>;

    /// Creates the main↔sub join of this partition, or `None` when the
    /// partition has no sub documents.
    fn create_sub_doc_join(&self) -> Result<Option<SubDocJoin>>;

    fn primary_key_reader(&self) -> Option<Arc<dyn PrimaryKeyReader>>;
}
