//! Posting-list contract consumed by the sieve query executors.
//!
//! This crate defines the boundary between seek-based query execution and the
//! storage layer that decodes posting lists. It provides:
//!
//! - The document id model ([`DocId`], [`SubDocId`] and the [`INVALID_DOCID`] /
//!   [`END_DOCID`] sentinels).
//! - [`PostingIterator`], the forward-only cursor every posting representation
//!   implements, together with [`ListPosting`] and [`BitmapPosting`].
//! - [`LayerMeta`], the caller-supplied partition of the doc-id space.
//! - [`SubDocJoin`], the main↔sub document id mapping used by nested documents.
//! - The index-reader collaborator traits in [`reader`].
//! - In-memory implementations of every collaborator in [`memory`].

pub mod bitmap;
pub mod join;
pub mod layer;
pub mod list;
pub mod memory;
pub mod posting;
pub mod reader;
pub mod term;

pub use bitmap::BitmapPosting;
pub use join::{JoinDocIdIterator, SubDocJoin};
pub use layer::{DocIdRange, LayerMeta, LayerOrdering};
pub use list::ListPosting;
pub use posting::{PostingIterator, PostingType, TermMeta};
pub use reader::{
    IndexPartitionReader, IndexReader, IndexScope, LookupRequest, PkLookup, PrimaryKeyReader,
    ReaderHandle,
};
pub use term::{TermDescriptor, TermValue};

/// Identifier of a main document.
pub type DocId = u32;

/// Identifier of a nested (sub) document. Sub documents share the id
/// representation of main documents but live in their own id space.
pub type SubDocId = DocId;

/// The scan is exhausted. Greater than every valid document id.
pub const END_DOCID: DocId = DocId::MAX;

/// No document has been visited yet.
pub const INVALID_DOCID: DocId = DocId::MAX - 1;

/// Whether `doc` denotes a real document rather than one of the sentinels.
#[inline]
pub fn is_valid_doc(doc: DocId) -> bool {
    doc < INVALID_DOCID
}
