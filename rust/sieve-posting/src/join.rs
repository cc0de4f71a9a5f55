//! Main ↔ sub document id mapping for nested documents.
//!
//! Sub documents of one main document occupy a contiguous block of the sub id
//! space. The layout is described by two join iterators:
//!
//! - main→sub: for main document `m`, the exclusive end of its sub block. The
//!   block of `m` is therefore `[main_to_sub(m - 1), main_to_sub(m))`, with the
//!   block of main document `0` starting at sub id `0`.
//! - sub→main: for sub document `s`, the main document owning it.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use sieve_common::Result;

use crate::layer::LayerMeta;
use crate::{DocId, END_DOCID, SubDocId};

/// A read-only doc id mapping, typically backed by a join attribute.
///
/// Implementations are shared by every sub-document-aware executor of a
/// resolver and are never mutated after creation.
pub trait JoinDocIdIterator: Send + Sync {
    /// Returns the mapped id for `doc`, or [`END_DOCID`] when `doc` lies
    /// beyond the mapped space.
    fn seek(&self, doc: DocId) -> Result<DocId>;
}

/// The pair of join iterators linking main and sub documents.
#[derive(Clone)]
pub struct SubDocJoin {
    main_to_sub: Arc<dyn JoinDocIdIterator>,
    sub_to_main: Arc<dyn JoinDocIdIterator>,
}

impl SubDocJoin {
    pub fn new(
        main_to_sub: Arc<dyn JoinDocIdIterator>,
        sub_to_main: Arc<dyn JoinDocIdIterator>,
    ) -> SubDocJoin {
        SubDocJoin {
            main_to_sub,
            sub_to_main,
        }
    }

    /// First sub id belonging to main document `main` (or to the first main
    /// document after it when `main` has no children).
    pub fn first_sub(&self, main: DocId) -> Result<SubDocId> {
        match main.checked_sub(1) {
            Some(prev) => self.main_to_sub.seek(prev),
            None => Ok(0),
        }
    }

    /// The half-open block of sub ids owned by `main`.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` error when the join reports a block whose end
    /// precedes its start.
    pub fn sub_range(&self, main: DocId) -> Result<Range<SubDocId>> {
        let begin = self.first_sub(main)?;
        let end = self.main_to_sub.seek(main)?;
        sieve_common::verify_invariant!(begin <= end);
        Ok(begin..end)
    }

    /// The main document owning sub document `sub`.
    pub fn main_of(&self, sub: SubDocId) -> Result<DocId> {
        if sub == END_DOCID {
            return Ok(END_DOCID);
        }
        self.sub_to_main.seek(sub)
    }

    /// Translates the main-document ranges of `layer` into the half-open sub
    /// ranges covering the same main documents. Empty translations are
    /// dropped.
    pub fn sub_ranges(&self, layer: &LayerMeta) -> Result<Vec<Range<SubDocId>>> {
        let mut ranges = Vec::with_capacity(layer.ranges().len());
        for range in layer.ranges() {
            let begin = self.first_sub(range.begin)?;
            let end = self.main_to_sub.seek(range.end)?;
            if begin < end {
                ranges.push(begin..end);
            }
        }
        Ok(ranges)
    }
}

impl fmt::Debug for SubDocJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubDocJoin").finish_non_exhaustive()
    }
}
