use std::fmt;
use std::sync::Arc;

use sieve_common::Result;
use sieve_posting::{DocId, END_DOCID, INVALID_DOCID, PostingType, SubDocId, SubDocJoin};

use crate::executor::{DocFreqKind, SeekableExecutor};
use crate::resolver::PostingHandle;
use crate::term::Term;

/// How a [`FieldMapFilter`] compares its mask with a posting entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldMatchMode {
    /// At least one bit of the mask is set in the entry.
    Intersects,
    /// Every bit of the mask is set in the entry.
    ContainsAll,
}

/// Restricts a term to the posting entries whose field map satisfies a mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldMapFilter {
    pub mask: u8,
    pub mode: FieldMatchMode,
}

impl FieldMapFilter {
    pub fn intersects(mask: u8) -> FieldMapFilter {
        FieldMapFilter {
            mask,
            mode: FieldMatchMode::Intersects,
        }
    }

    pub fn contains_all(mask: u8) -> FieldMapFilter {
        FieldMapFilter {
            mask,
            mode: FieldMatchMode::ContainsAll,
        }
    }

    #[inline]
    pub fn matches(&self, field_map: u8) -> bool {
        match self.mode {
            FieldMatchMode::Intersects => field_map & self.mask != 0,
            FieldMatchMode::ContainsAll => field_map & self.mask == self.mask,
        }
    }
}

#[inline]
fn passes(filter: Option<FieldMapFilter>, field_map: u8) -> bool {
    filter.is_none_or(|filter| filter.matches(field_map))
}

/// Leaf executor walking the posting of one term.
///
/// A term without a posting (unknown index or word) is empty and matches
/// nothing.
///
/// When the posting belongs to a sub document index, the term works in two
/// document spaces: `seek` maps a main target to the first sub document of
/// that main document, seeks the sub posting and maps the hit back to its
/// owner; `seek_sub` walks the sub posting inside the block of the current
/// main document and applies the field-map filter there.
pub struct TermExecutor {
    term: Term,
    posting: Option<PostingHandle>,
    join: Option<Arc<SubDocJoin>>,
    field_filter: Option<FieldMapFilter>,
    cur_doc: DocId,
    empty: bool,
    seeks: u64,
}

impl TermExecutor {
    pub fn new(term: Term, posting: Option<PostingHandle>) -> TermExecutor {
        let join = posting.as_ref().and_then(|p| p.join().cloned());
        let empty = posting.is_none();
        TermExecutor {
            term,
            posting,
            join,
            field_filter: None,
            cur_doc: INVALID_DOCID,
            empty,
            seeks: 0,
        }
    }

    pub fn with_field_filter(mut self, filter: FieldMapFilter) -> TermExecutor {
        self.field_filter = Some(filter);
        self
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn posting(&self) -> Option<&PostingHandle> {
        self.posting.as_ref()
    }

    /// Whether this term can be evaluated with [`test`](Self::test) alone: a
    /// bitmap posting over main documents without a field filter.
    pub fn is_bitmap(&self) -> bool {
        self.join.is_none()
            && self.field_filter.is_none()
            && self
                .posting
                .as_ref()
                .is_some_and(|p| p.posting_type() == PostingType::Bitmap)
    }

    /// Membership test at `doc` without moving the cursor. A hit makes `doc`
    /// the current document.
    pub fn test(&mut self, doc: DocId) -> bool {
        if self.empty {
            return false;
        }
        let hit = self.posting.as_ref().is_some_and(|p| p.test(doc));
        if hit {
            self.cur_doc = doc;
        }
        hit
    }
}

impl SeekableExecutor for TermExecutor {
    fn seek(&mut self, target: DocId) -> Result<DocId> {
        self.seeks += 1;
        if self.empty || self.cur_doc == END_DOCID {
            return Ok(END_DOCID);
        }
        let Some(posting) = self.posting.as_mut() else {
            return Ok(END_DOCID);
        };

        let doc = match &self.join {
            None => {
                let mut doc = posting.seek(target)?;
                while doc != END_DOCID && !passes(self.field_filter, posting.field_map()) {
                    doc = posting.seek(doc + 1)?;
                }
                doc
            }
            // The field filter is a sub document predicate here, applied by
            // `seek_sub`.
            Some(join) => {
                let sub = posting.seek(join.first_sub(target)?)?;
                join.main_of(sub)?
            }
        };
        self.cur_doc = doc;
        Ok(doc)
    }

    fn seek_sub(
        &mut self,
        doc: DocId,
        sub_begin: SubDocId,
        sub_end: SubDocId,
    ) -> Result<SubDocId> {
        if self.empty || doc != self.cur_doc || sub_begin >= sub_end {
            return Ok(END_DOCID);
        }
        if self.join.is_none() {
            return Ok(sub_begin);
        }
        let Some(posting) = self.posting.as_mut() else {
            return Ok(END_DOCID);
        };

        let mut sub = posting.seek(sub_begin)?;
        while sub < sub_end && !passes(self.field_filter, posting.field_map()) {
            sub = posting.seek(sub + 1)?;
        }
        Ok(if sub < sub_end { sub } else { END_DOCID })
    }

    fn is_main_doc_hit(&self, doc: DocId) -> bool {
        !self.empty && self.join.is_none() && self.cur_doc == doc
    }

    fn doc_freq(&self, kind: DocFreqKind) -> u64 {
        if self.empty {
            return 0;
        }
        self.posting.as_ref().map_or(0, |p| match kind {
            DocFreqKind::MainChain => p.term_meta().doc_freq,
            DocFreqKind::CurrentChain => p.truncated_term_meta().doc_freq,
        })
    }

    fn reset(&mut self) {
        if let Some(posting) = self.posting.as_mut() {
            posting.renew();
        }
        self.cur_doc = INVALID_DOCID;
        self.empty = self.posting.is_none();
    }

    fn move_to_end(&mut self) {
        self.cur_doc = END_DOCID;
    }

    fn set_empty(&mut self) {
        self.empty = true;
        self.cur_doc = END_DOCID;
    }

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn doc_id(&self) -> DocId {
        self.cur_doc
    }

    fn seek_count(&self) -> u64 {
        self.seeks
    }

    fn total_seek_count(&self) -> u64 {
        self.seeks
    }

    fn has_sub_doc_executor(&self) -> bool {
        self.join.is_some()
    }
}

impl fmt::Display for TermExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TERM:{}", self.term)
    }
}
