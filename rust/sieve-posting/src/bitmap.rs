//! Bitmap-backed posting representation.

use std::ops::Range;
use std::sync::Arc;

use roaring::RoaringBitmap;
use sieve_common::Result;

use crate::posting::{PostingIterator, PostingType, TermMeta};
use crate::{DocId, END_DOCID, INVALID_DOCID, is_valid_doc};

/// A posting list stored as a shared roaring bitmap.
///
/// Membership tests are O(1)-ish and do not disturb the cursor, which is what
/// lets a bitmap AND verify bitmap operands without seeking them. Sequential
/// `seek` is supported through rank/select.
#[derive(Clone)]
pub struct BitmapPosting {
    bitmap: Arc<RoaringBitmap>,
    term_meta: TermMeta,
    /// Last document returned by `seek`, or [`INVALID_DOCID`] before the first seek.
    current: DocId,
}

impl BitmapPosting {
    pub fn new(bitmap: RoaringBitmap) -> BitmapPosting {
        let len = bitmap.len();
        BitmapPosting {
            bitmap: Arc::new(bitmap),
            term_meta: TermMeta::new(len, len),
            current: INVALID_DOCID,
        }
    }

    pub fn from_docs(docs: impl IntoIterator<Item = DocId>) -> BitmapPosting {
        Self::new(docs.into_iter().filter(|&doc| is_valid_doc(doc)).collect())
    }

    /// Overrides the main-chain statistics of the term this bitmap was cut from.
    pub fn with_term_meta(mut self, term_meta: TermMeta) -> BitmapPosting {
        self.term_meta = term_meta;
        self
    }

    pub fn bitmap(&self) -> &RoaringBitmap {
        &self.bitmap
    }

    /// Returns an unsought copy holding only the documents inside `ranges`
    /// (half-open). Main-chain statistics are preserved.
    pub fn restrict(&self, ranges: &[Range<DocId>]) -> BitmapPosting {
        let mut mask = RoaringBitmap::new();
        for range in ranges {
            mask.insert_range(range.clone());
        }
        BitmapPosting {
            bitmap: Arc::new(self.bitmap.as_ref() & &mask),
            term_meta: self.term_meta,
            current: INVALID_DOCID,
        }
    }

    /// Smallest member `>= target`.
    fn next_member(&self, target: DocId) -> DocId {
        let preceding = match target.checked_sub(1) {
            Some(last_below) => self.bitmap.rank(last_below),
            None => 0,
        };
        u32::try_from(preceding)
            .ok()
            .and_then(|n| self.bitmap.select(n))
            .unwrap_or(END_DOCID)
    }
}

impl PostingIterator for BitmapPosting {
    fn posting_type(&self) -> PostingType {
        PostingType::Bitmap
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        if self.current != INVALID_DOCID && self.current >= target {
            return Ok(self.current);
        }
        self.current = self.next_member(target);
        Ok(self.current)
    }

    fn test(&self, doc: DocId) -> bool {
        self.bitmap.contains(doc)
    }

    fn term_meta(&self) -> TermMeta {
        self.term_meta
    }

    fn truncated_term_meta(&self) -> TermMeta {
        let len = self.bitmap.len();
        TermMeta::new(len, len)
    }

    fn boxed_clone(&self) -> Box<dyn PostingIterator> {
        Box::new(self.clone())
    }
}
