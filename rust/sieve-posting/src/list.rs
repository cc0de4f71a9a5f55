//! Posting list stored as an explicit sorted array of document ids.

use std::ops::Range;
use std::sync::Arc;

use sieve_common::Result;

use crate::posting::{PostingIterator, PostingType, TermMeta};
use crate::{DocId, END_DOCID, is_valid_doc};

/// A posting list backed by a shared, sorted array of document ids, with an
/// optional per-entry field bitmask.
///
/// # Sharing
///
/// The document array and the field maps are reference counted: cloning a
/// `ListPosting` duplicates only the cursor, which makes it suitable as the
/// canonical template kept by a posting cache.
///
/// # Invariants
///
/// - `docs` is strictly ascending and contains no sentinel ids.
/// - When present, `field_maps` has exactly one entry per document.
/// - `cursor <= docs.len()`; `cursor == docs.len()` means exhausted.
#[derive(Clone)]
pub struct ListPosting {
    docs: Arc<[DocId]>,
    field_maps: Option<Arc<[u8]>>,
    term_meta: TermMeta,
    cursor: usize,
}

impl ListPosting {
    /// Creates a posting list from document ids in any order. Duplicates and
    /// sentinel values are dropped.
    pub fn new(docs: impl IntoIterator<Item = DocId>) -> ListPosting {
        let mut docs = docs
            .into_iter()
            .filter(|&doc| is_valid_doc(doc))
            .collect::<Vec<_>>();
        docs.sort_unstable();
        docs.dedup();
        let term_meta = Self::meta_of_len(docs.len());
        ListPosting {
            docs: docs.into(),
            field_maps: None,
            term_meta,
            cursor: 0,
        }
    }

    /// Creates a posting list whose entries carry a field bitmask each.
    ///
    /// When a document appears more than once, the first entry wins.
    pub fn with_field_maps(entries: impl IntoIterator<Item = (DocId, u8)>) -> ListPosting {
        let mut entries = entries
            .into_iter()
            .filter(|&(doc, _)| is_valid_doc(doc))
            .collect::<Vec<_>>();
        entries.sort_by_key(|&(doc, _)| doc);
        entries.dedup_by_key(|&mut (doc, _)| doc);
        let term_meta = Self::meta_of_len(entries.len());
        let (docs, field_maps): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        ListPosting {
            docs: docs.into(),
            field_maps: Some(field_maps.into()),
            term_meta,
            cursor: 0,
        }
    }

    /// Overrides the main-chain statistics, e.g. when this list is a truncated
    /// top-K profile of a larger posting.
    pub fn with_term_meta(mut self, term_meta: TermMeta) -> ListPosting {
        self.term_meta = term_meta;
        self
    }

    pub fn docs(&self) -> &[DocId] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Returns an unsought copy holding only the entries inside `ranges`
    /// (half-open). Main-chain statistics are preserved.
    pub fn restrict(&self, ranges: &[Range<DocId>]) -> ListPosting {
        let keep = |doc: &DocId| ranges.iter().any(|range| range.contains(doc));
        let (docs, field_maps) = match &self.field_maps {
            Some(maps) => {
                let (docs, maps): (Vec<_>, Vec<_>) = self
                    .docs
                    .iter()
                    .zip(maps.iter())
                    .filter(|(doc, _)| keep(doc))
                    .map(|(&doc, &map)| (doc, map))
                    .unzip();
                (docs, Some(maps.into()))
            }
            None => (
                self.docs.iter().copied().filter(keep).collect::<Vec<_>>(),
                None,
            ),
        };
        ListPosting {
            docs: docs.into(),
            field_maps,
            term_meta: self.term_meta,
            cursor: 0,
        }
    }

    #[inline]
    fn current(&self) -> DocId {
        self.docs.get(self.cursor).copied().unwrap_or(END_DOCID)
    }

    fn meta_of_len(len: usize) -> TermMeta {
        TermMeta::new(len as u64, len as u64)
    }
}

impl PostingIterator for ListPosting {
    fn posting_type(&self) -> PostingType {
        PostingType::Normal
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        let rest = &self.docs[self.cursor..];
        self.cursor += rest.partition_point(|&doc| doc < target);
        Ok(self.current())
    }

    fn field_map(&self) -> u8 {
        self.field_maps
            .as_ref()
            .and_then(|maps| maps.get(self.cursor).copied())
            .unwrap_or(0)
    }

    fn term_meta(&self) -> TermMeta {
        self.term_meta
    }

    fn truncated_term_meta(&self) -> TermMeta {
        Self::meta_of_len(self.docs.len())
    }

    fn boxed_clone(&self) -> Box<dyn PostingIterator> {
        Box::new(self.clone())
    }
}
