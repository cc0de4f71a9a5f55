//! Partial-scan bounds over the document id space.

use std::fmt::{self, Write};
use std::ops::Range;

use sieve_common::Result;

use crate::{DocId, END_DOCID};

/// An inclusive range of document ids `[begin, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DocIdRange {
    pub begin: DocId,
    pub end: DocId,
}

impl DocIdRange {
    pub fn new(begin: DocId, end: DocId) -> DocIdRange {
        DocIdRange { begin, end }
    }

    /// The equivalent half-open range `[begin, end + 1)`.
    pub fn to_half_open(&self) -> Range<DocId> {
        self.begin..self.end.saturating_add(1).min(END_DOCID)
    }

    pub fn contains(&self, doc: DocId) -> bool {
        self.begin <= doc && doc <= self.end
    }
}

/// Whether the ranges of a layer are visited in ascending doc id order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayerOrdering {
    #[default]
    Ordered,
    Unordered,
}

/// A set of document id ranges bounding a partial scan.
///
/// Layers partition a full index scan across workers or record sets. The same
/// term can be looked up once per layer, so the layer's range string is part
/// of posting cache keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerMeta {
    ranges: Vec<DocIdRange>,
    ordering: LayerOrdering,
}

impl LayerMeta {
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if a range has `begin > end`.
    pub fn new(ranges: Vec<DocIdRange>, ordering: LayerOrdering) -> Result<LayerMeta> {
        for range in &ranges {
            sieve_common::verify_arg!(layer_range, range.begin <= range.end);
        }
        Ok(LayerMeta { ranges, ordering })
    }

    pub fn ordered(ranges: impl IntoIterator<Item = (DocId, DocId)>) -> Result<LayerMeta> {
        Self::new(
            ranges
                .into_iter()
                .map(|(begin, end)| DocIdRange::new(begin, end))
                .collect(),
            LayerOrdering::Ordered,
        )
    }

    pub fn ranges(&self) -> &[DocIdRange] {
        &self.ranges
    }

    pub fn ordering(&self) -> LayerOrdering {
        self.ordering
    }

    pub fn contains(&self, doc: DocId) -> bool {
        self.ranges.iter().any(|range| range.contains(doc))
    }

    /// Ranges in the half-open form index readers expect.
    pub fn to_half_open(&self) -> Vec<Range<DocId>> {
        self.ranges.iter().map(DocIdRange::to_half_open).collect()
    }

    /// Compact textual form, e.g. `[0,99][200,299]`.
    pub fn range_string(&self) -> String {
        let mut s = String::with_capacity(self.ranges.len() * 12);
        for range in &self.ranges {
            let _ = write!(s, "[{},{}]", range.begin, range.end);
        }
        s
    }
}

impl fmt::Display for LayerMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{}", self.ordering, self.range_string())
    }
}
