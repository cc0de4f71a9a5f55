//! Seek-based query executors.
//!
//! Every executor answers `seek(target)`: the smallest document id at or after
//! `target` that satisfies its predicate. Composite executors combine the
//! answers of their children without ever materializing a result list.
//!
//! Executors that may appear below a query scoped to nested documents also
//! answer [`seek_sub`](SeekableExecutor::seek_sub), which refines a matched
//! main document to the sub documents that satisfy the sub-scoped predicate.

use std::fmt;

use sieve_common::Result;
use sieve_posting::{DocId, SubDocId};

use crate::options::QueryOptions;

mod and;
mod bitmap_and;
mod sub_doc;
mod term;

pub use and::AndExecutor;
pub use bitmap_and::BitmapAndExecutor;
pub use sub_doc::{SubDocCoordinator, SubRangeCursor};
pub use term::{FieldMapFilter, FieldMatchMode, TermExecutor};

/// Which document frequency an executor reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocFreqKind {
    /// Frequency of the untruncated posting chain.
    MainChain,
    /// Frequency of the representation the executor actually walks. Used to
    /// order intersection children.
    CurrentChain,
}

/// The capability set shared by all executors.
pub trait SeekableExecutor: fmt::Display {
    /// Moves to the first matching document `>= target`, or
    /// [`END_DOCID`](sieve_posting::END_DOCID). Targets must not decrease
    /// between calls. Once `END_DOCID` is returned, every later call returns
    /// it too.
    fn seek(&mut self, target: DocId) -> Result<DocId>;

    /// Given that `doc` matched at the main document level, returns the
    /// smallest sub document in `[sub_begin, sub_end)` satisfying the
    /// sub-scoped predicate, or `END_DOCID` when there is none.
    fn seek_sub(&mut self, doc: DocId, sub_begin: SubDocId, sub_end: SubDocId)
    -> Result<SubDocId>;

    /// Whether `doc`, the document last matched, matched without involving
    /// any sub document predicate.
    fn is_main_doc_hit(&self, doc: DocId) -> bool;

    fn doc_freq(&self, kind: DocFreqKind) -> u64;

    /// Rewinds to the initial state, acquiring fresh posting cursors.
    fn reset(&mut self);

    /// Forces the exhausted state: every further seek returns `END_DOCID`.
    fn move_to_end(&mut self);

    /// Forces the empty state: the executor matches nothing until reset.
    fn set_empty(&mut self);

    fn is_empty(&self) -> bool;

    /// The document last returned by `seek`.
    fn doc_id(&self) -> DocId;

    /// Number of `seek` calls on this executor.
    fn seek_count(&self) -> u64;

    /// Number of `seek` calls on this executor and all its descendants.
    fn total_seek_count(&self) -> u64;

    fn has_sub_doc_executor(&self) -> bool;
}

/// A node of an executor tree.
pub enum ExecutorNode {
    Term(TermExecutor),
    And(AndExecutor),
    BitmapAnd(BitmapAndExecutor),
}

impl ExecutorNode {
    /// Builds the intersection of `children`.
    ///
    /// A single child is returned unchanged. When bitmap intersection is
    /// enabled and at least one child is a bitmap-backed term, the result is a
    /// [`BitmapAndExecutor`], otherwise an [`AndExecutor`].
    pub fn and(mut children: Vec<ExecutorNode>, options: &QueryOptions) -> ExecutorNode {
        if children.len() == 1 {
            return children.remove(0);
        }
        if options.get_bitmap_and() && children.iter().any(ExecutorNode::is_bitmap_term) {
            ExecutorNode::BitmapAnd(BitmapAndExecutor::new(children))
        } else {
            ExecutorNode::And(AndExecutor::new(children))
        }
    }

    /// Whether this node is a term that can be evaluated by membership tests.
    pub fn is_bitmap_term(&self) -> bool {
        matches!(self, ExecutorNode::Term(term) if term.is_bitmap())
    }

    pub fn as_term(&self) -> Option<&TermExecutor> {
        match self {
            ExecutorNode::Term(term) => Some(term),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn SeekableExecutor {
        match self {
            ExecutorNode::Term(e) => e,
            ExecutorNode::And(e) => e,
            ExecutorNode::BitmapAnd(e) => e,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SeekableExecutor {
        match self {
            ExecutorNode::Term(e) => e,
            ExecutorNode::And(e) => e,
            ExecutorNode::BitmapAnd(e) => e,
        }
    }
}

impl SeekableExecutor for ExecutorNode {
    #[inline]
    fn seek(&mut self, target: DocId) -> Result<DocId> {
        self.inner_mut().seek(target)
    }

    #[inline]
    fn seek_sub(
        &mut self,
        doc: DocId,
        sub_begin: SubDocId,
        sub_end: SubDocId,
    ) -> Result<SubDocId> {
        self.inner_mut().seek_sub(doc, sub_begin, sub_end)
    }

    fn is_main_doc_hit(&self, doc: DocId) -> bool {
        self.inner().is_main_doc_hit(doc)
    }

    fn doc_freq(&self, kind: DocFreqKind) -> u64 {
        self.inner().doc_freq(kind)
    }

    fn reset(&mut self) {
        self.inner_mut().reset()
    }

    fn move_to_end(&mut self) {
        self.inner_mut().move_to_end()
    }

    fn set_empty(&mut self) {
        self.inner_mut().set_empty()
    }

    fn is_empty(&self) -> bool {
        self.inner().is_empty()
    }

    fn doc_id(&self) -> DocId {
        self.inner().doc_id()
    }

    fn seek_count(&self) -> u64 {
        self.inner().seek_count()
    }

    fn total_seek_count(&self) -> u64 {
        self.inner().total_seek_count()
    }

    fn has_sub_doc_executor(&self) -> bool {
        self.inner().has_sub_doc_executor()
    }
}

impl fmt::Display for ExecutorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorNode::Term(e) => fmt::Display::fmt(e, f),
            ExecutorNode::And(e) => fmt::Display::fmt(e, f),
            ExecutorNode::BitmapAnd(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl From<TermExecutor> for ExecutorNode {
    fn from(executor: TermExecutor) -> Self {
        ExecutorNode::Term(executor)
    }
}

impl From<AndExecutor> for ExecutorNode {
    fn from(executor: AndExecutor) -> Self {
        ExecutorNode::And(executor)
    }
}

impl From<BitmapAndExecutor> for ExecutorNode {
    fn from(executor: BitmapAndExecutor) -> Self {
        ExecutorNode::BitmapAnd(executor)
    }
}
