use std::fmt;

use itertools::Itertools;
use sieve_common::Result;
use sieve_posting::{DocId, END_DOCID, INVALID_DOCID, SubDocId};

use crate::executor::{DocFreqKind, ExecutorNode, SeekableExecutor, SubDocCoordinator};

/// Leap-frog intersection of its children.
///
/// Children are ordered by ascending current-chain frequency, so the most
/// selective child proposes candidates. An intersection without children, or
/// with an empty child, is empty.
pub struct AndExecutor {
    children: Vec<ExecutorNode>,
    cur_doc: DocId,
    empty: bool,
    has_sub: bool,
    seeks: u64,
}

impl AndExecutor {
    pub fn new(mut children: Vec<ExecutorNode>) -> AndExecutor {
        children.sort_by_key(|child| child.doc_freq(DocFreqKind::CurrentChain));
        let empty = children.is_empty() || children.iter().any(ExecutorNode::is_empty);
        let has_sub = children.iter().any(ExecutorNode::has_sub_doc_executor);
        AndExecutor {
            children,
            cur_doc: INVALID_DOCID,
            empty,
            has_sub,
            seeks: 0,
        }
    }

    /// The children in evaluation order.
    pub fn children(&self) -> &[ExecutorNode] {
        &self.children
    }
}

impl SeekableExecutor for AndExecutor {
    fn seek(&mut self, target: DocId) -> Result<DocId> {
        self.seeks += 1;
        if self.empty || self.cur_doc == END_DOCID {
            return Ok(END_DOCID);
        }

        let Some((first, rest)) = self.children.split_first_mut() else {
            return Ok(END_DOCID);
        };
        let mut candidate = first.seek(target)?;
        let mut i = 0;
        while candidate != END_DOCID && i < rest.len() {
            let doc = rest[i].seek(candidate)?;
            if doc == candidate {
                i += 1;
            } else if doc == END_DOCID {
                candidate = END_DOCID;
            } else {
                candidate = first.seek(doc)?;
                i = 0;
            }
        }
        self.cur_doc = candidate;
        Ok(candidate)
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
        if !self.has_sub {
            return Ok(sub_begin);
        }
        let children = &mut self.children;
        SubDocCoordinator::converge(sub_begin, sub_end, children.len(), |i, cur| {
            children[i].seek_sub(doc, cur, sub_end)
        })
    }

    fn is_main_doc_hit(&self, doc: DocId) -> bool {
        !self.empty
            && self.cur_doc == doc
            && self.children.iter().all(|child| child.is_main_doc_hit(doc))
    }

    fn doc_freq(&self, kind: DocFreqKind) -> u64 {
        if self.empty {
            return 0;
        }
        self.children
            .iter()
            .map(|child| child.doc_freq(kind))
            .min()
            .unwrap_or(0)
    }

    fn reset(&mut self) {
        self.children.iter_mut().for_each(ExecutorNode::reset);
        self.cur_doc = INVALID_DOCID;
        self.empty = self.children.is_empty() || self.children.iter().any(ExecutorNode::is_empty);
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
            + self
                .children
                .iter()
                .map(ExecutorNode::total_seek_count)
                .sum::<u64>()
    }

    fn has_sub_doc_executor(&self) -> bool {
        self.has_sub
    }
}

impl fmt::Display for AndExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AND({})", self.children.iter().join(", "))
    }
}
