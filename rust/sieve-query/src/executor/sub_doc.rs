//! Nested document seek protocol.

use std::ops::Range;

use sieve_common::Result;
use sieve_posting::{DocId, END_DOCID, SubDocId};

use crate::executor::{ExecutorNode, SeekableExecutor};

/// Leap-frog convergence of several sub-scoped predicates on sub document
/// ids.
pub struct SubDocCoordinator;

impl SubDocCoordinator {
    /// Finds the smallest sub id in `[sub_begin, sub_end)` accepted by all
    /// `count` children.
    ///
    /// `seek_child(i, cur)` asks child `i` for its first accepted sub id at or
    /// after `cur`. Whenever a child moves the cursor, the pass restarts from
    /// the first child; a pass where no child moves it yields the cursor.
    ///
    /// # Errors
    ///
    /// Child failures are returned as is. A child answering below the cursor
    /// breaks the forward-only contract and yields an `Internal` error.
    pub fn converge<F>(
        sub_begin: SubDocId,
        sub_end: SubDocId,
        count: usize,
        mut seek_child: F,
    ) -> Result<SubDocId>
    where
        F: FnMut(usize, SubDocId) -> Result<SubDocId>,
    {
        if sub_begin >= sub_end {
            return Ok(END_DOCID);
        }
        let mut cur = sub_begin;
        let mut i = 0;
        while i < count {
            let next = seek_child(i, cur)?;
            if next >= sub_end {
                return Ok(END_DOCID);
            }
            sieve_common::verify_invariant!(next >= cur);
            if next == cur {
                i += 1;
            } else {
                cur = next;
                // Child `i` already sits on `cur`.
                i = usize::from(i == 0);
            }
        }
        Ok(cur)
    }
}

/// Iterates the matching sub documents of one main document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubRangeCursor {
    doc: DocId,
    next: SubDocId,
    end: SubDocId,
}

impl SubRangeCursor {
    pub fn new(doc: DocId, range: Range<SubDocId>) -> SubRangeCursor {
        SubRangeCursor {
            doc,
            next: range.start,
            end: range.end,
        }
    }

    pub fn doc(&self) -> DocId {
        self.doc
    }

    /// Returns the next matching sub document and steps past it.
    pub fn next_hit(&mut self, executor: &mut ExecutorNode) -> Result<Option<SubDocId>> {
        let Some(sub) = self.peek(executor)? else {
            return Ok(None);
        };
        self.next = sub + 1;
        Ok(Some(sub))
    }

    /// Whether a matching sub document remains. The cursor moves onto it
    /// without consuming it.
    pub fn probe(&mut self, executor: &mut ExecutorNode) -> Result<bool> {
        Ok(self.peek(executor)?.is_some())
    }

    fn peek(&mut self, executor: &mut ExecutorNode) -> Result<Option<SubDocId>> {
        if self.next >= self.end {
            return Ok(None);
        }
        let sub = executor.seek_sub(self.doc, self.next, self.end)?;
        if sub == END_DOCID {
            self.next = self.end;
            return Ok(None);
        }
        self.next = sub;
        Ok(Some(sub))
    }
}
