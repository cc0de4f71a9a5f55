//! Driving an executor tree to enumerate matches.

use std::fmt;
use std::sync::Arc;

use log::debug;
use sieve_common::{Result, error::Error, try_or_ret_some_err};
use sieve_posting::{DocId, END_DOCID, INVALID_DOCID, SubDocId, SubDocJoin};

use crate::executor::{ExecutorNode, SeekableExecutor, SubRangeCursor};
use crate::options::QueryOptions;

/// Enumerates the main documents matched by an executor tree, in ascending
/// order, and the matching sub documents of each.
///
/// With `require_sub_hit`, a main document that only matched through sub
/// document predicates is emitted only if at least one of its sub documents
/// matches too. The first error ends the scan; later calls report that the
/// scan was aborted until it is [`reset`](DocScan::reset).
pub struct DocScan {
    root: ExecutorNode,
    join: Option<Arc<SubDocJoin>>,
    require_sub_hit: bool,
    next_target: DocId,
    current: DocId,
    sub_cursor: Option<SubRangeCursor>,
    docs_scanned: u64,
    aborted: bool,
}

impl DocScan {
    /// Creates a scan over `root`. `join` is the main↔sub join the tree's
    /// sub document postings were resolved with, typically
    /// [`PostingResolver::sub_doc_join`](crate::PostingResolver::sub_doc_join).
    pub fn new(
        root: ExecutorNode,
        join: Option<Arc<SubDocJoin>>,
        options: &QueryOptions,
    ) -> DocScan {
        DocScan {
            root,
            join,
            require_sub_hit: options.get_require_sub_hit(),
            next_target: 0,
            current: INVALID_DOCID,
            sub_cursor: None,
            docs_scanned: 0,
            aborted: false,
        }
    }

    pub fn root(&self) -> &ExecutorNode {
        &self.root
    }

    /// Returns the next matching main document, or `None` once the scan is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Posting and join failures are returned as is and abort the scan. Every
    /// later call returns an `InvalidArgument` error until the scan is reset.
    pub fn next_match(&mut self) -> Result<Option<DocId>> {
        if self.aborted {
            return Err(Error::invalid_arg(
                "scan",
                "aborted by an earlier error, reset to restart",
            ));
        }
        let next = self.advance();
        if next.is_err() {
            self.finish();
            self.aborted = true;
        }
        next
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Returns the next matching sub document of `doc`, which must be the
    /// document last returned by [`next_match`](Self::next_match). Returns
    /// `None` when no further sub document matches, or when the tree has no
    /// sub documents.
    pub fn next_sub_match(&mut self, doc: DocId) -> Result<Option<SubDocId>> {
        if doc != self.current || doc >= INVALID_DOCID {
            return Err(Error::invalid_arg(
                "doc",
                format!("{doc} is not the current document {}", self.current),
            ));
        }
        match self.sub_cursor.as_mut() {
            Some(cursor) => cursor.next_hit(&mut self.root),
            None => Ok(None),
        }
    }

    /// Restarts the scan from the first document with fresh posting cursors.
    pub fn reset(&mut self) {
        self.root.reset();
        self.next_target = 0;
        self.current = INVALID_DOCID;
        self.sub_cursor = None;
        self.aborted = false;
    }

    pub fn total_seek_count(&self) -> u64 {
        self.root.total_seek_count()
    }

    /// Number of candidate main documents produced by the tree, including
    /// the ones rejected for lacking a sub document hit.
    pub fn total_docs_scanned(&self) -> u64 {
        self.docs_scanned
    }

    fn advance(&mut self) -> Result<Option<DocId>> {
        loop {
            if self.next_target == END_DOCID {
                return Ok(None);
            }
            let doc = self.root.seek(self.next_target)?;
            if doc == END_DOCID {
                self.finish();
                return Ok(None);
            }
            self.docs_scanned += 1;
            self.next_target = doc + 1;
            self.current = doc;
            self.sub_cursor = match &self.join {
                Some(join) if self.root.has_sub_doc_executor() => {
                    Some(SubRangeCursor::new(doc, join.sub_range(doc)?))
                }
                _ => None,
            };

            if self.require_sub_hit && !self.root.is_main_doc_hit(doc) {
                let hit = match self.sub_cursor.as_mut() {
                    Some(cursor) => cursor.probe(&mut self.root)?,
                    None => false,
                };
                if !hit {
                    continue;
                }
            }
            return Ok(Some(doc));
        }
    }

    fn finish(&mut self) {
        if self.next_target != END_DOCID {
            debug!(
                "scan of {} finished: {} docs scanned, {} seeks",
                self.root,
                self.docs_scanned,
                self.root.total_seek_count()
            );
        }
        self.next_target = END_DOCID;
        self.current = END_DOCID;
        self.sub_cursor = None;
    }
}

impl Iterator for DocScan {
    type Item = Result<DocId>;

    /// Yields the error that aborts the scan once, then ends.
    fn next(&mut self) -> Option<Self::Item> {
        if self.aborted {
            return None;
        }
        try_or_ret_some_err!(self.next_match()).map(Ok)
    }
}

impl fmt::Display for DocScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SCAN({})", self.root)
    }
}
