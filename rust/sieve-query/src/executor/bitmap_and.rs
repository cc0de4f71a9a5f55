use std::fmt;

use itertools::{Either, Itertools};
use log::debug;
use sieve_common::Result;
use sieve_posting::{DocId, END_DOCID, INVALID_DOCID, SubDocId};

use crate::executor::{
    AndExecutor, DocFreqKind, ExecutorNode, SeekableExecutor, SubDocCoordinator, TermExecutor,
};

/// Intersection where one driver seeks and bitmap-backed terms are tested.
///
/// At construction the children are split into bitmap-backed terms and
/// seeking executors. The seekers drive the scan: a single seeker directly,
/// several through a nested [`AndExecutor`]. When every child is
/// bitmap-backed, the least frequent bitmap term is promoted to driver.
/// Bitmap children are tested in ascending frequency order; ties keep their
/// original order.
pub struct BitmapAndExecutor {
    driver: Option<Box<ExecutorNode>>,
    bitmap_children: Vec<TermExecutor>,
    has_sub: bool,
    cur_doc: DocId,
    seeks: u64,
}

impl BitmapAndExecutor {
    pub fn new(children: Vec<ExecutorNode>) -> BitmapAndExecutor {
        let (mut bitmaps, mut seekers): (Vec<TermExecutor>, Vec<ExecutorNode>) =
            children.into_iter().partition_map(|child| match child {
                ExecutorNode::Term(term) if term.is_bitmap() => Either::Left(term),
                other => Either::Right(other),
            });
        bitmaps.sort_by_key(|term| term.doc_freq(DocFreqKind::CurrentChain));

        let has_sub = seekers.iter().any(ExecutorNode::has_sub_doc_executor)
            || bitmaps.iter().any(TermExecutor::has_sub_doc_executor);

        let driver = match seekers.len() {
            0 if bitmaps.is_empty() => None,
            0 => Some(ExecutorNode::Term(bitmaps.remove(0))),
            1 => seekers.pop(),
            _ => Some(ExecutorNode::And(AndExecutor::new(seekers))),
        };

        let executor = BitmapAndExecutor {
            driver: driver.map(Box::new),
            bitmap_children: bitmaps,
            has_sub,
            cur_doc: INVALID_DOCID,
            seeks: 0,
        };
        debug!(
            "bitmap AND: driver {}, {} tested bitmap terms, sub doc aware: {}",
            executor
                .driver
                .as_ref()
                .map_or_else(|| "none".to_string(), |d| d.to_string()),
            executor.bitmap_children.len(),
            executor.has_sub
        );
        executor
    }

    pub fn driver(&self) -> Option<&ExecutorNode> {
        self.driver.as_deref()
    }

    /// The tested children in test order.
    pub fn bitmap_children(&self) -> &[TermExecutor] {
        &self.bitmap_children
    }
}

impl SeekableExecutor for BitmapAndExecutor {
    fn seek(&mut self, target: DocId) -> Result<DocId> {
        self.seeks += 1;
        if self.cur_doc == END_DOCID || self.is_empty() {
            return Ok(END_DOCID);
        }
        let Some(driver) = self.driver.as_mut() else {
            return Ok(END_DOCID);
        };

        let mut target = target;
        loop {
            let candidate = driver.seek(target)?;
            if candidate == END_DOCID
                || self
                    .bitmap_children
                    .iter_mut()
                    .all(|bitmap| bitmap.test(candidate))
            {
                self.cur_doc = candidate;
                return Ok(candidate);
            }
            target = candidate + 1;
        }
    }

    fn seek_sub(
        &mut self,
        doc: DocId,
        sub_begin: SubDocId,
        sub_end: SubDocId,
    ) -> Result<SubDocId> {
        if doc != self.cur_doc || sub_begin >= sub_end {
            return Ok(END_DOCID);
        }
        let Some(driver) = self.driver.as_mut() else {
            return Ok(END_DOCID);
        };
        if !self.has_sub {
            return driver.seek_sub(doc, sub_begin, sub_end);
        }

        let bitmaps = &mut self.bitmap_children;
        SubDocCoordinator::converge(sub_begin, sub_end, bitmaps.len() + 1, |i, cur| match i {
            0 => driver.seek_sub(doc, cur, sub_end),
            _ => bitmaps[i - 1].seek_sub(doc, cur, sub_end),
        })
    }

    fn is_main_doc_hit(&self, doc: DocId) -> bool {
        self.cur_doc == doc
            && self.driver.as_ref().is_some_and(|d| d.is_main_doc_hit(doc))
            && self
                .bitmap_children
                .iter()
                .all(|bitmap| bitmap.is_main_doc_hit(doc))
    }

    fn doc_freq(&self, kind: DocFreqKind) -> u64 {
        let Some(driver) = self.driver.as_ref() else {
            return 0;
        };
        self.bitmap_children
            .iter()
            .map(|bitmap| bitmap.doc_freq(kind))
            .fold(driver.doc_freq(kind), u64::min)
    }

    fn reset(&mut self) {
        if let Some(driver) = self.driver.as_mut() {
            driver.reset();
        }
        self.bitmap_children
            .iter_mut()
            .for_each(TermExecutor::reset);
        self.cur_doc = INVALID_DOCID;
    }

    fn move_to_end(&mut self) {
        self.cur_doc = END_DOCID;
    }

    fn set_empty(&mut self) {
        if let Some(driver) = self.driver.as_mut() {
            driver.set_empty();
        }
        self.cur_doc = END_DOCID;
    }

    fn is_empty(&self) -> bool {
        self.driver.as_ref().is_none_or(|d| d.is_empty())
            || self.bitmap_children.iter().any(TermExecutor::is_empty)
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
                .driver
                .as_ref()
                .map_or(0, |driver| driver.total_seek_count())
    }

    fn has_sub_doc_executor(&self) -> bool {
        self.has_sub
    }
}

impl fmt::Display for BitmapAndExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.driver {
            Some(driver) => write!(
                f,
                "BITMAP_AND({}; {})",
                driver,
                self.bitmap_children.iter().join(", ")
            ),
            None => f.write_str("BITMAP_AND()"),
        }
    }
}
