use std::sync::Arc;

use sieve_common::Result;

use crate::join::{JoinDocIdIterator, SubDocJoin};
use crate::{DocId, END_DOCID, SubDocId};

/// Sub document layout held in memory as the exclusive end of every main
/// document's sub block.
#[derive(Clone, Debug)]
pub struct MemJoinIndex {
    sub_ends: Arc<[SubDocId]>,
}

impl MemJoinIndex {
    /// Builds the layout from the number of children of each main document,
    /// in main doc id order.
    pub fn from_child_counts(counts: impl IntoIterator<Item = u32>) -> MemJoinIndex {
        let mut end = 0;
        let sub_ends = counts
            .into_iter()
            .map(|count| {
                end += count;
                end
            })
            .collect::<Vec<_>>();
        MemJoinIndex {
            sub_ends: sub_ends.into(),
        }
    }

    pub fn main_doc_count(&self) -> usize {
        self.sub_ends.len()
    }

    pub fn sub_doc_count(&self) -> SubDocId {
        self.sub_ends.last().copied().unwrap_or(0)
    }

    pub fn to_join(&self) -> SubDocJoin {
        SubDocJoin::new(
            Arc::new(MainToSub(Arc::clone(&self.sub_ends))),
            Arc::new(SubToMain(Arc::clone(&self.sub_ends))),
        )
    }
}

struct MainToSub(Arc<[SubDocId]>);

impl JoinDocIdIterator for MainToSub {
    /// Main documents past the layout own no children: their block is empty
    /// and starts at the total sub document count.
    fn seek(&self, main: DocId) -> Result<SubDocId> {
        let total = self.0.last().copied().unwrap_or(0);
        Ok(self.0.get(main as usize).copied().unwrap_or(total))
    }
}

struct SubToMain(Arc<[SubDocId]>);

impl JoinDocIdIterator for SubToMain {
    fn seek(&self, sub: SubDocId) -> Result<DocId> {
        let total = self.0.last().copied().unwrap_or(0);
        if sub >= total {
            return Ok(END_DOCID);
        }
        Ok(self.0.partition_point(|&end| end <= sub) as DocId)
    }
}
