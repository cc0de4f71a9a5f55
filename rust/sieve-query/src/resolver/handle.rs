use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use sieve_common::Result;
use sieve_posting::{DocId, PostingIterator, PostingType, SubDocJoin, TermMeta};

/// Counts the posting handles a resolver has handed out and how many of them
/// are still alive.
#[derive(Debug, Default)]
pub(crate) struct LeaseTracker {
    issued: AtomicU64,
    outstanding: AtomicU64,
}

impl LeaseTracker {
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    pub fn outstanding(&self) -> u64 {
        self.outstanding.load(Ordering::Relaxed)
    }

    fn acquire(self: &Arc<Self>) -> Lease {
        self.issued.fetch_add(1, Ordering::Relaxed);
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        Lease {
            tracker: Arc::clone(self),
        }
    }
}

struct Lease {
    tracker: Arc<LeaseTracker>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.tracker.outstanding.fetch_sub(1, Ordering::Relaxed);
    }
}

/// A private cursor over a cached posting.
///
/// The handle owns its own iterator, cloned from the canonical posting held
/// by the resolver cache. Clones share the decoded list or bitmap, so several
/// executors can walk the same term independently. Postings are forward-only:
/// [`renew`](Self::renew) replaces the cursor with a fresh clone of the
/// canonical posting instead of seeking backwards.
pub struct PostingHandle {
    iter: Box<dyn PostingIterator>,
    template: Arc<dyn PostingIterator>,
    join: Option<Arc<SubDocJoin>>,
    _lease: Lease,
}

impl PostingHandle {
    pub(crate) fn checkout(
        template: &Arc<dyn PostingIterator>,
        join: Option<&Arc<SubDocJoin>>,
        leases: &Arc<LeaseTracker>,
    ) -> PostingHandle {
        PostingHandle {
            iter: template.boxed_clone(),
            template: Arc::clone(template),
            join: join.cloned(),
            _lease: leases.acquire(),
        }
    }

    #[inline]
    pub fn seek(&mut self, target: DocId) -> Result<DocId> {
        self.iter.seek(target)
    }

    #[inline]
    pub fn test(&self, doc: DocId) -> bool {
        self.iter.test(doc)
    }

    #[inline]
    pub fn field_map(&self) -> u8 {
        self.iter.field_map()
    }

    pub fn posting_type(&self) -> PostingType {
        self.iter.posting_type()
    }

    pub fn term_meta(&self) -> TermMeta {
        self.iter.term_meta()
    }

    pub fn truncated_term_meta(&self) -> TermMeta {
        self.iter.truncated_term_meta()
    }

    /// The main↔sub join, present when the posting holds sub document ids.
    pub fn join(&self) -> Option<&Arc<SubDocJoin>> {
        self.join.as_ref()
    }

    /// Rewinds by replacing the cursor with a fresh clone of the canonical
    /// posting.
    pub fn renew(&mut self) {
        self.iter = self.template.boxed_clone();
    }
}

impl std::fmt::Debug for PostingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostingHandle")
            .field("posting_type", &self.posting_type())
            .field("term_meta", &self.term_meta())
            .field("sub_doc", &self.join.is_some())
            .finish()
    }
}
