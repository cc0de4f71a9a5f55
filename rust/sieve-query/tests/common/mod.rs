#![allow(dead_code)]

use std::sync::Arc;

use sieve_common::Result;
use sieve_posting::memory::{MemIndexReader, MemPartition};
use sieve_posting::{DocId, END_DOCID};
use sieve_query::{ExecutorNode, PostingResolver, QueryOptions, SeekableExecutor, Term};

pub fn resolver(partition: MemPartition) -> PostingResolver {
    PostingResolver::new(Arc::new(partition), QueryOptions::default())
}

/// A partition with a single main document index called `body`.
pub fn body_partition(reader: MemIndexReader) -> (Arc<MemIndexReader>, PostingResolver) {
    let reader = Arc::new(reader);
    let partition = MemPartition::new().with_index("body", Arc::clone(&reader));
    (reader, resolver(partition))
}

pub fn term_node(resolver: &mut PostingResolver, word: &str) -> ExecutorNode {
    resolver
        .term_executor(Term::new("body", word), None)
        .unwrap()
        .into()
}

/// Drains `executor` with strictly increasing targets.
pub fn collect_docs(executor: &mut impl SeekableExecutor) -> Result<Vec<DocId>> {
    let mut docs = Vec::new();
    let mut target = 0;
    loop {
        let doc = executor.seek(target)?;
        if doc == END_DOCID {
            return Ok(docs);
        }
        assert!(doc >= target, "seek({target}) went backwards to {doc}");
        docs.push(doc);
        target = doc + 1;
    }
}

/// Sorted intersection of several sorted doc lists.
pub fn intersect(lists: &[Vec<DocId>]) -> Vec<DocId> {
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };
    first
        .iter()
        .copied()
        .filter(|doc| rest.iter().all(|list| list.binary_search(doc).is_ok()))
        .collect()
}

pub fn random_docs(max: DocId, one_in: u8) -> Vec<DocId> {
    (0..max).filter(|_| fastrand::u8(0..one_in) == 0).collect()
}
