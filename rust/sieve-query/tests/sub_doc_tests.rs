mod common;

use std::sync::Arc;

use sieve_common::error::Error;
use sieve_posting::memory::{Fault, FaultyPosting, MemIndexReader, MemPartition};
use sieve_posting::{BitmapPosting, DocId, END_DOCID, LayerMeta, ListPosting, SubDocId};
use sieve_query::{
    AndExecutor, DocScan, ExecutorNode, FieldMapFilter, PostingResolver, QueryOptions,
    SeekableExecutor, SubDocCoordinator, Term,
};

use common::collect_docs;

/// Main docs 0, 1 and 2 own sub docs [0, 2), [2, 5) and [5, 7).
///
/// `sku:red` holds sub docs 4 and 6. Every sub doc of main docs 1 and 2 holds
/// `sku:size`, with field bit 0x2 only on sub docs 4 and 5. `title:cotton` is
/// a bitmap over main docs 1 and 2.
fn nested_resolver() -> PostingResolver {
    let sku = MemIndexReader::new()
        .with_posting("red", ListPosting::new([4, 6]))
        .with_posting(
            "size",
            ListPosting::with_field_maps([(2, 0x1), (3, 0x1), (4, 0x2), (5, 0x2), (6, 0x1)]),
        );
    let title = MemIndexReader::new()
        .with_posting("shirt", ListPosting::new([0, 1, 2]))
        .with_bitmap_posting("cotton", BitmapPosting::from_docs([1, 2]));
    let partition = MemPartition::new()
        .with_index("title", Arc::new(title))
        .with_sub_index("sku", Arc::new(sku))
        .with_sub_docs([2, 3, 2]);
    PostingResolver::new(Arc::new(partition), QueryOptions::default())
}

fn red_and_size(resolver: &mut PostingResolver, mask: u8) -> AndExecutor {
    let red = resolver.term_executor(Term::new("sku", "red"), None).unwrap();
    let size = resolver
        .term_executor(Term::new("sku", "size"), None)
        .unwrap()
        .with_field_filter(FieldMapFilter::intersects(mask));
    AndExecutor::new(vec![red.into(), size.into()])
}

/// `title:cotton AND sku:red AND sku:size`, the size term filtered by `mask`.
fn cotton_red_size(resolver: &mut PostingResolver, mask: u8) -> ExecutorNode {
    let cotton = resolver
        .term_executor(Term::new("title", "cotton"), None)
        .unwrap();
    assert!(cotton.is_bitmap());
    let red = resolver.term_executor(Term::new("sku", "red"), None).unwrap();
    let size = resolver
        .term_executor(Term::new("sku", "size"), None)
        .unwrap()
        .with_field_filter(FieldMapFilter::intersects(mask));
    ExecutorNode::and(
        vec![cotton.into(), red.into(), size.into()],
        &QueryOptions::default(),
    )
}

/// Drains `scan`, returning the emitted main docs and every `(main, sub)` hit.
fn drain_scan(scan: &mut DocScan) -> (Vec<DocId>, Vec<(DocId, SubDocId)>) {
    let mut docs = Vec::new();
    let mut hits = Vec::new();
    while let Some(doc) = scan.next_match().unwrap() {
        docs.push(doc);
        while let Some(sub) = scan.next_sub_match(doc).unwrap() {
            hits.push((doc, sub));
        }
    }
    (docs, hits)
}

/// Like [`nested_resolver`] without `title`, but `sku:red` fails on its
/// `fail_on_seek`-th seek.
fn faulty_red_resolver(fail_on_seek: u64) -> PostingResolver {
    let sku = MemIndexReader::new()
        .with_custom_posting(
            "red",
            FaultyPosting::new(ListPosting::new([4, 6]), fail_on_seek, Fault::FileIo),
        )
        .with_posting(
            "size",
            ListPosting::with_field_maps([(2, 0x1), (3, 0x1), (4, 0x2), (5, 0x2), (6, 0x1)]),
        );
    let partition = MemPartition::new()
        .with_sub_index("sku", Arc::new(sku))
        .with_sub_docs([2, 3, 2]);
    PostingResolver::new(Arc::new(partition), QueryOptions::default())
}

#[test]
fn test_sub_and_converges_on_shared_sub_doc() {
    let mut resolver = nested_resolver();
    let mut and = red_and_size(&mut resolver, 0x2);
    assert!(and.has_sub_doc_executor());

    assert_eq!(and.seek(0).unwrap(), 1);
    assert!(!and.is_main_doc_hit(1));
    assert_eq!(and.seek_sub(1, 2, 5).unwrap(), 4);
    assert_eq!(and.seek_sub(1, 5, 5).unwrap(), END_DOCID);
    // Only the current document can be refined.
    assert_eq!(and.seek_sub(0, 0, 2).unwrap(), END_DOCID);
}

#[test]
fn test_sub_and_without_common_field_bit() {
    let mut resolver = nested_resolver();
    let mut and = red_and_size(&mut resolver, 0x8);

    // Main doc 1 still matches at the main document level.
    assert_eq!(and.seek(0).unwrap(), 1);
    assert_eq!(and.seek_sub(1, 2, 5).unwrap(), END_DOCID);
}

#[test]
fn test_sub_term_maps_to_main_docs() {
    let mut resolver = nested_resolver();
    let mut red = resolver.term_executor(Term::new("sku", "red"), None).unwrap();
    assert_eq!(collect_docs(&mut red).unwrap(), vec![1, 2]);
    assert!(resolver.sub_doc_join().is_some());
}

#[test]
fn test_join_is_created_once() {
    let sku = Arc::new(MemIndexReader::new().with_posting("red", ListPosting::new([4])));
    let partition = Arc::new(
        MemPartition::new()
            .with_sub_index("sku", sku)
            .with_sub_docs([2, 3]),
    );
    let mut resolver = PostingResolver::new(partition.clone(), QueryOptions::default());
    resolver.lookup(&Term::new("sku", "red"), None).unwrap();
    resolver.lookup(&Term::new("sku", "blue"), None).unwrap();
    assert_eq!(partition.join_creations(), 1);

    resolver.clear();
    assert!(resolver.sub_doc_join().is_none());
    resolver.lookup(&Term::new("sku", "red"), None).unwrap();
    assert_eq!(partition.join_creations(), 2);
}

#[test]
fn test_main_term_passes_sub_range_through() {
    let mut resolver = nested_resolver();
    let mut shirt = resolver
        .term_executor(Term::new("title", "shirt"), None)
        .unwrap();
    assert_eq!(shirt.seek(1).unwrap(), 1);
    assert!(shirt.is_main_doc_hit(1));
    assert_eq!(shirt.seek_sub(1, 2, 5).unwrap(), 2);
    assert_eq!(shirt.seek_sub(2, 5, 7).unwrap(), END_DOCID);
}

#[test]
fn test_scan_requires_sub_hit() {
    let options = QueryOptions::default().require_sub_hit(true);
    let mut resolver = nested_resolver();
    let root = ExecutorNode::And(red_and_size(&mut resolver, 0x2));
    let mut scan = DocScan::new(root, resolver.sub_doc_join(), &options);

    assert_eq!(scan.next_match().unwrap(), Some(1));
    assert_eq!(scan.next_sub_match(1).unwrap(), Some(4));
    assert_eq!(scan.next_sub_match(1).unwrap(), None);
    // Main doc 2 has red on sub doc 6, whose size entry lacks bit 0x2.
    assert_eq!(scan.next_match().unwrap(), None);
    assert_eq!(scan.total_docs_scanned(), 2);
    assert_eq!(scan.next_match().unwrap(), None);
}

#[test]
fn test_scan_keeps_main_hits_when_sub_hit_optional() {
    let options = QueryOptions::default();
    let mut resolver = nested_resolver();
    let root = ExecutorNode::And(red_and_size(&mut resolver, 0x8));
    let scan = DocScan::new(root, resolver.sub_doc_join(), &options);
    assert_eq!(scan.collect::<sieve_common::Result<Vec<_>>>().unwrap(), vec![1, 2]);

    let options = options.require_sub_hit(true);
    let root = ExecutorNode::And(red_and_size(&mut resolver, 0x8));
    let mut scan = DocScan::new(root, resolver.sub_doc_join(), &options);
    assert_eq!(scan.next_match().unwrap(), None);
}

#[test]
fn test_scan_mixed_main_and_sub_terms() {
    let options = QueryOptions::default().require_sub_hit(true);
    let mut resolver = nested_resolver();
    let shirt = resolver
        .term_executor(Term::new("title", "shirt"), None)
        .unwrap();
    let red = resolver.term_executor(Term::new("sku", "red"), None).unwrap();
    let root = ExecutorNode::and(vec![shirt.into(), red.into()], &options);
    let mut scan = DocScan::new(root, resolver.sub_doc_join(), &options);

    let mut hits = Vec::new();
    while let Some(doc) = scan.next_match().unwrap() {
        while let Some(sub) = scan.next_sub_match(doc).unwrap() {
            hits.push((doc, sub));
        }
    }
    assert_eq!(hits, vec![(1, 4), (2, 6)]);
    assert!(scan.total_seek_count() > 0);
}

#[test]
fn test_scan_rejects_stale_document() {
    let options = QueryOptions::default();
    let mut resolver = nested_resolver();
    let red = resolver.term_executor(Term::new("sku", "red"), None).unwrap();
    let mut scan = DocScan::new(red.into(), resolver.sub_doc_join(), &options);

    assert!(scan.next_sub_match(0).unwrap_err().is_invalid_arg());
    assert_eq!(scan.next_match().unwrap(), Some(1));
    assert!(scan.next_sub_match(2).unwrap_err().is_invalid_arg());
}

#[test]
fn test_scan_reset() {
    let options = QueryOptions::default();
    let mut resolver = nested_resolver();
    let red = resolver.term_executor(Term::new("sku", "red"), None).unwrap();
    let mut scan = DocScan::new(red.into(), resolver.sub_doc_join(), &options);
    assert_eq!(scan.to_string(), "SCAN(TERM:sku:red)");

    assert_eq!(scan.by_ref().collect::<sieve_common::Result<Vec<_>>>().unwrap(), vec![1, 2]);
    scan.reset();
    assert_eq!(scan.next_match().unwrap(), Some(1));
    assert_eq!(scan.next_sub_match(1).unwrap(), Some(4));
    assert_eq!(scan.total_docs_scanned(), 3);
}

#[test]
fn test_sub_layer_translates_ranges() {
    let sku = Arc::new(MemIndexReader::new().with_posting("red", ListPosting::new(0..7)));
    let partition = MemPartition::new()
        .with_sub_index("sku", Arc::clone(&sku))
        .with_sub_docs([2, 3, 2]);
    let mut resolver = PostingResolver::new(Arc::new(partition), QueryOptions::default());

    let layer = LayerMeta::ordered([(1, 1)]).unwrap();
    let mut red = resolver
        .term_executor(Term::new("sku", "red"), Some(&layer))
        .unwrap();
    assert_eq!(sku.recorded_lookups()[0].ranges, Some(vec![2..5]));
    assert_eq!(collect_docs(&mut red).unwrap(), vec![1]);
}

#[test]
fn test_coordinator_converges() {
    let children: [&[u32]; 3] = [&[3, 5, 8, 9], &[1, 5, 9], &[5, 6, 9]];
    let mut calls = 0;
    let first_common = |begin: u32, end: u32, calls: &mut usize| {
        SubDocCoordinator::converge(begin, end, children.len(), |i, cur| {
            *calls += 1;
            Ok(children[i]
                .iter()
                .copied()
                .find(|&sub| sub >= cur)
                .unwrap_or(END_DOCID))
        })
    };

    assert_eq!(first_common(0, 20, &mut calls).unwrap(), 5);
    assert_eq!(first_common(6, 20, &mut calls).unwrap(), 9);
    assert_eq!(first_common(6, 9, &mut calls).unwrap(), END_DOCID);
    assert_eq!(first_common(4, 4, &mut calls).unwrap(), END_DOCID);
    assert!(calls > 0);
}

#[test]
fn test_coordinator_rejects_backward_child() {
    let err = SubDocCoordinator::converge(4, 10, 2, |i, cur| Ok(if i == 1 { cur - 1 } else { cur }))
        .unwrap_err();
    assert!(err.is_internal());
}

#[test]
fn test_bitmap_and_refines_sub_docs() {
    let mut resolver = nested_resolver();
    let mut executor = cotton_red_size(&mut resolver, 0x2);
    let ExecutorNode::BitmapAnd(bitmap_and) = &executor else {
        panic!("expected a bitmap AND, got {executor}");
    };
    assert!(bitmap_and.has_sub_doc_executor());
    assert_eq!(bitmap_and.bitmap_children().len(), 1);
    assert!(matches!(bitmap_and.driver(), Some(ExecutorNode::And(_))));

    assert_eq!(executor.seek(0).unwrap(), 1);
    assert!(!executor.is_main_doc_hit(1));
    assert_eq!(executor.seek_sub(1, 2, 5).unwrap(), 4);
    assert_eq!(executor.seek_sub(1, 5, 5).unwrap(), END_DOCID);
    assert_eq!(executor.seek_sub(0, 0, 2).unwrap(), END_DOCID);

    // Main doc 2 matches, but no sub doc carries both red and bit 0x2.
    assert_eq!(executor.seek(2).unwrap(), 2);
    assert_eq!(executor.seek_sub(2, 5, 7).unwrap(), END_DOCID);
    assert_eq!(executor.seek(3).unwrap(), END_DOCID);
}

#[test]
fn test_scan_bitmap_and_with_sub_terms() {
    let mut resolver = nested_resolver();

    let options = QueryOptions::default().require_sub_hit(true);
    let mut scan = DocScan::new(
        cotton_red_size(&mut resolver, 0x2),
        resolver.sub_doc_join(),
        &options,
    );
    assert_eq!(drain_scan(&mut scan), (vec![1], vec![(1, 4)]));
    assert_eq!(scan.total_docs_scanned(), 2);

    let options = QueryOptions::default();
    let mut scan = DocScan::new(
        cotton_red_size(&mut resolver, 0x2),
        resolver.sub_doc_join(),
        &options,
    );
    assert_eq!(drain_scan(&mut scan), (vec![1, 2], vec![(1, 4)]));
}

#[test]
fn test_sub_and_propagates_child_error() {
    let mut resolver = faulty_red_resolver(2);
    let mut and = red_and_size(&mut resolver, 0x2);
    assert_eq!(
        and.children()[0].to_string(),
        "TERM:sku:red",
        "red is the rarer child"
    );

    // Seek #1 maps red onto main doc 1; converging on its sub docs hits the
    // fault.
    assert_eq!(and.seek(0).unwrap(), 1);
    assert!(and.seek_sub(1, 2, 5).unwrap_err().is_file_io());
}

#[test]
fn test_coordinator_stops_at_child_error() {
    let mut calls = [0; 3];
    let err = SubDocCoordinator::converge(0, 10, 3, |i, cur| {
        calls[i] += 1;
        match i {
            1 => Err(Error::decode("posting block", "corrupt")),
            _ => Ok(cur),
        }
    })
    .unwrap_err();
    assert!(err.is_decode());
    assert_eq!(calls, [1, 1, 0]);
}

#[test]
fn test_scan_aborts_on_sub_hit_error() {
    let options = QueryOptions::default().require_sub_hit(true);
    let mut resolver = faulty_red_resolver(2);
    let red = resolver.term_executor(Term::new("sku", "red"), None).unwrap();
    let mut scan = DocScan::new(red.into(), resolver.sub_doc_join(), &options);

    // Seek #1 lands on main doc 1, seek #2 looks for its sub hit.
    assert!(scan.next_match().unwrap_err().is_file_io());
    assert!(scan.is_aborted());
    assert!(scan.next_match().unwrap_err().is_invalid_arg());
    assert!(scan.next_sub_match(1).unwrap_err().is_invalid_arg());
    assert!(scan.next().is_none());

    scan.reset();
    assert!(!scan.is_aborted());
}

#[test]
fn test_scan_iterator_yields_error_once() {
    let options = QueryOptions::default().require_sub_hit(true);
    let mut resolver = faulty_red_resolver(2);
    let red = resolver.term_executor(Term::new("sku", "red"), None).unwrap();
    let mut scan = DocScan::new(red.into(), resolver.sub_doc_join(), &options);

    let results = scan.by_ref().collect::<Vec<_>>();
    assert_eq!(results.len(), 1);
    assert!(results[0].as_ref().unwrap_err().is_file_io());
    assert!(scan.next().is_none());
}
