use std::sync::Arc;

use crate::memory::{Fault, FaultyPosting, MemIndexReader, MemPartition, MemPrimaryKeyIndex};
use crate::{
    BitmapPosting, END_DOCID, IndexPartitionReader, IndexReader, IndexScope, ListPosting,
    LookupRequest, PkLookup, PostingIterator, PostingType, PrimaryKeyReader, TermDescriptor,
    TermValue,
};

fn word(index: &str, word: &str) -> TermDescriptor {
    TermDescriptor::new(index, TermValue::Word(word.to_string()))
}

#[test]
fn test_reader_matches_exact_representation() {
    let reader = MemIndexReader::new()
        .with_posting("apple", ListPosting::new([1, 2, 3]))
        .with_truncated_posting("apple", "top", ListPosting::new([2]))
        .with_bitmap_posting("pear", BitmapPosting::from_docs([4, 5]));

    let apple = word("title", "apple");
    let normal = LookupRequest {
        term: &apple,
        top_k: 10,
        posting_type: PostingType::Normal,
        ranges: None,
    };
    let mut posting = reader.lookup(&normal).unwrap().unwrap();
    assert_eq!(posting.seek(0).unwrap(), 1);

    let truncated = apple.clone().with_truncate_name("top");
    let request = LookupRequest {
        term: &truncated,
        ..normal
    };
    let mut posting = reader.lookup(&request).unwrap().unwrap();
    assert_eq!(posting.seek(0).unwrap(), 2);

    let missing_profile = apple.clone().with_truncate_name("recent");
    let request = LookupRequest {
        term: &missing_profile,
        ..normal
    };
    assert!(reader.lookup(&request).unwrap().is_none());

    let bitmap = LookupRequest {
        posting_type: PostingType::Bitmap,
        ..normal
    };
    assert!(reader.lookup(&bitmap).unwrap().is_none());

    let pear = word("title", "pear");
    let request = LookupRequest {
        term: &pear,
        posting_type: PostingType::Bitmap,
        ..normal
    };
    let posting = reader.lookup(&request).unwrap().unwrap();
    assert!(posting.test(5));

    assert_eq!(reader.lookup_count(), 5);
    let log = reader.recorded_lookups();
    assert_eq!(log.len(), 5);
    assert_eq!(log[1].truncate_name.as_deref(), Some("top"));
    assert_eq!(log[4].posting_type, PostingType::Bitmap);
}

#[test]
fn test_reader_applies_ranges() {
    let reader = MemIndexReader::new().with_posting("apple", ListPosting::new(0..50));
    let apple = word("title", "apple");
    let ranges = [10..12, 40..41];
    let request = LookupRequest {
        term: &apple,
        top_k: 10,
        posting_type: PostingType::Normal,
        ranges: Some(&ranges),
    };
    let mut posting = reader.lookup(&request).unwrap().unwrap();
    assert_eq!(posting.seek(0).unwrap(), 10);
    assert_eq!(posting.seek(12).unwrap(), 40);
    assert_eq!(posting.seek(41).unwrap(), END_DOCID);
    assert_eq!(reader.recorded_lookups()[0].ranges, Some(vec![10..12, 40..41]));
}

#[test]
fn test_number_range_terms() {
    let reader = MemIndexReader::new().with_posting("[1,10]", ListPosting::new([3]));
    let term = TermDescriptor::new("price", TermValue::NumberRange { left: 1, right: 10 });
    let request = LookupRequest {
        term: &term,
        top_k: 10,
        posting_type: PostingType::Normal,
        ranges: None,
    };
    assert!(reader.lookup(&request).unwrap().is_some());
}

#[test]
fn test_partition_resolves_scopes() {
    let reader = Arc::new(MemIndexReader::new());
    let partition = MemPartition::new()
        .with_index("title", Arc::clone(&reader))
        .with_sub_index("sku", reader)
        .with_sub_docs([1, 2]);

    assert_eq!(
        partition.resolve_index_reader("title").unwrap().scope,
        IndexScope::Main
    );
    assert_eq!(
        partition.resolve_index_reader("sku").unwrap().scope,
        IndexScope::Sub
    );
    assert!(partition.resolve_index_reader("body").is_none());

    let join = partition.create_sub_doc_join().unwrap().unwrap();
    assert_eq!(join.sub_range(1).unwrap(), 1..3);
    assert_eq!(partition.join_creations(), 1);

    assert!(MemPartition::new().create_sub_doc_join().unwrap().is_none());
}

#[test]
fn test_primary_key_remembers_deleted_doc() {
    let mut pk = MemPrimaryKeyIndex::new();
    pk.insert("user-1", 3);
    pk.insert("user-2", 7);
    assert!(pk.delete("user-2"));
    assert!(!pk.delete("user-9"));

    assert_eq!(
        pk.lookup("user-1").unwrap(),
        PkLookup {
            live: Some(3),
            last: Some(3)
        }
    );
    assert_eq!(
        pk.lookup("user-2").unwrap(),
        PkLookup {
            live: None,
            last: Some(7)
        }
    );
    assert_eq!(pk.lookup("user-9").unwrap(), PkLookup::default());

    let partition = MemPartition::new().with_primary_key(pk);
    let reader = partition.primary_key_reader().unwrap();
    assert_eq!(reader.lookup("user-1").unwrap().live, Some(3));
}

#[test]
fn test_faulty_posting_fails_chosen_seek() {
    let mut posting = FaultyPosting::new(ListPosting::new([1, 2, 3]), 2, Fault::FileIo);
    assert_eq!(posting.seek(0).unwrap(), 1);
    assert!(posting.seek(1).unwrap_err().is_file_io());
    assert_eq!(posting.seek(2).unwrap(), 2);

    let template = FaultyPosting::new(ListPosting::new([1]), 1, Fault::Decode);
    let mut clone = template.boxed_clone();
    assert!(clone.seek(0).unwrap_err().is_decode());
}
