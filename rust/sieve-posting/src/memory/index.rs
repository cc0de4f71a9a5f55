use std::ops::Range;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use sieve_common::Result;

use crate::bitmap::BitmapPosting;
use crate::list::ListPosting;
use crate::posting::{PostingIterator, PostingType};
use crate::reader::{IndexReader, LookupRequest};
use crate::DocId;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PostingKey {
    word: String,
    posting_type: PostingType,
    truncate_name: String,
}

enum StoredPosting {
    List(ListPosting),
    Bitmap(BitmapPosting),
    /// Any other iterator. Layer ranges are not applied to it.
    Custom(Box<dyn PostingIterator>),
}

impl StoredPosting {
    fn materialize(&self, ranges: Option<&[Range<DocId>]>) -> Box<dyn PostingIterator> {
        match (self, ranges) {
            (StoredPosting::List(posting), Some(ranges)) => Box::new(posting.restrict(ranges)),
            (StoredPosting::List(posting), None) => Box::new(posting.clone()),
            (StoredPosting::Bitmap(posting), Some(ranges)) => Box::new(posting.restrict(ranges)),
            (StoredPosting::Bitmap(posting), None) => Box::new(posting.clone()),
            (StoredPosting::Custom(posting), _) => posting.boxed_clone(),
        }
    }
}

/// One lookup received by a [`MemIndexReader`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedLookup {
    pub word: String,
    pub posting_type: PostingType,
    pub truncate_name: Option<String>,
    pub ranges: Option<Vec<Range<DocId>>>,
}

/// An [`IndexReader`] over postings registered in memory.
///
/// Every word can carry a main-chain posting, any number of truncated
/// postings (keyed by truncation profile name) and a bitmap posting. Lookups
/// match exactly: a missing truncation profile does not fall back to another
/// representation, which is left to the caller.
///
/// The reader counts and records the lookups it serves, which lets tests
/// observe how often and in which order the storage layer is consulted.
#[derive(Default)]
pub struct MemIndexReader {
    postings: AHashMap<PostingKey, StoredPosting>,
    lookups: AtomicU64,
    log: Mutex<Vec<RecordedLookup>>,
}

impl MemIndexReader {
    pub fn new() -> MemIndexReader {
        Self::default()
    }

    /// Registers the main-chain posting of `word`.
    pub fn with_posting(self, word: impl Into<String>, posting: ListPosting) -> MemIndexReader {
        self.with_stored(word, PostingType::Normal, "", StoredPosting::List(posting))
    }

    /// Registers a truncated (top-K) posting of `word` under `truncate_name`.
    pub fn with_truncated_posting(
        self,
        word: impl Into<String>,
        truncate_name: &str,
        posting: ListPosting,
    ) -> MemIndexReader {
        self.with_stored(
            word,
            PostingType::Normal,
            truncate_name,
            StoredPosting::List(posting),
        )
    }

    pub fn with_bitmap_posting(
        self,
        word: impl Into<String>,
        posting: BitmapPosting,
    ) -> MemIndexReader {
        self.with_stored(word, PostingType::Bitmap, "", StoredPosting::Bitmap(posting))
    }

    /// Registers an arbitrary iterator as the main-chain posting of `word`,
    /// under the representation it reports.
    pub fn with_custom_posting(
        self,
        word: impl Into<String>,
        posting: impl PostingIterator + 'static,
    ) -> MemIndexReader {
        let posting_type = posting.posting_type();
        self.with_stored(word, posting_type, "", StoredPosting::Custom(Box::new(posting)))
    }

    /// Number of lookups served so far, hits and misses alike.
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Lookups served so far, in arrival order.
    pub fn recorded_lookups(&self) -> Vec<RecordedLookup> {
        self.log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn with_stored(
        mut self,
        word: impl Into<String>,
        posting_type: PostingType,
        truncate_name: &str,
        posting: StoredPosting,
    ) -> MemIndexReader {
        let key = PostingKey {
            word: word.into(),
            posting_type,
            truncate_name: truncate_name.to_string(),
        };
        self.postings.insert(key, posting);
        self
    }
}

impl IndexReader for MemIndexReader {
    fn lookup(&self, request: &LookupRequest<'_>) -> Result<Option<Box<dyn PostingIterator>>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let word = request.term.value.normalized().into_owned();
        if let Ok(mut log) = self.log.lock() {
            log.push(RecordedLookup {
                word: word.clone(),
                posting_type: request.posting_type,
                truncate_name: request.term.truncate_name.clone(),
                ranges: request.ranges.map(<[_]>::to_vec),
            });
        }

        let truncate_name = match request.posting_type {
            PostingType::Normal => request.term.truncate_name.clone().unwrap_or_default(),
            PostingType::Bitmap => String::new(),
        };
        let key = PostingKey {
            word,
            posting_type: request.posting_type,
            truncate_name,
        };
        Ok(self
            .postings
            .get(&key)
            .map(|posting| posting.materialize(request.ranges)))
    }
}
