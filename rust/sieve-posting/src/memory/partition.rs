use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use sieve_common::Result;

use crate::join::SubDocJoin;
use crate::memory::{MemIndexReader, MemJoinIndex, MemPrimaryKeyIndex};
use crate::reader::{
    IndexPartitionReader, IndexReader, IndexScope, PrimaryKeyReader, ReaderHandle,
};

/// An [`IndexPartitionReader`] assembled from in-memory parts.
///
/// ```rust
/// use std::sync::Arc;
/// use sieve_posting::ListPosting;
/// use sieve_posting::memory::{MemIndexReader, MemPartition};
///
/// let title = MemIndexReader::new().with_posting("rust", ListPosting::new([1, 4, 9]));
/// let partition = MemPartition::new().with_index("title", Arc::new(title));
/// ```
#[derive(Default)]
pub struct MemPartition {
    indexes: AHashMap<String, ReaderHandle>,
    sub_docs: Option<MemJoinIndex>,
    primary_key: Option<Arc<MemPrimaryKeyIndex>>,
    join_creations: AtomicU64,
}

impl MemPartition {
    pub fn new() -> MemPartition {
        Self::default()
    }

    /// Registers an index over main documents.
    pub fn with_index(self, name: impl Into<String>, reader: Arc<MemIndexReader>) -> MemPartition {
        self.with_reader(name, reader, IndexScope::Main)
    }

    /// Registers an index over sub documents.
    pub fn with_sub_index(
        self,
        name: impl Into<String>,
        reader: Arc<MemIndexReader>,
    ) -> MemPartition {
        self.with_reader(name, reader, IndexScope::Sub)
    }

    /// Declares the sub document layout, as the number of children of each
    /// main document.
    pub fn with_sub_docs(mut self, child_counts: impl IntoIterator<Item = u32>) -> MemPartition {
        self.sub_docs = Some(MemJoinIndex::from_child_counts(child_counts));
        self
    }

    pub fn with_primary_key(mut self, primary_key: MemPrimaryKeyIndex) -> MemPartition {
        self.primary_key = Some(Arc::new(primary_key));
        self
    }

    /// How many times a main↔sub join was created from this partition.
    pub fn join_creations(&self) -> u64 {
        self.join_creations.load(Ordering::Relaxed)
    }

    fn with_reader(
        mut self,
        name: impl Into<String>,
        reader: Arc<MemIndexReader>,
        scope: IndexScope,
    ) -> MemPartition {
        let reader: Arc<dyn IndexReader> = reader;
        self.indexes
            .insert(name.into(), ReaderHandle { reader, scope });
        self
    }
}

impl IndexPartitionReader for MemPartition {
    fn resolve_index_reader(&self, index_name: &str) -> Option<ReaderHandle> {
        self.indexes.get(index_name).cloned()
    }

    fn create_sub_doc_join(&self) -> Result<Option<SubDocJoin>> {
        let Some(sub_docs) = &self.sub_docs else {
            return Ok(None);
        };
        self.join_creations.fetch_add(1, Ordering::Relaxed);
        Ok(Some(sub_docs.to_join()))
    }

    fn primary_key_reader(&self) -> Option<Arc<dyn PrimaryKeyReader>> {
        self.primary_key
            .as_ref()
            .map(|pk| Arc::clone(pk) as Arc<dyn PrimaryKeyReader>)
    }
}
