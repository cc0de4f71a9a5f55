//! Resolution of query terms to posting handles.
//!
//! The [`PostingResolver`] is the only place where executors obtain postings.
//! It caches one canonical posting per `(word, index, truncation profile,
//! layer)` key for the lifetime of a search session and hands out private
//! clones, so a term repeated in a query, or across queries of the same
//! session, is read from the index at most once.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, trace, warn};
use sieve_common::{Result, error::Error};
use sieve_posting::{
    DocId, IndexPartitionReader, IndexReader, IndexScope, LayerMeta, LookupRequest,
    PostingIterator, PostingType, SubDocJoin,
};

use crate::executor::TermExecutor;
use crate::options::QueryOptions;
use crate::term::Term;

mod handle;

pub use handle::PostingHandle;
use handle::LeaseTracker;

/// Reserved truncation profile name requesting the bitmap representation.
pub const BITMAP_TRUNCATE_NAME: &str = "__bitmap__";

/// Counters describing the work a resolver has done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Calls to [`PostingResolver::lookup`].
    pub lookups: u64,
    /// Lookups answered from the cache, including cached absent postings.
    pub cache_hits: u64,
    /// Requests sent to index readers. A miss costs up to two probes when
    /// the first representation is absent.
    pub index_probes: u64,
    /// Misses answered by the second representation.
    pub fallbacks: u64,
    pub handles_issued: u64,
    pub handles_outstanding: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PostingCacheKey {
    word: String,
    index_name: String,
    truncate_name: String,
    layer: String,
}

impl PostingCacheKey {
    fn new(term: &Term, layer: Option<&LayerMeta>) -> PostingCacheKey {
        PostingCacheKey {
            word: term.normalized_word().into_owned(),
            index_name: term.index_name().to_string(),
            truncate_name: term.truncate_name().to_string(),
            layer: layer.map(LayerMeta::range_string).unwrap_or_default(),
        }
    }
}

impl fmt::Display for PostingCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index_name, self.word)?;
        if !self.truncate_name.is_empty() {
            write!(f, "#{}", self.truncate_name)?;
        }
        if !self.layer.is_empty() {
            write!(f, "@{}", self.layer)?;
        }
        Ok(())
    }
}

/// The outcome of resolving one cache key. An absent posting is cached too.
struct CachedPosting {
    template: Option<Arc<dyn PostingIterator>>,
    join: Option<Arc<SubDocJoin>>,
}

impl CachedPosting {
    fn absent() -> CachedPosting {
        CachedPosting {
            template: None,
            join: None,
        }
    }

    fn checkout(&self, leases: &Arc<LeaseTracker>) -> Option<PostingHandle> {
        self.template
            .as_ref()
            .map(|template| PostingHandle::checkout(template, self.join.as_ref(), leases))
    }
}

/// Resolves terms to [`PostingHandle`]s against one index partition.
///
/// Resolution of a cache key consults the index at most once per resolver
/// lifetime (until [`clear`](Self::clear)). Every lookup returns a fresh
/// handle with its own cursor.
///
/// The resolver is single-threaded: every operation that touches the cache
/// takes `&mut self`. Independent scans use independent resolvers.
pub struct PostingResolver {
    partition: Arc<dyn IndexPartitionReader>,
    options: QueryOptions,
    cache: AHashMap<PostingCacheKey, CachedPosting>,
    join: Option<Arc<SubDocJoin>>,
    leases: Arc<LeaseTracker>,
    stats: ResolverStats,
}

impl PostingResolver {
    pub fn new(partition: Arc<dyn IndexPartitionReader>, options: QueryOptions) -> Self {
        PostingResolver {
            partition,
            options,
            cache: AHashMap::new(),
            join: None,
            leases: Arc::new(LeaseTracker::default()),
            stats: ResolverStats::default(),
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Resolves `term`, optionally bounded to the main-document ranges of
    /// `layer`, and returns a private handle over its posting.
    ///
    /// Returns `Ok(None)` when the index or the term does not exist: a missing
    /// term matches nothing, it is not a failure.
    ///
    /// # Errors
    ///
    /// Reader failures, and a `NotFound` error when a sub document index is
    /// queried on a partition without a main↔sub join. Failed resolutions are
    /// not cached.
    pub fn lookup(
        &mut self,
        term: &Term,
        layer: Option<&LayerMeta>,
    ) -> Result<Option<PostingHandle>> {
        self.stats.lookups += 1;
        let key = PostingCacheKey::new(term, layer);
        if let Some(cached) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            trace!("posting cache hit: {key}");
            return Ok(cached.checkout(&self.leases));
        }

        trace!("posting cache miss: {key}");
        let cached = self.resolve(term, layer)?;
        let handle = cached.checkout(&self.leases);
        self.cache.insert(key, cached);
        Ok(handle)
    }

    /// Resolves `term` and wraps the handle in a [`TermExecutor`].
    pub fn term_executor(&mut self, term: Term, layer: Option<&LayerMeta>) -> Result<TermExecutor> {
        let posting = self.lookup(&term, layer)?;
        Ok(TermExecutor::new(term, posting))
    }

    /// The main↔sub join created for sub document lookups, if any was needed
    /// so far.
    pub fn sub_doc_join(&self) -> Option<Arc<SubDocJoin>> {
        self.join.clone()
    }

    /// Finds the document holding the primary key `key`.
    ///
    /// With `ignore_deleted`, a deleted key still yields the last document it
    /// occupied.
    pub fn lookup_by_key(&self, key: &str, ignore_deleted: bool) -> Result<Option<DocId>> {
        let Some(primary_key) = self.partition.primary_key_reader() else {
            warn!("primary key lookup of '{key}' on a partition without primary key");
            return Ok(None);
        };
        let found = primary_key.lookup(key)?;
        Ok(if ignore_deleted { found.last } else { found.live })
    }

    /// Ends the session: drops every canonical posting and the join.
    ///
    /// Returns the number of handles still alive. They stay valid, since each
    /// keeps its own reference to the data it reads.
    pub fn clear(&mut self) -> usize {
        let outstanding = self.leases.outstanding();
        if outstanding > 0 {
            warn!("clearing posting cache with {outstanding} handles outstanding");
        }
        debug!("clearing {} cached postings", self.cache.len());
        self.cache.clear();
        self.join = None;
        outstanding as usize
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            handles_issued: self.leases.issued(),
            handles_outstanding: self.leases.outstanding(),
            ..self.stats
        }
    }

    fn resolve(&mut self, term: &Term, layer: Option<&LayerMeta>) -> Result<CachedPosting> {
        let Some(handle) = self.partition.resolve_index_reader(term.index_name()) else {
            warn!("index '{}' not found, {term} matches nothing", term.index_name());
            return Ok(CachedPosting::absent());
        };

        let join = match handle.scope {
            IndexScope::Main => None,
            IndexScope::Sub => Some(self.ensure_join(term.index_name())?),
        };
        let ranges = match (layer, &join) {
            (None, _) => None,
            (Some(layer), None) => Some(layer.to_half_open()),
            (Some(layer), Some(join)) => Some(join.sub_ranges(layer)?),
        };

        let template = self.lookup_with_fallback(handle.reader.as_ref(), term, ranges.as_deref())?;
        Ok(CachedPosting {
            template: template.map(Arc::from),
            join,
        })
    }

    /// Looks up the requested representation first and the other one when it
    /// is absent. The reserved bitmap profile prefers the bitmap; any other
    /// profile (including the main chain) prefers the normal posting.
    fn lookup_with_fallback(
        &mut self,
        reader: &dyn IndexReader,
        term: &Term,
        ranges: Option<&[Range<DocId>]>,
    ) -> Result<Option<Box<dyn PostingIterator>>> {
        let mut descriptor = term.descriptor();
        let order = if term.truncate_name() == BITMAP_TRUNCATE_NAME {
            [PostingType::Bitmap, PostingType::Normal]
        } else {
            if !term.truncate_name().is_empty() {
                descriptor = descriptor.with_truncate_name(term.truncate_name());
            }
            [PostingType::Normal, PostingType::Bitmap]
        };

        for (attempt, posting_type) in order.into_iter().enumerate() {
            let request = LookupRequest {
                term: &descriptor,
                top_k: self.options.get_top_k(),
                posting_type,
                ranges,
            };
            self.stats.index_probes += 1;
            if let Some(posting) = reader.lookup(&request)? {
                if attempt > 0 {
                    self.stats.fallbacks += 1;
                    debug!(
                        "{term}: {} posting absent, using {}",
                        order[0].as_str(),
                        posting_type.as_str()
                    );
                }
                return Ok(Some(posting));
            }
        }
        Ok(None)
    }

    fn ensure_join(&mut self, index_name: &str) -> Result<Arc<SubDocJoin>> {
        if let Some(join) = &self.join {
            return Ok(Arc::clone(join));
        }
        let join = self.partition.create_sub_doc_join()?.ok_or_else(|| {
            Error::not_found(format!("sub document join required by index '{index_name}'"))
        })?;
        debug!("created main/sub doc join for index '{index_name}'");
        let join = Arc::new(join);
        self.join = Some(Arc::clone(&join));
        Ok(join)
    }
}

impl fmt::Debug for PostingResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostingResolver")
            .field("options", &self.options)
            .field("cached", &self.cache.len())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
