//! Seek-based boolean query execution over inverted-index postings.
//!
//! A query is compiled (outside of this crate) into a tree of
//! [`ExecutorNode`]s. Leaves are [`TermExecutor`]s backed by posting handles
//! obtained from a [`PostingResolver`]; inner nodes intersect their children
//! either by leap-frogging ([`AndExecutor`]) or by letting one child drive the
//! scan while bitmap-backed children answer membership tests
//! ([`BitmapAndExecutor`]). [`DocScan`] drives a tree and enumerates the
//! matching main documents and, for nested documents, their matching sub
//! documents.
//!
//! ```rust
//! use std::sync::Arc;
//! use sieve_posting::ListPosting;
//! use sieve_posting::memory::{MemIndexReader, MemPartition};
//! use sieve_query::{DocScan, ExecutorNode, PostingResolver, QueryOptions, Term};
//!
//! let title = MemIndexReader::new()
//!     .with_posting("rust", ListPosting::new([1, 3, 5, 8]))
//!     .with_posting("index", ListPosting::new([3, 4, 8]));
//! let partition = Arc::new(MemPartition::new().with_index("title", Arc::new(title)));
//!
//! let options = QueryOptions::default();
//! let mut resolver = PostingResolver::new(partition, options.clone());
//! let rust = resolver.term_executor(Term::new("title", "rust"), None)?;
//! let index = resolver.term_executor(Term::new("title", "index"), None)?;
//! let root = ExecutorNode::and(vec![rust.into(), index.into()], &options);
//!
//! let docs = DocScan::new(root, resolver.sub_doc_join(), &options)
//!     .collect::<sieve_common::Result<Vec<_>>>()?;
//! assert_eq!(docs, vec![3, 8]);
//! # Ok::<(), sieve_common::error::Error>(())
//! ```

pub mod executor;
pub mod options;
pub mod resolver;
pub mod scan;
pub mod term;

pub use executor::{
    AndExecutor, BitmapAndExecutor, DocFreqKind, ExecutorNode, FieldMapFilter, FieldMatchMode,
    SeekableExecutor, SubDocCoordinator, SubRangeCursor, TermExecutor,
};
pub use options::QueryOptions;
pub use resolver::{BITMAP_TRUNCATE_NAME, PostingHandle, PostingResolver, ResolverStats};
pub use scan::DocScan;
pub use term::Term;
