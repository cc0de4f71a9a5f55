//! In-memory implementations of the index collaborators.
//!
//! These back unit tests, integration tests and embedders that keep small
//! indexes in memory. They are not an index format: postings are held as
//! [`ListPosting`](crate::ListPosting) and [`BitmapPosting`](crate::BitmapPosting)
//! values and handed out as cheap clones.

mod faulty;
mod index;
mod join;
mod partition;
mod primary_key;

pub use faulty::{Fault, FaultyPosting};
pub use index::{MemIndexReader, RecordedLookup};
pub use join::MemJoinIndex;
pub use partition::MemPartition;
pub use primary_key::MemPrimaryKeyIndex;
