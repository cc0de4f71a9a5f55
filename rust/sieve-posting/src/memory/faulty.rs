use sieve_common::{Result, error::Error};

use crate::posting::{PostingIterator, PostingType, TermMeta};
use crate::DocId;

/// The failure a [`FaultyPosting`] injects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    FileIo,
    Decode,
}

/// Wraps a posting and fails one chosen `seek` call, for exercising error
/// propagation through executor trees.
pub struct FaultyPosting {
    inner: Box<dyn PostingIterator>,
    /// 1-based index of the failing seek call.
    fail_on_seek: u64,
    seeks: u64,
    fault: Fault,
}

impl FaultyPosting {
    pub fn new(inner: impl PostingIterator + 'static, fail_on_seek: u64, fault: Fault) -> Self {
        FaultyPosting {
            inner: Box::new(inner),
            fail_on_seek,
            seeks: 0,
            fault,
        }
    }

    fn make_error(&self) -> Error {
        match self.fault {
            Fault::FileIo => Error::file_io(
                "posting block",
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "injected read failure"),
            ),
            Fault::Decode => Error::decode("posting block", "injected corrupt block"),
        }
    }
}

impl PostingIterator for FaultyPosting {
    fn posting_type(&self) -> PostingType {
        self.inner.posting_type()
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        self.seeks += 1;
        if self.seeks == self.fail_on_seek {
            log::debug!("injecting {:?} fault on seek #{}", self.fault, self.seeks);
            return Err(self.make_error());
        }
        self.inner.seek(target)
    }

    fn test(&self, doc: DocId) -> bool {
        self.inner.test(doc)
    }

    fn field_map(&self) -> u8 {
        self.inner.field_map()
    }

    fn term_meta(&self) -> TermMeta {
        self.inner.term_meta()
    }

    fn truncated_term_meta(&self) -> TermMeta {
        self.inner.truncated_term_meta()
    }

    fn boxed_clone(&self) -> Box<dyn PostingIterator> {
        Box::new(FaultyPosting {
            inner: self.inner.boxed_clone(),
            fail_on_seek: self.fail_on_seek,
            seeks: self.seeks,
            fault: self.fault,
        })
    }
}
