//! Low-level term descriptors handed to index readers.

use std::borrow::Cow;
use std::fmt;

/// The searchable value of a term.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TermValue {
    /// A token of a text or keyword index, already normalized by the analyzer.
    Word(String),
    /// An inclusive numeric range of a number index.
    NumberRange { left: i64, right: i64 },
}

impl TermValue {
    /// Canonical textual form used for cache keys and in-memory lookups.
    pub fn normalized(&self) -> Cow<'_, str> {
        match self {
            TermValue::Word(word) => Cow::Borrowed(word),
            TermValue::NumberRange { left, right } => Cow::Owned(format!("[{left},{right}]")),
        }
    }
}

impl fmt::Display for TermValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

/// What an [`IndexReader`](crate::IndexReader) is asked to look up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermDescriptor {
    pub index_name: String,
    pub value: TermValue,
    /// Truncation profile to read. `None` reads the main chain.
    pub truncate_name: Option<String>,
}

impl TermDescriptor {
    pub fn new(index_name: impl Into<String>, value: TermValue) -> TermDescriptor {
        TermDescriptor {
            index_name: index_name.into(),
            value,
            truncate_name: None,
        }
    }

    pub fn with_truncate_name(mut self, truncate_name: impl Into<String>) -> TermDescriptor {
        self.truncate_name = Some(truncate_name.into());
        self
    }
}
