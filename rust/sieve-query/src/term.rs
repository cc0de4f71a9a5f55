//! Query terms.

use std::borrow::Cow;
use std::fmt;

use sieve_posting::{TermDescriptor, TermValue};

/// A leaf predicate of a query: one value looked up in one index.
///
/// Terms are immutable once built. The truncation profile selects an
/// alternate, size-reduced posting representation; an empty name selects the
/// main chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term {
    index_name: String,
    value: TermValue,
    truncate_name: String,
    boost: i32,
}

impl Term {
    pub const DEFAULT_BOOST: i32 = 100;

    /// A word term of a text or keyword index.
    pub fn new(index_name: impl Into<String>, word: impl Into<String>) -> Term {
        Term::with_value(index_name, TermValue::Word(word.into()))
    }

    /// An inclusive numeric range of a number index.
    pub fn number_range(index_name: impl Into<String>, left: i64, right: i64) -> Term {
        Term::with_value(index_name, TermValue::NumberRange { left, right })
    }

    pub fn with_value(index_name: impl Into<String>, value: TermValue) -> Term {
        Term {
            index_name: index_name.into(),
            value,
            truncate_name: String::new(),
            boost: Self::DEFAULT_BOOST,
        }
    }

    pub fn with_truncate_name(mut self, truncate_name: impl Into<String>) -> Term {
        self.truncate_name = truncate_name.into();
        self
    }

    pub fn with_boost(mut self, boost: i32) -> Term {
        self.boost = boost;
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn value(&self) -> &TermValue {
        &self.value
    }

    pub fn truncate_name(&self) -> &str {
        &self.truncate_name
    }

    pub fn boost(&self) -> i32 {
        self.boost
    }

    /// The value in the canonical form used by posting cache keys.
    pub fn normalized_word(&self) -> Cow<'_, str> {
        self.value.normalized()
    }

    /// Descriptor of the main-chain posting of this term. The caller attaches
    /// a truncation profile when one applies.
    pub(crate) fn descriptor(&self) -> TermDescriptor {
        TermDescriptor::new(self.index_name.clone(), self.value.clone())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index_name, self.value)?;
        if !self.truncate_name.is_empty() {
            write!(f, "#{}", self.truncate_name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Term;

    #[test]
    fn test_display() {
        assert_eq!(Term::new("title", "apple").to_string(), "title:apple");
        assert_eq!(
            Term::new("title", "apple")
                .with_truncate_name("top")
                .to_string(),
            "title:apple#top"
        );
        assert_eq!(Term::number_range("price", -5, 10).to_string(), "price:[-5,10]");
    }

    #[test]
    fn test_defaults() {
        let term = Term::new("title", "apple");
        assert_eq!(term.boost(), Term::DEFAULT_BOOST);
        assert_eq!(term.truncate_name(), "");
        assert_eq!(term.with_boost(7).boost(), 7);
    }
}
