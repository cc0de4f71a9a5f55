//! Core definitions (error type, result alias and helper macros), relied upon by all sieve-* crates.

pub mod error;
pub mod macros;
pub mod result;

pub use result::Result;
