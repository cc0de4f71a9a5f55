/// Tuning knobs of query execution.
///
/// Options are built with chained setters starting from the defaults:
///
/// ```rust
/// use sieve_query::QueryOptions;
///
/// let options = QueryOptions::new().top_k(200).require_sub_hit(true);
/// assert_eq!(options.get_top_k(), 200);
/// assert!(options.get_bitmap_and());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryOptions {
    top_k: u32,
    bitmap_and: bool,
    require_sub_hit: bool,
}

impl QueryOptions {
    pub const DEFAULT_TOP_K: u32 = 1000;

    pub fn new() -> Self {
        Self {
            top_k: Self::DEFAULT_TOP_K,
            bitmap_and: true,
            require_sub_hit: false,
        }
    }

    /// Sets the top-K hint forwarded to index readers with every posting
    /// lookup. Readers use it to pick a truncated representation.
    pub fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    /// Allows [`ExecutorNode::and`](crate::ExecutorNode::and) to build a
    /// bitmap-accelerated intersection when a bitmap-backed term is present.
    pub fn bitmap_and(mut self, enabled: bool) -> Self {
        self.bitmap_and = enabled;
        self
    }

    /// Requires every emitted main document to have at least one matching sub
    /// document, unless it matched purely at the main-document level.
    pub fn require_sub_hit(mut self, required: bool) -> Self {
        self.require_sub_hit = required;
        self
    }

    pub fn get_top_k(&self) -> u32 {
        self.top_k
    }

    pub fn get_bitmap_and(&self) -> bool {
        self.bitmap_and
    }

    pub fn get_require_sub_hit(&self) -> bool {
        self.require_sub_hit
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::new()
    }
}
