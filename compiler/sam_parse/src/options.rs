//! Parser limits.

/// Bounds on the work one parse may do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParserOptions {
    /// Stack versions kept alive after each round.
    pub max_versions: usize,
    /// Stack entries error recovery may fold into one ERROR node.
    pub max_pop_depth: usize,
    /// MISSING tokens error recovery may insert before one lookahead.
    pub max_missing_insertions: usize,
    /// Reductions a version may perform before it shifts.
    pub max_reduce_steps: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            max_versions: 6,
            max_pop_depth: 16,
            max_missing_insertions: 3,
            max_reduce_steps: 10_000,
        }
    }
}
