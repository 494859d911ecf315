//! Stack growth guard for recursive syntax tree walks.
//!
//! Syntax trees built from left-recursive repetition rules can be as deep as
//! the number of statements in a file. Recursive operations over them (edit
//! propagation, structural comparison, S-expression printing) wrap each
//! recursive step in [`ensure_sufficient_stack`].
//!
//! - **Native targets**: grows the stack on demand through `stacker`.
//! - **WASM targets**: calls straight through.

/// Minimum stack space to keep available (128KB red zone).
const RED_ZONE: usize = 128 * 1024;

/// Stack space to allocate per growth step (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
///
/// ```text
/// fn depth(node: &Subtree) -> usize {
///     ensure_sufficient_stack(|| {
///         1 + node.children().iter().map(depth).max().unwrap_or(0)
///     })
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version: WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
