//! Reuse of subtrees from a previous, edited tree.
//!
//! # Architecture
//!
//! 1. **Edit** - the caller applies [`InputEdit`]s to the old tree, which
//!    flags every subtree whose text or lexer lookahead was touched.
//! 2. **Cursor** - [`ReuseCursor`] walks the edited tree in step with the
//!    parser, offering the largest subtree that starts at the current
//!    position.
//! 3. **Check** - the parser accepts the offer only when it would have
//!    built the same subtree itself; otherwise it asks the cursor to
//!    descend and tries the first child.
//!
//! [`InputEdit`]: sam_ir::InputEdit

use std::sync::Arc;

use sam_ir::{Length, Subtree, Tree};

/// Statistics for one incremental parse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReuseStats {
    /// Subtrees taken from the old tree (leaves included).
    pub reused_nodes: u32,
    /// Bytes covered by reused subtrees.
    pub reused_bytes: u32,
    /// Bytes in the parsed text.
    pub total_bytes: u32,
    /// The old tree could not be used and the text was parsed from scratch.
    pub fallback: bool,
}

impl ReuseStats {
    /// Percentage of the text covered by reused subtrees.
    #[inline]
    #[allow(
        clippy::cast_precision_loss,
        reason = "byte counts never approach 2^52"
    )]
    pub fn reuse_rate(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            (f64::from(self.reused_bytes) / f64::from(self.total_bytes)) * 100.0
        }
    }

    pub(crate) fn record(&mut self, subtree: &Subtree) {
        self.reused_nodes += 1;
        self.reused_bytes += subtree.size().bytes;
    }
}

#[derive(Clone, Debug)]
struct Frame {
    subtree: Subtree,
    start: Length,
    /// Index in the parent's children.
    index: usize,
}

/// Depth-first walk over an old tree, driven by byte position.
pub(crate) struct ReuseCursor {
    stack: Vec<Frame>,
    /// External scanner state left by everything before the current frame.
    external_state: Option<Arc<[u8]>>,
}

impl ReuseCursor {
    pub fn new(tree: &Tree) -> Self {
        ReuseCursor {
            stack: vec![Frame {
                subtree: tree.root_subtree().clone(),
                start: Length::ZERO,
                index: 0,
            }],
            external_state: None,
        }
    }

    /// The largest non-empty subtree starting exactly at `position`, if
    /// any. Subtrees ending at or before `position` are skipped for good.
    pub fn candidate(&mut self, position: u32) -> Option<(Subtree, Length)> {
        loop {
            let frame = self.stack.last()?;
            let start = frame.start.bytes;
            let end = start + frame.subtree.size().bytes;
            if start > position {
                return None;
            }
            if end <= position {
                self.advance();
            } else if start < position {
                if !self.descend() {
                    self.advance();
                }
            } else {
                return Some((frame.subtree.clone(), frame.start));
            }
        }
    }

    /// Replace the current subtree by its first child. Returns `false` for
    /// leaves.
    pub fn descend(&mut self) -> bool {
        let Some(frame) = self.stack.last() else {
            return false;
        };
        let Some(first) = frame.subtree.children().first() else {
            return false;
        };
        let child = Frame {
            subtree: first.clone(),
            start: frame.start,
            index: 0,
        };
        self.stack.push(child);
        true
    }

    /// Move past the current subtree.
    pub fn advance(&mut self) {
        while let Some(frame) = self.stack.pop() {
            if frame.subtree.has_external_tokens() {
                self.external_state = frame.subtree.last_external_state().cloned();
            }
            let Some(parent) = self.stack.last() else {
                return;
            };
            if let Some(sibling) = parent.subtree.children().get(frame.index + 1) {
                let next = Frame {
                    subtree: sibling.clone(),
                    start: frame.start + frame.subtree.size(),
                    index: frame.index + 1,
                };
                self.stack.push(next);
                return;
            }
        }
    }

    /// External scanner state in effect at the start of the current
    /// subtree.
    pub fn external_state(&self) -> Option<&[u8]> {
        self.external_state.as_deref()
    }
}

#[cfg(test)]
mod tests;
