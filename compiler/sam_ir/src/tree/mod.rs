//! Concrete syntax trees.
//!
//! A [`Tree`] owns a root [`Subtree`] and the [`Language`] it was parsed
//! with. Trees are persistent: [`Tree::edit`] returns a new tree that shares
//! every subtree the edit did not touch with the original.

mod node;
mod subtree;

use std::fmt;

use sam_stack::ensure_sufficient_stack;

use crate::incremental::InputEdit;
use crate::{Language, Length, SymbolId};

pub use node::{Children, Node};
pub use subtree::{
    Subtree, SubtreeFlags, ERROR_COST_PER_MISSING_TREE, ERROR_COST_PER_RECOVERY,
    ERROR_COST_PER_SKIPPED_CHAR, ERROR_COST_PER_SKIPPED_LINE, ERROR_COST_PER_SKIPPED_TREE,
};

/// A parsed document.
#[derive(Clone)]
pub struct Tree {
    root: Subtree,
    language: Language,
    edits: Vec<InputEdit>,
}

impl Tree {
    pub fn new(root: Subtree, language: Language) -> Tree {
        Tree {
            root,
            language,
            edits: Vec::new(),
        }
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::root(self)
    }

    #[inline]
    pub fn root_subtree(&self) -> &Subtree {
        &self.root
    }

    #[inline]
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Length in bytes of the text this tree covers.
    #[inline]
    pub fn source_len(&self) -> u32 {
        self.root.size().bytes
    }

    /// Edits applied since the tree was parsed, oldest first.
    pub fn edits(&self) -> &[InputEdit] {
        &self.edits
    }

    pub fn has_error(&self) -> bool {
        self.root.has_error()
    }

    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }

    /// Every leaf in document order, hidden ones and extras included.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            pending: vec![(&self.root, Length::ZERO)],
        }
    }

    /// Same shape, kinds, sizes and recovery markers.
    pub fn structurally_eq(&self, other: &Tree) -> bool {
        self.root.structurally_eq(&other.root)
    }

    /// Apply `edit` and return the adjusted tree.
    ///
    /// Subtrees whose text, or whose lexer lookahead, overlaps the edited
    /// region are copied with new sizes and flagged as changed; everything
    /// else is shared with `self`.
    #[must_use]
    #[tracing::instrument(level = "trace", skip_all, fields(start = edit.start_byte))]
    pub fn edit(&self, edit: &InputEdit) -> Tree {
        let root = edit_subtree(&self.root, Length::ZERO, edit, true);
        let mut edits = self.edits.clone();
        edits.push(*edit);
        Tree {
            root,
            language: self.language.clone(),
            edits,
        }
    }
}

/// `last` marks the rightmost spine, which also absorbs text inserted at
/// the very end of the document.
fn edit_subtree(subtree: &Subtree, start: Length, edit: &InputEdit, last: bool) -> Subtree {
    let end = start + subtree.size();
    if !edit.touches(start.bytes, end.bytes, subtree.lookahead_bytes()) {
        return subtree.clone();
    }
    if subtree.is_leaf() {
        let new_end = if last {
            edit.new_end() + (end - edit.old_end())
        } else {
            edit.map_position(end)
        };
        let size = new_end - edit.map_position(start);
        return subtree.changed(size, Box::default());
    }
    ensure_sufficient_stack(|| {
        let mut position = start;
        let mut size = Length::ZERO;
        let count = subtree.children().len();
        let children: Box<[Subtree]> = subtree
            .children()
            .iter()
            .enumerate()
            .map(|(index, child)| {
                let edited = edit_subtree(child, position, edit, last && index + 1 == count);
                position += child.size();
                size += edited.size();
                edited
            })
            .collect();
        subtree.changed(size, children)
    })
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Tree {:?} {}}}", self.language.name(), self.to_sexp())
    }
}

/// A leaf with its absolute start.
#[derive(Copy, Clone, Debug)]
pub struct Leaf<'tree> {
    pub subtree: &'tree Subtree,
    pub start: Length,
}

impl Leaf<'_> {
    #[inline]
    pub fn symbol(&self) -> SymbolId {
        self.subtree.symbol()
    }

    #[inline]
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        let start = self.start.bytes as usize;
        start..start + self.subtree.size().bytes as usize
    }
}

/// Iterator returned by [`Tree::leaves`].
pub struct Leaves<'tree> {
    pending: Vec<(&'tree Subtree, Length)>,
}

impl<'tree> Iterator for Leaves<'tree> {
    type Item = Leaf<'tree>;

    fn next(&mut self) -> Option<Leaf<'tree>> {
        loop {
            let (subtree, start) = self.pending.pop()?;
            if subtree.is_leaf() {
                return Some(Leaf { subtree, start });
            }
            let mut position = start;
            let first = self.pending.len();
            for child in subtree.children() {
                self.pending.push((child, position));
                position += child.size();
            }
            self.pending[first..].reverse();
        }
    }
}
