//! Public, position-aware view of a syntax tree.

use std::fmt;
use std::fmt::Write as _;

use sam_stack::ensure_sufficient_stack;

use super::{Subtree, Tree};
use crate::table::ProductionStep;
use crate::{FieldId, Length, Point, Range, SymbolId};

/// A visible node: a subtree plus its absolute position.
///
/// Hidden subtrees never surface as nodes; their visible descendants are
/// spliced into the nearest visible ancestor's children.
#[derive(Copy, Clone)]
pub struct Node<'tree> {
    tree: &'tree Tree,
    subtree: &'tree Subtree,
    start: Length,
    alias: Option<SymbolId>,
    field: Option<FieldId>,
}

impl<'tree> Node<'tree> {
    pub(super) fn root(tree: &'tree Tree) -> Self {
        Node {
            tree,
            subtree: &tree.root,
            start: Length::ZERO,
            alias: None,
            field: None,
        }
    }

    /// Underlying subtree.
    #[inline]
    pub fn subtree(&self) -> &'tree Subtree {
        self.subtree
    }

    /// Node kind id, after aliasing.
    #[inline]
    pub fn kind_id(&self) -> SymbolId {
        self.alias.unwrap_or(self.subtree.symbol())
    }

    /// Node kind name, after aliasing.
    pub fn kind(&self) -> &'tree str {
        self.tree.language.symbol_name(self.kind_id())
    }

    pub fn is_named(&self) -> bool {
        match self.alias {
            Some(alias) => self.tree.language.is_named(alias),
            None => self.subtree.is_named(),
        }
    }

    #[inline]
    pub fn is_extra(&self) -> bool {
        self.subtree.is_extra()
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.subtree.is_error()
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.subtree.is_missing()
    }

    /// This node or a descendant is an ERROR or MISSING node.
    #[inline]
    pub fn has_error(&self) -> bool {
        self.subtree.has_error()
    }

    #[inline]
    pub fn has_changes(&self) -> bool {
        self.subtree.has_changes()
    }

    #[inline]
    pub fn start_byte(&self) -> u32 {
        self.start.bytes
    }

    #[inline]
    pub fn end_byte(&self) -> u32 {
        self.start.bytes + self.subtree.size().bytes
    }

    #[inline]
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start_byte() as usize..self.end_byte() as usize
    }

    #[inline]
    pub fn start_position(&self) -> Point {
        self.start.extent
    }

    #[inline]
    pub fn end_position(&self) -> Point {
        (self.start + self.subtree.size()).extent
    }

    pub fn range(&self) -> Range {
        Range {
            start_byte: self.start_byte(),
            end_byte: self.end_byte(),
            start_point: self.start_position(),
            end_point: self.end_position(),
        }
    }

    /// Field this node occupies in its parent, if any.
    pub fn field_name(&self) -> Option<&'tree str> {
        self.field.and_then(|f| self.tree.language.field_name_for_id(f))
    }

    /// Visible children, hidden subtrees spliced in.
    pub fn children(&self) -> Children<'tree> {
        Children::new(self.tree, self.subtree, self.start)
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'tree>> {
        self.children().filter(Node::is_named)
    }

    pub fn child_count(&self) -> usize {
        self.subtree.visible_child_count() as usize
    }

    pub fn named_child_count(&self) -> usize {
        self.subtree.named_child_count() as usize
    }

    pub fn child(&self, index: usize) -> Option<Node<'tree>> {
        self.children().nth(index)
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'tree>> {
        self.named_children().nth(index)
    }

    /// First child carrying the field `name`.
    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'tree>> {
        let field = self.tree.language.field_id_for_name(name)?;
        self.children().find(|child| child.field == Some(field))
    }

    /// Every child carrying the field `name`.
    pub fn children_by_field_name(&self, name: &str) -> Vec<Node<'tree>> {
        let Some(field) = self.tree.language.field_id_for_name(name) else {
            return Vec::new();
        };
        self.children().filter(|child| child.field == Some(field)).collect()
    }

    /// Field name of the child at `index`.
    pub fn field_name_for_child(&self, index: usize) -> Option<&'tree str> {
        self.child(index).and_then(|child| child.field_name())
    }

    /// Whether both refer to the same subtree at the same position.
    pub fn same_as(&self, other: &Node<'_>) -> bool {
        self.subtree.ptr_eq(other.subtree) && self.start == other.start
    }

    /// Visible parent, found by descending from the root.
    pub fn parent(&self) -> Option<Node<'tree>> {
        let mut pending = vec![Node::root(self.tree)];
        while let Some(candidate) = pending.pop() {
            for child in candidate.children() {
                if child.same_as(self) {
                    return Some(candidate);
                }
                if child.start_byte() <= self.start_byte()
                    && self.end_byte() <= child.end_byte()
                    && !child.subtree.is_leaf()
                {
                    pending.push(child);
                }
            }
        }
        None
    }

    pub fn next_sibling(&self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let mut children = parent.children();
        children.find(|child| child.same_as(self))?;
        children.next()
    }

    pub fn prev_sibling(&self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let mut previous = None;
        for child in parent.children() {
            if child.same_as(self) {
                return previous;
            }
            previous = Some(child);
        }
        None
    }

    /// Smallest node spanning `start..end`.
    pub fn descendant_for_byte_range(&self, start: u32, end: u32) -> Option<Node<'tree>> {
        if start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut current = *self;
        'descend: loop {
            for child in current.children() {
                if child.start_byte() > start {
                    break;
                }
                let contains = child.start_byte() <= start && end <= child.end_byte();
                // A zero-width range at a boundary belongs to the node that
                // starts there.
                if contains && (child.end_byte() > start || child.start_byte() == child.end_byte()) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Source text covered by this node.
    pub fn utf8_text<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.byte_range())
    }

    /// S-expression of the named structure below this node, in the usual
    /// `(kind field: (child) ...)` form. Anonymous nodes are omitted and
    /// inserted tokens print as `(MISSING kind)`.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        ensure_sufficient_stack(|| {
            if self.is_missing() {
                if self.is_named() {
                    let _ = write!(out, "(MISSING {})", self.kind());
                } else {
                    let _ = write!(out, "(MISSING {:?})", self.kind());
                }
                return;
            }
            out.push('(');
            out.push_str(self.kind());
            for child in self.children().filter(Node::is_named) {
                out.push(' ');
                if let Some(field) = child.field_name() {
                    out.push_str(field);
                    out.push_str(": ");
                }
                child.write_sexp(out);
            }
            out.push(')');
        });
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Node {} {} - {}}}",
            self.kind(),
            self.start_position(),
            self.end_position()
        )
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other) && self.alias == other.alias
    }
}

struct Frame<'tree> {
    subtree: &'tree Subtree,
    steps: &'tree [ProductionStep],
    index: usize,
    structural: usize,
    position: Length,
    inherited_field: Option<FieldId>,
}

/// Iterator over the visible children of a node.
pub struct Children<'tree> {
    tree: &'tree Tree,
    frames: Vec<Frame<'tree>>,
}

impl<'tree> Children<'tree> {
    fn new(tree: &'tree Tree, subtree: &'tree Subtree, position: Length) -> Self {
        let mut children = Children {
            tree,
            frames: Vec::new(),
        };
        children.enter(subtree, position, None);
        children
    }

    fn enter(&mut self, subtree: &'tree Subtree, position: Length, inherited_field: Option<FieldId>) {
        let steps = self
            .tree
            .language
            .table()
            .productions
            .get(subtree.production_id().index())
            .filter(|p| p.lhs == subtree.symbol())
            .map_or(&[][..], |p| p.steps.as_slice());
        self.frames.push(Frame {
            subtree,
            steps,
            index: 0,
            structural: 0,
            position,
            inherited_field,
        });
    }
}

impl<'tree> Iterator for Children<'tree> {
    type Item = Node<'tree>;

    fn next(&mut self) -> Option<Node<'tree>> {
        loop {
            let frame = self.frames.last_mut()?;
            let (subtree, steps) = (frame.subtree, frame.steps);
            let Some(child) = subtree.children().get(frame.index) else {
                self.frames.pop();
                continue;
            };
            frame.index += 1;
            let start = frame.position;
            frame.position += child.size();

            let step = if child.is_extra() {
                None
            } else {
                frame.structural += 1;
                steps.get(frame.structural - 1)
            };
            let alias = step.and_then(|s| s.alias);
            let field = step.and_then(|s| s.field).or(frame.inherited_field);

            let visible = match alias {
                Some(alias) => self.tree.language.is_visible(alias),
                None => child.is_visible(),
            };
            if visible {
                return Some(Node {
                    tree: self.tree,
                    subtree: child,
                    start,
                    alias,
                    field,
                });
            }
            if !child.is_leaf() {
                self.enter(child, start, field);
            }
        }
    }
}
