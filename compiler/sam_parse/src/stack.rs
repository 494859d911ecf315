//! Graph-structured parse stack.
//!
//! Every entry lives in one arena and points at the entry below it, so a
//! stack version is nothing more than the id of its top entry. Forking a
//! version copies an id; the shared prefix is never duplicated. Entries are
//! never removed during a parse, which keeps every id valid for as long as
//! some version may still refer to it.

use std::sync::Arc;

use sam_ir::{Length, StateId, Subtree};

/// Index of a stack entry in the arena.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct NodeId(u32);

#[derive(Clone, Debug)]
struct StackNode {
    state: StateId,
    /// Absolute position after `subtree`.
    position: Length,
    /// Subtree pushed to reach this entry (`None` for the bottom entry).
    subtree: Option<Subtree>,
    prev: Option<NodeId>,
    /// Error cost of everything from the bottom up to this entry.
    error_cost: u32,
    dynamic_precedence: i32,
}

/// Subtrees removed from a version by a reduction.
#[derive(Debug)]
pub(crate) struct Popped {
    /// Entry exposed by the pop.
    pub base: NodeId,
    /// The popped children, left to right. Extras between them are kept.
    pub children: Vec<Subtree>,
    /// Extras that sat above the last child, left to right.
    pub trailing_extras: Vec<Subtree>,
}

#[derive(Debug)]
pub(crate) struct Stack {
    nodes: Vec<StackNode>,
}

impl Stack {
    pub fn new() -> Self {
        Stack {
            nodes: vec![StackNode {
                state: StateId::START,
                position: Length::ZERO,
                subtree: None,
                prev: None,
                error_cost: 0,
                dynamic_precedence: 0,
            }],
        }
    }

    /// The bottom entry, in the start state.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    fn node(&self, id: NodeId) -> &StackNode {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn state(&self, id: NodeId) -> StateId {
        self.node(id).state
    }

    #[inline]
    pub fn position(&self, id: NodeId) -> Length {
        self.node(id).position
    }

    #[inline]
    pub fn error_cost(&self, id: NodeId) -> u32 {
        self.node(id).error_cost
    }

    #[inline]
    pub fn dynamic_precedence(&self, id: NodeId) -> i32 {
        self.node(id).dynamic_precedence
    }

    /// Subtree on top of `id`, if any.
    pub fn top_subtree(&self, id: NodeId) -> Option<&Subtree> {
        self.node(id).subtree.as_ref()
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Push `subtree` on `prev`, entering `state`.
    pub fn push(&mut self, prev: NodeId, subtree: Subtree, state: StateId) -> NodeId {
        let below = self.node(prev);
        let node = StackNode {
            state,
            position: below.position + subtree.size(),
            error_cost: below.error_cost + subtree.error_cost(),
            dynamic_precedence: below.dynamic_precedence + subtree.dynamic_precedence(),
            subtree: Some(subtree),
            prev: Some(prev),
        };
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    /// Pop `count` non-extra subtrees from `head`.
    ///
    /// Extras above the last child are returned separately so the reduced
    /// node never ends with one; extras below the first child stay on the
    /// stack so it never begins with one. Returns `None` if the version
    /// holds fewer than `count` subtrees.
    pub fn pop(&self, head: NodeId, count: usize) -> Option<Popped> {
        let mut node = head;
        let mut trailing_extras = Vec::new();
        if count > 0 {
            while let Some(subtree) = self.top_subtree(node).filter(|s| s.is_extra()) {
                trailing_extras.push(subtree.clone());
                node = self.prev(node)?;
            }
        }

        let mut children = Vec::with_capacity(count);
        let mut remaining = count;
        while remaining > 0 {
            let subtree = self.top_subtree(node)?;
            if !subtree.is_extra() {
                remaining -= 1;
            }
            children.push(subtree.clone());
            node = self.prev(node)?;
        }

        children.reverse();
        trailing_extras.reverse();
        Some(Popped {
            base: node,
            children,
            trailing_extras,
        })
    }

    /// Pop `depth` non-extra entries along with every extra above the
    /// deepest one. Used by error recovery to fold entries into an ERROR
    /// node.
    pub fn pop_entries(&self, head: NodeId, depth: usize) -> Option<(NodeId, Vec<Subtree>)> {
        let mut node = head;
        let mut popped = Vec::new();
        let mut remaining = depth;
        while remaining > 0 {
            let subtree = self.top_subtree(node)?;
            if !subtree.is_extra() {
                remaining -= 1;
            }
            popped.push(subtree.clone());
            node = self.prev(node)?;
        }
        popped.reverse();
        Some((node, popped))
    }

    /// Every subtree of a version, bottom to top.
    pub fn subtrees(&self, head: NodeId) -> Vec<Subtree> {
        let mut subtrees = Vec::new();
        let mut node = Some(head);
        while let Some(id) = node {
            if let Some(subtree) = self.top_subtree(id) {
                subtrees.push(subtree.clone());
            }
            node = self.prev(id);
        }
        subtrees.reverse();
        subtrees
    }

    /// Serialized external scanner state left by the last external token
    /// on this version.
    pub fn last_external_state(&self, head: NodeId) -> Option<Arc<[u8]>> {
        let mut node = Some(head);
        while let Some(id) = node {
            if let Some(subtree) = self.top_subtree(id) {
                if subtree.has_external_tokens() {
                    return subtree.last_external_state().cloned();
                }
            }
            node = self.prev(id);
        }
        None
    }

    /// Both versions hold the same sequence of states below their tops.
    ///
    /// Two such versions behave identically from here on, so one of them
    /// can be dropped.
    pub fn same_states(&self, a: NodeId, b: NodeId) -> bool {
        let (mut a, mut b) = (Some(a), Some(b));
        loop {
            a = a.map(|id| self.skip_extras(id));
            b = b.map(|id| self.skip_extras(id));
            match (a, b) {
                (Some(x), Some(y)) if x == y => return true,
                (Some(x), Some(y)) => {
                    if self.state(x) != self.state(y) {
                        return false;
                    }
                    a = self.prev(x);
                    b = self.prev(y);
                }
                (None, None) => return true,
                _ => return false,
            }
        }
    }

    fn skip_extras(&self, mut id: NodeId) -> NodeId {
        while let Some(prev) = self
            .top_subtree(id)
            .filter(|s| s.is_extra())
            .and_then(|_| self.prev(id))
        {
            id = prev;
        }
        id
    }
}
