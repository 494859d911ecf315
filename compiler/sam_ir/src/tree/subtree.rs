//! Immutable, shareable syntax tree nodes.
//!
//! A [`Subtree`] stores its size, never its position. Position is the sum of
//! the sizes of everything to its left, so a subtree that an edit does not
//! touch can be shared between the old tree and the new one, and between the
//! old tree and the result of re-parsing.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::language::{LexModeId, UNION_LEX_MODE};
use crate::token::Token;
use crate::{Language, Length, ProductionId, StateId, SymbolId};

/// Cost of entering error recovery once.
pub const ERROR_COST_PER_RECOVERY: u32 = 500;
/// Cost of an inserted zero-width token.
pub const ERROR_COST_PER_MISSING_TREE: u32 = 110;
/// Cost of each visible tree folded into an ERROR node.
pub const ERROR_COST_PER_SKIPPED_TREE: u32 = 100;
/// Cost of each line spanned by an ERROR node.
pub const ERROR_COST_PER_SKIPPED_LINE: u32 = 30;
/// Cost of each byte covered by an ERROR node.
pub const ERROR_COST_PER_SKIPPED_CHAR: u32 = 1;

bitflags! {
    /// Per-subtree properties, computed at construction.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct SubtreeFlags: u16 {
        /// Appears in the public node API.
        const VISIBLE = 1 << 0;
        /// Comes from a named rule rather than a literal.
        const NAMED = 1 << 1;
        /// Shifted as an extra (whitespace, comments, recovered ERROR
        /// nodes); does not count toward production child counts.
        const EXTRA = 1 << 2;
        /// Zero-width token inserted by error recovery. Always visible, even
    /// for hidden terminals.
        const MISSING = 1 << 3;
        /// Touched by an edit since it was parsed.
        const HAS_CHANGES = 1 << 4;
        /// Built while several stack versions were alive; never reused.
        const FRAGILE = 1 << 5;
        /// Contains at least one token from the external scanner.
        const HAS_EXTERNAL_TOKENS = 1 << 6;
    }
}

/// Shared handle to a subtree.
#[derive(Clone)]
pub struct Subtree(Arc<SubtreeData>);

#[derive(Clone)]
struct SubtreeData {
    symbol: SymbolId,
    size: Length,
    lookahead_bytes: u32,
    parse_state: StateId,
    lex_mode: LexModeId,
    production_id: ProductionId,
    flags: SubtreeFlags,
    error_cost: u32,
    dynamic_precedence: i32,
    visible_child_count: u32,
    named_child_count: u32,
    children: Box<[Subtree]>,
    external_state: Option<Arc<[u8]>>,
}

impl Subtree {
    /// Leaf for a lexed token shifted in `parse_state`.
    pub fn leaf(token: &Token, parse_state: StateId, extra: bool, language: &Language) -> Subtree {
        let mut flags = symbol_flags(token.symbol, language);
        flags.set(SubtreeFlags::EXTRA, extra);
        flags.set(SubtreeFlags::HAS_EXTERNAL_TOKENS, token.external_state.is_some());
        let error_cost = if token.symbol.is_error() {
            skipped_cost(token.size)
        } else {
            0
        };
        Subtree(Arc::new(SubtreeData {
            symbol: token.symbol,
            size: token.size,
            lookahead_bytes: token.lookahead_bytes,
            parse_state,
            lex_mode: token.lex_mode,
            production_id: ProductionId::default(),
            flags,
            error_cost,
            dynamic_precedence: 0,
            visible_child_count: 0,
            named_child_count: 0,
            children: Box::default(),
            external_state: token.external_state.clone(),
        }))
    }

    /// Zero-width token inserted by error recovery. Always visible, even
    /// for hidden terminals.
    pub fn missing(symbol: SymbolId, parse_state: StateId, language: &Language) -> Subtree {
        Subtree(Arc::new(SubtreeData {
            symbol,
            size: Length::ZERO,
            lookahead_bytes: 0,
            parse_state,
            lex_mode: UNION_LEX_MODE,
            production_id: ProductionId::default(),
            flags: symbol_flags(symbol, language) | SubtreeFlags::MISSING | SubtreeFlags::VISIBLE,
            error_cost: ERROR_COST_PER_MISSING_TREE + ERROR_COST_PER_RECOVERY,
            dynamic_precedence: 0,
            visible_child_count: 0,
            named_child_count: 0,
            children: Box::default(),
            external_state: None,
        }))
    }

    /// Interior node produced by a reduction.
    pub fn node(
        symbol: SymbolId,
        children: Vec<Subtree>,
        production_id: ProductionId,
        language: &Language,
    ) -> Subtree {
        let own_precedence = language
            .table()
            .productions
            .get(production_id.index())
            .map_or(0, |p| i32::from(p.dynamic_precedence));
        let mut data = SubtreeData::empty(symbol, symbol_flags(symbol, language));
        data.production_id = production_id;
        data.children = children.into_boxed_slice();
        data.summarize(language);
        data.dynamic_precedence += own_precedence;
        Subtree(Arc::new(data))
    }

    /// ERROR node wrapping skipped or popped trees. It is marked extra so
    /// it never counts toward the child count of a later reduction.
    pub fn error_node(children: Vec<Subtree>, language: &Language) -> Subtree {
        let flags = SubtreeFlags::VISIBLE | SubtreeFlags::NAMED | SubtreeFlags::EXTRA;
        let mut data = SubtreeData::empty(SymbolId::ERROR, flags);
        data.children = children.into_boxed_slice();
        data.summarize(language);
        data.error_cost += skipped_cost(data.size);
        for child in data.children.iter().filter(|c| !c.is_extra()) {
            if child.is_visible() {
                data.error_cost += ERROR_COST_PER_SKIPPED_TREE;
            } else if !child.is_leaf() {
                data.error_cost += ERROR_COST_PER_SKIPPED_TREE * child.visible_child_count();
            }
        }
        Subtree(Arc::new(data))
    }

    fn modify(self, f: impl FnOnce(&mut SubtreeData)) -> Subtree {
        let mut arc = self.0;
        f(Arc::make_mut(&mut arc));
        Subtree(arc)
    }

    #[must_use]
    pub fn with_extra(self, extra: bool) -> Subtree {
        if self.is_extra() == extra {
            return self;
        }
        self.modify(|data| data.flags.set(SubtreeFlags::EXTRA, extra))
    }

    #[must_use]
    pub fn with_fragile(self) -> Subtree {
        if self.is_fragile() {
            return self;
        }
        self.modify(|data| data.flags.insert(SubtreeFlags::FRAGILE))
    }

    /// Record the state a reused leaf is shifted in.
    #[must_use]
    pub fn with_parse_state(self, state: StateId) -> Subtree {
        if self.parse_state() == state {
            return self;
        }
        self.modify(|data| data.parse_state = state)
    }

    /// Extend the recorded lookahead so that it reaches at least `reach`
    /// bytes past the start of this subtree.
    #[must_use]
    pub fn with_reach(self, reach: u32) -> Subtree {
        let lookahead = reach.saturating_sub(self.size().bytes);
        if lookahead <= self.lookahead_bytes() {
            return self;
        }
        self.modify(|data| data.lookahead_bytes = lookahead)
    }

    #[inline]
    pub fn symbol(&self) -> SymbolId {
        self.0.symbol
    }

    #[inline]
    pub fn size(&self) -> Length {
        self.0.size
    }

    #[inline]
    pub fn lookahead_bytes(&self) -> u32 {
        self.0.lookahead_bytes
    }

    /// Parser state under this subtree when its first token was shifted.
    #[inline]
    pub fn parse_state(&self) -> StateId {
        self.0.parse_state
    }

    /// Lex mode of the first token.
    #[inline]
    pub fn lex_mode(&self) -> LexModeId {
        self.0.lex_mode
    }

    #[inline]
    pub fn production_id(&self) -> ProductionId {
        self.0.production_id
    }

    #[inline]
    pub fn flags(&self) -> SubtreeFlags {
        self.0.flags
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.0.flags.contains(SubtreeFlags::VISIBLE)
    }

    #[inline]
    pub fn is_named(&self) -> bool {
        self.0.flags.contains(SubtreeFlags::NAMED)
    }

    #[inline]
    pub fn is_extra(&self) -> bool {
        self.0.flags.contains(SubtreeFlags::EXTRA)
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.0.flags.contains(SubtreeFlags::MISSING)
    }

    #[inline]
    pub fn has_changes(&self) -> bool {
        self.0.flags.contains(SubtreeFlags::HAS_CHANGES)
    }

    #[inline]
    pub fn is_fragile(&self) -> bool {
        self.0.flags.contains(SubtreeFlags::FRAGILE)
    }

    #[inline]
    pub fn has_external_tokens(&self) -> bool {
        self.0.flags.contains(SubtreeFlags::HAS_EXTERNAL_TOKENS)
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.0.symbol.is_error()
    }

    /// Total error cost of this subtree and everything inside it.
    #[inline]
    pub fn error_cost(&self) -> u32 {
        self.0.error_cost
    }

    #[inline]
    pub fn has_error(&self) -> bool {
        self.0.error_cost > 0
    }

    #[inline]
    pub fn dynamic_precedence(&self) -> i32 {
        self.0.dynamic_precedence
    }

    #[inline]
    pub fn children(&self) -> &[Subtree] {
        &self.0.children
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.0.children.is_empty()
    }

    /// Visible children after splicing hidden ones.
    #[inline]
    pub fn visible_child_count(&self) -> u32 {
        self.0.visible_child_count
    }

    #[inline]
    pub fn named_child_count(&self) -> u32 {
        self.0.named_child_count
    }

    /// Scanner state stored on an external token leaf.
    #[inline]
    pub fn external_state(&self) -> Option<&Arc<[u8]>> {
        self.0.external_state.as_ref()
    }

    /// State of the last external token inside this subtree.
    pub fn last_external_state(&self) -> Option<&Arc<[u8]>> {
        let mut current = self;
        loop {
            if current.children().is_empty() {
                return current.external_state();
            }
            current = current
                .children()
                .iter()
                .rev()
                .find(|child| child.has_external_tokens())?;
        }
    }

    /// Leftmost leaf.
    pub fn first_leaf(&self) -> &Subtree {
        let mut current = self;
        while let Some(first) = current.children().first() {
            current = first;
        }
        current
    }

    /// Whether both handles point at the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Subtree) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Compare shape, kinds, sizes and recovery markers, ignoring
    /// bookkeeping such as parse states and change flags.
    pub fn structurally_eq(&self, other: &Subtree) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if a.ptr_eq(b) {
                continue;
            }
            let same = a.symbol() == b.symbol()
                && a.size() == b.size()
                && a.is_extra() == b.is_extra()
                && a.is_missing() == b.is_missing()
                && a.production_id() == b.production_id()
                && a.children().len() == b.children().len();
            if !same {
                return false;
            }
            pending.extend(a.children().iter().zip(b.children()));
        }
        true
    }

    /// Rebuild this subtree with a new size and the change flag, keeping
    /// everything else (used by edits).
    pub(super) fn changed(&self, size: Length, children: Box<[Subtree]>) -> Subtree {
        let mut data = (*self.0).clone();
        data.size = size;
        data.children = children;
        data.flags.insert(SubtreeFlags::HAS_CHANGES);
        Subtree(Arc::new(data))
    }
}

impl fmt::Debug for Subtree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{}b", self.symbol(), self.size().bytes)?;
        if self.is_missing() {
            write!(f, " missing")?;
        }
        if self.is_extra() {
            write!(f, " extra")?;
        }
        if !self.children().is_empty() {
            write!(f, " {} children", self.children().len())?;
        }
        write!(f, "]")
    }
}

impl SubtreeData {
    fn empty(symbol: SymbolId, flags: SubtreeFlags) -> SubtreeData {
        SubtreeData {
            symbol,
            size: Length::ZERO,
            lookahead_bytes: 0,
            parse_state: StateId::NONE,
            lex_mode: UNION_LEX_MODE,
            production_id: ProductionId::default(),
            flags,
            error_cost: 0,
            dynamic_precedence: 0,
            visible_child_count: 0,
            named_child_count: 0,
            children: Box::default(),
            external_state: None,
        }
    }

    /// Recompute size, lookahead, costs and child counts from children.
    fn summarize(&mut self, language: &Language) {
        let steps = language
            .table()
            .productions
            .get(self.production_id.index())
            .filter(|p| p.lhs == self.symbol)
            .map_or(&[][..], |p| p.steps.as_slice());

        if let Some(first) = self.children.first() {
            self.parse_state = first.parse_state();
            self.lex_mode = first.lex_mode();
        }

        let mut size = Length::ZERO;
        let mut reach = 0u32;
        let mut structural = 0usize;
        for child in &*self.children {
            reach = reach.max(size.bytes + child.size().bytes + child.lookahead_bytes());
            size += child.size();
            self.error_cost += child.error_cost();
            self.dynamic_precedence += child.dynamic_precedence();
            if child.has_external_tokens() {
                self.flags.insert(SubtreeFlags::HAS_EXTERNAL_TOKENS);
            }
            if child.is_fragile() {
                self.flags.insert(SubtreeFlags::FRAGILE);
            }

            let alias = if child.is_extra() {
                None
            } else {
                let step = steps.get(structural).and_then(|s| s.alias);
                structural += 1;
                step
            };
            let (visible, named) = match alias {
                Some(alias) => (language.is_visible(alias), language.is_named(alias)),
                None => (child.is_visible(), child.is_named()),
            };
            if visible {
                self.visible_child_count += 1;
                if named {
                    self.named_child_count += 1;
                }
            } else if !child.children().is_empty() {
                self.visible_child_count += child.visible_child_count();
                self.named_child_count += child.named_child_count();
            }
        }
        self.size = size;
        self.lookahead_bytes = reach.saturating_sub(size.bytes);
    }
}

impl Drop for SubtreeData {
    // Deep trees (long left-recursive lists) would overflow the stack with
    // the default recursive drop.
    fn drop(&mut self) {
        if self.children.is_empty() {
            return;
        }
        let mut pending: Vec<Subtree> = std::mem::take(&mut self.children).into_vec();
        while let Some(child) = pending.pop() {
            if let Ok(mut data) = Arc::try_unwrap(child.0) {
                pending.extend(std::mem::take(&mut data.children).into_vec());
            }
        }
    }
}

fn symbol_flags(symbol: SymbolId, language: &Language) -> SubtreeFlags {
    let mut flags = SubtreeFlags::empty();
    flags.set(SubtreeFlags::VISIBLE, language.is_visible(symbol));
    flags.set(SubtreeFlags::NAMED, language.is_named(symbol));
    flags
}

fn skipped_cost(size: Length) -> u32 {
    ERROR_COST_PER_RECOVERY
        + ERROR_COST_PER_SKIPPED_CHAR * size.bytes
        + ERROR_COST_PER_SKIPPED_LINE * size.extent.row
}
