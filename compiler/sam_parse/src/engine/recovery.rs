//! Error recovery.
//!
//! Runs when no version can use the lookahead. The cheapest version is
//! kept and repaired with the first strategy that applies:
//!
//! 1. Insert up to `max_missing_insertions` zero-width MISSING tokens after
//!    which the lookahead can be shifted. Each token costs
//!    `ERROR_COST_PER_MISSING_TREE + ERROR_COST_PER_RECOVERY`; the chain is
//!    only taken when it costs no more than the best fold below plus one
//!    `ERROR_COST_PER_RECOVERY`. One inserted token thus beats skipping a
//!    short token, while a chain of two loses to it.
//! 2. Fold the top stack entries into an ERROR node, exposing a state that
//!    can shift the lookahead, or fold the lookahead itself into an ERROR
//!    node. The cheaper of the two is taken.
//! 3. At end of input with neither available, wrap the whole stack in an
//!    ERROR node under the root.
//!
//! ERROR nodes are extras, so they never count as children of a later
//! reduction.

use sam_ir::table::ParseAction;
use sam_ir::tree::{ERROR_COST_PER_MISSING_TREE, ERROR_COST_PER_RECOVERY};
use sam_ir::{Language, StateId, Subtree, SymbolId, Token};
use smallvec::SmallVec;

use super::{shift_target, Engine, Lookahead, Reduction, Status, NO_PRODUCTION};
use crate::stack::{NodeId, Stack};

/// Parser states of a version plus hypothetical pushes, for trying actions
/// without building trees.
#[derive(Clone)]
struct Simulation<'s> {
    stack: &'s Stack,
    base: NodeId,
    pushed: SmallVec<[StateId; 8]>,
}

impl<'s> Simulation<'s> {
    fn new(stack: &'s Stack, head: NodeId) -> Self {
        Simulation {
            stack,
            base: head,
            pushed: SmallVec::new(),
        }
    }

    fn top(&self) -> StateId {
        self.pushed
            .last()
            .copied()
            .unwrap_or_else(|| self.stack.state(self.base))
    }

    fn pop(&mut self, count: usize) -> Option<()> {
        for _ in 0..count {
            if self.pushed.pop().is_some() {
                continue;
            }
            let mut node = self.base;
            while self.stack.top_subtree(node)?.is_extra() {
                node = self.stack.prev(node)?;
            }
            self.base = self.stack.prev(node)?;
        }
        Some(())
    }

    fn reduce(&mut self, language: &Language, symbol: SymbolId, child_count: u16) -> Option<()> {
        self.pop(usize::from(child_count))?;
        let next = language.goto(self.top(), symbol)?;
        self.pushed.push(next);
        Some(())
    }

    /// Reduce on `symbol` until it is shifted.
    fn consume(&mut self, language: &Language, symbol: SymbolId, budget: usize) -> bool {
        for _ in 0..budget {
            let actions = language.actions(self.top(), symbol);
            if let Some(next) = shift_target(actions) {
                self.pushed.push(next);
                return true;
            }
            let Some((lhs, child_count)) = first_reduction(actions) else {
                return false;
            };
            if self.reduce(language, lhs, child_count).is_none() {
                return false;
            }
        }
        false
    }

    /// `symbol` would be shifted or accepted after reductions.
    fn accepts(mut self, language: &Language, symbol: SymbolId, budget: usize) -> bool {
        for _ in 0..budget {
            let actions = language.actions(self.top(), symbol);
            if actions
                .iter()
                .any(|a| matches!(a, ParseAction::Shift { .. } | ParseAction::Accept))
            {
                return true;
            }
            let Some((lhs, child_count)) = first_reduction(actions) else {
                return false;
            };
            if self.reduce(language, lhs, child_count).is_none() {
                return false;
            }
        }
        false
    }
}

fn missing_chain_cost(len: usize) -> u32 {
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    (ERROR_COST_PER_MISSING_TREE + ERROR_COST_PER_RECOVERY).saturating_mul(len)
}

fn first_reduction(actions: &[ParseAction]) -> Option<(SymbolId, u16)> {
    actions.iter().find_map(|a| match *a {
        ParseAction::Reduce { symbol, child_count, .. } => Some((symbol, child_count)),
        _ => None,
    })
}

impl Engine<'_> {
    pub(super) fn recover(&mut self, index: usize) {
        self.recovering = true;
        self.recover_version(index);
        self.recovering = false;
    }

    fn recover_version(&mut self, index: usize) {
        let language = self.language;
        let head = self.versions[index].head;
        let state = self.stack.state(head);
        let token = match self.versions[index].lookahead.take() {
            Some(Lookahead::Token(token)) => token,
            _ => {
                let mode = self.versions[index]
                    .lex_mode
                    .unwrap_or_else(|| language.lex_mode_for_state(state));
                self.lex(head, mode)
            }
        };
        tracing::debug!(
            position = self.stack.position(head).bytes,
            lookahead = language.symbol_name(token.symbol),
            "recovering from a syntax error"
        );

        if token.is_error() {
            let leaf = Subtree::leaf(&token, state, true, language);
            self.shift(index, leaf, state);
            return;
        }

        let reach = token.reach();
        self.versions[index].lookahead = Some(Lookahead::Token(token.clone()));

        let missing = self.missing_chain(head, token.symbol);
        let popped = self.best_pop(head, token.symbol);
        let skip_cost = (!token.is_end()).then(|| {
            let leaf = Subtree::leaf(&token, state, false, language);
            Subtree::error_node(vec![leaf], language).error_cost()
        });

        // A MISSING token is charged its own cost. Folding input into an
        // ERROR node is charged one more recovery on top of the node's cost,
        // as a version left in the error state would be.
        let fold_cost = match (&popped, skip_cost) {
            (Some((_, error)), Some(skip_cost)) => Some(error.error_cost().min(skip_cost)),
            (Some((_, error)), None) => Some(error.error_cost()),
            (None, skip_cost) => skip_cost,
        }
        .map(|cost| cost.saturating_add(ERROR_COST_PER_RECOVERY));
        if let Some(missing) = missing {
            let missing_cost = missing_chain_cost(missing.len());
            if fold_cost.map_or(true, |fold_cost| missing_cost <= fold_cost) {
                tracing::trace!(count = missing.len(), cost = missing_cost, "inserting missing tokens");
                for symbol in missing {
                    self.insert_missing(index, symbol, reach);
                }
                self.versions[index].status = Status::Shifted;
                return;
            }
            tracing::trace!(cost = missing_cost, ?fold_cost, "missing tokens cost more than skipping");
        }

        match (popped, skip_cost) {
            (Some((_, error)), Some(skip_cost)) if skip_cost < error.error_cost() => self.skip(index, &token),
            (Some((base, error)), _) => {
                let base_state = self.stack.state(base);
                let version = &mut self.versions[index];
                version.head = self.stack.push(base, error, base_state);
                version.status = Status::Shifted;
            }
            (None, Some(_)) => self.skip(index, &token),
            (None, None) => self.force_accept(index),
        }
    }

    /// Shortest sequence of terminals whose insertion lets `lookahead` be
    /// shifted.
    fn missing_chain(&self, head: NodeId, lookahead: SymbolId) -> Option<Vec<SymbolId>> {
        let simulation = Simulation::new(&self.stack, head);
        let mut chain = Vec::new();
        for depth in 1..=self.options.max_missing_insertions {
            if self.search_missing(&simulation, lookahead, depth, &mut chain) {
                return Some(chain);
            }
        }
        None
    }

    fn search_missing(
        &self,
        simulation: &Simulation<'_>,
        lookahead: SymbolId,
        depth: usize,
        chain: &mut Vec<SymbolId>,
    ) -> bool {
        let language = self.language;
        let budget = self.options.max_reduce_steps;
        for terminal in 1..language.table().terminal_count {
            let candidate = SymbolId(terminal);
            if language.is_extra(candidate) || language.actions(simulation.top(), candidate).is_empty() {
                continue;
            }
            let mut next = simulation.clone();
            if !next.consume(language, candidate, budget) {
                continue;
            }
            chain.push(candidate);
            let found = if depth == 1 {
                next.accepts(language, lookahead, budget)
            } else {
                self.search_missing(&next, lookahead, depth - 1, chain)
            };
            if found {
                return true;
            }
            chain.pop();
        }
        false
    }

    /// Reduce on `symbol` as the parser would, then push it as MISSING.
    fn insert_missing(&mut self, index: usize, symbol: SymbolId, reach: u32) {
        let language = self.language;
        for _ in 0..self.options.max_reduce_steps {
            let head = self.versions[index].head;
            let state = self.stack.state(head);
            let actions = language.actions(state, symbol);
            if let Some(next) = shift_target(actions) {
                let missing = Subtree::missing(symbol, state, language);
                self.versions[index].head = self.stack.push(head, missing, next);
                return;
            }
            let reduction = actions.iter().find_map(|a| match *a {
                ParseAction::Reduce {
                    symbol,
                    child_count,
                    production_id,
                    ..
                } => Some(Reduction {
                    symbol,
                    child_count,
                    production_id,
                    reach,
                    ambiguous: actions.len() > 1,
                }),
                _ => None,
            });
            let Some(reduction) = reduction else {
                return;
            };
            match self.reduce(head, &reduction) {
                Some(head) => self.versions[index].head = head,
                None => return,
            }
        }
    }

    /// Cheapest ERROR node folding the top entries so that `lookahead` can
    /// be shifted in the exposed state.
    fn best_pop(&self, head: NodeId, lookahead: SymbolId) -> Option<(NodeId, Subtree)> {
        let mut best: Option<(NodeId, Subtree)> = None;
        for depth in 1..=self.options.max_pop_depth {
            let Some((base, popped)) = self.stack.pop_entries(head, depth) else {
                break;
            };
            let simulation = Simulation::new(&self.stack, base);
            if !simulation.accepts(self.language, lookahead, self.options.max_reduce_steps) {
                continue;
            }
            let error = Subtree::error_node(popped, self.language);
            if best.as_ref().map_or(true, |(_, b)| error.error_cost() < b.error_cost()) {
                best = Some((base, error));
            }
        }
        best
    }

    /// Fold the lookahead into an ERROR node, merging it with an ERROR node
    /// that sits just below any trailing extras.
    fn skip(&mut self, index: usize, token: &Token) {
        let language = self.language;
        let head = self.versions[index].head;
        let state = self.stack.state(head);
        let leaf = Subtree::leaf(token, state, false, language);

        let mut node = head;
        let mut extras = Vec::new();
        while let Some(extra) = self
            .stack
            .top_subtree(node)
            .filter(|s| s.is_extra() && !s.is_error())
        {
            extras.push(extra.clone());
            let Some(prev) = self.stack.prev(node) else {
                break;
            };
            node = prev;
        }
        let previous = self
            .stack
            .top_subtree(node)
            .filter(|s| s.is_error() && !s.is_leaf())
            .cloned()
            .zip(self.stack.prev(node));

        let (base, children) = match previous {
            Some((error, below)) => {
                let mut children = error.children().to_vec();
                children.extend(extras.into_iter().rev());
                children.push(leaf);
                (below, children)
            }
            None => (head, vec![leaf]),
        };
        let error = Subtree::error_node(children, language);
        self.versions[index].head = base;
        self.shift(index, error, self.stack.state(base));
    }

    /// Give up at end of input: everything parsed so far becomes one ERROR
    /// node under the root.
    fn force_accept(&mut self, index: usize) {
        let language = self.language;
        let head = self.versions[index].head;
        let subtrees = self.stack.subtrees(head);
        let error = Subtree::error_node(subtrees, language);
        let root = Subtree::node(language.table().start_symbol, vec![error], NO_PRODUCTION, language);
        tracing::debug!(cost = root.error_cost(), "forced acceptance at end of input");
        let error_cost = root.error_cost();
        let dynamic_precedence = root.dynamic_precedence();
        self.finish(index, root, error_cost, dynamic_precedence);
    }
}
