//! The GLR driver.
//!
//! Parsing proceeds in rounds. In each round every live version performs
//! reductions until it shifts one token (or a reused subtree), accepts, or
//! finds no action. A cell with several actions forks the version; the
//! forks share the stack below the fork point. After the round, versions
//! that errored are dropped if any other version made progress, and the
//! survivors are condensed.

mod recovery;

use std::cmp::Ordering;

use sam_ir::table::ParseAction;
use sam_ir::{Language, Length, LexModeId, ProductionId, StateId, Subtree, SymbolId, Token};
use sam_lexer::Lexer;
use sam_lexer_core::SourceBuffer;
use smallvec::SmallVec;

use crate::reuse::{ReuseCursor, ReuseStats};
use crate::stack::{NodeId, Stack};
use crate::ParserOptions;

#[derive(Clone, Debug)]
enum Lookahead {
    Token(Token),
    /// Subtree from the old tree starting at the version's position.
    Reused(Subtree),
}

impl Lookahead {
    /// Terminal that selects the table actions.
    fn symbol(&self) -> SymbolId {
        match self {
            Lookahead::Token(token) => token.symbol,
            Lookahead::Reused(subtree) => subtree.first_leaf().symbol(),
        }
    }

    /// Absolute end of the input examined to produce the lookahead token.
    fn reach(&self, position: Length) -> u32 {
        match self {
            Lookahead::Token(token) => token.reach(),
            Lookahead::Reused(subtree) => {
                let first = subtree.first_leaf();
                position.bytes + first.size().bytes + first.lookahead_bytes()
            }
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Status {
    /// Still has to advance in this round.
    Pending,
    Shifted,
    /// No action for the lookahead.
    Errored,
    /// Accepted; the result is in `Engine::finished`.
    Done,
}

#[derive(Clone, Debug)]
struct Version {
    head: NodeId,
    lookahead: Option<Lookahead>,
    /// Mode the lookahead was (or will be) lexed in. Reductions change the
    /// top state without re-lexing, and a reused subtree is followed by the
    /// mode its last token left behind, so this can differ from the mode of
    /// the top state. Shifting an extra keeps it.
    lex_mode: Option<LexModeId>,
    status: Status,
}

impl Version {
    fn new(head: NodeId) -> Self {
        Version {
            head,
            lookahead: None,
            lex_mode: None,
            status: Status::Pending,
        }
    }
}

struct Reduction {
    symbol: SymbolId,
    child_count: u16,
    production_id: ProductionId,
    /// Absolute end of the input examined by the lookahead token.
    reach: u32,
    /// Other actions exist for the same lookahead.
    ambiguous: bool,
}

struct Finished {
    root: Subtree,
    error_cost: u32,
    dynamic_precedence: i32,
}

/// Lower error cost first, then higher dynamic precedence.
fn rank(error_cost: u32, dynamic_precedence: i32, other_cost: u32, other_precedence: i32) -> Ordering {
    error_cost
        .cmp(&other_cost)
        .then_with(|| other_precedence.cmp(&dynamic_precedence))
}

pub(crate) struct Engine<'a> {
    language: &'a Language,
    options: &'a ParserOptions,
    lexer: Lexer<'a>,
    stack: Stack,
    versions: Vec<Version>,
    reuse: Option<ReuseCursor>,
    /// Position at which the reuse cursor has nothing left to offer.
    reuse_blocked_at: Option<u32>,
    stats: &'a mut ReuseStats,
    finished: Option<Finished>,
    recovering: bool,
}

impl<'a> Engine<'a> {
    pub fn new(
        language: &'a Language,
        options: &'a ParserOptions,
        source: &'a SourceBuffer,
        reuse: Option<ReuseCursor>,
        stats: &'a mut ReuseStats,
    ) -> Self {
        let stack = Stack::new();
        let versions = vec![Version::new(stack.root())];
        Engine {
            language,
            options,
            lexer: Lexer::new(language, source),
            stack,
            versions,
            reuse,
            reuse_blocked_at: None,
            stats,
            finished: None,
            recovering: false,
        }
    }

    /// Parse to completion and return the root subtree.
    pub fn run(mut self) -> Subtree {
        let mut rounds = 0u32;
        while !self.versions.is_empty() {
            rounds += 1;
            let mut index = 0;
            while index < self.versions.len() {
                if self.versions[index].status == Status::Pending {
                    self.advance(index);
                }
                index += 1;
            }
            self.versions.retain(|v| v.status != Status::Done);

            if self.versions.iter().any(|v| v.status == Status::Shifted) {
                self.versions.retain(|v| v.status == Status::Shifted);
            } else if self.finished.is_some() {
                self.versions.clear();
            } else if let Some(best) = self.best_version() {
                let version = self.versions.swap_remove(best);
                self.versions = vec![version];
                self.recover(0);
                self.versions.retain(|v| v.status != Status::Done);
            }

            if let Some(finished) = &self.finished {
                let stack = &self.stack;
                let cost = finished.error_cost;
                self.versions.retain(|v| stack.error_cost(v.head) < cost);
            }
            self.condense();
            for version in &mut self.versions {
                version.status = Status::Pending;
            }
        }

        tracing::debug!(rounds, stack_entries = self.stack.len(), "parse finished");
        match self.finished {
            Some(finished) => finished.root,
            None => Subtree::error_node(Vec::new(), self.language),
        }
    }

    /// Index of the best version by error cost and dynamic precedence.
    fn best_version(&self) -> Option<usize> {
        let stack = &self.stack;
        (0..self.versions.len()).min_by(|&a, &b| {
            let (a, b) = (self.versions[a].head, self.versions[b].head);
            rank(
                stack.error_cost(a),
                stack.dynamic_precedence(a),
                stack.error_cost(b),
                stack.dynamic_precedence(b),
            )
        })
    }

    /// Drop versions that duplicate a better one, then cap their number.
    fn condense(&mut self) {
        let stack = &self.stack;
        let compare = |a: &Version, b: &Version| {
            rank(
                stack.error_cost(a.head),
                stack.dynamic_precedence(a.head),
                stack.error_cost(b.head),
                stack.dynamic_precedence(b.head),
            )
        };

        let mut kept: Vec<Version> = Vec::with_capacity(self.versions.len());
        for version in self.versions.drain(..) {
            let duplicate = kept.iter().position(|k| {
                stack.state(k.head) == stack.state(version.head)
                    && stack.position(k.head).bytes == stack.position(version.head).bytes
                    && stack.same_states(k.head, version.head)
            });
            match duplicate {
                Some(i) => {
                    if compare(&version, &kept[i]) == Ordering::Less {
                        kept[i] = version;
                    }
                }
                None => kept.push(version),
            }
        }
        if kept.len() > self.options.max_versions {
            kept.sort_by(|a, b| compare(a, b));
            kept.truncate(self.options.max_versions.max(1));
            tracing::trace!(kept = kept.len(), "pruned stack versions");
        }
        self.versions = kept;
    }

    /// Reduce until the version shifts, accepts or errors.
    fn advance(&mut self, index: usize) {
        let language = self.language;
        let mut reductions = 0usize;
        loop {
            let head = self.versions[index].head;
            let state = self.stack.state(head);
            let lookahead = match self.versions[index].lookahead.clone() {
                Some(lookahead) => lookahead,
                None => {
                    let lookahead = self.next_lookahead(index);
                    self.versions[index].lookahead = Some(lookahead.clone());
                    lookahead
                }
            };
            let actions = language.actions(state, lookahead.symbol());

            if actions.is_empty() {
                match lookahead {
                    Lookahead::Reused(subtree) if subtree.is_leaf() && language.is_extra(subtree.symbol()) => {
                        self.push_reused(index, subtree.with_parse_state(state).with_extra(true), state);
                        return;
                    }
                    Lookahead::Reused(_) => {
                        self.reject_reuse(index);
                        continue;
                    }
                    Lookahead::Token(token) => {
                        if language.is_extra(token.symbol) {
                            let leaf = Subtree::leaf(&token, state, true, language);
                            self.shift(index, leaf, state);
                            return;
                        }
                        if !token.is_end() && token.lex_mode != language.lex_mode_for_state(state) {
                            // Reductions moved to a state that lexes differently.
                            let mode = language.lex_mode_for_state(state);
                            let token = self.lex(head, mode);
                            let version = &mut self.versions[index];
                            version.lookahead = Some(Lookahead::Token(token));
                            version.lex_mode = Some(mode);
                            continue;
                        }
                        self.versions[index].status = Status::Errored;
                        return;
                    }
                }
            }

            if let Lookahead::Reused(subtree) = &lookahead {
                if actions.len() > 1 {
                    self.reject_reuse(index);
                    continue;
                }
                if !subtree.is_leaf() && matches!(actions[0], ParseAction::Shift { .. }) {
                    let next = if state == subtree.parse_state() {
                        language.goto(state, subtree.symbol())
                    } else {
                        None
                    };
                    match next.zip(self.follow_mode(subtree)) {
                        Some((next, mode)) => {
                            self.push_reused(index, subtree.clone(), next);
                            self.versions[index].lex_mode = Some(mode);
                        }
                        None => {
                            self.reject_reuse(index);
                            continue;
                        }
                    }
                    return;
                }
            }

            let reach = lookahead.reach(self.stack.position(head));
            let mut shift = None;
            let mut accepted = false;
            let mut reduced: SmallVec<[NodeId; 2]> = SmallVec::new();
            for action in actions {
                match *action {
                    ParseAction::Shift { state: next } => shift = Some(next),
                    ParseAction::Reduce {
                        symbol,
                        child_count,
                        production_id,
                        ..
                    } => {
                        reductions += 1;
                        let reduction = Reduction {
                            symbol,
                            child_count,
                            production_id,
                            reach,
                            ambiguous: actions.len() > 1,
                        };
                        if let Some(head) = self.reduce(head, &reduction) {
                            reduced.push(head);
                        }
                    }
                    ParseAction::Accept => accepted = true,
                }
            }

            if accepted {
                self.accept(index);
                return;
            }
            if reductions > self.options.max_reduce_steps {
                tracing::debug!(reductions, "reduction limit reached");
                self.versions[index].status = Status::Errored;
                return;
            }
            match shift {
                Some(next) => {
                    for head in reduced {
                        self.fork(index, head);
                    }
                    self.shift_lookahead(index, lookahead, state, next);
                    return;
                }
                None => {
                    let mut heads = reduced.into_iter();
                    let Some(first) = heads.next() else {
                        self.versions[index].status = Status::Errored;
                        return;
                    };
                    for head in heads {
                        self.fork(index, head);
                    }
                    self.versions[index].head = first;
                }
            }
        }
    }

    fn fork(&mut self, index: usize, head: NodeId) {
        if self.versions.len() >= self.options.max_versions.saturating_mul(4) {
            tracing::trace!("fork dropped");
            return;
        }
        let mut version = self.versions[index].clone();
        version.head = head;
        version.status = Status::Pending;
        self.versions.push(version);
    }

    /// Lexed token or reusable subtree at the version's position.
    fn next_lookahead(&mut self, index: usize) -> Lookahead {
        let language = self.language;
        let head = self.versions[index].head;
        let state = self.stack.state(head);
        let mode = *self.versions[index]
            .lex_mode
            .get_or_insert_with(|| language.lex_mode_for_state(state));
        let position = self.stack.position(head).bytes;
        if self.versions.len() == 1 && self.reuse_blocked_at != Some(position) {
            if let Some(subtree) = self.reusable(head, position, mode) {
                return Lookahead::Reused(subtree);
            }
        }
        Lookahead::Token(self.lex(head, mode))
    }

    /// Mode the token after `subtree` was lexed in when it was built: that of
    /// the state its last token was shifted into.
    fn follow_mode(&self, subtree: &Subtree) -> Option<LexModeId> {
        let language = self.language;
        let mut last = subtree;
        while let Some(child) = last.children().iter().rev().find(|c| !c.is_extra()) {
            last = child;
        }
        if !last.is_leaf() || !language.is_terminal(last.symbol()) {
            return None;
        }
        let next = shift_target(language.actions(last.parse_state(), last.symbol()))?;
        Some(language.lex_mode_for_state(next))
    }

    /// First subtree at `position` the parser would rebuild identically,
    /// as far as can be told before trying the parse actions.
    fn reusable(&mut self, head: NodeId, position: u32, mode: LexModeId) -> Option<Subtree> {
        let language = self.language;
        let external = if language.external_tokens().is_empty() {
            None
        } else {
            self.stack.last_external_state(head)
        };
        let cursor = self.reuse.as_mut()?;
        loop {
            let (subtree, _) = cursor.candidate(position)?;
            let first = subtree.first_leaf();
            let usable = !subtree.has_changes()
                && subtree.error_cost() == 0
                && !subtree.is_fragile()
                && !subtree.size().is_zero()
                && (subtree.is_leaf() || !first.is_extra())
                && language.is_terminal(first.symbol())
                && first.lex_mode() == mode
                && cursor.external_state() == external.as_deref();
            if usable {
                return Some(subtree);
            }
            if !cursor.descend() {
                return None;
            }
        }
    }

    fn reject_reuse(&mut self, index: usize) {
        self.versions[index].lookahead = None;
        let descended = self.reuse.as_mut().is_some_and(ReuseCursor::descend);
        if !descended {
            let head = self.versions[index].head;
            self.reuse_blocked_at = Some(self.stack.position(head).bytes);
        }
    }

    fn lex(&mut self, head: NodeId, mode: LexModeId) -> Token {
        let external = if self.language.external_tokens().is_empty() {
            None
        } else {
            self.stack.last_external_state(head)
        };
        self.lexer.seek(self.stack.position(head));
        let language = self.language;
        self.lexer
            .next_token(mode, language.lex_mode(mode), external.as_deref())
    }

    fn shift(&mut self, index: usize, subtree: Subtree, next: StateId) {
        let version = &mut self.versions[index];
        if !subtree.is_extra() {
            version.lex_mode = None;
        }
        version.head = self.stack.push(version.head, subtree, next);
        version.lookahead = None;
        version.status = Status::Shifted;
    }

    fn shift_lookahead(&mut self, index: usize, lookahead: Lookahead, state: StateId, next: StateId) {
        match lookahead {
            Lookahead::Token(token) => {
                let leaf = Subtree::leaf(&token, state, false, self.language);
                self.shift(index, leaf, next);
            }
            Lookahead::Reused(subtree) => {
                self.push_reused(index, subtree.with_parse_state(state).with_extra(false), next);
            }
        }
    }

    fn push_reused(&mut self, index: usize, subtree: Subtree, next: StateId) {
        tracing::trace!(subtree = ?subtree, "reused");
        self.stats.record(&subtree);
        if let Some(cursor) = &mut self.reuse {
            cursor.advance();
        }
        self.shift(index, subtree, next);
    }

    /// Build `symbol` from the top `child_count` subtrees of `head` and
    /// push it in the goto state. Returns the new head.
    fn reduce(&mut self, head: NodeId, reduction: &Reduction) -> Option<NodeId> {
        let popped = self.stack.pop(head, usize::from(reduction.child_count))?;
        let base_state = self.stack.state(popped.base);
        let next = self.language.goto(base_state, reduction.symbol)?;
        let start = self.stack.position(popped.base).bytes;

        let mut node = Subtree::node(
            reduction.symbol,
            popped.children,
            reduction.production_id,
            self.language,
        )
        .with_reach(reduction.reach.saturating_sub(start));
        if reduction.ambiguous || self.versions.len() > 1 || self.recovering {
            node = node.with_fragile();
        }
        let mut head = self.stack.push(popped.base, node, next);
        for extra in popped.trailing_extras {
            head = self.stack.push(head, extra, next);
        }
        Some(head)
    }

    /// Wrap the accepted stack in the root node.
    fn accept(&mut self, index: usize) {
        let head = self.versions[index].head;
        let subtrees = self.stack.subtrees(head);
        let start_symbol = self.language.table().start_symbol;
        let root = match subtrees.iter().rposition(|s| !s.is_extra()) {
            Some(i) if subtrees[i].symbol() == start_symbol => {
                let top = &subtrees[i];
                let mut children = Vec::with_capacity(subtrees.len() + top.children().len());
                children.extend(subtrees[..i].iter().cloned());
                children.extend(top.children().iter().cloned());
                children.extend(subtrees[i + 1..].iter().cloned());
                Subtree::node(top.symbol(), children, top.production_id(), self.language)
            }
            _ => Subtree::node(
                start_symbol,
                vec![Subtree::error_node(subtrees, self.language)],
                NO_PRODUCTION,
                self.language,
            ),
        };
        let error_cost = root.error_cost();
        let dynamic_precedence = root.dynamic_precedence();
        self.finish(index, root, error_cost, dynamic_precedence);
    }

    fn finish(&mut self, index: usize, root: Subtree, error_cost: u32, dynamic_precedence: i32) {
        self.versions[index].status = Status::Done;
        let better = self.finished.as_ref().map_or(true, |f| {
            rank(error_cost, dynamic_precedence, f.error_cost, f.dynamic_precedence) == Ordering::Less
        });
        if better {
            self.finished = Some(Finished {
                root,
                error_cost,
                dynamic_precedence,
            });
        }
    }
}

fn shift_target(actions: &[ParseAction]) -> Option<StateId> {
    actions.iter().find_map(|a| match *a {
        ParseAction::Shift { state } => Some(state),
        _ => None,
    })
}

/// Production id of a root built by forced acceptance; it matches no
/// production, so no child gets a field or an alias.
const NO_PRODUCTION: ProductionId = ProductionId(u16::MAX);
