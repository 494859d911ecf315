//! LALR(1) automaton and action resolution.
//!
//! States are LR(0) item-set cores; lookaheads are merged into existing
//! cores and a state is reprocessed whenever its kernel lookaheads grow, so
//! the fixpoint is the LALR(1) automaton. Conflicts that precedence and
//! associativity cannot settle stay in the action list for the GLR parser.

use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashMap;

use crate::first::{FirstSets, TerminalSet};
use crate::precedence::PrecedenceOrder;
use crate::prepare::{Prepared, Production, Step, Sym};
use crate::rules::{Associativity, Precedence};
use crate::Conflict;

static NO_PRECEDENCE: Precedence = Precedence::None;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Item {
    production: u32,
    dot: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Shift(usize),
    /// Index into [`Automaton::productions`].
    Reduce(usize),
    Accept,
}

#[derive(Debug, Default)]
pub(crate) struct LrState {
    /// Keyed by table terminal id.
    pub actions: BTreeMap<usize, Vec<Action>>,
    /// Keyed by variable index.
    pub gotos: BTreeMap<usize, usize>,
}

pub(crate) struct Automaton {
    pub states: Vec<LrState>,
    /// `(variable, production index within the variable)`.
    pub productions: Vec<(usize, usize)>,
    pub conflicts: Vec<Conflict>,
}

struct Builder<'g> {
    grammar: &'g Prepared,
    first: FirstSets,
    order: PrecedenceOrder,
    productions: Vec<(usize, usize)>,
    by_variable: Vec<Vec<u32>>,
    augmented: Production,
    kernels: Vec<Vec<Item>>,
    lookaheads: Vec<Vec<TerminalSet>>,
    transitions: Vec<BTreeMap<Sym, usize>>,
    ids: FxHashMap<Vec<Item>, usize>,
}

#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn build(grammar: &Prepared) -> Automaton {
    let mut productions = Vec::new();
    let mut by_variable = vec![Vec::new(); grammar.variables.len()];
    for (variable, definition) in grammar.variables.iter().enumerate() {
        for index in 0..definition.productions.len() {
            by_variable[variable].push(u32::try_from(productions.len()).unwrap_or(u32::MAX));
            productions.push((variable, index));
        }
    }

    let augmented = Production {
        steps: vec![Step {
            symbol: Sym::NonTerminal(0),
            precedence: Precedence::None,
            associativity: None,
            field: None,
            alias: None,
        }],
        dynamic_precedence: 0,
    };

    let mut builder = Builder {
        grammar,
        first: FirstSets::compute(grammar),
        order: PrecedenceOrder::new(&grammar.precedences),
        productions,
        by_variable,
        augmented,
        kernels: Vec::new(),
        lookaheads: Vec::new(),
        transitions: Vec::new(),
        ids: FxHashMap::default(),
    };
    builder.run();
    builder.finish()
}

impl Builder<'_> {
    fn augmented_id(&self) -> u32 {
        u32::try_from(self.productions.len()).unwrap_or(u32::MAX)
    }

    fn production(&self, id: u32) -> &Production {
        match self.productions.get(id as usize) {
            Some(&(variable, index)) => &self.grammar.variables[variable].productions[index],
            None => &self.augmented,
        }
    }

    fn steps(&self, item: Item) -> &[Step] {
        &self.production(item.production).steps
    }

    fn run(&mut self) {
        let mut end = self.first.empty_set();
        end.insert(0);
        let start = vec![Item {
            production: self.augmented_id(),
            dot: 0,
        }];
        let mut queue = VecDeque::new();
        self.add_state(start, vec![end], &mut queue);

        while let Some(state) = queue.pop_front() {
            let items = self.closure(state);
            let mut grouped: BTreeMap<Sym, Vec<(Item, TerminalSet)>> = BTreeMap::new();
            for (item, lookahead) in items {
                if let Some(step) = self.steps(item).get(item.dot as usize) {
                    let advanced = Item {
                        production: item.production,
                        dot: item.dot + 1,
                    };
                    grouped.entry(step.symbol).or_default().push((advanced, lookahead));
                }
            }

            let mut transitions = BTreeMap::new();
            for (symbol, mut entries) in grouped {
                entries.sort_by_key(|(item, _)| *item);
                let mut kernel: Vec<Item> = Vec::with_capacity(entries.len());
                let mut lookaheads: Vec<TerminalSet> = Vec::with_capacity(entries.len());
                for (item, lookahead) in entries {
                    if kernel.last() == Some(&item) {
                        if let Some(last) = lookaheads.last_mut() {
                            last.union_with(&lookahead);
                        }
                    } else {
                        kernel.push(item);
                        lookaheads.push(lookahead);
                    }
                }
                let target = self.add_state(kernel, lookaheads, &mut queue);
                transitions.insert(symbol, target);
            }
            self.transitions[state] = transitions;
        }
        tracing::debug!(states = self.kernels.len(), "LALR(1) automaton built");
    }

    /// Find or create the state with this kernel, merging lookaheads. The
    /// state is queued when it is new or its lookaheads grew.
    fn add_state(&mut self, kernel: Vec<Item>, lookaheads: Vec<TerminalSet>, queue: &mut VecDeque<usize>) -> usize {
        if let Some(&existing) = self.ids.get(&kernel) {
            let mut grew = false;
            for (mine, theirs) in self.lookaheads[existing].iter_mut().zip(&lookaheads) {
                grew |= mine.union_with(theirs);
            }
            if grew && !queue.contains(&existing) {
                queue.push_back(existing);
            }
            return existing;
        }
        let id = self.kernels.len();
        self.ids.insert(kernel.clone(), id);
        self.kernels.push(kernel);
        self.lookaheads.push(lookaheads);
        self.transitions.push(BTreeMap::new());
        queue.push_back(id);
        id
    }

    fn closure(&self, state: usize) -> Vec<(Item, TerminalSet)> {
        let mut items: Vec<(Item, TerminalSet)> = self.kernels[state]
            .iter()
            .copied()
            .zip(self.lookaheads[state].iter().cloned())
            .collect();
        let mut index: FxHashMap<Item, usize> = items.iter().enumerate().map(|(i, (item, _))| (*item, i)).collect();
        let mut pending: Vec<usize> = (0..items.len()).collect();

        while let Some(current) = pending.pop() {
            let (item, lookahead) = items[current].clone();
            let steps = self.steps(item);
            let Some(Step {
                symbol: Sym::NonTerminal(variable),
                ..
            }) = steps.get(item.dot as usize)
            else {
                continue;
            };
            let mut follow = self.first.empty_set();
            if self.first.first_of_steps(&steps[item.dot as usize + 1..], &mut follow) {
                follow.union_with(&lookahead);
            }
            for &production in &self.by_variable[*variable] {
                let start = Item { production, dot: 0 };
                match index.get(&start) {
                    Some(&existing) => {
                        if items[existing].1.union_with(&follow) {
                            pending.push(existing);
                        }
                    }
                    None => {
                        index.insert(start, items.len());
                        pending.push(items.len());
                        items.push((start, follow.clone()));
                    }
                }
            }
        }
        items
    }

    fn finish(self) -> Automaton {
        let mut states = Vec::with_capacity(self.kernels.len());
        let mut conflicts = Vec::new();
        for state in 0..self.kernels.len() {
            let items = self.closure(state);
            let mut lr = LrState::default();
            let mut reduces: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

            for (item, lookahead) in &items {
                if (item.dot as usize) < self.steps(*item).len() {
                    continue;
                }
                if item.production == self.augmented_id() {
                    lr.actions.entry(0).or_default().push(Action::Accept);
                    continue;
                }
                for terminal in lookahead.iter() {
                    reduces.entry(terminal).or_default().push(item.production as usize);
                }
            }

            for (&symbol, &target) in &self.transitions[state] {
                match symbol {
                    Sym::Terminal(terminal) => {
                        lr.actions.entry(terminal + 1).or_default().push(Action::Shift(target));
                    }
                    Sym::NonTerminal(variable) => {
                        lr.gotos.insert(variable, target);
                    }
                }
            }

            for (terminal, mut candidates) in reduces {
                candidates.sort_unstable();
                candidates.dedup();
                let shift = lr.actions.get(&terminal).and_then(|actions| {
                    actions.iter().find_map(|a| match a {
                        Action::Shift(target) => Some(*target),
                        _ => None,
                    })
                });
                let resolved = self.resolve(&items, terminal, shift, candidates);
                if resolved.len() > 1 {
                    conflicts.push(self.describe(state, terminal, &resolved));
                }
                let actions = lr.actions.entry(terminal).or_default();
                actions.retain(|a| matches!(a, Action::Accept));
                actions.extend(resolved);
            }
            states.push(lr);
        }

        if !conflicts.is_empty() {
            tracing::debug!(count = conflicts.len(), "conflicts left to the GLR parser");
        }
        Automaton {
            states,
            productions: self.productions,
            conflicts,
        }
    }

    /// Precedence and associativity of reducing `production`: those of its
    /// last step.
    fn reduce_precedence(&self, production: usize) -> (&Precedence, Option<Associativity>) {
        let (variable, index) = self.productions[production];
        self.grammar.variables[variable].productions[index]
            .steps
            .last()
            .map_or((&NO_PRECEDENCE, None), |step| (&step.precedence, step.associativity))
    }

    fn resolve(
        &self,
        items: &[(Item, TerminalSet)],
        terminal: usize,
        shift: Option<usize>,
        mut reduces: Vec<usize>,
    ) -> Vec<Action> {
        if reduces.len() > 1 {
            let precedences: Vec<&Precedence> = reduces.iter().map(|&p| self.reduce_precedence(p).0).collect();
            let keep: Vec<bool> = precedences
                .iter()
                .map(|mine| {
                    !precedences
                        .iter()
                        .any(|other| self.order.compare(other, mine) == Ordering::Greater)
                })
                .collect();
            let mut keep = keep.into_iter();
            reduces.retain(|_| keep.next().unwrap_or(true));
        }

        let mut shift = shift;
        if shift.is_some() {
            let mut shift_precedences: Vec<&Precedence> = items
                .iter()
                .filter_map(|(item, _)| {
                    let steps = self.steps(*item);
                    let dot = item.dot as usize;
                    let next = steps.get(dot)?;
                    (dot > 0 && self.first.starts_with(next.symbol, terminal)).then(|| &steps[dot - 1].precedence)
                })
                .collect();
            if shift_precedences.is_empty() {
                shift_precedences.push(&NO_PRECEDENCE);
            }

            reduces.retain(|&production| {
                let (precedence, associativity) = self.reduce_precedence(production);
                let orders: Vec<Ordering> = shift_precedences
                    .iter()
                    .map(|s| self.order.compare(s, precedence))
                    .collect();
                if orders.iter().all(|&o| o == Ordering::Greater) {
                    return false;
                }
                if orders.iter().all(|&o| o == Ordering::Less) {
                    shift = None;
                    return true;
                }
                if orders.iter().all(|&o| o == Ordering::Equal) {
                    match associativity {
                        Some(Associativity::Left) => shift = None,
                        Some(Associativity::Right) => return false,
                        None => {}
                    }
                }
                true
            });
        }

        shift
            .map(Action::Shift)
            .into_iter()
            .chain(reduces.into_iter().map(Action::Reduce))
            .collect()
    }

    fn describe(&self, state: usize, terminal: usize, actions: &[Action]) -> Conflict {
        let lookahead = match terminal.checked_sub(1) {
            Some(index) => self.grammar.terminals[index].name.clone(),
            None => "end".to_string(),
        };
        let actions = actions
            .iter()
            .map(|action| match *action {
                Action::Shift(_) => "shift".to_string(),
                Action::Reduce(production) => {
                    let (variable, index) = self.productions[production];
                    let variable = &self.grammar.variables[variable];
                    format!(
                        "reduce {} ({} children)",
                        variable.name,
                        variable.productions[index].steps.len()
                    )
                }
                Action::Accept => "accept".to_string(),
            })
            .collect();
        Conflict {
            state,
            lookahead,
            actions,
        }
    }
}
