//! Terminal sets and FIRST/nullable analysis.

use crate::prepare::{Prepared, Step, Sym};

/// Bit set over table terminal ids (0 is the end symbol, prepared terminal
/// `i` is id `i + 1`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct TerminalSet {
    words: Vec<u64>,
}

impl TerminalSet {
    pub(crate) fn with_capacity(terminals: usize) -> Self {
        TerminalSet {
            words: vec![0; terminals.div_ceil(64)],
        }
    }

    /// Insert `id`; returns whether it was new.
    pub(crate) fn insert(&mut self, id: usize) -> bool {
        let (word, bit) = (id / 64, 1u64 << (id % 64));
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let added = self.words[word] & bit == 0;
        self.words[word] |= bit;
        added
    }

    pub(crate) fn contains(&self, id: usize) -> bool {
        self.words.get(id / 64).is_some_and(|w| w & (1u64 << (id % 64)) != 0)
    }

    /// Union with `other`; returns whether anything was added.
    pub(crate) fn union_with(&mut self, other: &TerminalSet) -> bool {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let merged = *mine | theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(index, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(index * 64 + bit)
            })
        })
    }
}

pub(crate) struct FirstSets {
    first: Vec<TerminalSet>,
    nullable: Vec<bool>,
    terminal_ids: usize,
}

impl FirstSets {
    pub(crate) fn compute(grammar: &Prepared) -> Self {
        let terminal_ids = grammar.terminals.len() + 1;
        let count = grammar.variables.len();
        let mut sets = FirstSets {
            first: vec![TerminalSet::with_capacity(terminal_ids); count],
            nullable: vec![false; count],
            terminal_ids,
        };

        let mut changed = true;
        while changed {
            changed = false;
            for (index, variable) in grammar.variables.iter().enumerate() {
                for production in &variable.productions {
                    let mut first = TerminalSet::with_capacity(terminal_ids);
                    let nullable = sets.first_of_steps(&production.steps, &mut first);
                    changed |= sets.first[index].union_with(&first);
                    if nullable && !sets.nullable[index] {
                        sets.nullable[index] = true;
                        changed = true;
                    }
                }
            }
        }
        sets
    }

    pub(crate) fn empty_set(&self) -> TerminalSet {
        TerminalSet::with_capacity(self.terminal_ids)
    }

    /// Add FIRST(steps) to `out`; returns whether `steps` can derive the
    /// empty string.
    pub(crate) fn first_of_steps(&self, steps: &[Step], out: &mut TerminalSet) -> bool {
        for step in steps {
            match step.symbol {
                Sym::Terminal(terminal) => {
                    out.insert(terminal + 1);
                    return false;
                }
                Sym::NonTerminal(variable) => {
                    out.union_with(&self.first[variable]);
                    if !self.nullable[variable] {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Whether `symbol` can begin with terminal id `terminal`.
    pub(crate) fn starts_with(&self, symbol: Sym, terminal: usize) -> bool {
        match symbol {
            Sym::Terminal(t) => t + 1 == terminal,
            Sym::NonTerminal(variable) => self.first[variable].contains(terminal),
        }
    }
}
