//! Ordering of parse precedences.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use crate::grammar::PrecedenceEntry;
use crate::rules::Precedence;

/// Position of every named level: `(list, rank)` with rank 0 the highest.
pub(crate) struct PrecedenceOrder {
    levels: FxHashMap<String, (usize, usize)>,
}

impl PrecedenceOrder {
    pub(crate) fn new(lists: &[Vec<PrecedenceEntry>]) -> Self {
        let mut levels = FxHashMap::default();
        for (list, entries) in lists.iter().enumerate() {
            for (rank, entry) in entries.iter().enumerate() {
                levels.entry(entry.name().to_string()).or_insert((list, rank));
            }
        }
        PrecedenceOrder { levels }
    }

    /// Compare two precedences. Integers (and the default, zero) compare
    /// numerically; names compare by their position within the same list.
    /// Anything else is treated as equal and left to associativity.
    pub(crate) fn compare(&self, left: &Precedence, right: &Precedence) -> Ordering {
        match (left, right) {
            (Precedence::None | Precedence::Integer(_), Precedence::None | Precedence::Integer(_)) => {
                integer(left).cmp(&integer(right))
            }
            (Precedence::Name(left), Precedence::Name(right)) => {
                match (self.levels.get(left), self.levels.get(right)) {
                    (Some(&(left_list, left_rank)), Some(&(right_list, right_rank))) if left_list == right_list => {
                        right_rank.cmp(&left_rank)
                    }
                    _ => Ordering::Equal,
                }
            }
            _ => Ordering::Equal,
        }
    }
}

fn integer(precedence: &Precedence) -> i32 {
    match precedence {
        Precedence::Integer(value) => *value,
        _ => 0,
    }
}
