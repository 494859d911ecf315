//! Thompson NFA.

use super::{CharSet, Regex};

#[derive(Clone, Debug)]
pub(crate) enum NfaState {
    Advance { chars: CharSet, next: u32 },
    Split(Vec<u32>),
    /// Accepts the terminal with this index.
    Accept(usize),
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Nfa {
    pub states: Vec<NfaState>,
}

impl Nfa {
    pub(crate) fn push(&mut self, state: NfaState) -> u32 {
        self.states.push(state);
        u32::try_from(self.states.len() - 1).unwrap_or(u32::MAX)
    }

    /// Add states matching `regex` that continue to `next`; returns the
    /// entry state. Built back to front, so every state knows its successor
    /// when it is created.
    pub(crate) fn add_regex(&mut self, regex: &Regex, next: u32) -> u32 {
        match regex {
            Regex::Empty => next,
            Regex::Set(chars) => self.push(NfaState::Advance {
                chars: chars.clone(),
                next,
            }),
            Regex::Seq(items) => items.iter().rev().fold(next, |next, item| self.add_regex(item, next)),
            Regex::Alt(alternatives) => {
                let starts = alternatives.iter().map(|alt| self.add_regex(alt, next)).collect();
                self.push(NfaState::Split(starts))
            }
            Regex::Repeat { inner, min, max } => {
                let tail = match *max {
                    None => {
                        let hub = self.push(NfaState::Split(Vec::new()));
                        let body = self.add_regex(inner, hub);
                        self.states[hub as usize] = NfaState::Split(vec![body, next]);
                        hub
                    }
                    Some(max) => {
                        let mut current = next;
                        for _ in *min..max {
                            let body = self.add_regex(inner, current);
                            current = self.push(NfaState::Split(vec![body, next]));
                        }
                        current
                    }
                };
                (0..*min).fold(tail, |next, _| self.add_regex(inner, next))
            }
        }
    }

    /// Extend `states` with everything reachable through splits; leaves it
    /// sorted and deduplicated.
    pub(crate) fn closure(&self, states: &mut Vec<u32>) {
        let mut seen = vec![false; self.states.len()];
        let mut pending = std::mem::take(states);
        while let Some(state) = pending.pop() {
            if std::mem::replace(&mut seen[state as usize], true) {
                continue;
            }
            states.push(state);
            if let NfaState::Split(targets) = &self.states[state as usize] {
                pending.extend(targets.iter().copied());
            }
        }
        states.sort_unstable();
    }

    /// States reached by consuming `c`.
    pub(crate) fn step(&self, states: &[u32], c: u32) -> Vec<u32> {
        states
            .iter()
            .filter_map(|&s| match &self.states[s as usize] {
                NfaState::Advance { chars, next } if chars.contains(c) => Some(*next),
                _ => None,
            })
            .collect()
    }
}
