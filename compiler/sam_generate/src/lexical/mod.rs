//! Lexical automaton construction.
//!
//! Token rules become regular expressions, the expressions become one
//! Thompson NFA with an accepting state per terminal, and subset
//! construction turns that into the DFA stored in the grammar table.

mod charset;
mod nfa;
mod pattern;

use rustc_hash::FxHashMap;
use sam_ir::table::{LexState, LexTransition};
use sam_ir::SymbolId;

use crate::rules::Rule;
use crate::GenerateError;

pub(crate) use charset::CharSet;
pub(crate) use nfa::{Nfa, NfaState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Regex {
    Empty,
    Set(CharSet),
    Seq(Vec<Regex>),
    Alt(Vec<Regex>),
    Repeat {
        inner: Box<Regex>,
        min: u32,
        max: Option<u32>,
    },
}

/// Convert the body of a token rule into a regular expression.
pub(crate) fn to_regex(rule: &Rule, token: &str) -> Result<Regex, GenerateError> {
    Ok(match rule {
        Rule::Blank => Regex::Empty,
        Rule::String(text) => Regex::Seq(text.chars().map(|c| Regex::Set(CharSet::single(c))).collect()),
        Rule::Pattern(source) => pattern::parse(source)?,
        Rule::Symbol(name) => {
            return Err(GenerateError::SymbolInToken {
                token: token.to_string(),
                name: name.clone(),
            })
        }
        Rule::Seq(rules) => Regex::Seq(rules.iter().map(|r| to_regex(r, token)).collect::<Result<_, _>>()?),
        Rule::Choice(rules) => Regex::Alt(rules.iter().map(|r| to_regex(r, token)).collect::<Result<_, _>>()?),
        Rule::Repeat(inner) => Regex::Repeat {
            inner: Box::new(to_regex(inner, token)?),
            min: 1,
            max: None,
        },
        Rule::Metadata { rule, .. } => to_regex(rule, token)?,
    })
}

/// Whether `regex` matches exactly `text`.
pub(crate) fn matches(regex: &Regex, text: &str) -> bool {
    let mut nfa = Nfa::default();
    let accept = nfa.push(NfaState::Accept(0));
    let start = nfa.add_regex(regex, accept);
    let mut current = vec![start];
    nfa.closure(&mut current);
    for c in text.chars() {
        let mut next = nfa.step(&current, u32::from(c));
        if next.is_empty() {
            return false;
        }
        nfa.closure(&mut next);
        current = next;
    }
    current.contains(&accept)
}

/// Subset construction over `nfa` from `start`.
///
/// `symbols[t]` is the table symbol of terminal `t` and `rank[t]` its
/// priority (lower wins); accept lists are ordered by rank.
pub(crate) fn build_dfa(nfa: &Nfa, start: u32, symbols: &[SymbolId], rank: &[usize]) -> Vec<LexState> {
    let mut initial = vec![start];
    nfa.closure(&mut initial);

    let mut ids: FxHashMap<Vec<u32>, u32> = FxHashMap::default();
    let mut sets: Vec<Vec<u32>> = Vec::new();
    ids.insert(initial.clone(), 0);
    sets.push(initial);

    let mut states = Vec::new();
    let mut next_unprocessed = 0;
    while next_unprocessed < sets.len() {
        let set = sets[next_unprocessed].clone();
        next_unprocessed += 1;

        let moves: Vec<(&CharSet, u32)> = set
            .iter()
            .filter_map(|&s| match &nfa.states[s as usize] {
                NfaState::Advance { chars, next } => Some((chars, *next)),
                _ => None,
            })
            .collect();

        let mut points: Vec<u32> = moves
            .iter()
            .flat_map(|(chars, _)| chars.ranges().iter().flat_map(|&(s, e)| [s, e + 1]))
            .collect();
        points.sort_unstable();
        points.dedup();

        let mut transitions: Vec<LexTransition> = Vec::new();
        for window in points.windows(2) {
            let (low, high) = (window[0], window[1] - 1);
            let mut targets: Vec<u32> = moves
                .iter()
                .filter(|(chars, _)| chars.contains(low))
                .map(|&(_, next)| next)
                .collect();
            if targets.is_empty() {
                continue;
            }
            nfa.closure(&mut targets);
            let target = match ids.get(&targets) {
                Some(&id) => id,
                None => {
                    let id = u32::try_from(sets.len()).unwrap_or(u32::MAX);
                    ids.insert(targets.clone(), id);
                    sets.push(targets);
                    id
                }
            };
            match transitions.last_mut() {
                Some(last) if last.target == target && last.end + 1 == low => last.end = high,
                _ => transitions.push(LexTransition {
                    start: low,
                    end: high,
                    target,
                }),
            }
        }

        let mut accepted: Vec<usize> = set
            .iter()
            .filter_map(|&s| match nfa.states[s as usize] {
                NfaState::Accept(terminal) => Some(terminal),
                _ => None,
            })
            .collect();
        accepted.sort_by_key(|&t| rank[t]);
        accepted.dedup();

        states.push(LexState {
            transitions,
            accepts: accepted.into_iter().map(|t| symbols[t]).collect(),
        });
    }
    states
}

#[cfg(test)]
mod tests;
