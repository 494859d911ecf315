//! Internal consistency checks run on every loaded table.

use rustc_hash::FxHashSet;

use super::GrammarLoadError;
use crate::table::{GrammarTable, ParseAction};
use crate::SymbolId;

macro_rules! ensure {
    ($cond:expr, $($msg:tt)+) => {
        if !$cond {
            return Err(GrammarLoadError::Inconsistent(format!($($msg)+)));
        }
    };
}

/// Validate a decoded table. Every index the parser or lexer will follow is
/// checked here so that the hot paths can index without re-checking.
pub(crate) fn validate(table: &GrammarTable) -> Result<(), GrammarLoadError> {
    check_symbols(table)?;
    check_productions(table)?;
    check_parse_table(table)?;
    check_lex_table(table)?;
    Ok(())
}

fn check_symbols(table: &GrammarTable) -> Result<(), GrammarLoadError> {
    let terminals = usize::from(table.terminal_count);
    let nonterminals = usize::from(table.nonterminal_count);

    ensure!(terminals >= 1, "a table needs at least the end symbol");
    ensure!(nonterminals >= 1, "a table needs at least one rule");
    ensure!(
        table.symbols.len() >= terminals + nonterminals,
        "{} symbols declared but {} terminals and {} nonterminals counted",
        table.symbols.len(),
        terminals,
        nonterminals
    );
    ensure!(
        table.symbols.len() < usize::from(u16::MAX),
        "too many symbols ({})",
        table.symbols.len()
    );
    ensure!(
        table.is_nonterminal(table.start_symbol),
        "start symbol {:?} is not a nonterminal",
        table.start_symbol
    );

    let mut seen = FxHashSet::default();
    for info in table.symbols.iter().skip(1).filter(|info| info.visible) {
        if !seen.insert((info.name.as_str(), info.named)) {
            return Err(GrammarLoadError::DuplicateSymbol {
                name: info.name.clone(),
            });
        }
    }

    let mut fields = FxHashSet::default();
    for name in &table.field_names {
        ensure!(fields.insert(name.as_str()), "field `{name}` declared twice");
    }

    for &extra in &table.extras {
        ensure!(is_token(table, extra), "extra {extra:?} is not a terminal");
    }
    for &external in &table.external_tokens {
        ensure!(is_token(table, external), "external token {external:?} is not a terminal");
    }
    if let Some(word) = table.word_token {
        ensure!(is_token(table, word), "word token {word:?} is not a terminal");
    }
    for keyword in &table.keywords {
        ensure!(
            is_token(table, keyword.symbol),
            "keyword `{}` maps to non-terminal {:?}",
            keyword.text,
            keyword.symbol
        );
    }
    Ok(())
}

fn is_token(table: &GrammarTable, symbol: SymbolId) -> bool {
    symbol != SymbolId::END && table.is_terminal(symbol)
}

fn check_productions(table: &GrammarTable) -> Result<(), GrammarLoadError> {
    ensure!(
        table.productions.len() < usize::from(u16::MAX),
        "too many productions ({})",
        table.productions.len()
    );
    for (id, production) in table.productions.iter().enumerate() {
        ensure!(
            table.is_nonterminal(production.lhs),
            "production {id} reduces to non-rule {:?}",
            production.lhs
        );
        for step in &production.steps {
            if let Some(alias) = step.alias {
                ensure!(
                    alias.index() < table.symbols.len() && alias != SymbolId::END,
                    "production {id} aliases to unknown symbol {alias:?}"
                );
            }
            if let Some(field) = step.field {
                ensure!(
                    field.index() < table.field_names.len(),
                    "production {id} uses unknown field {field:?}"
                );
            }
        }
    }
    Ok(())
}

fn check_parse_table(table: &GrammarTable) -> Result<(), GrammarLoadError> {
    let states = usize::from(table.state_count);
    let terminals = usize::from(table.terminal_count);
    let nonterminals = usize::from(table.nonterminal_count);

    ensure!(states >= 1, "a table needs at least one state");
    ensure!(states < usize::from(u16::MAX), "too many states ({states})");
    ensure!(
        table.action_index.len() == states * terminals,
        "action matrix has {} cells, expected {}",
        table.action_index.len(),
        states * terminals
    );
    ensure!(
        table.gotos.len() == states * nonterminals,
        "goto matrix has {} cells, expected {}",
        table.gotos.len(),
        states * nonterminals
    );
    ensure!(
        table.allows_extras.len() == states,
        "extras flags cover {} states, expected {states}",
        table.allows_extras.len()
    );
    ensure!(
        table.action_lists.first().is_some_and(|list| list.is_empty()),
        "action list 0 must be the empty list"
    );

    for (cell, &idx) in table.action_index.iter().enumerate() {
        ensure!(
            usize::from(idx) < table.action_lists.len(),
            "state {} column {} points at missing action list {idx}",
            cell / terminals,
            cell % terminals
        );
        if cell % terminals != 0 {
            ensure!(
                !table.action_lists[usize::from(idx)]
                    .iter()
                    .any(|a| matches!(a, ParseAction::Accept)),
                "accept action outside the end-of-input column in state {}",
                cell / terminals
            );
        }
    }

    let mut has_accept = false;
    for (list_id, list) in table.action_lists.iter().enumerate() {
        for action in list {
            match *action {
                ParseAction::Shift { state } => {
                    ensure!(state.index() < states, "action list {list_id} shifts to missing state {state:?}");
                }
                ParseAction::Reduce {
                    symbol,
                    child_count,
                    production_id,
                    ..
                } => {
                    let production = table.productions.get(production_id.index());
                    ensure!(
                        production.is_some_and(|p| p.lhs == symbol && p.steps.len() == usize::from(child_count)),
                        "action list {list_id} reduces {symbol:?}/{child_count} with mismatched production {production_id:?}"
                    );
                }
                ParseAction::Accept => has_accept = true,
            }
        }
    }
    ensure!(has_accept, "no state accepts the input");

    for (cell, target) in table.gotos.iter().enumerate() {
        ensure!(
            target.is_none() || target.index() < states,
            "goto in state {} leads to missing state {target:?}",
            cell / nonterminals.max(1)
        );
    }
    Ok(())
}

fn check_lex_table(table: &GrammarTable) -> Result<(), GrammarLoadError> {
    let lex_states = table.lex_states.len();
    ensure!(
        (table.lex_start as usize) < lex_states,
        "lexer start state {} out of {lex_states} states",
        table.lex_start
    );
    for (id, state) in table.lex_states.iter().enumerate() {
        let mut previous_end: Option<u32> = None;
        for transition in &state.transitions {
            ensure!(
                transition.start <= transition.end,
                "lexer state {id} has an inverted range"
            );
            ensure!(
                previous_end.map_or(true, |end| end < transition.start),
                "lexer state {id} has unsorted or overlapping ranges"
            );
            ensure!(
                (transition.target as usize) < lex_states,
                "lexer state {id} jumps to missing state {}",
                transition.target
            );
            previous_end = Some(transition.end);
        }
        for &accept in &state.accepts {
            ensure!(is_token(table, accept), "lexer state {id} accepts non-terminal {accept:?}");
        }
    }
    Ok(())
}
