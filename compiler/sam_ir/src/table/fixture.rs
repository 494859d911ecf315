//! Hand-built table for `sam_ir` unit tests.
//!
//! ```text
//! source -> expr
//! expr   -> expr '+' number    (fields: left, operator, right)
//! expr   -> number
//! extras: whitespace
//! ```

use smallvec::smallvec;

use super::{GrammarTable, LexState, LexTransition, ParseAction, Production, ProductionStep};
use crate::{FieldId, ProductionId, StateId, SymbolId, SymbolInfo};

pub(crate) const NUMBER: SymbolId = SymbolId(1);
pub(crate) const PLUS: SymbolId = SymbolId(2);
pub(crate) const WHITESPACE: SymbolId = SymbolId(3);
pub(crate) const SOURCE: SymbolId = SymbolId(4);
pub(crate) const EXPR: SymbolId = SymbolId(5);

fn reduce(symbol: SymbolId, child_count: u16, production: u16) -> ParseAction {
    ParseAction::Reduce {
        symbol,
        child_count,
        dynamic_precedence: 0,
        production_id: ProductionId(production),
    }
}

fn shift(state: u16) -> ParseAction {
    ParseAction::Shift { state: StateId(state) }
}

fn transition(start: char, end: char, target: u32) -> LexTransition {
    LexTransition {
        start: u32::from(start),
        end: u32::from(end),
        target,
    }
}

pub(crate) fn sum_table() -> GrammarTable {
    let terminal_count = 4u16;
    let nonterminal_count = 2u16;
    let state_count = 6u16;

    let action_lists = vec![
        smallvec![],
        smallvec![shift(1)],
        smallvec![reduce(EXPR, 1, 2)],
        smallvec![ParseAction::Accept],
        smallvec![reduce(SOURCE, 1, 0)],
        smallvec![shift(4)],
        smallvec![shift(5)],
        smallvec![reduce(EXPR, 3, 1)],
    ];

    // Columns: end, number, '+', whitespace.
    #[rustfmt::skip]
    let action_index = vec![
        0, 1, 0, 0, // 0
        2, 0, 2, 0, // 1
        3, 0, 0, 0, // 2
        4, 0, 5, 0, // 3
        0, 6, 0, 0, // 4
        7, 0, 7, 0, // 5
    ];

    let none = StateId::NONE;
    // Columns: source, expr.
    #[rustfmt::skip]
    let gotos = vec![
        StateId(2), StateId(3),
        none, none,
        none, none,
        none, none,
        none, none,
        none, none,
    ];

    let lex_states = vec![
        LexState {
            transitions: vec![
                transition('\n', '\n', 3),
                transition(' ', ' ', 3),
                transition('+', '+', 2),
                transition('0', '9', 1),
            ],
            accepts: vec![],
        },
        LexState {
            transitions: vec![transition('0', '9', 1)],
            accepts: vec![NUMBER],
        },
        LexState {
            transitions: vec![],
            accepts: vec![PLUS],
        },
        LexState {
            transitions: vec![transition('\n', '\n', 3), transition(' ', ' ', 3)],
            accepts: vec![WHITESPACE],
        },
    ];

    GrammarTable {
        name: "sum".to_string(),
        symbols: vec![
            SymbolInfo::hidden("end"),
            SymbolInfo::named("number"),
            SymbolInfo::anonymous("+"),
            SymbolInfo::hidden("_whitespace"),
            SymbolInfo::named("source"),
            SymbolInfo::named("expr"),
        ],
        terminal_count,
        nonterminal_count,
        start_symbol: SOURCE,
        field_names: vec!["left".to_string(), "operator".to_string(), "right".to_string()],
        productions: vec![
            Production {
                lhs: SOURCE,
                dynamic_precedence: 0,
                steps: vec![ProductionStep::default()],
            },
            Production {
                lhs: EXPR,
                dynamic_precedence: 0,
                steps: vec![
                    ProductionStep { alias: None, field: Some(FieldId(0)) },
                    ProductionStep { alias: None, field: Some(FieldId(1)) },
                    ProductionStep { alias: None, field: Some(FieldId(2)) },
                ],
            },
            Production {
                lhs: EXPR,
                dynamic_precedence: 0,
                steps: vec![ProductionStep::default()],
            },
        ],
        state_count,
        action_index,
        action_lists,
        gotos,
        allows_extras: vec![true; usize::from(state_count)],
        extras: vec![WHITESPACE],
        external_tokens: vec![],
        word_token: None,
        keywords: vec![],
        lex_states,
        lex_start: 0,
    }
}
