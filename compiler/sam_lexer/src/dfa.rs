//! Maximal-munch walk over the grammar's lexical automaton.

use sam_ir::table::LexState;
use sam_ir::SymbolId;
use sam_lexer_core::{Cursor, TextPosition};

/// Longest accepted token found by [`longest_match`].
pub(crate) struct Match {
    pub symbol: SymbolId,
    pub end: TextPosition,
}

/// Run the automaton from the cursor position and return the longest
/// non-empty token whose symbol passes `accept`.
///
/// The cursor is left at the end of the match (or at the start when nothing
/// matched). The second value is the exclusive end of the bytes examined.
pub(crate) fn longest_match(
    states: &[LexState],
    start_state: u32,
    cursor: &mut Cursor<'_>,
    accept: impl Fn(SymbolId) -> bool,
) -> (Option<Match>, u32) {
    let start = cursor.position();
    let mut state = start_state as usize;
    let mut best: Option<Match> = None;
    let mut reach = start.byte;

    loop {
        // Peeking at a character, or at the end of input, counts as
        // examining it.
        reach = reach.max(cursor.pos() + 1);
        let Some(c) = cursor.lookahead() else { break };
        let Some(next) = states[state].next(c) else { break };
        cursor.advance();
        state = next as usize;
        if let Some(&symbol) = states[state].accepts.iter().find(|&&s| accept(s)) {
            best = Some(Match {
                symbol,
                end: cursor.position(),
            });
        }
    }

    cursor.reset(best.as_ref().map_or(start, |m| m.end));
    (best, reach)
}
