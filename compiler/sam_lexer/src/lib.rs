//! Table-driven lexer for sam grammars.
//!
//! Unlike a standalone tokenizer, this lexer runs on demand: the parser asks
//! for the next token under the [`LexMode`] of its current state, so the
//! same text can lex differently depending on what the grammar expects
//! there. Lexing never fails; input nothing can match becomes an ERROR
//! token.
//!
//! # Token Selection
//!
//! 1. External scanner, when the mode has valid external tokens.
//! 2. Longest match among the mode's valid terminals (extras included when
//!    the state allows them). Equal lengths resolve by accept priority.
//! 3. Longest match among the terminals usable after an error: those valid
//!    in some state that allows extras. Immediate tokens and string
//!    contents are left out, so stray characters never pass for them.
//! 4. An ERROR token up to the next position where step 3 would match.
//!
//! The word token is then checked against the keyword table.

mod dfa;
mod keywords;

use std::sync::Arc;

use sam_ir::{Language, Length, LexMode, LexModeId, Point, SymbolId, Token};
use sam_lexer_core::{Cursor, ExternalScanner, ScanContext, SourceBuffer, TextPosition};

pub use sam_lexer_core::ScannedToken;

/// On-demand lexer over one source buffer.
pub struct Lexer<'a> {
    language: &'a Language,
    cursor: Cursor<'a>,
    scanner: Option<Box<dyn ExternalScanner>>,
    state_buffer: Vec<u8>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer at the start of `source`, with a fresh external
    /// scanner if the grammar uses one.
    pub fn new(language: &'a Language, source: &'a SourceBuffer) -> Self {
        Lexer {
            language,
            cursor: source.cursor(),
            scanner: language.new_external_scanner(),
            state_buffer: Vec::new(),
        }
    }

    /// Jump to an absolute position (used when the parser reuses a subtree).
    pub fn seek(&mut self, position: Length) {
        self.cursor.reset(TextPosition::new(
            position.bytes,
            position.extent.row,
            position.extent.column,
        ));
    }

    /// Lex one token.
    ///
    /// `external_state` is the serialized scanner state left by the last
    /// external token before this position (`None` for the initial state).
    pub fn next_token(&mut self, mode_id: LexModeId, mode: &LexMode, external_state: Option<&[u8]>) -> Token {
        let start = self.cursor.position();

        if mode.has_externals() {
            if let Some(token) = self.scan_external(mode_id, mode, external_state) {
                return token;
            }
        }

        if self.cursor.is_eof() {
            return self.finish(SymbolId::END, start, start, start.byte + 1, mode_id, None);
        }

        let table = self.language.table();
        let states = &table.lex_states;
        let word_usable = keywords::word_usable(self.language, mode);
        let language = self.language;
        let valid = |symbol: SymbolId| mode.is_valid(symbol) || (word_usable && Some(symbol) == language.word_token());
        let error_lexable = |symbol: SymbolId| language.is_error_lexable(symbol);

        let (found, mut reach) = dfa::longest_match(states, table.lex_start, &mut self.cursor, valid);
        let found = match found {
            Some(found) => Some(found),
            None => {
                self.cursor.reset(start);
                let (any, any_reach) = dfa::longest_match(states, table.lex_start, &mut self.cursor, error_lexable);
                reach = reach.max(any_reach);
                any
            }
        };

        if let Some(found) = found {
            let text = self.cursor.slice(start.byte, found.end.byte);
            let symbol = keywords::resolve(self.language, mode, found.symbol, text);
            return self.finish(symbol, start, found.end, reach, mode_id, None);
        }

        // Nothing matches: skip up to the next position where some token
        // could be lexed after an error.
        self.cursor.reset(start);
        self.cursor.advance();
        while !self.cursor.is_eof() {
            let here = self.cursor.position();
            let (next, next_reach) = dfa::longest_match(states, table.lex_start, &mut self.cursor, error_lexable);
            reach = reach.max(next_reach);
            self.cursor.reset(here);
            if next.is_some() {
                break;
            }
            self.cursor.advance();
        }
        let end = self.cursor.position();
        tracing::trace!(start = start.byte, end = end.byte, "unrecognized input");
        self.finish(SymbolId::ERROR, start, end, reach.max(end.byte + 1), mode_id, None)
    }

    fn scan_external(&mut self, mode_id: LexModeId, mode: &LexMode, external_state: Option<&[u8]>) -> Option<Token> {
        let scanner = self.scanner.as_mut()?;
        let start = self.cursor.position();
        scanner.deserialize(external_state.unwrap_or_default());

        let mut ctx = ScanContext::new(&mut self.cursor);
        let accepted = scanner.scan(&mut ctx, &mode.external_valid);
        let scanned = ctx.finish(accepted)?;

        let symbol = self
            .language
            .external_tokens()
            .get(usize::from(scanned.index))
            .copied()
            .filter(|&symbol| mode.is_valid(symbol));
        let Some(symbol) = symbol else {
            tracing::debug!(index = scanned.index, "external scanner returned an invalid token");
            self.cursor.reset(start);
            return None;
        };

        self.state_buffer.clear();
        scanner.serialize(&mut self.state_buffer);
        let state: Arc<[u8]> = Arc::from(self.state_buffer.as_slice());
        Some(self.finish(symbol, start, scanned.end, scanned.reach, mode_id, Some(state)))
    }

    fn finish(
        &self,
        symbol: SymbolId,
        start: TextPosition,
        end: TextPosition,
        reach: u32,
        lex_mode: LexModeId,
        external_state: Option<Arc<[u8]>>,
    ) -> Token {
        let start = to_length(start);
        let end = to_length(end);
        let token = Token {
            symbol,
            start,
            size: end - start,
            lookahead_bytes: reach.saturating_sub(end.bytes),
            lex_mode,
            external_state,
        };
        tracing::trace!(?token, "lexed");
        token
    }
}

fn to_length(position: TextPosition) -> Length {
    Length::new(position.byte, Point::new(position.row, position.column))
}
