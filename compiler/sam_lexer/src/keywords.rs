//! Keyword resolution for the grammar's word token.
//!
//! Keywords whose text the word token would also match are not part of the
//! lexical automaton. The lexer matches the word token and then looks the
//! text up here.

use sam_ir::{Language, LexMode, SymbolId};

/// Whether the word token may be matched in this mode: it is valid itself,
/// or some keyword it stands in for is.
pub(crate) fn word_usable(language: &Language, mode: &LexMode) -> bool {
    let Some(word) = language.word_token() else {
        return false;
    };
    mode.is_valid(word) || language.table().keywords.iter().any(|k| mode.is_valid(k.symbol))
}

/// Final symbol for a matched token.
///
/// Reserved keywords always win; other keywords only where valid.
pub(crate) fn resolve(language: &Language, mode: &LexMode, matched: SymbolId, text: &str) -> SymbolId {
    if Some(matched) != language.word_token() {
        return matched;
    }
    match language.keyword(text) {
        Some(keyword) if keyword.reserved || mode.is_valid(keyword.symbol) => keyword.symbol,
        _ => matched,
    }
}
