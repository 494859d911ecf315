//! Lexer output.

use std::fmt;
use std::sync::Arc;

use crate::language::LexModeId;
use crate::{Length, SymbolId};

/// One lexed token, before it becomes a tree leaf.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// Terminal symbol, [`SymbolId::ERROR`] for unrecognized input or
    /// [`SymbolId::END`] at end of input.
    pub symbol: SymbolId,
    /// Absolute start position.
    pub start: Length,
    pub size: Length,
    /// Bytes the lexer examined past the end of the token.
    pub lookahead_bytes: u32,
    /// Lex mode the token was produced under.
    pub lex_mode: LexModeId,
    /// Serialized external scanner state, for external tokens only.
    pub external_state: Option<Arc<[u8]>>,
}

impl Token {
    #[inline]
    pub fn end(&self) -> Length {
        self.start + self.size
    }

    /// Absolute end of the input the lexer looked at.
    #[inline]
    pub fn reach(&self) -> u32 {
        self.start.bytes + self.size.bytes + self.lookahead_bytes
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.symbol == SymbolId::END
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.symbol.is_error()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} @ {}..{}",
            self.symbol,
            self.start.bytes,
            self.start.bytes + self.size.bytes
        )
    }
}
