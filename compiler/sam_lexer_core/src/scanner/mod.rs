//! External scanner capability.
//!
//! Some tokens cannot be described by the grammar's regular token rules
//! (nested comments, heredocs, indentation). A grammar declares such tokens
//! as *externals*, and the host supplies an [`ExternalScanner`] that
//! recognizes them by driving a [`ScanContext`].
//!
//! Scanners may keep state between tokens. The lexer serializes the state
//! after every external token and restores it before every call, so a
//! scanner never observes state from an abandoned parse path.

use crate::{Cursor, TextPosition};

/// Contract for hand-written token recognizers.
pub trait ExternalScanner: Send {
    /// Try to recognize one of the external tokens marked `true` in
    /// `valid_symbols` (indexed by the grammar's external token order).
    ///
    /// On success, call [`ScanContext::set_result`] and return `true`. The
    /// token ends at the last [`ScanContext::mark_end`] call, or at the
    /// current position when `mark_end` was never called.
    fn scan(&mut self, ctx: &mut ScanContext<'_, '_>, valid_symbols: &[bool]) -> bool;

    /// Write the scanner's state into `buffer`.
    fn serialize(&self, buffer: &mut Vec<u8>);

    /// Replace the scanner's state with a previously serialized one. An empty
    /// slice means the initial state.
    fn deserialize(&mut self, state: &[u8]);
}

/// Token recognized by an external scanner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScannedToken {
    /// Index into the grammar's external token list.
    pub index: u16,
    /// Position right after the token.
    pub end: TextPosition,
    /// Furthest position the scanner looked at.
    pub reach: u32,
}

/// Input view handed to an [`ExternalScanner`].
pub struct ScanContext<'a, 'c> {
    cursor: &'c mut Cursor<'a>,
    start: TextPosition,
    marked_end: Option<TextPosition>,
    result: Option<u16>,
    reach: u32,
}

impl<'a, 'c> ScanContext<'a, 'c> {
    pub fn new(cursor: &'c mut Cursor<'a>) -> Self {
        let start = cursor.position();
        ScanContext {
            reach: start.byte,
            cursor,
            start,
            marked_end: None,
            result: None,
        }
    }

    /// Character at the current position, `None` at end of input.
    #[inline]
    pub fn lookahead(&mut self) -> Option<char> {
        // Looking at a character counts as examining it.
        self.reach = self.reach.max(self.cursor.pos() + 1);
        self.cursor.lookahead()
    }

    /// Consume the current character.
    #[inline]
    pub fn advance(&mut self) {
        self.cursor.advance();
        self.reach = self.reach.max(self.cursor.pos());
    }

    /// Mark the current position as the end of the token being scanned.
    #[inline]
    pub fn mark_end(&mut self) {
        self.marked_end = Some(self.cursor.position());
    }

    /// Record which external token was recognized.
    #[inline]
    pub fn set_result(&mut self, index: u16) {
        self.result = Some(index);
    }

    /// Byte column of the current position.
    #[inline]
    pub fn column(&self) -> u32 {
        self.cursor.position().column
    }

    #[inline]
    pub fn is_at_eof(&self) -> bool {
        self.cursor.is_eof()
    }

    /// Where the scan started.
    #[inline]
    pub fn start(&self) -> TextPosition {
        self.start
    }

    /// Resolve the scan outcome. On success the cursor is left at the token
    /// end; on failure it is rewound to the start.
    pub fn finish(self, accepted: bool) -> Option<ScannedToken> {
        let reach = self.reach;
        match (accepted, self.result) {
            (true, Some(index)) => {
                let end = self.marked_end.unwrap_or_else(|| self.cursor.position());
                self.cursor.reset(end);
                Some(ScannedToken { index, end, reach })
            }
            _ => {
                self.cursor.reset(self.start);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests;
