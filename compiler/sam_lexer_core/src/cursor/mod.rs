//! Character cursor over a sentinel-terminated buffer.
//!
//! The cursor decodes one UTF-8 character at a time and keeps row/column
//! bookkeeping in step with the byte offset. Columns count bytes, not
//! characters, so positions stay comparable with byte ranges.
//!
//! EOF is the sentinel byte at `pos == source_len`. Interior null bytes
//! (`pos < source_len`) decode as `'\0'` and are ordinary characters.

/// Absolute position in the source: byte offset plus zero-based row and
/// byte column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextPosition {
    pub byte: u32,
    pub row: u32,
    pub column: u32,
}

impl TextPosition {
    /// Start of input.
    pub const ZERO: TextPosition = TextPosition {
        byte: 0,
        row: 0,
        column: 0,
    };

    #[inline]
    pub const fn new(byte: u32, row: u32, column: u32) -> Self {
        TextPosition { byte, row, column }
    }
}

/// Copyable cursor over a sentinel-terminated byte buffer.
///
/// Created via [`SourceBuffer::cursor()`](crate::SourceBuffer::cursor).
/// Being [`Copy`], a cursor doubles as a snapshot for backtracking: the
/// lexer saves one at the last accepting position and restores it after
/// overshooting.
///
/// # Invariant
///
/// `buf[source_len] == 0x00` and all padding bytes are `0x00`.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: u32,
    row: u32,
    column: u32,
    source_len: u32,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8], source_len: u32) -> Self {
        debug_assert!(
            (source_len as usize) < buf.len(),
            "sentinel must be within buffer bounds"
        );
        debug_assert!(buf[source_len as usize] == 0, "sentinel byte must be 0x00");
        Self {
            buf,
            pos: 0,
            row: 0,
            column: 0,
            source_len,
        }
    }

    /// Byte at the current position (`0x00` at EOF).
    #[inline]
    pub fn current_byte(&self) -> u8 {
        self.buf[self.pos as usize]
    }

    /// Byte one position ahead of current. Safe at EOF thanks to padding.
    #[inline]
    pub fn peek_byte(&self) -> u8 {
        self.buf[self.pos as usize + 1]
    }

    /// Decode the character at the current position, or `None` at EOF.
    #[inline]
    pub fn lookahead(&self) -> Option<char> {
        if self.is_eof() {
            return None;
        }
        let first = self.current_byte();
        if first.is_ascii() {
            return Some(char::from(first));
        }
        let start = self.pos as usize;
        let end = (start + Self::utf8_char_width(first) as usize).min(self.source_len as usize);
        std::str::from_utf8(&self.buf[start..end])
            .ok()
            .and_then(|s| s.chars().next())
    }

    /// Advance past the current character, updating row and column.
    ///
    /// No-op at EOF.
    #[inline]
    pub fn advance(&mut self) {
        if self.is_eof() {
            return;
        }
        let first = self.current_byte();
        let width = Self::utf8_char_width(first).min(self.source_len - self.pos);
        self.pos += width;
        if first == b'\n' {
            self.row += 1;
            self.column = 0;
        } else {
            self.column += width;
        }
    }

    /// Move forward to byte offset `target`, counting newlines on the way.
    ///
    /// Used when the parser splices a reused subtree and the lexer has to
    /// resume at the subtree's end without re-reading it character by
    /// character. `target` must lie on a character boundary.
    pub fn advance_to(&mut self, target: u32) {
        let target = target.min(self.source_len);
        if target <= self.pos {
            return;
        }
        let skipped = &self.buf[self.pos as usize..target as usize];
        match memchr::memrchr(b'\n', skipped) {
            Some(last_newline) => {
                let newlines = memchr::memchr_iter(b'\n', skipped).count();
                self.row += u32::try_from(newlines).unwrap_or(u32::MAX);
                self.column = u32::try_from(skipped.len() - last_newline - 1).unwrap_or(u32::MAX);
            }
            None => {
                self.column += target - self.pos;
            }
        }
        self.pos = target;
    }

    /// Restore a position previously obtained from [`position()`](Self::position).
    #[inline]
    pub fn reset(&mut self, position: TextPosition) {
        debug_assert!(position.byte <= self.source_len);
        self.pos = position.byte;
        self.row = position.row;
        self.column = position.column;
    }

    /// Returns `true` at the sentinel.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source_len
    }

    /// Current byte offset.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Current byte offset, row and column.
    #[inline]
    pub fn position(&self) -> TextPosition {
        TextPosition {
            byte: self.pos,
            row: self.row,
            column: self.column,
        }
    }

    /// Length of the source content.
    #[inline]
    pub fn source_len(&self) -> u32 {
        self.source_len
    }

    /// Source substring `start..end`. Both ends must be character boundaries
    /// within the source content.
    pub fn slice(&self, start: u32, end: u32) -> &'a str {
        let end = end.min(self.source_len) as usize;
        let start = (start as usize).min(end);
        std::str::from_utf8(&self.buf[start..end]).unwrap_or_default()
    }

    /// Source substring from `start` to the current position.
    pub fn slice_from(&self, start: u32) -> &'a str {
        self.slice(start, self.pos)
    }

    /// Number of bytes in the UTF-8 character starting with `byte`.
    ///
    /// Continuation and invalid leading bytes count as one byte.
    #[inline]
    pub fn utf8_char_width(byte: u8) -> u32 {
        match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        }
    }
}
