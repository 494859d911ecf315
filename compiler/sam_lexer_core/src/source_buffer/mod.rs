//! Owned copy of the text being lexed, followed by zero bytes.
//!
//! The lexer's DFA reads one byte ahead of every character it accepts. A
//! zero byte at `len()` gives that read something to see at end of input,
//! and rounding the allocation up to whole 64-byte blocks leaves room for
//! wider peeks.

use crate::Cursor;

const BLOCK: usize = 64;

/// Text plus trailing zero padding; see the module docs.
#[derive(Clone, Debug)]
pub struct SourceBuffer {
    bytes: Vec<u8>,
    text_len: u32,
}

impl SourceBuffer {
    /// Copy `text` into a padded buffer. Lengths past `u32::MAX` saturate;
    /// the parser never hands over such texts.
    pub fn new(text: &str) -> Self {
        let len = text.len();
        let mut bytes = vec![0u8; (len / BLOCK + 1) * BLOCK];
        bytes[..len].copy_from_slice(text.as_bytes());
        SourceBuffer {
            bytes,
            text_len: u32::try_from(len).unwrap_or(u32::MAX),
        }
    }

    /// The text's bytes, padding excluded.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.text_len as usize]
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    /// The whole allocation, padding included.
    pub fn padded_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// A cursor at the first byte.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(&self.bytes, self.text_len)
    }

    pub fn len(&self) -> u32 {
        self.text_len
    }

    pub fn is_empty(&self) -> bool {
        self.text_len == 0
    }
}
