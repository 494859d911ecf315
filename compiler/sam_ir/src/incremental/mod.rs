//! Text edits for incremental re-parsing.
//!
//! An [`InputEdit`] describes one replacement: the old region
//! `[start_byte, old_end_byte)` becomes `[start_byte, new_end_byte)` in the
//! new text. Points are carried alongside bytes so row/column positions can
//! be shifted without rescanning the text.
//!
//! # Examples
//!
//! ```
//! use sam_ir::incremental::InputEdit;
//!
//! let old = "let x = 1;";
//! let (new, edit) = InputEdit::apply(old, 8, 9, "42");
//! assert_eq!(new, "let x = 42;");
//! assert_eq!(edit.delta(), 1);
//! ```

use crate::{Length, Point};

/// A single text replacement.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct InputEdit {
    pub start_byte: u32,
    pub old_end_byte: u32,
    pub new_end_byte: u32,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

impl InputEdit {
    /// Describe replacing `old_text[start..old_end]` with `new_text`.
    ///
    /// Offsets are clamped to the text and must fall on character boundaries.
    pub fn replace(old_text: &str, start: usize, old_end: usize, new_text: &str) -> Self {
        let old_end = old_end.min(old_text.len());
        let start = start.min(old_end);
        let start_len = Length::of_str(&old_text[..start]);
        let old_end_len = Length::of_str(&old_text[..old_end]);
        let new_end_len = start_len + Length::of_str(new_text);
        InputEdit {
            start_byte: start_len.bytes,
            old_end_byte: old_end_len.bytes,
            new_end_byte: new_end_len.bytes,
            start_point: start_len.extent,
            old_end_point: old_end_len.extent,
            new_end_point: new_end_len.extent,
        }
    }

    /// Describe inserting `text` at `at`.
    pub fn insert(old_text: &str, at: usize, text: &str) -> Self {
        Self::replace(old_text, at, at, text)
    }

    /// Describe deleting `old_text[start..end]`.
    pub fn delete(old_text: &str, start: usize, end: usize) -> Self {
        Self::replace(old_text, start, end, "")
    }

    /// Apply a replacement to `old_text`, returning the new text and the edit
    /// that describes it.
    pub fn apply(old_text: &str, start: usize, old_end: usize, new_text: &str) -> (String, Self) {
        let edit = Self::replace(old_text, start, old_end, new_text);
        let mut result = String::with_capacity(old_text.len() + new_text.len());
        result.push_str(&old_text[..edit.start_byte as usize]);
        result.push_str(new_text);
        result.push_str(&old_text[edit.old_end_byte as usize..]);
        (result, edit)
    }

    /// A zero-length edit at `at` (changes nothing, but still invalidates
    /// nodes whose lexer lookahead touches `at`).
    pub fn noop(old_text: &str, at: usize) -> Self {
        Self::replace(old_text, at, at, "")
    }

    /// Net change in document length.
    #[inline]
    pub fn delta(&self) -> i64 {
        i64::from(self.new_end_byte) - i64::from(self.old_end_byte)
    }

    /// Length of the removed region.
    #[inline]
    pub const fn old_len(&self) -> u32 {
        self.old_end_byte - self.start_byte
    }

    /// Length of the inserted region.
    #[inline]
    pub const fn new_len(&self) -> u32 {
        self.new_end_byte - self.start_byte
    }

    #[inline]
    pub fn start(&self) -> Length {
        Length::new(self.start_byte, self.start_point)
    }

    #[inline]
    pub fn old_end(&self) -> Length {
        Length::new(self.old_end_byte, self.old_end_point)
    }

    #[inline]
    pub fn new_end(&self) -> Length {
        Length::new(self.new_end_byte, self.new_end_point)
    }

    /// Whether a node occupying `[start, end)` whose lexer examined input up
    /// to `end + lookahead_bytes` is affected by this edit.
    ///
    /// Nodes touching either boundary of the edited region count as
    /// affected: text inserted at a boundary is absorbed by one of them.
    #[inline]
    pub fn touches(&self, start: u32, end: u32, lookahead_bytes: u32) -> bool {
        self.start_byte <= end.saturating_add(lookahead_bytes) && start <= self.old_end_byte
    }

    /// Map an absolute position in the old text to the new text.
    ///
    /// Positions before the edit stay, positions after it shift by the
    /// delta, and positions inside the removed region collapse onto the
    /// end of the inserted text.
    pub fn map_position(&self, pos: Length) -> Length {
        if pos.bytes <= self.start_byte {
            pos
        } else if pos.bytes >= self.old_end_byte {
            self.new_end() + (pos - self.old_end())
        } else {
            self.new_end()
        }
    }
}

#[cfg(test)]
mod tests;
