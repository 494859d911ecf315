//! Low-level source access for the sam lexer.
//!
//! Provides a sentinel-terminated [`SourceBuffer`], a copyable character
//! [`Cursor`] that tracks byte offset, row and column while it advances,
//! and the [`ExternalScanner`] contract for hand-written token recognizers.
//! The table-driven lexer (`sam_lexer`) and external scanners both read
//! input exclusively through the cursor.
//!
//! This crate has no `sam_*` dependencies.

mod cursor;
mod scanner;
mod source_buffer;

pub use cursor::{Cursor, TextPosition};
pub use scanner::{ExternalScanner, ScanContext, ScannedToken};
pub use source_buffer::SourceBuffer;
