//! Sam IR - data model shared by the lexer, parser and tools.
//!
//! This crate contains:
//! - Lengths, points and ranges (sizes are relative, positions absolute)
//! - Symbol, state, field and production identifiers
//! - The serialized grammar table and the validated [`Language`] handle
//! - Text edits for incremental re-parsing
//! - Lexer tokens
//! - Syntax trees: shared [`Subtree`]s, the [`Tree`] owner and the [`Node`] view
//!
//! # Design Philosophy
//!
//! - **Relative Sizes**: subtrees never store absolute positions, so
//!   untouched subtrees are shared across edits.
//! - **Immutable Sharing**: subtrees sit behind `Arc` and are never mutated
//!   once another tree can see them.
//! - **Validate Once**: every index in a grammar table is checked at load
//!   time; the parser and lexer trust the table afterwards.

pub mod incremental;
pub mod language;
mod length;
mod symbol;
pub mod table;
mod token;
pub mod tree;

pub use incremental::InputEdit;
pub use language::{GrammarLoadError, Language, LexMode, LexModeId, ScannerFactory, UNION_LEX_MODE};
pub use length::{Length, Point, Range};
pub use symbol::{FieldId, ProductionId, StateId, SymbolId, SymbolInfo};
pub use table::{GrammarTable, ParseAction};
pub use token::Token;
pub use tree::{Node, Subtree, Tree};

// Subtree handles are a single pointer.
const _: () = assert!(std::mem::size_of::<Subtree>() == std::mem::size_of::<usize>());
