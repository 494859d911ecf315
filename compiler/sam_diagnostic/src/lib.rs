//! Diagnostics for syntax trees.
//!
//! Recovery leaves its marks in the tree instead of failing the parse:
//! ERROR nodes around input that could not be parsed, MISSING leaves where
//! a token was assumed, and ERROR leaves where the lexer matched nothing.
//! [`collect`] turns those marks into [`Diagnostic`]s and [`render`] prints
//! them as `file:line:col` text.

mod collect;
mod diagnostic;
mod error_code;
mod render;

pub use collect::collect;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use render::{line_col, render};
