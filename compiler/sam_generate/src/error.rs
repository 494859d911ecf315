//! Table generation failures.

use thiserror::Error;

/// Why a grammar could not be compiled into a table.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("grammar `{0}` has no rules")]
    EmptyGrammar(String),

    #[error("rule `{rule}` refers to undefined symbol `{name}`")]
    UndefinedSymbol { name: String, rule: String },

    #[error("rule `{name}` is defined more than once")]
    DuplicateRule { name: String },

    #[error("start rule `{name}` cannot derive any input")]
    UnreachableStart { name: String },

    #[error("start rule `{name}` must not be a token")]
    TokenStart { name: String },

    #[error("precedence `{name}` is used but not declared in `precedences`")]
    UndefinedPrecedence { name: String },

    #[error("word token `{name}` is not a token rule")]
    InvalidWordToken { name: String },

    #[error("extra `{name}` is not a token")]
    InvalidExtra { name: String },

    #[error("external token `{name}` must be a symbol or string that no rule defines")]
    InvalidExternal { name: String },

    #[error("supertype `{name}` is not a rule")]
    InvalidSupertype { name: String },

    #[error("token `{token}` refers to symbol `{name}`; tokens may only contain strings and patterns")]
    SymbolInToken { token: String, name: String },

    #[error("token `{name}` matches the empty string")]
    EmptyToken { name: String },

    #[error("invalid pattern /{pattern}/ at offset {offset}: {message}")]
    InvalidPattern {
        pattern: String,
        offset: usize,
        message: &'static str,
    },

    #[error("grammar needs {count} {what}, more than the table format allows")]
    TooLarge { what: &'static str, count: usize },

    #[error("failed to encode grammar table: {0}")]
    Encode(#[from] bincode::Error),
}
