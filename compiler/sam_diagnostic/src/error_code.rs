use std::fmt;

/// Error codes for syntax diagnostics.
///
/// Format: E#### where the first digit is the phase:
/// - E0xxx: lexer errors
/// - E1xxx: parser errors
/// - E9xxx: internal errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Unrecognized character
    E0001,
    /// Unexpected input (ERROR node)
    E1001,
    /// Missing token (MISSING leaf)
    E1002,
    /// Grammar table failed to load
    E9001,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E9001 => "E9001",
        }
    }

    pub fn is_lexer_error(&self) -> bool {
        self.as_str().starts_with("E0")
    }

    pub fn is_parser_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
