use std::fmt;

use sam_ir::{GrammarLoadError, Range};

use crate::ErrorCode;

/// One problem found in a tree or while loading a grammar.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    /// Source range the diagnostic points at; `None` when it concerns no
    /// source text.
    pub range: Option<Range>,
    /// Additional context, printed after the snippet.
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            message: message.into(),
            range: None,
            notes: Vec::new(),
        }
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Wrap a grammar table that failed to load.
    pub fn grammar_load(error: &GrammarLoadError) -> Self {
        Diagnostic::error(ErrorCode::E9001, format!("cannot load grammar: {error}"))
    }

    pub fn start_byte(&self) -> Option<u32> {
        self.range.map(|r| r.start_byte)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", self.code, self.message)?;
        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }
        Ok(())
    }
}
