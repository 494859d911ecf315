use std::io;
use std::path::PathBuf;

use sam_generate::GenerateError;
use sam_grammar::GrammarError;
use thiserror::Error;

/// Everything that makes a `samc` command fail.
///
/// Syntax errors in the parsed file are not among them: those are reported
/// as diagnostics.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Language(&'static GrammarError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("missing file path")]
    MissingFile,

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for {option}")]
    InvalidValue { option: &'static str, value: String },

    #[error("invalid edit '{0}', expected <start>:<end>:<text>")]
    InvalidEdit(String),

    #[error("edit {start}..{end} does not fit a text of {len} bytes")]
    EditOutOfRange { start: usize, end: usize, len: usize },
}

impl CliError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CliError::Read {
            path: path.into(),
            source,
        }
    }
}

impl From<&'static GrammarError> for CliError {
    fn from(error: &'static GrammarError) -> Self {
        CliError::Language(error)
    }
}
