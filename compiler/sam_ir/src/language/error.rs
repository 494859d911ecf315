//! Grammar table load failures.

use thiserror::Error;

/// Why a serialized grammar table was rejected.
///
/// This is the only hard failure in the parsing pipeline: a handle that
/// failed to load must never be used for parsing, so [`Language::load`]
/// returns no partial handle.
///
/// [`Language::load`]: crate::Language::load
#[derive(Debug, Error)]
pub enum GrammarLoadError {
    #[error("grammar table is truncated ({len} bytes, header needs {needed})")]
    Truncated { len: usize, needed: usize },

    #[error("not a sam grammar table (bad magic bytes)")]
    BadMagic,

    #[error("grammar table version {found} is not supported (supported: {min}..={max})")]
    UnsupportedVersion { found: u16, min: u16, max: u16 },

    #[error("grammar table checksum mismatch (expected {expected:#018x}, found {found:#018x})")]
    ChecksumMismatch { expected: u64, found: u64 },

    #[error("grammar table payload could not be decoded: {0}")]
    Decode(#[from] bincode::Error),

    #[error("grammar table is inconsistent: {0}")]
    Inconsistent(String),

    #[error("grammar table declares symbol `{name}` more than once")]
    DuplicateSymbol { name: String },

    #[error("grammar `{language}` declares {count} external tokens but no external scanner was supplied")]
    MissingExternalScanner { language: String, count: usize },
}
