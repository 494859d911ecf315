//! The sam language: a scripting language built around function and
//! language composition.
//!
//! [`grammar`] defines the syntax with the `sam_generate` DSL and
//! [`language`] hands out the loaded tables, compiled once per process.
//!
//! ```text
//! let tree = sam_parse::parse(&sam_grammar::language()?, "let x = 1;", None, &[]);
//! ```

mod grammar;

use std::sync::OnceLock;

use sam_generate::GenerateError;
use sam_ir::{GrammarLoadError, Language};
use thiserror::Error;

pub use grammar::{grammar, OPERATOR_PRECEDENCE, RESERVED_WORDS};

/// The sam grammar could not be turned into a language.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("cannot generate the sam tables: {0}")]
    Generate(#[from] GenerateError),
    #[error("cannot load the sam tables: {0}")]
    Load(#[from] GrammarLoadError),
}

static LANGUAGE: OnceLock<Result<Language, GrammarError>> = OnceLock::new();

/// The sam language handle. Cloning is cheap; every clone shares the same
/// tables.
pub fn language() -> Result<Language, &'static GrammarError> {
    LANGUAGE.get_or_init(build).as_ref().cloned()
}

/// Serialized sam tables, as accepted by [`Language::load`].
pub fn table_bytes() -> Result<Vec<u8>, GrammarError> {
    Ok(sam_generate::generate(&grammar())?.to_bytes()?)
}

#[tracing::instrument(level = "debug")]
fn build() -> Result<Language, GrammarError> {
    let generated = sam_generate::generate(&grammar())?;
    if !generated.conflicts.is_empty() {
        tracing::debug!(count = generated.conflicts.len(), "sam tables keep GLR conflicts");
    }
    let language = Language::load(&generated.to_bytes()?)?;
    tracing::debug!(
        symbols = language.symbol_count(),
        states = language.state_count(),
        "loaded sam tables"
    );
    Ok(language)
}
