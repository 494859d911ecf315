//! The `edit` command: apply text edits to a file and re-parse it
//! incrementally.

use sam_ir::{InputEdit, Language};
use sam_parse::{ParserOptions, ReuseStats};

use super::{parse_fresh, parser};
use crate::{CliError, EditArg};

/// Result of re-parsing an edited file.
#[derive(Clone, Debug)]
pub struct EditReport {
    /// The text after every edit.
    pub text: String,
    pub sexp: String,
    pub stats: ReuseStats,
    /// The incremental tree differs from a fresh parse of `text`.
    pub diverged: bool,
}

/// Apply `edits` in order (each in offsets of the text left by the ones
/// before it), then re-parse the result reusing the tree of `text`.
pub fn edit_text(
    language: &Language,
    options: &ParserOptions,
    text: &str,
    edits: &[EditArg],
) -> Result<EditReport, CliError> {
    let mut tree = parse_fresh(language, options, text);
    let mut current = text.to_owned();
    for change in edits {
        change.validate(&current)?;
        let (next, edit) = InputEdit::apply(&current, change.start, change.end, &change.text);
        tree = tree.edit(&edit);
        current = next;
    }

    let mut parser = parser(language, options);
    let tree = match parser.parse(&current, Some(&tree)) {
        Some(tree) => tree,
        None => sam_parse::parse(language, &current, Some(&tree), &[]),
    };
    let stats = parser.reuse_stats().clone();
    let fresh = parse_fresh(language, options, &current);
    let diverged = !tree.structurally_eq(&fresh);
    if diverged {
        tracing::debug!("incremental tree differs from a fresh parse");
    }
    Ok(EditReport {
        sexp: tree.to_sexp(),
        text: current,
        stats,
        diverged,
    })
}
