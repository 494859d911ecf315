//! The `parse` command: print the syntax tree of a file.

use sam_ir::Language;
use sam_parse::ParserOptions;

use super::parse_fresh;

/// S-expression of the tree for `text`.
pub fn parse_text(language: &Language, options: &ParserOptions, text: &str) -> String {
    let tree = parse_fresh(language, options, text);
    tracing::debug!(bytes = text.len(), has_error = tree.has_error(), "parsed");
    tree.to_sexp()
}
