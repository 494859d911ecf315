//! The `check` command: report syntax errors in a file.

use sam_ir::Language;
use sam_parse::ParserOptions;

use super::parse_fresh;

/// Rendered diagnostics for one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckReport {
    pub rendered: String,
    pub error_count: usize,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

/// Parse `text` and render every ERROR and MISSING node as a diagnostic
/// located in `name`.
pub fn check_text(language: &Language, options: &ParserOptions, name: &str, text: &str) -> CheckReport {
    let tree = parse_fresh(language, options, text);
    let diagnostics = sam_diagnostic::collect(&tree, text);
    CheckReport {
        rendered: sam_diagnostic::render(name, text, &diagnostics),
        error_count: diagnostics.len(),
    }
}
