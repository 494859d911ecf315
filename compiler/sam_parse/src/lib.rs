//! Incremental GLR parser for sam grammars.
//!
//! The parser is driven entirely by a loaded [`Language`]: its action table
//! picks shifts and reductions, and its lex modes tell the on-demand lexer
//! which tokens are valid in each state. Cells with several actions fork
//! the parse stack; the forks are condensed once they agree again.
//!
//! Parsing never fails. Input that does not fit the grammar produces ERROR
//! nodes and zero-width MISSING leaves, and the tree always spans the whole
//! text.
//!
//! # Incremental Parsing
//!
//! Given an old tree that has been [edited](Tree::edit) to match the new
//! text, the parser reuses every old subtree it would have rebuilt
//! identically. The result is structurally equal to a fresh parse of the
//! new text.
//!
//! ```text
//! let tree = sam_parse::parse(&language, "let x = 1;", None, &[]);
//! let (text, edit) = InputEdit::apply("let x = 1;", 8, 9, "42");
//! let tree = sam_parse::parse(&language, &text, Some(&tree), &[edit]);
//! ```

mod engine;
mod options;
mod reuse;
mod stack;

pub use options::ParserOptions;
pub use reuse::ReuseStats;

use sam_ir::{InputEdit, Language, Tree};
use sam_lexer_core::SourceBuffer;

use crate::engine::Engine;
use crate::reuse::ReuseCursor;

/// Reusable parser configured with a language and limits.
#[derive(Debug, Default)]
pub struct Parser {
    language: Option<Language>,
    options: ParserOptions,
    stats: ReuseStats,
}

impl Parser {
    pub fn new() -> Self {
        Parser::default()
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = Some(language);
    }

    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    pub fn set_options(&mut self, options: ParserOptions) {
        self.options = options;
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Reuse statistics of the last parse.
    pub fn reuse_stats(&self) -> &ReuseStats {
        &self.stats
    }

    /// Parse `text`, reusing what is still valid in `old_tree`.
    ///
    /// `old_tree` must already carry the edits that turned its text into
    /// `text`. Returns `None` only when no language is set.
    pub fn parse(&mut self, text: &str, old_tree: Option<&Tree>) -> Option<Tree> {
        let language = self.language.as_ref()?;
        let (tree, stats) = parse_with(language, &self.options, text, old_tree);
        self.stats = stats;
        Some(tree)
    }
}

/// Parse `text` with default limits, after applying `edits` in order to
/// `old_tree`.
pub fn parse(language: &Language, text: &str, old_tree: Option<&Tree>, edits: &[InputEdit]) -> Tree {
    let edited = old_tree.map(|tree| edits.iter().fold(tree.clone(), |tree, edit| tree.edit(edit)));
    parse_with(language, &ParserOptions::default(), text, edited.as_ref()).0
}

#[tracing::instrument(level = "debug", skip_all, fields(bytes = text.len(), incremental = old_tree.is_some()))]
fn parse_with(
    language: &Language,
    options: &ParserOptions,
    text: &str,
    old_tree: Option<&Tree>,
) -> (Tree, ReuseStats) {
    let mut stats = ReuseStats {
        total_bytes: u32::try_from(text.len()).unwrap_or(u32::MAX),
        ..ReuseStats::default()
    };
    let reuse = match old_tree {
        Some(old) if !old.language().ptr_eq(language) => {
            tracing::debug!(old = old.language().name(), "old tree uses another grammar, parsing from scratch");
            stats.fallback = true;
            None
        }
        Some(old) if old.source_len() != stats.total_bytes => {
            tracing::debug!(
                old_len = old.source_len(),
                new_len = stats.total_bytes,
                "edited tree does not match the text, parsing from scratch"
            );
            stats.fallback = true;
            None
        }
        Some(old) => Some(ReuseCursor::new(old)),
        None => None,
    };

    let source = SourceBuffer::new(text);
    let root = Engine::new(language, options, &source, reuse, &mut stats).run();
    let tree = Tree::new(root, language.clone());
    tracing::debug!(
        reused_nodes = stats.reused_nodes,
        reuse_rate = stats.reuse_rate(),
        has_error = tree.has_error(),
        "parsed"
    );
    (tree, stats)
}

#[cfg(test)]
mod tests;
