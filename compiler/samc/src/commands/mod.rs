//! Command handlers for the `samc` CLI.
//!
//! Each handler returns its report instead of printing it; `main` decides
//! what goes to stdout and the exit code.

mod check;
mod edit;
mod generate;
mod parse;

use std::path::Path;

use sam_ir::{Language, Tree};
use sam_parse::{Parser, ParserOptions};

use crate::CliError;

pub use check::{check_text, CheckReport};
pub use edit::{edit_text, EditReport};
pub use generate::{generate_tables, GenerateReport};
pub use parse::parse_text;

/// Read a source file, naming the path in the error.
pub fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::read(path, e))
}

/// The sam language, compiled on first use.
pub fn sam_language() -> Result<Language, CliError> {
    Ok(sam_grammar::language()?)
}

fn parser(language: &Language, options: &ParserOptions) -> Parser {
    let mut parser = Parser::new();
    parser.set_language(language.clone());
    parser.set_options(options.clone());
    parser
}

fn parse_fresh(language: &Language, options: &ParserOptions, text: &str) -> Tree {
    match parser(language, options).parse(text, None) {
        Some(tree) => tree,
        None => sam_parse::parse(language, text, None, &[]),
    }
}

#[cfg(test)]
mod tests;
