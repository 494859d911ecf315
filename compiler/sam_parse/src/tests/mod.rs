//! Parser tests.
//!
//! - `parser`: tree shapes for valid input, forks and dynamic precedence
//! - `recovery`: ERROR and MISSING nodes for invalid input
//! - `incremental`: reuse of edited trees, checked against fresh parses

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod incremental;
mod parser;
mod recovery;

use sam_generate::rules::{choice, field, pattern, prec_left, repeat, seq, string, sym};
use sam_generate::{generate, Grammar};
use sam_ir::{Language, Tree};

pub(crate) fn load(grammar: &Grammar) -> Language {
    Language::from_table(generate(grammar).unwrap().table).unwrap()
}

/// `1 + 2 + 3`, left associative, with hidden operands.
pub(crate) fn sums() -> Language {
    load(
        &Grammar::new("sums")
            .rule("source", sym("_expression"))
            .rule("_expression", choice([sym("sum"), sym("number")]))
            .rule(
                "sum",
                prec_left(
                    1,
                    seq([
                        field("left", sym("_expression")),
                        string("+"),
                        field("right", sym("_expression")),
                    ]),
                ),
            )
            .rule("number", pattern(r"\d+"))
            .extra(pattern(r"\s+")),
    )
}

/// Semicolon-terminated statements of sums and names.
pub(crate) fn statements() -> Language {
    load(
        &Grammar::new("statements")
            .rule("source", repeat(sym("statement")))
            .rule(
                "statement",
                choice([
                    seq([sym("_expression"), string(";")]),
                    seq([string("("), sym("identifier"), string(")")]),
                ]),
            )
            .rule("_expression", choice([sym("sum"), sym("number"), sym("identifier")]))
            .rule(
                "sum",
                prec_left(1, seq([sym("_expression"), string("+"), sym("_expression")])),
            )
            .rule("number", pattern(r"\d+"))
            .rule("identifier", pattern("[a-z]+"))
            .extra(pattern(r"\s+")),
    )
}

pub(crate) fn parse(language: &Language, text: &str) -> Tree {
    crate::parse(language, text, None, &[])
}

/// Leaf byte ranges with their kinds, extras left out.
pub(crate) fn leaves(tree: &Tree) -> Vec<(String, std::ops::Range<usize>)> {
    tree.leaves()
        .filter(|leaf| !leaf.subtree.is_extra())
        .map(|leaf| (tree.language().symbol_name(leaf.symbol()).to_string(), leaf.byte_range()))
        .collect()
}

/// The leaves tile the whole text, in order.
pub(crate) fn assert_covers(tree: &Tree, text: &str) {
    let mut end = 0;
    for leaf in tree.leaves() {
        let range = leaf.byte_range();
        assert_eq!(range.start, end, "gap or overlap before {range:?} in {text:?}");
        end = range.end;
    }
    assert_eq!(end, text.len(), "leaves stop short in {text:?}");
    assert_eq!(tree.source_len() as usize, text.len());
}
