//! Tree shapes for valid input.

use pretty_assertions::assert_eq;
use sam_generate::rules::{choice, pattern, prec_dynamic, seq, string, sym};
use sam_generate::Grammar;

use super::{assert_covers, leaves, load, parse, statements, sums};
use crate::{Parser, ParserOptions};

fn ranges(tree: &sam_ir::Tree, kind: &str) -> Vec<std::ops::Range<usize>> {
    leaves(tree)
        .into_iter()
        .filter(|(k, _)| k == kind)
        .map(|(_, range)| range)
        .collect()
}

#[test]
fn sums_associate_to_the_left() {
    let language = sums();
    let tree = parse(&language, "1+2+3");
    assert!(!tree.has_error());
    assert_eq!(
        tree.to_sexp(),
        "(source (sum left: (sum left: (number) right: (number)) right: (number)))"
    );
    assert_eq!(ranges(&tree, "number"), [0..1, 2..3, 4..5]);
    assert_eq!(ranges(&tree, "+"), [1..2, 3..4]);
}

#[test]
fn extras_stay_between_tokens() {
    let language = sums();
    let text = "  1 +\n 2  ";
    let tree = parse(&language, text);
    assert!(!tree.has_error());
    assert_covers(&tree, text);

    let sum = tree.root_node().named_child(0).unwrap();
    assert_eq!(sum.kind(), "sum");
    assert_eq!(sum.byte_range(), 2..8);
    assert_eq!(sum.end_position(), sam_ir::Point::new(1, 2));
    assert_eq!(tree.root_node().byte_range(), 0..text.len());
}

#[test]
fn empty_repetition_parses() {
    let language = statements();
    let tree = parse(&language, "");
    assert!(!tree.has_error());
    assert_eq!(tree.to_sexp(), "(source)");

    let tree = parse(&language, "   ");
    assert!(!tree.has_error());
    assert_covers(&tree, "   ");
}

#[test]
fn statements_repeat() {
    let language = statements();
    let text = "a; 1 + b;\n(c)";
    let tree = parse(&language, text);
    assert!(!tree.has_error());
    assert_covers(&tree, text);
    assert_eq!(
        tree.to_sexp(),
        "(source (statement (identifier)) (statement (sum (number) (identifier))) (statement (identifier)))"
    );
}

#[test]
fn ambiguity_forks_and_still_parses() {
    let language = load(
        &Grammar::new("ambiguous")
            .rule("source", sym("expr"))
            .rule(
                "expr",
                choice([seq([sym("expr"), string("+"), sym("expr")]), sym("number")]),
            )
            .rule("number", pattern(r"\d+")),
    );
    let tree = parse(&language, "1+2+3+4");
    assert!(!tree.has_error());
    assert_covers(&tree, "1+2+3+4");
    assert_eq!(ranges(&tree, "number"), [0..1, 2..3, 4..5, 6..7]);
}

#[test]
fn dynamic_precedence_picks_between_forks() {
    let grammar = |low: i16, high: i16| {
        Grammar::new("dynamic")
            .rule("source", choice([sym("low"), sym("high")]))
            .rule("low", prec_dynamic(low, sym("word")))
            .rule("high", prec_dynamic(high, sym("word")))
            .rule("word", pattern("[a-z]+"))
    };
    let tree = parse(&load(&grammar(0, 2)), "abc");
    assert!(!tree.has_error());
    assert_eq!(tree.to_sexp(), "(source (high (word)))");

    let tree = parse(&load(&grammar(3, -1)), "abc");
    assert_eq!(tree.to_sexp(), "(source (low (word)))");
}

#[test]
fn parser_without_language_returns_none() {
    let mut parser = Parser::new();
    assert!(parser.parse("1", None).is_none());
    assert!(parser.language().is_none());
}

#[test]
fn parser_keeps_language_and_options() {
    let mut parser = Parser::new();
    parser.set_language(sums());
    parser.set_options(ParserOptions {
        max_versions: 2,
        ..ParserOptions::default()
    });
    assert_eq!(parser.options().max_versions, 2);
    let tree = parser.parse("4 + 5", None).unwrap();
    assert!(!tree.has_error());
    assert_eq!(parser.reuse_stats().reused_nodes, 0);
    assert_eq!(parser.reuse_stats().total_bytes, 5);
}
