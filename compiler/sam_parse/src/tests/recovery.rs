//! ERROR and MISSING nodes for input that does not fit the grammar.

use pretty_assertions::assert_eq;

use super::{assert_covers, leaves, parse, statements, sums};
use crate::{Parser, ParserOptions};

fn without_insertions(language: sam_ir::Language, text: &str) -> sam_ir::Tree {
    let mut parser = Parser::new();
    parser.set_language(language);
    parser.set_options(ParserOptions {
        max_missing_insertions: 0,
        ..ParserOptions::default()
    });
    parser.parse(text, None).unwrap()
}

fn missing(tree: &sam_ir::Tree) -> Vec<(String, usize)> {
    tree.leaves()
        .filter(|leaf| leaf.subtree.is_missing())
        .map(|leaf| {
            let name = tree.language().symbol_name(leaf.symbol()).to_string();
            (name, leaf.byte_range().start)
        })
        .collect()
}

#[test]
fn missing_operand_at_end_of_input() {
    let language = sums();
    let tree = parse(&language, "1+");
    assert!(tree.has_error());
    assert_eq!(tree.to_sexp(), "(source (sum left: (number) right: (MISSING number)))");
    assert_eq!(missing(&tree), [("number".to_string(), 2)]);
    assert_covers(&tree, "1+");
}

#[test]
fn missing_operand_between_operators() {
    let language = sums();
    let tree = parse(&language, "1 + + 2");
    assert_eq!(
        tree.to_sexp(),
        "(source (sum left: (sum left: (number) right: (MISSING number)) right: (number)))"
    );
    assert_eq!(missing(&tree), [("number".to_string(), 4)]);
}

#[test]
fn missing_operator_between_operands() {
    let language = sums();
    let tree = parse(&language, "1 2");
    assert!(tree.has_error());
    assert_eq!(missing(&tree), [("+".to_string(), 2)]);
    assert_eq!(tree.to_sexp(), "(source (sum left: (number) right: (number)))");
}

#[test]
fn unknown_characters_become_error_leaves() {
    let language = sums();
    let text = "1 @ + 2";
    let tree = parse(&language, text);
    assert!(tree.has_error());
    assert_covers(&tree, text);
    assert_eq!(tree.to_sexp(), "(source (sum left: (number) (ERROR) right: (number)))");
    let errors: Vec<_> = tree
        .leaves()
        .filter(|leaf| leaf.symbol().is_error())
        .map(|leaf| leaf.byte_range())
        .collect();
    assert_eq!(errors, [2..3]);
    assert_eq!(leaves(&tree).len(), 3);
}

#[test]
fn unexpected_token_is_skipped() {
    let tree = without_insertions(statements(), "a; ) b;");
    assert!(tree.has_error());
    assert_covers(&tree, "a; ) b;");
    assert_eq!(
        tree.to_sexp(),
        "(source (statement (identifier)) (ERROR) (statement (identifier)))"
    );
}

#[test]
fn consecutive_skips_share_one_error_node() {
    let tree = without_insertions(statements(), "a; ) ) b;");
    assert_eq!(
        tree.to_sexp(),
        "(source (statement (identifier)) (ERROR) (statement (identifier)))"
    );
    let error = tree
        .root_node()
        .children()
        .find(|node| node.is_error())
        .unwrap();
    assert_eq!(error.byte_range(), 3..6);
}

#[test]
fn skipping_beats_a_chain_of_missing_tokens() {
    // `( identifier` would let each `)` shift, at twice the cost of a skip.
    let text = "a; ) ) b;";
    let tree = parse(&statements(), text);
    assert_covers(&tree, text);
    assert!(missing(&tree).is_empty(), "{}", tree.to_sexp());
    assert_eq!(
        tree.to_sexp(),
        "(source (statement (identifier)) (ERROR) (statement (identifier)))"
    );
}

#[test]
fn stack_entries_fold_into_an_error_node() {
    let tree = without_insertions(statements(), "a bcd;");
    assert_covers(&tree, "a bcd;");
    assert_eq!(tree.to_sexp(), "(source (ERROR (identifier)) (statement (identifier)))");
}

#[test]
fn nothing_left_to_try_forces_acceptance() {
    let tree = without_insertions(sums(), "");
    assert!(tree.has_error());
    assert_eq!(tree.to_sexp(), "(source (ERROR))");
    assert_eq!(tree.source_len(), 0);

    let tree = without_insertions(sums(), "1 +");
    assert!(tree.has_error());
    assert_covers(&tree, "1 +");
}

#[test]
fn recovery_never_loses_text() {
    let language = statements();
    for text in ["((", ";;;", "a + ; ( b", "1 + + + ;", ") ( ) (", "a;@@ b; #"] {
        let tree = parse(&language, text);
        assert!(tree.has_error(), "{text:?} should not parse cleanly");
        assert_covers(&tree, text);
    }
}
