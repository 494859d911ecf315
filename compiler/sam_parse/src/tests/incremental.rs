//! Re-parsing edited trees.
//!
//! Every test compares against a parse of the new text from scratch: reuse
//! may only ever change how much work is done, never the result.

use pretty_assertions::assert_eq;
use sam_ir::{InputEdit, Language, Tree};

use super::{assert_covers, parse, statements, sums};
use crate::{Parser, ReuseStats};

/// Apply one edit and re-parse incrementally, returning the new text, the
/// new tree and the reuse statistics.
fn reparse(language: &Language, old_text: &str, start: usize, end: usize, insert: &str) -> (String, Tree, ReuseStats) {
    let old = parse(language, old_text);
    let (text, edit) = InputEdit::apply(old_text, start, end, insert);
    let mut parser = Parser::new();
    parser.set_language(language.clone());
    let tree = parser.parse(&text, Some(&old.edit(&edit))).unwrap();
    (text, tree, parser.reuse_stats().clone())
}

fn assert_same_as_fresh(language: &Language, text: &str, tree: &Tree) {
    let fresh = parse(language, text);
    assert_eq!(tree.to_sexp(), fresh.to_sexp(), "shape differs for {text:?}");
    assert!(tree.structurally_eq(&fresh), "subtrees differ for {text:?}");
    assert_covers(tree, text);
}

#[test]
fn editing_a_number_reuses_the_rest() {
    let language = sums();
    let (text, tree, stats) = reparse(&language, "1 + 2 + 3", 4, 5, "20");
    assert_eq!(text, "1 + 20 + 3");
    assert_same_as_fresh(&language, &text, &tree);
    assert!(!stats.fallback);
    assert!(stats.reused_nodes > 0);
}

#[test]
fn untouched_statements_are_reused_whole() {
    let language = statements();
    let old_text: String = (0..40).map(|i| format!("a + {i};\n")).collect();
    let middle = old_text.find("20;").unwrap();
    let (text, tree, stats) = reparse(&language, &old_text, middle, middle + 2, "b");
    assert_same_as_fresh(&language, &text, &tree);
    assert!(stats.reuse_rate() > 50.0, "reuse rate {}", stats.reuse_rate());
    assert!(u64::from(stats.reused_nodes) < 40 * 6, "reused {} nodes", stats.reused_nodes);
}

#[test]
fn edits_that_break_and_repair_the_syntax() {
    let language = statements();
    let text = "a; b + 1; (c)";
    let (broken, tree, _) = reparse(&language, text, 3, 4, ")");
    assert!(tree.has_error());
    assert_same_as_fresh(&language, &broken, &tree);

    let old = parse(&language, &broken);
    let (repaired, edit) = InputEdit::apply(&broken, 3, 4, "b");
    let tree = crate::parse(&language, &repaired, Some(&old), &[edit]);
    assert!(!tree.has_error());
    assert_eq!(repaired, text);
    assert_same_as_fresh(&language, text, &tree);
}

#[test]
fn appending_at_the_end_keeps_the_old_tree() {
    let language = statements();
    let (text, tree, stats) = reparse(&language, "a;\nb;", 5, 5, " c;");
    assert_eq!(text, "a;\nb; c;");
    assert_same_as_fresh(&language, &text, &tree);
    assert!(!stats.fallback);
    assert!(stats.reused_nodes > 0);

    let (text, tree, stats) = reparse(&language, "", 0, 0, "+");
    assert_same_as_fresh(&language, &text, &tree);
    assert!(!stats.fallback);
}

#[test]
fn several_edits_apply_in_order() {
    let language = sums();
    let old = parse(&language, "1 + 2");
    let (once, first) = InputEdit::apply("1 + 2", 0, 1, "10");
    let (twice, second) = InputEdit::apply(&once, 6, 6, " + 3");
    let tree = crate::parse(&language, &twice, Some(&old), &[first, second]);
    assert_eq!(twice, "10 + 2 + 3");
    assert_same_as_fresh(&language, &twice, &tree);
}

#[test]
fn noop_edit_gives_the_same_tree() {
    let language = statements();
    let text = "a; b + 1;\n(c)";
    let old = parse(&language, text);
    let tree = crate::parse(&language, text, Some(&old), &[InputEdit::noop(text, 4)]);
    assert!(tree.structurally_eq(&old));
    assert_eq!(tree.to_sexp(), old.to_sexp());
}

#[test]
fn unedited_tree_is_reused_from_the_root() {
    let language = statements();
    let text = "a; b + 1;";
    let old = parse(&language, text);
    let mut parser = Parser::new();
    parser.set_language(language);
    let tree = parser.parse(text, Some(&old)).unwrap();
    assert!(tree.structurally_eq(&old));
    assert_eq!(parser.reuse_stats().reused_bytes, 9);
}

#[test]
fn length_mismatch_falls_back_to_a_full_parse() {
    let language = sums();
    let old = parse(&language, "1 + 2");
    let mut parser = Parser::new();
    parser.set_language(language.clone());
    let tree = parser.parse("1 + 2 + 3", Some(&old)).unwrap();
    assert!(parser.reuse_stats().fallback);
    assert_eq!(parser.reuse_stats().reused_nodes, 0);
    assert_same_as_fresh(&language, "1 + 2 + 3", &tree);
}

#[test]
fn another_language_falls_back_to_a_full_parse() {
    let first = sums();
    let second = sums();
    let old = parse(&first, "1 + 2");
    let mut parser = Parser::new();
    parser.set_language(second.clone());
    let tree = parser.parse("1 + 2", Some(&old)).unwrap();
    assert!(parser.reuse_stats().fallback);
    assert_same_as_fresh(&second, "1 + 2", &tree);
}

mod properties {
    use proptest::prelude::*;

    use super::*;

    fn text() -> impl Strategy<Value = String> {
        "[a-c0-9+;() \n@]{0,30}"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn incremental_matches_fresh(
            old_text in text(),
            a in 0usize..32,
            b in 0usize..32,
            insert in "[a1+;( ]{0,4}",
        ) {
            let language = statements();
            let start = a.min(b).min(old_text.len());
            let end = a.max(b).min(old_text.len());
            let (text, tree, stats) = reparse(&language, &old_text, start, end, &insert);
            let fresh = parse(&language, &text);
            prop_assert!(!stats.fallback);
            prop_assert_eq!(tree.to_sexp(), fresh.to_sexp());
            prop_assert!(tree.structurally_eq(&fresh));
        }

        #[test]
        fn leaves_cover_the_text(text in text()) {
            let language = statements();
            let tree = parse(&language, &text);
            let mut covered = String::new();
            for leaf in tree.leaves() {
                covered.push_str(&text[leaf.byte_range()]);
            }
            prop_assert_eq!(covered, text);
        }

        #[test]
        fn noop_edit_is_idempotent(text in text(), at in 0usize..32) {
            let language = sums();
            let at = at.min(text.len());
            let old = parse(&language, &text);
            let tree = crate::parse(&language, &text, Some(&old), &[InputEdit::noop(&text, at)]);
            prop_assert!(tree.structurally_eq(&old));
        }
    }
}
