use pretty_assertions::assert_eq;
use sam_ir::{InputEdit, Tree};
use sam_parse::{Parser, ReuseStats};

use crate::common::{parse, sam, SAMPLE};

/// Replace `find` in `old_text` and re-parse the edited tree.
fn reparse(old_text: &str, find: &str, insert: &str) -> (String, Tree, ReuseStats) {
    let start = old_text.find(find).unwrap();
    edit(old_text, start, start + find.len(), insert)
}

fn edit(old_text: &str, start: usize, end: usize, insert: &str) -> (String, Tree, ReuseStats) {
    let old = parse(old_text);
    let (text, input_edit) = InputEdit::apply(old_text, start, end, insert);
    let mut parser = Parser::new();
    parser.set_language(sam());
    let tree = parser.parse(&text, Some(&old.edit(&input_edit))).unwrap();
    (text, tree, parser.reuse_stats().clone())
}

fn assert_same_as_fresh(text: &str, tree: &Tree) {
    let fresh = parse(text);
    assert_eq!(tree.to_sexp(), fresh.to_sexp(), "for {text:?}");
    assert!(tree.structurally_eq(&fresh), "for {text:?}");
}

#[test]
fn changing_a_number_reuses_most_of_the_file() {
    let (text, tree, stats) = reparse(SAMPLE, "0x1F", "42");
    assert_same_as_fresh(&text, &tree);
    assert!(!tree.has_error());
    assert!(stats.reuse_rate() > 50.0, "reuse rate {}", stats.reuse_rate());
}

#[test]
fn editing_inside_a_string() {
    let (text, tree, _) = reparse(SAMPLE, "hi", "hello there");
    assert_same_as_fresh(&text, &tree);
    assert!(!tree.has_error());
}

#[test]
fn renaming_an_identifier() {
    let (text, tree, _) = reparse(SAMPLE, "fact(n - 1)", "factorial(n - 1)");
    assert_same_as_fresh(&text, &tree);
}

#[test]
fn inserting_a_statement() {
    let at = SAMPLE.find("grid[1];").unwrap();
    let (text, tree, stats) = edit(SAMPLE, at, at, "let z = [];\n");
    assert_same_as_fresh(&text, &tree);
    assert!(!tree.has_error());
    assert!(stats.reused_nodes > 0);
}

#[test]
fn breaking_and_repairing_a_block() {
    let (broken, tree, _) = reparse(SAMPLE, "{ io.print(item); }", "{ io.print(item); ");
    assert!(tree.has_error());
    assert_same_as_fresh(&broken, &tree);

    let old = parse(&broken);
    let at = broken.find("{ io.print(item); ").unwrap() + "{ io.print(item); ".len();
    let (repaired, input_edit) = InputEdit::apply(&broken, at, at, "}");
    let tree = sam_parse::parse(&sam(), &repaired, Some(&old), &[input_edit]);
    assert_eq!(repaired, SAMPLE);
    assert!(!tree.has_error());
    assert_same_as_fresh(SAMPLE, &tree);
}

#[test]
fn turning_code_into_a_comment() {
    let at = SAMPLE.find("total").unwrap();
    let (text, tree, _) = edit(SAMPLE, at, at, "// ");
    assert_same_as_fresh(&text, &tree);
    assert!(!tree.has_error());
}

mod properties {
    use proptest::prelude::*;

    use super::*;

    fn snippet() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec![
            "", "x", "1", ";", " ", "\n", "(", ")", "{", "}", "\"", "// ", "let ", "+ 2", "[0]",
            "=>",
        ])
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn incremental_matches_fresh(
            a in 0usize..SAMPLE.len(),
            len in 0usize..6,
            insert in snippet(),
        ) {
            let end = (a + len).min(SAMPLE.len());
            let (text, tree, stats) = edit(SAMPLE, a, end, insert);
            let fresh = parse(&text);
            prop_assert!(!stats.fallback);
            prop_assert_eq!(tree.to_sexp(), fresh.to_sexp());
            prop_assert!(tree.structurally_eq(&fresh));
        }

        #[test]
        fn two_edits_in_a_row(
            a in 0usize..SAMPLE.len(),
            b in 0usize..SAMPLE.len(),
            first in snippet(),
            second in snippet(),
        ) {
            let (once, tree, _) = edit(SAMPLE, a, a, first);
            let b = b.min(once.len());
            let (twice, input_edit) = InputEdit::apply(&once, b, b, second);
            let tree = sam_parse::parse(&sam(), &twice, Some(&tree), &[input_edit]);
            let fresh = parse(&twice);
            prop_assert!(tree.structurally_eq(&fresh));
        }
    }
}
