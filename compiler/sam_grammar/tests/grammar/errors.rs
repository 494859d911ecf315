use pretty_assertions::assert_eq;
use sam_diagnostic::{collect, Diagnostic, ErrorCode};

use crate::common::{assert_covers, parse, SAMPLE};

fn diagnose(text: &str) -> Vec<Diagnostic> {
    let tree = parse(text);
    assert!(tree.has_error(), "{text:?} parsed cleanly");
    assert_covers(&tree, text);
    collect(&tree, text)
}

fn codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
    diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn missing_semicolon() {
    let diagnostics = diagnose("let x = 1");
    assert_eq!(codes(&diagnostics), [ErrorCode::E1002]);
    assert_eq!(diagnostics[0].message, "missing semicolon");
    assert_eq!(diagnostics[0].start_byte(), Some(9));
}

#[test]
fn missing_name() {
    let diagnostics = diagnose("let = 1;");
    assert_eq!(codes(&diagnostics), [ErrorCode::E1002]);
    assert_eq!(diagnostics[0].message, "missing identifier");
    assert_eq!(diagnostics[0].start_byte(), Some(4));
}

#[test]
fn unterminated_string() {
    let diagnostics = diagnose("let s = \"abc");
    assert_eq!(codes(&diagnostics), [ErrorCode::E1002, ErrorCode::E1002]);
    assert_eq!(diagnostics[0].message, "missing `\"`");
}

#[test]
fn unrecognized_character() {
    let diagnostics = diagnose("x = 1 $ 2;");
    assert_eq!(diagnostics[0].code, ErrorCode::E0001);
    assert_eq!(diagnostics[0].message, "unrecognized character `$`");
    assert_eq!(diagnostics[0].start_byte(), Some(6));
}

#[test]
fn garbage_between_statements_is_skipped() {
    let text = "a;\nelse else\nb;";
    let tree = parse(text);
    let diagnostics = collect(&tree, text);
    assert!(diagnostics.iter().any(|d| d.code == ErrorCode::E1001));
    let statements: Vec<&str> = tree
        .root_node()
        .named_children()
        .filter(|n| n.kind() == "expression_statement")
        .filter_map(|n| n.utf8_text(text))
        .collect();
    assert_eq!(statements, ["a;", "b;"]);
}

#[test]
fn rendered_report_points_at_the_problem() {
    let text = "let a = 1;\nlet b = 2";
    let diagnostics = diagnose(text);
    let report = sam_diagnostic::render("main.sam", text, &diagnostics);
    assert!(report.starts_with("main.sam:2:10: error[E1002]: missing semicolon\n"), "{report}");
}

#[test]
fn every_truncation_of_the_sample_recovers() {
    for end in (0..SAMPLE.len()).step_by(7) {
        let text = &SAMPLE[..end];
        let tree = parse(text);
        assert_covers(&tree, text);
        if tree.has_error() {
            assert!(!collect(&tree, text).is_empty(), "no diagnostics for {text:?}");
        }
    }
}

mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn any_input_is_fully_covered(text in r#"[a-z0-9 \n;=+*(){}\[\],."'\\!<>/$-]{0,40}"#) {
            let tree = parse(&text);
            let covered: String = tree.leaves().map(|leaf| &text[leaf.byte_range()]).collect();
            prop_assert_eq!(covered, text.clone());
            prop_assert_eq!(tree.has_error(), !collect(&tree, &text).is_empty());
        }
    }
}
