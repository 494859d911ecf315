use pretty_assertions::assert_eq;
use sam_ir::Language;

use super::*;
use crate::EditArg;

fn sam() -> Language {
    sam_language().unwrap()
}

fn edit(start: usize, end: usize, text: &str) -> EditArg {
    EditArg {
        start,
        end,
        text: text.to_owned(),
    }
}

#[test]
fn parse_prints_the_tree() {
    let sexp = parse_text(&sam(), &ParserOptions::default(), "x = 1;");
    assert_eq!(
        sexp,
        "(source_file (assignment lhs: (identifier) rhs: (literal (number))))"
    );
}

#[test]
fn check_accepts_valid_files() {
    let report = check_text(&sam(), &ParserOptions::default(), "ok.sam", "let x = 1;\nx;");
    assert!(!report.has_errors());
    assert_eq!(report.rendered, "");
}

#[test]
fn check_renders_each_error() {
    let report = check_text(&sam(), &ParserOptions::default(), "bad.sam", "let x = 1");
    assert_eq!(report.error_count, 1);
    assert!(
        report.rendered.starts_with("bad.sam:1:10: error[E1002]: missing semicolon\n"),
        "{}",
        report.rendered
    );
}

#[test]
fn edit_reuses_the_old_tree() {
    let text = "let a = 1;\nlet b = 2;\nlet c = 3;\n";
    let report = edit_text(&sam(), &ParserOptions::default(), text, &[edit(19, 20, "20")]).unwrap();
    assert_eq!(report.text, "let a = 1;\nlet b = 20;\nlet c = 3;\n");
    assert!(!report.diverged);
    assert!(!report.stats.fallback);
    assert!(report.stats.reused_nodes > 0);
    assert_eq!(report.sexp, parse_text(&sam(), &ParserOptions::default(), &report.text));
}

#[test]
fn edits_apply_to_the_text_left_by_the_previous_one() {
    let report = edit_text(
        &sam(),
        &ParserOptions::default(),
        "a;",
        &[edit(0, 1, "bb"), edit(2, 2, " + 1")],
    )
    .unwrap();
    assert_eq!(report.text, "bb + 1;");
    assert!(!report.diverged);
}

#[test]
fn edit_outside_the_text_fails() {
    let error = edit_text(&sam(), &ParserOptions::default(), "a;", &[edit(1, 9, "")]).unwrap_err();
    assert!(matches!(error, CliError::EditOutOfRange { start: 1, end: 9, len: 2 }));
}

#[test]
fn generate_writes_loadable_tables() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("sam.samt");
    let report = generate_tables(&output).unwrap();
    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(bytes.len(), report.bytes);
    let language = Language::load(&bytes).unwrap();
    assert_eq!(language.name(), "sam");
}

#[test]
fn generate_reports_unwritable_paths() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("missing").join("sam.samt");
    assert!(matches!(generate_tables(&output), Err(CliError::Write { .. })));
}

#[test]
fn read_file_names_the_path() {
    let error = read_file(Path::new("/nonexistent/main.sam")).unwrap_err();
    assert!(error.to_string().starts_with("cannot read '/nonexistent/main.sam': "));
}
