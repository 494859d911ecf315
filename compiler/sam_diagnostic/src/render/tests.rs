use pretty_assertions::assert_eq;
use sam_ir::{Point, Range};

use crate::{line_col, render, Diagnostic, ErrorCode};

fn range(start_byte: u32, end_byte: u32) -> Range {
    Range {
        start_byte,
        end_byte,
        start_point: Point::default(),
        end_point: Point::default(),
    }
}

#[test]
fn line_and_column_are_one_based() {
    let source = "ab\ncdé\nf";
    assert_eq!(line_col(source, 0), (1, 1));
    assert_eq!(line_col(source, 2), (1, 3));
    assert_eq!(line_col(source, 3), (2, 1));
    assert_eq!(line_col(source, 7), (2, 4));
    assert_eq!(line_col(source, 8), (3, 1));
    assert_eq!(line_col(source, 100), (3, 2));
}

#[test]
fn renders_header_and_snippet() {
    let source = "a;\nb";
    let diagnostics = [Diagnostic::error(ErrorCode::E1002, "missing `;`").with_range(range(4, 4))];
    assert_eq!(
        render("test.sam", source, &diagnostics),
        "test.sam:2:2: error[E1002]: missing `;`\n2 | b\n  |  ^\n"
    );
}

#[test]
fn underlines_the_whole_range_and_prints_notes() {
    let source = "let x = ) );";
    let diagnostics = [Diagnostic::error(ErrorCode::E1001, "unexpected `) )`")
        .with_range(range(8, 11))
        .with_note("skipped nothing")];
    assert_eq!(
        render("a.sam", source, &diagnostics),
        "a.sam:1:9: error[E1001]: unexpected `) )`\n\
         1 | let x = ) );\n  |         ^^^\n  = note: skipped nothing\n"
    );
}

#[test]
fn diagnostics_without_a_range() {
    let diagnostics = [Diagnostic::error(ErrorCode::E9001, "cannot load grammar: bad magic")];
    assert_eq!(
        render("sam", "", &diagnostics),
        "sam: error[E9001]: cannot load grammar: bad magic\n"
    );
}
