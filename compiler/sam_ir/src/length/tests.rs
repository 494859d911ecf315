use super::*;
use pretty_assertions::assert_eq;

#[test]
fn of_str_single_line() {
    assert_eq!(Length::of_str("abc"), Length::new(3, Point::new(0, 3)));
}

#[test]
fn of_str_multi_line() {
    assert_eq!(Length::of_str("ab\ncd\ne"), Length::new(7, Point::new(2, 1)));
    assert_eq!(Length::of_str("x\n"), Length::new(2, Point::new(1, 0)));
}

#[test]
fn add_same_row_accumulates_columns() {
    let sum = Length::of_str("let ") + Length::of_str("x");
    assert_eq!(sum, Length::of_str("let x"));
}

#[test]
fn add_across_rows_takes_right_column() {
    let sum = Length::of_str("let x;") + Length::of_str("\n  y");
    assert_eq!(sum, Length::of_str("let x;\n  y"));
}

#[test]
fn sub_inverts_add() {
    let left = Length::of_str("a\nbc");
    let right = Length::of_str("de\nfgh");
    assert_eq!((left + right) - left, right);

    let same_row = Length::of_str("abc");
    let more = Length::of_str("de");
    assert_eq!((same_row + more) - same_row, more);
}

#[test]
fn point_display_is_one_based() {
    assert_eq!(Point::new(0, 4).to_string(), "1:5");
}
