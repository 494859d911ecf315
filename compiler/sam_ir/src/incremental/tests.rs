use super::*;
use pretty_assertions::assert_eq;

#[test]
fn replace_computes_points() {
    let old = "let a = 1;\nlet b = 2;";
    let edit = InputEdit::replace(old, 19, 20, "300");
    assert_eq!(edit.start_point, Point::new(1, 8));
    assert_eq!(edit.old_end_point, Point::new(1, 9));
    assert_eq!(edit.new_end_point, Point::new(1, 11));
    assert_eq!(edit.delta(), 2);
}

#[test]
fn insert_newline_moves_to_next_row() {
    let edit = InputEdit::insert("ab", 1, "\n\n");
    assert_eq!(edit.new_end_point, Point::new(2, 0));
    assert_eq!(edit.new_len(), 2);
    assert_eq!(edit.old_len(), 0);
}

#[test]
fn apply_produces_new_text() {
    let (new, edit) = InputEdit::apply("1+2", 1, 2, "*");
    assert_eq!(new, "1*2");
    assert_eq!(edit.delta(), 0);
}

#[test]
fn delete_has_negative_delta() {
    let edit = InputEdit::delete("hello world", 5, 11);
    assert_eq!(edit.delta(), -6);
    assert_eq!(edit.new_end_byte, 5);
}

#[test]
fn map_position_before_inside_after() {
    let old = "aaaa\nbbbb\ncccc";
    let edit = InputEdit::replace(old, 5, 9, "x");
    let before = Length::of_str("aa");
    let inside = Length::of_str("aaaa\nbb");
    let after = Length::of_str("aaaa\nbbbb\ncc");

    assert_eq!(edit.map_position(before), before);
    assert_eq!(edit.map_position(inside), Length::of_str("aaaa\nx"));
    assert_eq!(edit.map_position(after), Length::of_str("aaaa\nx\ncc"));
}

#[test]
fn touches_respects_lookahead() {
    let edit = InputEdit::insert("abc def", 3, "x");
    // `abc` ended at 3; lexer peeked one byte past it.
    assert!(edit.touches(0, 3, 1));
    // `def` starts after the edit.
    assert!(!edit.touches(4, 7, 1));
    // A node entirely before the edit with no lookahead overlap.
    let far = InputEdit::insert("abc def ghi", 10, "x");
    assert!(!far.touches(0, 3, 1));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn apply_matches_edit_points(
            text in "[a-c\n]{0,24}",
            a in 0usize..24,
            b in 0usize..24,
            insert in "[x\n]{0,6}",
        ) {
            let start = a.min(b).min(text.len());
            let end = a.max(b).min(text.len());
            let (new, edit) = InputEdit::apply(&text, start, end, &insert);
            prop_assert_eq!(new.len() as i64, text.len() as i64 + edit.delta());
            prop_assert_eq!(edit.new_end(), Length::of_str(&new[..edit.new_end_byte as usize]));
            // The end of the text moves with the edit, unless the edit is a
            // pure insertion at the very end (positions at the start stay).
            if start < end || end < text.len() {
                let old_end = Length::of_str(&text);
                prop_assert_eq!(edit.map_position(old_end), Length::of_str(&new));
            }
        }

        #[test]
        fn map_position_is_monotonic(
            text in "[ab\n]{0,20}",
            start in 0usize..20,
            len in 0usize..6,
            p in 0usize..20,
            q in 0usize..20,
        ) {
            let start = start.min(text.len());
            let end = (start + len).min(text.len());
            let edit = InputEdit::replace(&text, start, end, "zz\nz");
            let (p, q) = (p.min(q).min(text.len()), p.max(q).min(text.len()));
            let mp = edit.map_position(Length::of_str(&text[..p]));
            let mq = edit.map_position(Length::of_str(&text[..q]));
            prop_assert!(mp.bytes <= mq.bytes);
        }
    }
}
