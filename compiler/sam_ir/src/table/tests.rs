use super::fixture::{sum_table, EXPR, NUMBER, PLUS, SOURCE};
use super::*;
use pretty_assertions::assert_eq;

#[test]
fn envelope_starts_with_magic_and_version() {
    let bytes = sum_table().to_bytes().unwrap_or_else(|e| panic!("encode failed: {e}"));
    assert_eq!(&bytes[..4], b"SAMT");
    assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), TABLE_VERSION);

    let mut stored = [0u8; 8];
    stored.copy_from_slice(&bytes[6..HEADER_LEN]);
    assert_eq!(u64::from_le_bytes(stored), checksum(&bytes[HEADER_LEN..]));
}

#[test]
fn action_lookup() {
    let table = sum_table();
    assert_eq!(
        table.actions(StateId(0), NUMBER),
        &[ParseAction::Shift { state: StateId(1) }]
    );
    assert!(table.actions(StateId(0), PLUS).is_empty());
    assert_eq!(table.actions(StateId(2), SymbolId::END), &[ParseAction::Accept]);
}

#[test]
fn action_lookup_out_of_range_is_empty() {
    let table = sum_table();
    assert!(table.actions(StateId(99), NUMBER).is_empty());
    assert!(table.actions(StateId(0), EXPR).is_empty());
}

#[test]
fn goto_lookup() {
    let table = sum_table();
    assert_eq!(table.goto(StateId(0), SOURCE), Some(StateId(2)));
    assert_eq!(table.goto(StateId(0), EXPR), Some(StateId(3)));
    assert_eq!(table.goto(StateId(3), EXPR), None);
    assert_eq!(table.goto(StateId(0), NUMBER), None);
}

#[test]
fn terminal_classification() {
    let table = sum_table();
    assert!(table.is_terminal(SymbolId::END));
    assert!(table.is_terminal(PLUS));
    assert!(table.is_nonterminal(SOURCE));
    assert!(!table.is_nonterminal(SymbolId(6)));
}

#[test]
fn lex_state_transition_search() {
    let table = sum_table();
    let start = &table.lex_states[0];
    assert_eq!(start.next('7'), Some(1));
    assert_eq!(start.next('+'), Some(2));
    assert_eq!(start.next(' '), Some(3));
    assert_eq!(start.next('x'), None);
    assert_eq!(start.next('\u{1F600}'), None);
}
