use pretty_assertions::assert_eq;
use sam_ir::Language;

use crate::common::sam;

#[test]
fn can_load_grammar() {
    let language = sam_grammar::language();
    assert!(language.is_ok(), "error loading the sam grammar: {language:?}");
}

#[test]
fn language_is_shared() {
    let first = sam();
    let second = sam();
    assert!(first.ptr_eq(&second));
    assert_eq!(first.name(), "sam");
}

#[test]
fn table_bytes_round_trip() {
    let bytes = sam_grammar::table_bytes().unwrap();
    let loaded = Language::load(&bytes).unwrap();
    assert_eq!(loaded.symbol_count(), sam().symbol_count());
    assert_eq!(loaded.state_count(), sam().state_count());
}

#[test]
fn node_kinds_are_known() {
    let language = sam();
    for kind in [
        "source_file",
        "interface",
        "variable_declaration",
        "variable_declarator",
        "assignment",
        "binary_expression",
        "unary_expression",
        "lambda_expression",
        "call_expression",
        "array_access_expression",
        "if_expression",
        "for_expression",
        "nested_identifier",
        "string_fragment",
        "escape_sequence",
        "comment",
    ] {
        assert!(language.id_for_node_kind(kind, true).is_some(), "{kind}");
    }
    assert!(language.id_for_node_kind("=>", false).is_some());
    assert!(language.field_id_for_name("consequence").is_some());
}
