use pretty_assertions::assert_eq;

use crate::common::{assert_covers, parse, SAMPLE};

/// S-expression of a program that must parse without errors.
fn sexp(text: &str) -> String {
    let tree = parse(text);
    assert!(!tree.has_error(), "{text:?} parsed as {}", tree.to_sexp());
    assert_covers(&tree, text);
    tree.to_sexp()
}

#[test]
fn sample_program_parses_cleanly() {
    let tree = parse(SAMPLE);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert_covers(&tree, SAMPLE);
    assert!(sam_diagnostic::collect(&tree, SAMPLE).is_empty());
}

#[test]
fn empty_file() {
    assert_eq!(sexp(""), "(source_file)");
    assert_eq!(sexp("  \n"), "(source_file)");
}

#[test]
fn variable_declaration() {
    assert_eq!(
        sexp("let x = 1;"),
        "(source_file (variable_declaration (variable_declarator variable: (identifier) \
         value: (literal (number)))))"
    );
    assert_eq!(
        sexp("let a, b = c;"),
        "(source_file (variable_declaration (variable_declarator variable: (identifier)) \
         (variable_declarator variable: (identifier) value: (identifier))))"
    );
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(
        sexp("x = 1 + 2 * 3;"),
        "(source_file (assignment lhs: (identifier) rhs: (binary_expression \
         left: (literal (number)) right: (binary_expression left: (literal (number)) \
         right: (literal (number))))))"
    );
}

#[test]
fn operators_associate_to_the_left() {
    assert_eq!(
        sexp("1 - 2 - 3;"),
        "(source_file (expression_statement (binary_expression left: (binary_expression \
         left: (literal (number)) right: (literal (number))) right: (literal (number)))))"
    );
}

#[test]
fn unary_binds_tighter_than_binary() {
    assert_eq!(
        sexp("-a * b;"),
        "(source_file (expression_statement (binary_expression left: (unary_expression \
         argument: (identifier)) right: (identifier))))"
    );
}

#[test]
fn member_access_and_calls_chain() {
    assert_eq!(
        sexp("io.print(x);"),
        "(source_file (expression_statement (call_expression function: (nested_identifier \
         parent: (identifier) name: (identifier)) arguments: (arguments (identifier)))))"
    );
    assert_eq!(
        sexp("f(x).y;"),
        "(source_file (expression_statement (nested_identifier parent: (call_expression \
         function: (identifier) arguments: (arguments (identifier))) name: (identifier))))"
    );
}

#[test]
fn lambda_body_extends_as_far_as_possible() {
    assert_eq!(
        sexp("let f = (x) => x + 1;"),
        "(source_file (variable_declaration (variable_declarator variable: (identifier) \
         value: (lambda_expression parameters: (parameters (identifier)) \
         body: (binary_expression left: (identifier) right: (literal (number)))))))"
    );
}

#[test]
fn if_else_chains() {
    assert_eq!(
        sexp("if (a) { b; } else if (c) { d; };"),
        "(source_file (expression_statement (if_expression condition: (identifier) \
         consequence: (statement_block (expression_statement (identifier))) \
         else: (if_expression condition: (identifier) \
         consequence: (statement_block (expression_statement (identifier)))))))"
    );
}

#[test]
fn for_loops() {
    assert_eq!(
        sexp("for x in xs { y; };"),
        "(source_file (expression_statement (for_expression variable: (identifier) \
         iterable: (identifier) body: (statement_block (expression_statement (identifier))))))"
    );
}

#[test]
fn arrays_and_indexing() {
    assert_eq!(
        sexp("[1, 2][0];"),
        "(source_file (expression_statement (array_access_expression \
         array_expression: (array_expression (literal (number)) (literal (number))) \
         index: (literal (number)))))"
    );
    assert_eq!(
        sexp("let grid[0] = 2;"),
        "(source_file (variable_declaration (variable_declarator \
         variable: (array_access_expression array: (identifier) index: (literal (number))) \
         value: (literal (number)))))"
    );
}

#[test]
fn interfaces_come_first() {
    assert_eq!(
        sexp("interface \"m\" load m;\nx;"),
        "(source_file (interfaces (interface path: (string (string_fragment)) \
         module: (identifier))) (expression_statement (identifier)))"
    );
}

#[test]
fn strings_and_escapes() {
    assert_eq!(
        sexp(r#""a\nb";"#),
        "(source_file (expression_statement (literal (string (string_fragment) \
         (escape_sequence) (string_fragment)))))"
    );
    assert_eq!(
        sexp(r"'\u{1F600}\x41';"),
        "(source_file (expression_statement (literal (string (escape_sequence) \
         (escape_sequence)))))"
    );
    assert_eq!(
        sexp(r#""";"#),
        "(source_file (expression_statement (literal (string))))"
    );
}

#[test]
fn string_fragments_keep_their_spaces() {
    let text = "\" two  words \";";
    let tree = parse(text);
    let string = tree
        .root_node()
        .descendant_for_byte_range(1, 2)
        .unwrap();
    assert_eq!(string.kind(), "string_fragment");
    assert_eq!(string.utf8_text(text), Some(" two  words "));
}

#[test]
fn number_forms() {
    for number in [
        "0", "7", "1_000", "007", "0x1F", "0Xab_cd", "0b1_0", "0o17", "1.5", "1.", ".5", "1e10",
        "1.5e-3", ".5E+2",
    ] {
        let text = format!("{number};");
        assert_eq!(
            sexp(&text),
            "(source_file (expression_statement (literal (number))))",
            "{number}"
        );
        let tree = parse(&text);
        let leaf = tree.root_node().descendant_for_byte_range(0, 1).unwrap();
        assert_eq!(leaf.utf8_text(&text), Some(number));
    }
}

#[test]
fn comments_are_extras() {
    assert_eq!(
        sexp("// hi\nx; // there"),
        "(source_file (comment) (expression_statement (identifier)) (comment))"
    );
}

#[test]
fn unreserved_keywords_are_identifiers_elsewhere() {
    assert_eq!(
        sexp("load = 1;"),
        "(source_file (assignment lhs: (identifier) rhs: (literal (number))))"
    );
}

#[test]
fn reserved_words_are_never_identifiers() {
    for word in sam_grammar::RESERVED_WORDS {
        let tree = parse(&format!("let {word} = 1;"));
        assert!(tree.has_error(), "`{word}` was accepted as a name");
    }
}
