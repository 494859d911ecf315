use sam_generate::rules::{
    alias, choice, field, immediate, optional, pattern, prec, prec_left, prec_right, repeat,
    repeat1, seq, string, sym, token, Rule,
};
use sam_generate::{Grammar, PrecedenceEntry};

/// Binary operators and the precedence level each belongs to. All of them
/// associate to the left.
pub const OPERATOR_PRECEDENCE: [(&str, &str); 12] = [
    ("**", "binary_exp"),
    ("*", "binary_times"),
    ("/", "binary_times"),
    ("%", "binary_times"),
    ("+", "binary_plus"),
    ("-", "binary_plus"),
    ("<", "binary_compare"),
    ("<=", "binary_compare"),
    (">", "binary_compare"),
    (">=", "binary_compare"),
    ("==", "binary_compare"),
    ("!=", "binary_compare"),
];

/// Words that always lex as keywords, never as identifiers.
pub const RESERVED_WORDS: [&str; 6] = ["return", "let", "if", "else", "for", "in"];

fn comma_sep1(rule: Rule) -> Rule {
    seq([rule.clone(), repeat(seq([string(","), rule]))])
}

fn comma_sep(rule: Rule) -> Rule {
    optional(comma_sep1(rule))
}

/// The sam grammar.
pub fn grammar() -> Grammar {
    let levels = [
        "attr_access",
        "call",
        "unary_op",
        "binary_exp",
        "binary_times",
        "binary_plus",
        "binary_compare",
    ];
    let mut operators: Vec<PrecedenceEntry> =
        levels.iter().map(|l| PrecedenceEntry::Name((*l).to_owned())).collect();
    operators.push(PrecedenceEntry::Symbol("lambda_expression".to_owned()));

    Grammar::new("sam")
        .supertype("statement")
        .supertype("expression")
        .supertype("declaration")
        .word("identifier")
        .extra(sym("comment"))
        .extra(pattern(r"\s+"))
        .reserved(RESERVED_WORDS)
        .precedences(operators)
        .precedences(vec![PrecedenceEntry::Name("assign".to_owned())])
        .precedences(vec![PrecedenceEntry::Name("declaration".to_owned())])
        .rule("source_file", seq([optional(sym("interfaces")), repeat(sym("statement"))]))
        .rule("interfaces", repeat1(sym("interface")))
        .rule(
            "interface",
            seq([
                string("interface"),
                field("path", sym("string")),
                string("load"),
                field("module", sym("identifier")),
                sym("_semicolon"),
            ]),
        )
        .rule(
            "statement",
            choice([
                sym("expression_statement"),
                sym("declaration"),
                sym("assignment"),
                sym("return_statement"),
            ]),
        )
        .rule("expression_statement", seq([sym("expression"), sym("_semicolon")]))
        .rule(
            "expression",
            choice([
                sym("identifier"),
                sym("nested_identifier"),
                sym("literal"),
                sym("binary_expression"),
                sym("unary_expression"),
                sym("lambda_expression"),
                sym("call_expression"),
                sym("array_access_expression"),
                sym("array_expression"),
                sym("if_expression"),
                sym("for_expression"),
            ]),
        )
        .rule("declaration", choice([sym("variable_declaration")]))
        .rule(
            "variable_declaration",
            seq([string("let"), comma_sep1(sym("variable_declarator")), sym("_semicolon")]),
        )
        .rule(
            "variable_declarator",
            seq([
                field(
                    "variable",
                    choice([sym("identifier"), sym("array_access_expression")]),
                ),
                optional(sym("_initializer")),
            ]),
        )
        .rule(
            "assignment",
            prec_right(
                "assign",
                seq([
                    field("lhs", sym("identifier")),
                    string("="),
                    field("rhs", sym("expression")),
                    sym("_semicolon"),
                ]),
            ),
        )
        .rule("_initializer", seq([string("="), field("value", sym("expression"))]))
        .rule("identifier", token(pattern("[_a-zA-Z]+[_a-zA-Z0-9]*")))
        .rule("literal", choice([sym("number"), sym("string")]))
        .rule("binary_expression", binary_expression())
        .rule(
            "unary_expression",
            prec_left(
                "unary_op",
                seq([
                    field("operator", choice([string("!"), string("-"), string("+")])),
                    field("argument", sym("expression")),
                ]),
            ),
        )
        .rule(
            "lambda_expression",
            seq([
                field("parameters", sym("parameters")),
                string("=>"),
                field("body", choice([sym("expression"), sym("statement_block")])),
            ]),
        )
        .rule(
            "parameters",
            seq([string("("), comma_sep(sym("identifier")), string(")")]),
        )
        .rule(
            "statement_block",
            seq([string("{"), repeat(sym("statement")), string("}")]),
        )
        .rule(
            "return_statement",
            seq([string("return"), optional(sym("expression")), sym("_semicolon")]),
        )
        .rule(
            "call_expression",
            prec(
                "call",
                seq([
                    field("function", sym("expression")),
                    field("arguments", sym("arguments")),
                ]),
            ),
        )
        .rule(
            "arguments",
            seq([string("("), comma_sep(sym("expression")), string(")")]),
        )
        .rule("string", string_literal())
        .rule(
            "unescaped_double_string_fragment",
            immediate(prec(1, pattern(r#"[^"\\\r\n]+"#))),
        )
        .rule(
            "unescaped_single_string_fragment",
            immediate(prec(1, pattern(r"[^'\\\r\n]+"))),
        )
        .rule("escape_sequence", escape_sequence())
        .rule("number", number())
        .rule(
            "array_access_expression",
            seq([
                choice([
                    field("array", sym("identifier")),
                    field("array_expression", sym("array_expression")),
                ]),
                string("["),
                field("index", sym("expression")),
                string("]"),
            ]),
        )
        .rule(
            "array_expression",
            seq([string("["), comma_sep(sym("expression")), string("]")]),
        )
        .rule(
            "if_expression",
            seq([
                string("if"),
                string("("),
                field("condition", sym("expression")),
                string(")"),
                field("consequence", sym("statement_block")),
                optional(seq([
                    string("else"),
                    field("else", choice([sym("statement_block"), sym("if_expression")])),
                ])),
            ]),
        )
        .rule(
            "for_expression",
            seq([
                string("for"),
                field("variable", sym("identifier")),
                string("in"),
                field("iterable", sym("expression")),
                field("body", sym("statement_block")),
            ]),
        )
        .rule(
            "nested_identifier",
            prec(
                "attr_access",
                seq([
                    field("parent", sym("expression")),
                    string("."),
                    field("name", sym("identifier")),
                ]),
            ),
        )
        .rule("comment", token(seq([string("//"), pattern(r"[^\r\n]*")])))
        .rule("_semicolon", pattern(";"))
}

fn binary_expression() -> Rule {
    choice(OPERATOR_PRECEDENCE.iter().map(|&(operator, level)| {
        prec_left(
            level,
            seq([
                field("left", sym("expression")),
                field("operator", string(operator)),
                field("right", sym("expression")),
            ]),
        )
    }))
}

fn string_literal() -> Rule {
    let quoted = |quote: &str, fragment: &str| {
        seq([
            string(quote),
            repeat(choice([
                alias(sym(fragment), "string_fragment"),
                sym("escape_sequence"),
            ])),
            string(quote),
        ])
    };
    choice([
        quoted("\"", "unescaped_double_string_fragment"),
        quoted("'", "unescaped_single_string_fragment"),
    ])
}

fn escape_sequence() -> Rule {
    immediate(seq([
        string("\\"),
        choice([
            pattern("[^xu0-7]"),
            pattern("[0-7]{1,3}"),
            pattern("x[0-9a-fA-F]{2}"),
            pattern("u[0-9a-fA-F]{4}"),
            pattern(r"u\{[0-9a-fA-F]+\}"),
            pattern(r"[\r?][\n\u2028\u2029]"),
        ]),
    ]))
}

/// Hexadecimal, decimal (with fraction and exponent), binary and octal
/// literals, with `_` digit separators.
fn number() -> Rule {
    let decimal_digits = || pattern(r"\d(_?\d)*");
    let signed_integer = || seq([optional(choice([string("-"), string("+")])), decimal_digits()]);
    let exponent_part = || seq([choice([string("e"), string("E")]), signed_integer()]);

    let binary = seq([choice([string("0b"), string("0B")]), pattern("[0-1](_?[0-1])*")]);
    let octal = seq([choice([string("0o"), string("0O")]), pattern("[0-7](_?[0-7])*")]);
    let hex = seq([
        choice([string("0x"), string("0X")]),
        pattern(r"[\da-fA-F](_?[\da-fA-F])*"),
    ]);

    let decimal_integer = || {
        choice([
            string("0"),
            seq([
                optional(string("0")),
                pattern("[1-9]"),
                optional(seq([optional(string("_")), decimal_digits()])),
            ]),
        ])
    };
    let decimal = choice([
        seq([
            decimal_integer(),
            string("."),
            optional(decimal_digits()),
            optional(exponent_part()),
        ]),
        seq([string("."), decimal_digits(), optional(exponent_part())]),
        seq([decimal_integer(), exponent_part()]),
        decimal_digits(),
    ]);

    token(choice([hex, decimal, binary, octal]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_rule_comes_first() {
        let grammar = grammar();
        assert_eq!(grammar.name, "sam");
        assert_eq!(grammar.rules[0].0, "source_file");
        assert_eq!(grammar.word.as_deref(), Some("identifier"));
        assert_eq!(grammar.reserved, RESERVED_WORDS);
    }

    #[test]
    fn every_operator_has_a_declared_level() {
        let grammar = grammar();
        let declared: Vec<&str> = grammar.precedences[0].iter().map(PrecedenceEntry::name).collect();
        for (operator, level) in OPERATOR_PRECEDENCE {
            assert!(declared.contains(&level), "{operator} uses undeclared {level}");
        }
    }
}
