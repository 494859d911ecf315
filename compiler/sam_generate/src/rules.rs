//! Grammar rule DSL.
//!
//! Mirrors the combinators of tree-sitter's `grammar.js` so grammars read
//! almost the same in Rust:
//!
//! ```
//! use sam_generate::rules::{field, prec_left, seq, string, sym};
//!
//! let sum = prec_left(1, seq([
//!     field("left", sym("expression")),
//!     string("+"),
//!     field("right", sym("expression")),
//! ]));
//! # let _ = sum;
//! ```

/// Parse or lexical precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Precedence {
    #[default]
    None,
    Integer(i32),
    /// Level declared in the grammar's `precedences` lists.
    Name(String),
}

impl From<i32> for Precedence {
    fn from(value: i32) -> Self {
        Precedence::Integer(value)
    }
}

impl From<&str> for Precedence {
    fn from(value: &str) -> Self {
        Precedence::Name(value.to_string())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

/// Node kind shown instead of a child's own kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Alias {
    pub value: String,
    pub named: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MetadataParams {
    pub precedence: Precedence,
    pub associativity: Option<Associativity>,
    pub dynamic_precedence: i16,
    pub field: Option<String>,
    pub alias: Option<Alias>,
    /// Everything inside lexes as a single token.
    pub token: bool,
    /// No extras may precede this token.
    pub immediate: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Rule {
    Blank,
    String(String),
    Pattern(String),
    Symbol(String),
    Seq(Vec<Rule>),
    Choice(Vec<Rule>),
    /// One or more repetitions.
    Repeat(Box<Rule>),
    Metadata {
        params: MetadataParams,
        rule: Box<Rule>,
    },
}

impl Rule {
    /// Rules that lex as a single token on their own.
    pub(crate) fn is_token(&self) -> bool {
        match self {
            Rule::String(_) | Rule::Pattern(_) => true,
            Rule::Metadata { params, rule } => {
                params.token
                    || (params.field.is_none() && params.alias.is_none() && rule.is_token())
            }
            _ => false,
        }
    }
}

fn metadata(rule: Rule, f: impl FnOnce(&mut MetadataParams)) -> Rule {
    let mut params = MetadataParams::default();
    f(&mut params);
    Rule::Metadata {
        params,
        rule: Box::new(rule),
    }
}

pub fn blank() -> Rule {
    Rule::Blank
}

pub fn string(text: impl Into<String>) -> Rule {
    Rule::String(text.into())
}

/// Regular expression in the JavaScript syntax used by `grammar.js`.
pub fn pattern(source: impl Into<String>) -> Rule {
    Rule::Pattern(source.into())
}

pub fn sym(name: impl Into<String>) -> Rule {
    Rule::Symbol(name.into())
}

pub fn seq(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Seq(rules.into_iter().collect())
}

pub fn choice(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Choice(rules.into_iter().collect())
}

pub fn optional(rule: Rule) -> Rule {
    Rule::Choice(vec![rule, Rule::Blank])
}

pub fn repeat(rule: Rule) -> Rule {
    optional(repeat1(rule))
}

pub fn repeat1(rule: Rule) -> Rule {
    Rule::Repeat(Box::new(rule))
}

pub fn prec(precedence: impl Into<Precedence>, rule: Rule) -> Rule {
    metadata(rule, |p| p.precedence = precedence.into())
}

pub fn prec_left(precedence: impl Into<Precedence>, rule: Rule) -> Rule {
    metadata(rule, |p| {
        p.precedence = precedence.into();
        p.associativity = Some(Associativity::Left);
    })
}

pub fn prec_right(precedence: impl Into<Precedence>, rule: Rule) -> Rule {
    metadata(rule, |p| {
        p.precedence = precedence.into();
        p.associativity = Some(Associativity::Right);
    })
}

pub fn prec_dynamic(precedence: i16, rule: Rule) -> Rule {
    metadata(rule, |p| p.dynamic_precedence = precedence)
}

pub fn field(name: impl Into<String>, rule: Rule) -> Rule {
    metadata(rule, |p| p.field = Some(name.into()))
}

/// Show `rule` as the named kind `name`.
pub fn alias(rule: Rule, name: impl Into<String>) -> Rule {
    metadata(rule, |p| {
        p.alias = Some(Alias {
            value: name.into(),
            named: true,
        });
    })
}

/// Show `rule` as the anonymous kind `text`.
pub fn alias_anonymous(rule: Rule, text: impl Into<String>) -> Rule {
    metadata(rule, |p| {
        p.alias = Some(Alias {
            value: text.into(),
            named: false,
        });
    })
}

pub fn token(rule: Rule) -> Rule {
    metadata(rule, |p| p.token = true)
}

/// `token.immediate`: a token that must directly follow the previous one.
pub fn immediate(rule: Rule) -> Rule {
    metadata(rule, |p| {
        p.token = true;
        p.immediate = true;
    })
}
