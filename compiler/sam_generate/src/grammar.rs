//! Grammar definition.

use crate::rules::Rule;

/// Entry of a `precedences` list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrecedenceEntry {
    /// A named level used with `prec("name", ..)`.
    Name(String),
    /// Every production of this rule without an explicit precedence.
    Symbol(String),
}

impl PrecedenceEntry {
    pub fn name(&self) -> &str {
        match self {
            PrecedenceEntry::Name(name) | PrecedenceEntry::Symbol(name) => name,
        }
    }
}

/// A complete grammar. The first rule is the start rule.
#[derive(Clone, Debug, Default)]
pub struct Grammar {
    pub name: String,
    pub rules: Vec<(String, Rule)>,
    pub extras: Vec<Rule>,
    pub externals: Vec<Rule>,
    pub word: Option<String>,
    pub supertypes: Vec<String>,
    /// Words lexed as keywords even where the grammar does not expect them.
    pub reserved: Vec<String>,
    /// Lists of levels, highest first. Levels in different lists do not
    /// compare.
    pub precedences: Vec<Vec<PrecedenceEntry>>,
}

impl Grammar {
    pub fn new(name: impl Into<String>) -> Self {
        Grammar {
            name: name.into(),
            ..Grammar::default()
        }
    }

    #[must_use]
    pub fn rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    #[must_use]
    pub fn extra(mut self, rule: Rule) -> Self {
        self.extras.push(rule);
        self
    }

    #[must_use]
    pub fn external(mut self, rule: Rule) -> Self {
        self.externals.push(rule);
        self
    }

    #[must_use]
    pub fn word(mut self, name: impl Into<String>) -> Self {
        self.word = Some(name.into());
        self
    }

    #[must_use]
    pub fn supertype(mut self, name: impl Into<String>) -> Self {
        self.supertypes.push(name.into());
        self
    }

    #[must_use]
    pub fn reserved<S: Into<String>>(mut self, words: impl IntoIterator<Item = S>) -> Self {
        self.reserved.extend(words.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn precedences(mut self, levels: Vec<PrecedenceEntry>) -> Self {
        self.precedences.push(levels);
        self
    }
}
