//! Grammar preparation: token extraction, repeat expansion and flattening.
//!
//! The output is a grammar over two symbol spaces: lexical terminals (each
//! with its regular expression) and syntax variables whose productions are
//! flat sequences of steps.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::grammar::{Grammar, PrecedenceEntry};
use crate::lexical::{self, Regex};
use crate::rules::{Alias, Associativity, MetadataParams, Precedence, Rule};
use crate::GenerateError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Sym {
    Terminal(usize),
    NonTerminal(usize),
}

#[derive(Clone, Debug)]
pub(crate) struct Terminal {
    pub name: String,
    pub visible: bool,
    pub named: bool,
    /// `None` for external tokens.
    pub regex: Option<Regex>,
    pub precedence: i32,
    pub immediate: bool,
    pub is_string: bool,
    pub external: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Step {
    pub symbol: Sym,
    pub precedence: Precedence,
    pub associativity: Option<Associativity>,
    pub field: Option<String>,
    pub alias: Option<Alias>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Production {
    pub steps: Vec<Step>,
    pub dynamic_precedence: i16,
}

#[derive(Clone, Debug)]
pub(crate) struct Variable {
    pub name: String,
    pub visible: bool,
    pub supertype: bool,
    pub productions: Vec<Production>,
}

#[derive(Debug)]
pub(crate) struct Prepared {
    pub name: String,
    pub terminals: Vec<Terminal>,
    /// The start rule is variable 0.
    pub variables: Vec<Variable>,
    pub extras: Vec<usize>,
    pub externals: Vec<usize>,
    pub word: Option<usize>,
    pub reserved: FxHashSet<String>,
    pub precedences: Vec<Vec<PrecedenceEntry>>,
}

/// Metadata inherited by every step under a `Metadata` rule; the innermost
/// setting wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
struct Context {
    precedence: Precedence,
    associativity: Option<Associativity>,
    field: Option<String>,
    alias: Option<Alias>,
}

impl Context {
    fn apply(&self, params: &MetadataParams) -> Context {
        let mut inner = self.clone();
        if params.precedence != Precedence::None {
            inner.precedence = params.precedence.clone();
        }
        if params.associativity.is_some() {
            inner.associativity = params.associativity;
        }
        if params.field.is_some() {
            inner.field.clone_from(&params.field);
        }
        if params.alias.is_some() {
            inner.alias.clone_from(&params.alias);
        }
        inner
    }

    fn step(&self, symbol: Sym) -> Step {
        Step {
            symbol,
            precedence: self.precedence.clone(),
            associativity: self.associativity,
            field: self.field.clone(),
            alias: self.alias.clone(),
        }
    }
}

struct Preparer<'g> {
    grammar: &'g Grammar,
    terminals: Vec<Terminal>,
    variables: Vec<Variable>,
    by_name: FxHashMap<String, Sym>,
    strings: FxHashMap<String, usize>,
    inline_tokens: FxHashMap<Rule, usize>,
    repeats: FxHashMap<(Rule, Context), usize>,
    declared_precedences: FxHashSet<String>,
    /// Rule name -> precedence name from `Symbol` entries in `precedences`.
    symbol_precedences: FxHashMap<String, String>,
}

#[tracing::instrument(level = "debug", skip_all, fields(grammar = %grammar.name))]
pub(crate) fn prepare(grammar: &Grammar) -> Result<Prepared, GenerateError> {
    let Some((start_name, start_rule)) = grammar.rules.first() else {
        return Err(GenerateError::EmptyGrammar(grammar.name.clone()));
    };
    if start_rule.is_token() {
        return Err(GenerateError::TokenStart {
            name: start_name.clone(),
        });
    }

    let mut preparer = Preparer {
        grammar,
        terminals: Vec::new(),
        variables: Vec::new(),
        by_name: FxHashMap::default(),
        strings: FxHashMap::default(),
        inline_tokens: FxHashMap::default(),
        repeats: FxHashMap::default(),
        declared_precedences: FxHashSet::default(),
        symbol_precedences: FxHashMap::default(),
    };
    preparer.declare_rules()?;
    preparer.declare_precedences()?;
    let externals = preparer.declare_externals()?;
    let extras = preparer.declare_extras()?;
    let word = preparer.word()?;
    preparer.declare_supertypes()?;
    preparer.flatten_rules()?;
    preparer.check_productive(start_name)?;

    let reserved = grammar.reserved.iter().cloned().collect();
    tracing::debug!(
        terminals = preparer.terminals.len(),
        variables = preparer.variables.len(),
        "grammar prepared"
    );
    Ok(Prepared {
        name: grammar.name.clone(),
        terminals: preparer.terminals,
        variables: preparer.variables,
        extras,
        externals,
        word,
        reserved,
        precedences: grammar.precedences.clone(),
    })
}

impl Preparer<'_> {
    /// Token rules become terminals, everything else a syntax variable.
    fn declare_rules(&mut self) -> Result<(), GenerateError> {
        for (name, rule) in &self.grammar.rules {
            if self.by_name.contains_key(name) {
                return Err(GenerateError::DuplicateRule { name: name.clone() });
            }
            let visible = !name.starts_with('_');
            let symbol = if rule.is_token() {
                let regex = lexical::to_regex(rule, name)?;
                Sym::Terminal(self.push_terminal(Terminal {
                    name: name.clone(),
                    visible,
                    named: true,
                    regex: Some(regex),
                    precedence: lexical_precedence(rule),
                    immediate: is_immediate(rule),
                    is_string: false,
                    external: None,
                }))
            } else {
                self.variables.push(Variable {
                    name: name.clone(),
                    visible,
                    supertype: false,
                    productions: Vec::new(),
                });
                Sym::NonTerminal(self.variables.len() - 1)
            };
            self.by_name.insert(name.clone(), symbol);
        }
        Ok(())
    }

    fn declare_precedences(&mut self) -> Result<(), GenerateError> {
        for list in &self.grammar.precedences {
            for entry in list {
                match entry {
                    PrecedenceEntry::Name(name) => {
                        self.declared_precedences.insert(name.clone());
                    }
                    PrecedenceEntry::Symbol(rule) => {
                        if !self.by_name.contains_key(rule) {
                            return Err(GenerateError::UndefinedSymbol {
                                name: rule.clone(),
                                rule: "precedences".to_string(),
                            });
                        }
                        self.declared_precedences.insert(rule.clone());
                        self.symbol_precedences.insert(rule.clone(), rule.clone());
                    }
                }
            }
        }
        Ok(())
    }

    fn declare_externals(&mut self) -> Result<Vec<usize>, GenerateError> {
        let mut externals = Vec::new();
        for (index, rule) in self.grammar.externals.iter().enumerate() {
            let (name, visible, named) = match rule {
                Rule::Symbol(name) => (name.clone(), !name.starts_with('_'), true),
                Rule::String(text) => (text.clone(), true, false),
                _ => {
                    return Err(GenerateError::InvalidExternal {
                        name: format!("{rule:?}"),
                    })
                }
            };
            if matches!(self.by_name.get(&name), Some(Sym::NonTerminal(_))) {
                return Err(GenerateError::InvalidExternal { name });
            }
            let terminal = match self.by_name.get(&name) {
                Some(&Sym::Terminal(terminal)) => {
                    self.terminals[terminal].external = Some(index);
                    terminal
                }
                _ => {
                    let terminal = self.push_terminal(Terminal {
                        name: name.clone(),
                        visible,
                        named,
                        regex: None,
                        precedence: 0,
                        immediate: false,
                        is_string: !named,
                        external: Some(index),
                    });
                    if named {
                        self.by_name.insert(name, Sym::Terminal(terminal));
                    } else {
                        self.strings.insert(name, terminal);
                    }
                    terminal
                }
            };
            externals.push(terminal);
        }
        Ok(externals)
    }

    fn declare_extras(&mut self) -> Result<Vec<usize>, GenerateError> {
        let mut extras = Vec::new();
        let mut inline = 0;
        for rule in &self.grammar.extras {
            let terminal = match rule {
                Rule::Symbol(name) => match self.by_name.get(name) {
                    Some(&Sym::Terminal(terminal)) => terminal,
                    Some(Sym::NonTerminal(_)) => {
                        return Err(GenerateError::InvalidExtra { name: name.clone() })
                    }
                    None => {
                        return Err(GenerateError::UndefinedSymbol {
                            name: name.clone(),
                            rule: "extras".to_string(),
                        })
                    }
                },
                rule if rule.is_token() => {
                    inline += 1;
                    let name = format!("_extra_token{inline}");
                    let regex = lexical::to_regex(rule, &name)?;
                    self.push_terminal(Terminal {
                        name,
                        visible: false,
                        named: true,
                        regex: Some(regex),
                        precedence: lexical_precedence(rule),
                        immediate: false,
                        is_string: matches!(rule, Rule::String(_)),
                        external: None,
                    })
                }
                rule => {
                    return Err(GenerateError::InvalidExtra {
                        name: format!("{rule:?}"),
                    })
                }
            };
            extras.push(terminal);
        }
        Ok(extras)
    }

    fn word(&self) -> Result<Option<usize>, GenerateError> {
        let Some(name) = &self.grammar.word else {
            return Ok(None);
        };
        match self.by_name.get(name) {
            Some(&Sym::Terminal(terminal)) if self.terminals[terminal].regex.is_some() => Ok(Some(terminal)),
            _ => Err(GenerateError::InvalidWordToken { name: name.clone() }),
        }
    }

    fn declare_supertypes(&mut self) -> Result<(), GenerateError> {
        for name in &self.grammar.supertypes {
            let Some(&Sym::NonTerminal(variable)) = self.by_name.get(name) else {
                return Err(GenerateError::InvalidSupertype { name: name.clone() });
            };
            let variable = &mut self.variables[variable];
            variable.visible = false;
            variable.supertype = true;
        }
        Ok(())
    }

    fn flatten_rules(&mut self) -> Result<(), GenerateError> {
        let grammar = self.grammar;
        for (name, rule) in &grammar.rules {
            let Some(&Sym::NonTerminal(variable)) = self.by_name.get(name) else {
                continue;
            };
            let mut context = Context::default();
            if let Some(level) = self.symbol_precedences.get(name) {
                context.precedence = Precedence::Name(level.clone());
            }
            let productions = self.flatten(rule, name, &context)?;
            self.variables[variable].productions = dedup(productions);
        }
        Ok(())
    }

    /// Every alternative `rule` can expand to.
    fn flatten(&mut self, rule: &Rule, owner: &str, context: &Context) -> Result<Vec<Production>, GenerateError> {
        Ok(match rule {
            Rule::Blank => vec![Production::default()],
            Rule::String(text) => {
                let terminal = self.intern_string(text);
                vec![single(context.step(Sym::Terminal(terminal)))]
            }
            Rule::Pattern(_) => {
                let terminal = self.intern_inline_token(rule, owner)?;
                vec![single(context.step(Sym::Terminal(terminal)))]
            }
            Rule::Symbol(name) => {
                let Some(&symbol) = self.by_name.get(name) else {
                    return Err(GenerateError::UndefinedSymbol {
                        name: name.clone(),
                        rule: owner.to_string(),
                    });
                };
                vec![single(context.step(symbol))]
            }
            Rule::Seq(items) => {
                let mut alternatives = vec![Production::default()];
                for item in items {
                    let tails = self.flatten(item, owner, context)?;
                    alternatives = alternatives
                        .iter()
                        .flat_map(|head| {
                            tails.iter().map(move |tail| {
                                let mut joined = head.clone();
                                joined.steps.extend(tail.steps.iter().cloned());
                                joined.dynamic_precedence = stronger(joined.dynamic_precedence, tail.dynamic_precedence);
                                joined
                            })
                        })
                        .collect();
                }
                alternatives
            }
            Rule::Choice(options) => {
                let mut alternatives = Vec::new();
                for option in options {
                    alternatives.extend(self.flatten(option, owner, context)?);
                }
                alternatives
            }
            Rule::Repeat(inner) => {
                let aux = self.expand_repeat(inner, owner, context)?;
                let step = Step {
                    symbol: Sym::NonTerminal(aux),
                    precedence: context.precedence.clone(),
                    associativity: context.associativity,
                    field: None,
                    alias: None,
                };
                vec![single(step)]
            }
            Rule::Metadata { params, rule: inner } => {
                if params.token {
                    let terminal = self.intern_inline_token(rule, owner)?;
                    let context = context.apply(params);
                    return Ok(vec![single(context.step(Sym::Terminal(terminal)))]);
                }
                if let Precedence::Name(name) = &params.precedence {
                    if !self.declared_precedences.contains(name) {
                        return Err(GenerateError::UndefinedPrecedence { name: name.clone() });
                    }
                }
                let mut alternatives = self.flatten(inner, owner, &context.apply(params))?;
                for production in &mut alternatives {
                    production.dynamic_precedence = stronger(production.dynamic_precedence, params.dynamic_precedence);
                }
                alternatives
            }
        })
    }

    /// Hidden left-recursive helper `aux -> aux body | body`.
    fn expand_repeat(&mut self, inner: &Rule, owner: &str, context: &Context) -> Result<usize, GenerateError> {
        let key = (inner.clone(), context.clone());
        if let Some(&aux) = self.repeats.get(&key) {
            return Ok(aux);
        }
        let count = self.repeats.len() + 1;
        self.variables.push(Variable {
            name: format!("{owner}_repeat{count}"),
            visible: false,
            supertype: false,
            productions: Vec::new(),
        });
        let aux = self.variables.len() - 1;
        self.repeats.insert(key, aux);

        let body = self.flatten(inner, owner, context)?;
        let mut productions = Vec::with_capacity(body.len() * 2);
        for alternative in &body {
            let mut recursive = single(Step {
                symbol: Sym::NonTerminal(aux),
                precedence: Precedence::None,
                associativity: None,
                field: None,
                alias: None,
            });
            recursive.steps.extend(alternative.steps.iter().cloned());
            recursive.dynamic_precedence = alternative.dynamic_precedence;
            productions.push(recursive);
        }
        productions.extend(body);
        self.variables[aux].productions = dedup(productions);
        Ok(aux)
    }

    fn intern_string(&mut self, text: &str) -> usize {
        if let Some(&terminal) = self.strings.get(text) {
            return terminal;
        }
        let regex = Regex::Seq(text.chars().map(|c| Regex::Set(lexical::CharSet::single(c))).collect());
        let terminal = self.push_terminal(Terminal {
            name: text.to_string(),
            visible: true,
            named: false,
            regex: Some(regex),
            precedence: 0,
            immediate: false,
            is_string: true,
            external: None,
        });
        self.strings.insert(text.to_string(), terminal);
        terminal
    }

    fn intern_inline_token(&mut self, rule: &Rule, owner: &str) -> Result<usize, GenerateError> {
        // Field and alias wrappers apply to the step, not the token text.
        let body = strip_step_metadata(rule);
        if let Some(&terminal) = self.inline_tokens.get(body) {
            return Ok(terminal);
        }
        let name = format!("_{owner}_token{}", self.inline_tokens.len() + 1);
        let regex = lexical::to_regex(body, &name)?;
        let terminal = self.push_terminal(Terminal {
            name,
            visible: false,
            named: true,
            regex: Some(regex),
            precedence: lexical_precedence(body),
            immediate: is_immediate(body),
            is_string: false,
            external: None,
        });
        self.inline_tokens.insert(body.clone(), terminal);
        Ok(terminal)
    }

    fn push_terminal(&mut self, terminal: Terminal) -> usize {
        self.terminals.push(terminal);
        self.terminals.len() - 1
    }

    /// The start rule must derive at least one finite string.
    fn check_productive(&self, start: &str) -> Result<(), GenerateError> {
        let mut productive = vec![false; self.variables.len()];
        let mut changed = true;
        while changed {
            changed = false;
            for (index, variable) in self.variables.iter().enumerate() {
                if productive[index] {
                    continue;
                }
                let derives = variable.productions.iter().any(|production| {
                    production.steps.iter().all(|step| match step.symbol {
                        Sym::Terminal(_) => true,
                        Sym::NonTerminal(other) => productive[other],
                    })
                });
                if derives {
                    productive[index] = true;
                    changed = true;
                }
            }
        }
        if productive.first().copied().unwrap_or(false) {
            Ok(())
        } else {
            Err(GenerateError::UnreachableStart {
                name: start.to_string(),
            })
        }
    }
}

fn single(step: Step) -> Production {
    Production {
        steps: vec![step],
        dynamic_precedence: 0,
    }
}

fn stronger(a: i16, b: i16) -> i16 {
    if b.unsigned_abs() > a.unsigned_abs() {
        b
    } else {
        a
    }
}

fn dedup(productions: Vec<Production>) -> Vec<Production> {
    let mut unique: Vec<Production> = Vec::with_capacity(productions.len());
    for production in productions {
        if !unique.contains(&production) {
            unique.push(production);
        }
    }
    unique
}

fn strip_step_metadata(rule: &Rule) -> &Rule {
    match rule {
        Rule::Metadata { params, rule: inner }
            if !params.token && (params.field.is_some() || params.alias.is_some()) =>
        {
            strip_step_metadata(inner)
        }
        _ => rule,
    }
}

/// First integer precedence inside a token rule.
fn lexical_precedence(rule: &Rule) -> i32 {
    match rule {
        Rule::Metadata { params, rule } => match params.precedence {
            Precedence::Integer(value) => value,
            _ => lexical_precedence(rule),
        },
        Rule::Seq(rules) | Rule::Choice(rules) => rules.iter().map(lexical_precedence).find(|&p| p != 0).unwrap_or(0),
        Rule::Repeat(rule) => lexical_precedence(rule),
        _ => 0,
    }
}

fn is_immediate(rule: &Rule) -> bool {
    match rule {
        Rule::Metadata { params, rule } => params.immediate || is_immediate(rule),
        _ => false,
    }
}
