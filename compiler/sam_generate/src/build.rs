//! Lowering of the prepared grammar and its automata into a [`GrammarTable`].

use rustc_hash::FxHashMap;
use sam_ir::table::{ActionList, GrammarTable, Keyword, ParseAction, Production, ProductionStep};
use sam_ir::{FieldId, ProductionId, StateId, SymbolId, SymbolInfo};

use crate::lexical::{self, Nfa, NfaState};
use crate::lr::{Action, Automaton};
use crate::prepare::{Prepared, Sym};
use crate::rules::Alias;
use crate::GenerateError;

fn to_u16(what: &'static str, count: usize) -> Result<u16, GenerateError> {
    u16::try_from(count)
        .ok()
        .filter(|&n| n < u16::MAX)
        .ok_or(GenerateError::TooLarge { what, count })
}

struct Symbols {
    infos: Vec<SymbolInfo>,
    terminal_count: u16,
    aliases: FxHashMap<Alias, SymbolId>,
}

impl Symbols {
    fn new(grammar: &Prepared) -> Result<Self, GenerateError> {
        let terminal_count = to_u16("terminals", grammar.terminals.len() + 1)?;
        let mut infos = Vec::with_capacity(grammar.terminals.len() + grammar.variables.len() + 1);
        infos.push(SymbolInfo::hidden("end"));
        for terminal in &grammar.terminals {
            infos.push(SymbolInfo {
                name: terminal.name.clone(),
                visible: terminal.visible,
                named: terminal.named,
                supertype: false,
            });
        }
        for variable in &grammar.variables {
            infos.push(SymbolInfo {
                name: variable.name.clone(),
                visible: variable.visible,
                named: true,
                supertype: variable.supertype,
            });
        }

        let mut symbols = Symbols {
            infos,
            terminal_count,
            aliases: FxHashMap::default(),
        };
        let aliases = grammar
            .variables
            .iter()
            .flat_map(|v| &v.productions)
            .flat_map(|p| &p.steps)
            .filter_map(|s| s.alias.as_ref());
        for alias in aliases {
            symbols.alias(alias)?;
        }
        Ok(symbols)
    }

    fn id(&self, symbol: Sym) -> SymbolId {
        let index = match symbol {
            Sym::Terminal(terminal) => terminal + 1,
            Sym::NonTerminal(variable) => usize::from(self.terminal_count) + variable,
        };
        SymbolId(u16::try_from(index).unwrap_or(u16::MAX))
    }

    /// Symbol shown for an alias: an existing visible symbol with the same
    /// name and namedness, or a new alias-only symbol.
    fn alias(&mut self, alias: &Alias) -> Result<SymbolId, GenerateError> {
        if let Some(&id) = self.aliases.get(alias) {
            return Ok(id);
        }
        let existing = self
            .infos
            .iter()
            .skip(1)
            .position(|info| info.visible && info.named == alias.named && info.name == alias.value);
        let id = match existing {
            Some(index) => SymbolId(to_u16("symbols", index + 1)?),
            None => {
                self.infos.push(SymbolInfo {
                    name: alias.value.clone(),
                    visible: true,
                    named: alias.named,
                    supertype: false,
                });
                SymbolId(to_u16("symbols", self.infos.len() - 1)?)
            }
        };
        self.aliases.insert(alias.clone(), id);
        Ok(id)
    }
}

#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn build_table(grammar: &Prepared, automaton: &Automaton) -> Result<GrammarTable, GenerateError> {
    let symbols = Symbols::new(grammar)?;
    let terminal_count = symbols.terminal_count;
    let nonterminal_count = to_u16("rules", grammar.variables.len())?;
    let state_count = to_u16("parse states", automaton.states.len())?;
    to_u16("symbols", symbols.infos.len())?;

    let mut field_names: Vec<String> = grammar
        .variables
        .iter()
        .flat_map(|v| &v.productions)
        .flat_map(|p| &p.steps)
        .filter_map(|s| s.field.clone())
        .collect();
    field_names.sort_unstable();
    field_names.dedup();
    to_u16("fields", field_names.len())?;
    let field_id = |name: &str| {
        field_names
            .binary_search_by(|f| f.as_str().cmp(name))
            .ok()
            .and_then(|i| u16::try_from(i).ok())
            .map(FieldId)
    };

    to_u16("productions", automaton.productions.len())?;
    let mut productions = Vec::with_capacity(automaton.productions.len());
    for &(variable, index) in &automaton.productions {
        let production = &grammar.variables[variable].productions[index];
        let mut steps = Vec::with_capacity(production.steps.len());
        for step in &production.steps {
            let alias = match &step.alias {
                Some(alias) => symbols.aliases.get(alias).copied(),
                None => None,
            };
            steps.push(ProductionStep {
                alias,
                field: step.field.as_deref().and_then(field_id),
            });
        }
        productions.push(Production {
            lhs: symbols.id(Sym::NonTerminal(variable)),
            dynamic_precedence: production.dynamic_precedence,
            steps,
        });
    }

    let terminals = usize::from(terminal_count);
    let nonterminals = usize::from(nonterminal_count);
    let mut action_lists: Vec<ActionList> = vec![ActionList::new()];
    let mut list_ids: FxHashMap<ActionList, u16> = FxHashMap::default();
    list_ids.insert(ActionList::new(), 0);
    let mut action_index = vec![0u16; usize::from(state_count) * terminals];
    let mut gotos = vec![StateId::NONE; usize::from(state_count) * nonterminals];
    let mut allows_extras = Vec::with_capacity(automaton.states.len());

    for (state, lr) in automaton.states.iter().enumerate() {
        for (&terminal, actions) in &lr.actions {
            let mut list = ActionList::new();
            for action in actions {
                list.push(match *action {
                    Action::Shift(target) => ParseAction::Shift {
                        state: StateId(to_u16("parse states", target)?),
                    },
                    Action::Reduce(production) => {
                        let table_production = &productions[production];
                        ParseAction::Reduce {
                            symbol: table_production.lhs,
                            child_count: to_u16("production steps", table_production.steps.len())?,
                            dynamic_precedence: table_production.dynamic_precedence,
                            production_id: ProductionId(to_u16("productions", production)?),
                        }
                    }
                    Action::Accept => ParseAction::Accept,
                });
            }
            let id = match list_ids.get(&list) {
                Some(&id) => id,
                None => {
                    let id = to_u16("action lists", action_lists.len())?;
                    list_ids.insert(list.clone(), id);
                    action_lists.push(list);
                    id
                }
            };
            action_index[state * terminals + terminal] = id;
        }
        for (&variable, &target) in &lr.gotos {
            gotos[state * nonterminals + variable] = StateId(to_u16("parse states", target)?);
        }
        let immediate = lr
            .actions
            .keys()
            .any(|&t| t > 0 && grammar.terminals[t - 1].immediate);
        allows_extras.push(!immediate);
    }

    let lexer = build_lexer(grammar, &symbols)?;

    tracing::debug!(
        symbols = symbols.infos.len(),
        states = state_count,
        action_lists = action_lists.len(),
        lex_states = lexer.states.len(),
        "grammar table built"
    );
    let start_symbol = symbols.id(Sym::NonTerminal(0));
    let extras = grammar.extras.iter().map(|&t| symbols.id(Sym::Terminal(t))).collect();
    let external_tokens = grammar.externals.iter().map(|&t| symbols.id(Sym::Terminal(t))).collect();
    let word_token = grammar.word.map(|t| symbols.id(Sym::Terminal(t)));
    Ok(GrammarTable {
        name: grammar.name.clone(),
        symbols: symbols.infos,
        terminal_count,
        nonterminal_count,
        start_symbol,
        field_names,
        productions,
        state_count,
        action_index,
        action_lists,
        gotos,
        allows_extras,
        extras,
        external_tokens,
        word_token,
        keywords: lexer.keywords,
        lex_states: lexer.states,
        lex_start: 0,
    })
}

struct Lexer {
    states: Vec<sam_ir::table::LexState>,
    keywords: Vec<Keyword>,
}

/// Keyword extraction plus the lexical DFA over every remaining terminal.
fn build_lexer(grammar: &Prepared, symbols: &Symbols) -> Result<Lexer, GenerateError> {
    let word_regex = grammar.word.and_then(|w| grammar.terminals[w].regex.as_ref());

    let mut keywords = Vec::new();
    let mut is_keyword = vec![false; grammar.terminals.len()];
    if let Some(word_regex) = word_regex {
        for (index, terminal) in grammar.terminals.iter().enumerate() {
            if terminal.is_string && terminal.external.is_none() && lexical::matches(word_regex, &terminal.name) {
                is_keyword[index] = true;
                keywords.push(Keyword {
                    text: terminal.name.clone(),
                    symbol: symbols.id(Sym::Terminal(index)),
                    reserved: grammar.reserved.contains(&terminal.name),
                });
            }
        }
    }
    for word in &grammar.reserved {
        if !keywords.iter().any(|k| &k.text == word) {
            tracing::debug!(word = %word, "reserved word is not used by any rule");
        }
    }

    let mut order: Vec<usize> = (0..grammar.terminals.len()).collect();
    order.sort_by_key(|&t| {
        let terminal = &grammar.terminals[t];
        (std::cmp::Reverse(terminal.precedence), !terminal.is_string, t)
    });
    let mut rank = vec![0; grammar.terminals.len()];
    for (position, &terminal) in order.iter().enumerate() {
        rank[terminal] = position;
    }

    let mut nfa = Nfa::default();
    let mut entries = Vec::new();
    for (index, terminal) in grammar.terminals.iter().enumerate() {
        let Some(regex) = &terminal.regex else { continue };
        if lexical::matches(regex, "") {
            return Err(GenerateError::EmptyToken {
                name: terminal.name.clone(),
            });
        }
        if is_keyword[index] {
            continue;
        }
        let accept = nfa.push(NfaState::Accept(index));
        entries.push(nfa.add_regex(regex, accept));
    }
    let start = nfa.push(NfaState::Split(entries));

    let ids: Vec<SymbolId> = (0..grammar.terminals.len())
        .map(|t| symbols.id(Sym::Terminal(t)))
        .collect();
    let states = lexical::build_dfa(&nfa, start, &ids, &rank);
    to_u16("lexer states", states.len())?;
    Ok(Lexer { states, keywords })
}
