//! Serialized grammar table.
//!
//! The table is produced offline by the grammar compiler (`sam_generate`)
//! and loaded at runtime through [`Language::load`](crate::Language::load).
//!
//! # Binary Envelope
//!
//! ```text
//! [ "SAMT" | version: u16 LE | checksum: u64 LE | bincode payload ... ]
//! ```
//!
//! The checksum is an `FxHash` of the payload bytes; it catches truncated
//! or corrupted tables before bincode gets a chance to decode garbage into
//! a plausible-looking table.

use std::hash::Hasher;

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{FieldId, ProductionId, StateId, SymbolId, SymbolInfo};

/// Magic bytes at the start of every serialized table.
pub const MAGIC: [u8; 4] = *b"SAMT";

/// Format version written by this crate.
pub const TABLE_VERSION: u16 = 1;

/// Oldest format version this crate can still read.
pub const MIN_COMPATIBLE_VERSION: u16 = 1;

/// Envelope header size: magic + version + checksum.
pub const HEADER_LEN: usize = 4 + 2 + 8;

/// One parse action for a (state, terminal) pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseAction {
    /// Consume the lookahead and push `state`.
    Shift { state: StateId },
    /// Pop `child_count` non-extra entries and build a `symbol` node.
    Reduce {
        symbol: SymbolId,
        child_count: u16,
        dynamic_precedence: i16,
        production_id: ProductionId,
    },
    /// Input accepted (only on the end symbol).
    Accept,
}

/// Actions for a single (state, terminal) cell. More than one action marks
/// an unresolved conflict, handled by forking the parse stack.
pub type ActionList = SmallVec<[ParseAction; 2]>;

/// Per-child metadata of a production.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionStep {
    /// Node kind shown for this child instead of its own symbol.
    pub alias: Option<SymbolId>,
    /// Field name attached to this child.
    pub field: Option<FieldId>,
}

/// Reduction metadata indexed by [`ProductionId`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    pub lhs: SymbolId,
    pub dynamic_precedence: i16,
    pub steps: Vec<ProductionStep>,
}

/// Inclusive code-point range transition of the lexical automaton.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexTransition {
    pub start: u32,
    pub end: u32,
    pub target: u32,
}

/// One state of the lexical DFA.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexState {
    /// Sorted, non-overlapping transitions.
    pub transitions: Vec<LexTransition>,
    /// Terminals accepted in this state, highest priority first.
    pub accepts: Vec<SymbolId>,
}

impl LexState {
    /// Follow the transition for `c`, if any.
    pub fn next(&self, c: char) -> Option<u32> {
        let c = u32::from(c);
        let idx = self.transitions.partition_point(|t| t.end < c);
        self.transitions
            .get(idx)
            .filter(|t| t.start <= c)
            .map(|t| t.target)
    }
}

/// Keyword recognized by re-checking the word token's text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    pub symbol: SymbolId,
    /// Reserved keywords win over the word token even where the keyword
    /// itself is not valid.
    pub reserved: bool,
}

/// The complete compiled grammar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarTable {
    pub name: String,
    /// All symbols, laid out as described in [`crate::symbol`].
    pub symbols: Vec<SymbolInfo>,
    /// Number of terminals including the end symbol.
    pub terminal_count: u16,
    pub nonterminal_count: u16,
    pub start_symbol: SymbolId,
    pub field_names: Vec<String>,
    pub productions: Vec<Production>,
    pub state_count: u16,
    /// Dense `state_count * terminal_count` matrix of indices into
    /// `action_lists` (index 0 is the empty list).
    pub action_index: Vec<u16>,
    pub action_lists: Vec<ActionList>,
    /// Dense `state_count * nonterminal_count` matrix of goto states.
    pub gotos: Vec<StateId>,
    /// Whether extras may be lexed in each state.
    pub allows_extras: Vec<bool>,
    pub extras: Vec<SymbolId>,
    /// Terminals produced by the external scanner, by scanner index.
    pub external_tokens: Vec<SymbolId>,
    pub word_token: Option<SymbolId>,
    pub keywords: Vec<Keyword>,
    pub lex_states: Vec<LexState>,
    pub lex_start: u32,
}

impl GrammarTable {
    /// Actions for `(state, terminal)`.
    #[inline]
    pub fn actions(&self, state: StateId, terminal: SymbolId) -> &[ParseAction] {
        if terminal.index() >= usize::from(self.terminal_count) || state.index() >= usize::from(self.state_count) {
            return &[];
        }
        let idx = self.action_index[state.index() * usize::from(self.terminal_count) + terminal.index()];
        &self.action_lists[usize::from(idx)]
    }

    /// Goto state for `(state, nonterminal)`.
    #[inline]
    pub fn goto(&self, state: StateId, nonterminal: SymbolId) -> Option<StateId> {
        let nt = nonterminal.index().checked_sub(usize::from(self.terminal_count))?;
        if nt >= usize::from(self.nonterminal_count) || state.index() >= usize::from(self.state_count) {
            return None;
        }
        let target = self.gotos[state.index() * usize::from(self.nonterminal_count) + nt];
        (!target.is_none()).then_some(target)
    }

    #[inline]
    pub fn is_terminal(&self, symbol: SymbolId) -> bool {
        symbol.index() < usize::from(self.terminal_count)
    }

    #[inline]
    pub fn is_nonterminal(&self, symbol: SymbolId) -> bool {
        !self.is_terminal(symbol)
            && symbol.index() < usize::from(self.terminal_count) + usize::from(self.nonterminal_count)
    }

    /// Encode into the binary envelope.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        let payload = bincode::serialize(self)?;
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&TABLE_VERSION.to_le_bytes());
        out.extend_from_slice(&checksum(&payload).to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }
}

/// Checksum used by the binary envelope.
pub fn checksum(payload: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(payload);
    hasher.finish()
}

#[cfg(test)]
pub(crate) mod fixture;
#[cfg(test)]
mod tests;
