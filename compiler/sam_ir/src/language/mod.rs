//! Loaded, validated grammar handle.
//!
//! A [`Language`] wraps a decoded [`GrammarTable`] together with indexes
//! derived at load time (lex modes per parser state, name lookups, keyword
//! map). It is cheap to clone and safe to share across threads: every
//! parser and every tree holds one, and none of them mutate it.

mod error;
mod validate;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use sam_lexer_core::ExternalScanner;

use crate::table::{
    checksum, GrammarTable, Keyword, ParseAction, HEADER_LEN, MAGIC, MIN_COMPATIBLE_VERSION,
    TABLE_VERSION,
};
use crate::{FieldId, StateId, SymbolId, SymbolInfo};

pub use error::GrammarLoadError;

/// Creates a fresh external scanner for each parser.
pub type ScannerFactory = Arc<dyn Fn() -> Box<dyn ExternalScanner> + Send + Sync>;

/// Identifier of a deduplicated [`LexMode`].
pub type LexModeId = u16;

/// Lex mode used for tokens lexed while several stack versions were active.
/// Never equal to a real mode, so such tokens are never reused.
pub const UNION_LEX_MODE: LexModeId = u16::MAX;

/// What the lexer may produce in a given parser state.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexMode {
    /// Valid terminals, indexed by symbol id (the end symbol is never set).
    pub valid: Box<[bool]>,
    /// Valid external tokens, indexed by external scanner index.
    pub external_valid: Box<[bool]>,
    pub allows_extras: bool,
}

impl LexMode {
    /// Merge another mode into this one (used when several stack versions
    /// share one lookahead token).
    pub fn union_with(&mut self, other: &LexMode) {
        for (valid, &other_valid) in self.valid.iter_mut().zip(other.valid.iter()) {
            *valid |= other_valid;
        }
        for (valid, &other_valid) in self.external_valid.iter_mut().zip(other.external_valid.iter()) {
            *valid |= other_valid;
        }
        self.allows_extras |= other.allows_extras;
    }

    #[inline]
    pub fn is_valid(&self, symbol: SymbolId) -> bool {
        self.valid.get(symbol.index()).copied().unwrap_or(false)
    }

    #[inline]
    pub fn has_externals(&self) -> bool {
        self.external_valid.iter().any(|&v| v)
    }
}

struct LanguageInner {
    table: GrammarTable,
    version: u16,
    lex_modes: Vec<LexMode>,
    state_lex_modes: Vec<LexModeId>,
    error_valid: Box<[bool]>,
    is_extra: Vec<bool>,
    kinds: FxHashMap<(String, bool), SymbolId>,
    fields: FxHashMap<String, FieldId>,
    keywords: FxHashMap<String, usize>,
    scanner: Option<ScannerFactory>,
}

/// Shared handle to a loaded grammar.
#[derive(Clone)]
pub struct Language(Arc<LanguageInner>);

impl Language {
    /// Load a serialized table.
    ///
    /// Fails on a malformed envelope, an unsupported version, a checksum
    /// mismatch, an undecodable payload, an inconsistent table, or a table
    /// that needs an external scanner.
    pub fn load(bytes: &[u8]) -> Result<Language, GrammarLoadError> {
        Self::load_inner(bytes, None)
    }

    /// Load a serialized table whose grammar declares external tokens.
    pub fn load_with_scanner(bytes: &[u8], scanner: ScannerFactory) -> Result<Language, GrammarLoadError> {
        Self::load_inner(bytes, Some(scanner))
    }

    fn load_inner(bytes: &[u8], scanner: Option<ScannerFactory>) -> Result<Language, GrammarLoadError> {
        if bytes.len() < HEADER_LEN {
            return Err(GrammarLoadError::Truncated {
                len: bytes.len(),
                needed: HEADER_LEN,
            });
        }
        if bytes[..4] != MAGIC {
            return Err(GrammarLoadError::BadMagic);
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if !(MIN_COMPATIBLE_VERSION..=TABLE_VERSION).contains(&version) {
            return Err(GrammarLoadError::UnsupportedVersion {
                found: version,
                min: MIN_COMPATIBLE_VERSION,
                max: TABLE_VERSION,
            });
        }
        let mut stored = [0u8; 8];
        stored.copy_from_slice(&bytes[6..HEADER_LEN]);
        let expected = u64::from_le_bytes(stored);
        let payload = &bytes[HEADER_LEN..];
        let found = checksum(payload);
        if expected != found {
            return Err(GrammarLoadError::ChecksumMismatch { expected, found });
        }
        let table: GrammarTable = bincode::deserialize(payload)?;
        Self::build(table, version, scanner)
    }

    /// Build a handle straight from an in-memory table (still validated).
    pub fn from_table(table: GrammarTable) -> Result<Language, GrammarLoadError> {
        Self::build(table, TABLE_VERSION, None)
    }

    /// Like [`from_table`](Self::from_table), with an external scanner.
    pub fn from_table_with_scanner(
        table: GrammarTable,
        scanner: ScannerFactory,
    ) -> Result<Language, GrammarLoadError> {
        Self::build(table, TABLE_VERSION, Some(scanner))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(name = %table.name))]
    fn build(
        table: GrammarTable,
        version: u16,
        scanner: Option<ScannerFactory>,
    ) -> Result<Language, GrammarLoadError> {
        validate::validate(&table)?;
        if !table.external_tokens.is_empty() && scanner.is_none() {
            return Err(GrammarLoadError::MissingExternalScanner {
                language: table.name.clone(),
                count: table.external_tokens.len(),
            });
        }

        let mut is_extra = vec![false; table.symbols.len()];
        for extra in &table.extras {
            is_extra[extra.index()] = true;
        }

        let (lex_modes, state_lex_modes) = compute_lex_modes(&table, &is_extra);
        let error_valid = error_mode_terminals(&lex_modes, usize::from(table.terminal_count));

        let mut kinds = FxHashMap::default();
        for (id, info) in table.symbols.iter().enumerate().skip(1) {
            let id = SymbolId(u16::try_from(id).unwrap_or(u16::MAX));
            kinds.entry((info.name.clone(), info.named)).or_insert(id);
        }
        let fields = table
            .field_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), FieldId(u16::try_from(i).unwrap_or(u16::MAX))))
            .collect();
        let keywords = table
            .keywords
            .iter()
            .enumerate()
            .map(|(i, keyword)| (keyword.text.clone(), i))
            .collect();

        tracing::debug!(
            states = table.state_count,
            symbols = table.symbols.len(),
            lex_modes = lex_modes.len(),
            "grammar table loaded"
        );

        Ok(Language(Arc::new(LanguageInner {
            table,
            version,
            lex_modes,
            state_lex_modes,
            error_valid,
            is_extra,
            kinds,
            fields,
            keywords,
            scanner,
        })))
    }

    #[inline]
    pub fn table(&self) -> &GrammarTable {
        &self.0.table
    }

    pub fn name(&self) -> &str {
        &self.0.table.name
    }

    /// Format version of the table this handle was loaded from.
    pub fn version(&self) -> u16 {
        self.0.version
    }

    pub fn symbol_count(&self) -> usize {
        self.0.table.symbols.len()
    }

    pub fn state_count(&self) -> usize {
        usize::from(self.0.table.state_count)
    }

    pub fn field_count(&self) -> usize {
        self.0.table.field_names.len()
    }

    /// Two handles refer to the same loaded grammar.
    pub fn ptr_eq(&self, other: &Language) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn symbol_info(&self, symbol: SymbolId) -> Option<&SymbolInfo> {
        self.0.table.symbols.get(symbol.index())
    }

    /// Node kind name. The builtin error symbol is `"ERROR"`.
    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        if symbol.is_error() {
            return "ERROR";
        }
        self.symbol_info(symbol).map_or("", |info| info.name.as_str())
    }

    pub fn is_visible(&self, symbol: SymbolId) -> bool {
        symbol.is_error() || self.symbol_info(symbol).is_some_and(|info| info.visible)
    }

    pub fn is_named(&self, symbol: SymbolId) -> bool {
        symbol.is_error() || self.symbol_info(symbol).is_some_and(|info| info.named)
    }

    #[inline]
    pub fn is_extra(&self, symbol: SymbolId) -> bool {
        self.0.is_extra.get(symbol.index()).copied().unwrap_or(false)
    }

    /// Look up a node kind id by name.
    pub fn id_for_node_kind(&self, name: &str, named: bool) -> Option<SymbolId> {
        if named && name == "ERROR" {
            return Some(SymbolId::ERROR);
        }
        self.0.kinds.get(&(name.to_string(), named)).copied()
    }

    pub fn field_name_for_id(&self, field: FieldId) -> Option<&str> {
        self.0.table.field_names.get(field.index()).map(String::as_str)
    }

    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        self.0.fields.get(name).copied()
    }

    #[inline]
    pub fn actions(&self, state: StateId, terminal: SymbolId) -> &[ParseAction] {
        self.0.table.actions(state, terminal)
    }

    #[inline]
    pub fn goto(&self, state: StateId, nonterminal: SymbolId) -> Option<StateId> {
        self.0.table.goto(state, nonterminal)
    }

    #[inline]
    pub fn is_terminal(&self, symbol: SymbolId) -> bool {
        self.0.table.is_terminal(symbol)
    }

    /// Deduplicated lex mode id for a parser state.
    #[inline]
    pub fn lex_mode_for_state(&self, state: StateId) -> LexModeId {
        self.0.state_lex_modes.get(state.index()).copied().unwrap_or(0)
    }

    #[inline]
    pub fn lex_mode(&self, id: LexModeId) -> &LexMode {
        &self.0.lex_modes[usize::from(id).min(self.0.lex_modes.len() - 1)]
    }

    /// Whether the lexer may fall back to `symbol` when nothing valid in the
    /// current state matches. Terminals only valid where extras are not
    /// (immediate tokens, string contents) never qualify.
    #[inline]
    pub fn is_error_lexable(&self, symbol: SymbolId) -> bool {
        self.0.error_valid.get(symbol.index()).copied().unwrap_or(false)
    }

    pub fn keyword(&self, text: &str) -> Option<&Keyword> {
        self.0.keywords.get(text).map(|&i| &self.0.table.keywords[i])
    }

    pub fn word_token(&self) -> Option<SymbolId> {
        self.0.table.word_token
    }

    pub fn external_tokens(&self) -> &[SymbolId] {
        &self.0.table.external_tokens
    }

    /// Create a scanner instance for a new parser, if the grammar uses one.
    pub fn new_external_scanner(&self) -> Option<Box<dyn ExternalScanner>> {
        self.0.scanner.as_ref().map(|factory| factory())
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.0.table.name)
            .field("version", &self.0.version)
            .field("states", &self.0.table.state_count)
            .field("symbols", &self.0.table.symbols.len())
            .finish_non_exhaustive()
    }
}

fn compute_lex_modes(table: &GrammarTable, is_extra: &[bool]) -> (Vec<LexMode>, Vec<LexModeId>) {
    let terminals = usize::from(table.terminal_count);
    let mut modes: Vec<LexMode> = Vec::new();
    let mut index: FxHashMap<LexMode, LexModeId> = FxHashMap::default();
    let mut per_state = Vec::with_capacity(usize::from(table.state_count));

    for state in 0..table.state_count {
        let state = StateId(state);
        let allows_extras = table.allows_extras[state.index()];
        let mut valid = vec![false; terminals];
        for (t, slot) in valid.iter_mut().enumerate().skip(1) {
            let symbol = SymbolId(u16::try_from(t).unwrap_or(u16::MAX));
            *slot = !table.actions(state, symbol).is_empty() || (allows_extras && is_extra[t]);
        }
        let external_valid = table
            .external_tokens
            .iter()
            .map(|symbol| valid[symbol.index()])
            .collect();
        let mode = LexMode {
            valid: valid.into_boxed_slice(),
            external_valid,
            allows_extras,
        };
        let id = *index.entry(mode.clone()).or_insert_with(|| {
            modes.push(mode);
            LexModeId::try_from(modes.len() - 1).unwrap_or(UNION_LEX_MODE - 1)
        });
        per_state.push(id);
    }
    (modes, per_state)
}

/// Terminals valid in at least one mode that allows extras.
fn error_mode_terminals(modes: &[LexMode], terminals: usize) -> Box<[bool]> {
    let mut valid = vec![false; terminals];
    for mode in modes.iter().filter(|mode| mode.allows_extras) {
        for (slot, &mode_valid) in valid.iter_mut().zip(mode.valid.iter()) {
            *slot |= mode_valid;
        }
    }
    valid.into_boxed_slice()
}
