//! Grammar symbol, state, field and production identifiers.
//!
//! Symbol ids are stable across loads of the same table, so external query
//! engines can match on [`SymbolId`] values as well as on node kind names.
//!
//! # Layout
//!
//! ```text
//! 0                      end of input
//! 1 .. terminal_count    terminals (tokens)
//! .. + nonterminals      nonterminals (rules)
//! .. + aliases           alias-only names
//! 0xFFFF                 ERROR (builtin, not stored in the table)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Grammar symbol identifier.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u16);

impl SymbolId {
    /// End of input.
    pub const END: SymbolId = SymbolId(0);
    /// Builtin error symbol, used for ERROR nodes and unlexable input.
    pub const ERROR: SymbolId = SymbolId(u16::MAX);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 == u16::MAX
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_error() {
            write!(f, "sym#ERROR")
        } else {
            write!(f, "sym#{}", self.0)
        }
    }
}

/// Parser state identifier.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize)]
pub struct StateId(pub u16);

impl StateId {
    /// Initial parser state.
    pub const START: StateId = StateId(0);
    /// Placeholder for "no state" in dense goto tables.
    pub const NONE: StateId = StateId(u16::MAX);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u16::MAX
    }
}

/// Field name identifier (index into the table's field list).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct FieldId(pub u16);

impl FieldId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Production identifier (index into the table's production list).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize)]
pub struct ProductionId(pub u16);

impl ProductionId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Display and structural metadata for one symbol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Node kind name (`"binary_expression"`, `"+"`).
    pub name: String,
    /// Visible symbols appear in the public node API; hidden ones are
    /// spliced into their parent's children.
    pub visible: bool,
    /// Named symbols come from rules; anonymous ones are literal tokens.
    pub named: bool,
    /// Declared as a supertype (always hidden).
    pub supertype: bool,
}

impl SymbolInfo {
    pub fn named(name: impl Into<String>) -> Self {
        SymbolInfo {
            name: name.into(),
            visible: true,
            named: true,
            supertype: false,
        }
    }

    pub fn anonymous(name: impl Into<String>) -> Self {
        SymbolInfo {
            name: name.into(),
            visible: true,
            named: false,
            supertype: false,
        }
    }

    pub fn hidden(name: impl Into<String>) -> Self {
        SymbolInfo {
            name: name.into(),
            visible: false,
            named: true,
            supertype: false,
        }
    }
}
