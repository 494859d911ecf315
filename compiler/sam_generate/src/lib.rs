//! Grammar compiler for the sam parser runtime.
//!
//! Turns a [`Grammar`] written with the [`rules`] DSL into the
//! [`GrammarTable`] that `sam_ir::Language` loads:
//!
//! 1. **Prepare**: rule-level tokens become terminals, strings and inline
//!    patterns are interned, repeats become hidden left-recursive helpers
//!    and every rule is flattened into productions.
//! 2. **LR**: FIRST sets, then the LALR(1) automaton. Conflicts that
//!    precedence and associativity settle are resolved; the rest stay as
//!    multi-action cells for the GLR parser and are reported.
//! 3. **Lexical**: keywords are split off the word token, everything else
//!    goes through a Thompson NFA and subset construction.

mod build;
mod error;
mod first;
pub mod grammar;
mod lexical;
mod lr;
mod precedence;
mod prepare;
pub mod rules;

use std::fmt;

use sam_ir::GrammarTable;

pub use error::GenerateError;
pub use grammar::{Grammar, PrecedenceEntry};

/// A parse-table cell left with more than one action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub state: usize,
    /// Name of the lookahead terminal.
    pub lookahead: String,
    /// `"shift"` or `"reduce <rule> (<n> children)"`, in table order.
    pub actions: Vec<String>,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "state {} on `{}`: {}",
            self.state,
            self.lookahead,
            self.actions.join(" / ")
        )
    }
}

/// Output of [`generate`].
#[derive(Clone, Debug)]
pub struct Generated {
    pub table: GrammarTable,
    pub conflicts: Vec<Conflict>,
}

impl Generated {
    /// The table in the binary envelope accepted by `Language::load`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GenerateError> {
        Ok(self.table.to_bytes()?)
    }
}

/// Compile `grammar` into a parse table.
#[tracing::instrument(level = "debug", skip_all, fields(grammar = %grammar.name))]
pub fn generate(grammar: &Grammar) -> Result<Generated, GenerateError> {
    let prepared = prepare::prepare(grammar)?;
    let automaton = lr::build(&prepared);
    let table = build::build_table(&prepared, &automaton)?;
    for conflict in &automaton.conflicts {
        tracing::debug!(%conflict, "unresolved conflict");
    }
    Ok(Generated {
        table,
        conflicts: automaton.conflicts,
    })
}
