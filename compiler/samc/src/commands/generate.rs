//! The `generate` command: write the sam tables to disk.

use std::path::Path;

use sam_generate::Conflict;

use crate::CliError;

/// What `generate` wrote.
#[derive(Clone, Debug)]
pub struct GenerateReport {
    pub bytes: usize,
    /// Cells kept with several actions; the parser forks on them.
    pub conflicts: Vec<Conflict>,
}

/// Compile the sam grammar and write the serialized tables to `output`.
#[tracing::instrument(level = "debug", skip_all, fields(output = %output.display()))]
pub fn generate_tables(output: &Path) -> Result<GenerateReport, CliError> {
    let generated = sam_generate::generate(&sam_grammar::grammar())?;
    let bytes = generated.to_bytes()?;
    std::fs::write(output, &bytes).map_err(|source| CliError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    Ok(GenerateReport {
        bytes: bytes.len(),
        conflicts: generated.conflicts,
    })
}
