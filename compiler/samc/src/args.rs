//! Option parsing shared by the commands.

use sam_parse::ParserOptions;

use crate::CliError;

/// One `<start>:<end>:<text>` replacement, in byte offsets of the text it
/// applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditArg {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl EditArg {
    /// Check the offsets against `text`.
    pub fn validate(&self, text: &str) -> Result<(), CliError> {
        let fits = self.start <= self.end
            && self.end <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end);
        if fits {
            Ok(())
        } else {
            Err(CliError::EditOutOfRange {
                start: self.start,
                end: self.end,
                len: text.len(),
            })
        }
    }
}

/// Parse `<start>:<end>:<text>`. The text may itself contain `:`, and `\n`
/// and `\t` in it stand for a newline and a tab.
pub fn parse_edit(arg: &str) -> Result<EditArg, CliError> {
    let invalid = || CliError::InvalidEdit(arg.to_owned());
    let mut parts = arg.splitn(3, ':');
    let start = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
    let end = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
    let text = parts.next().ok_or_else(invalid)?;
    Ok(EditArg {
        start,
        end,
        text: text.replace("\\n", "\n").replace("\\t", "\t"),
    })
}

/// Split parser limit flags (`--max-versions=N` and friends) from the
/// remaining arguments.
pub fn parse_parser_options(args: &[String]) -> Result<(ParserOptions, Vec<String>), CliError> {
    let mut options = ParserOptions::default();
    let mut rest = Vec::new();
    for arg in args {
        if let Some(value) = arg.strip_prefix("--max-versions=") {
            options.max_versions = count("--max-versions", value)?;
        } else if let Some(value) = arg.strip_prefix("--max-pop-depth=") {
            options.max_pop_depth = count("--max-pop-depth", value)?;
        } else if let Some(value) = arg.strip_prefix("--max-missing=") {
            options.max_missing_insertions = count("--max-missing", value)?;
        } else if let Some(value) = arg.strip_prefix("--max-reduce-steps=") {
            options.max_reduce_steps = count("--max-reduce-steps", value)?;
        } else if arg.starts_with("--max-") {
            return Err(CliError::UnknownOption(arg.clone()));
        } else {
            rest.push(arg.clone());
        }
    }
    Ok((options, rest))
}

fn count(option: &'static str, value: &str) -> Result<usize, CliError> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 || option == "--max-missing" => Ok(n),
        _ => Err(CliError::InvalidValue {
            option,
            value: value.to_owned(),
        }),
    }
}
