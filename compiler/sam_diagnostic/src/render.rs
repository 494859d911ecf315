use std::fmt::Write as _;

use sam_ir::Range;

use crate::Diagnostic;

/// 1-based line and column of a byte offset. Columns count characters.
pub fn line_col(source: &str, offset: u32) -> (u32, u32) {
    let offset = (offset as usize).min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let line = before.bytes().filter(|&b| b == b'\n').count();
    let column = before[line_start..].chars().count();
    (saturate(line) + 1, saturate(column) + 1)
}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX - 1)
}

/// Plain-text report: one `name:line:col: error[CODE]: message` header per
/// diagnostic, followed by the source line with the range underlined.
pub fn render(name: &str, source: &str, diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        match diagnostic.range {
            Some(range) => {
                let (line, column) = line_col(source, range.start_byte);
                let _ = writeln!(
                    out,
                    "{name}:{line}:{column}: error[{}]: {}",
                    diagnostic.code, diagnostic.message
                );
                snippet(&mut out, source, range, line, column);
            }
            None => {
                let _ = writeln!(out, "{name}: error[{}]: {}", diagnostic.code, diagnostic.message);
            }
        }
        for note in &diagnostic.notes {
            let _ = writeln!(out, "  = note: {note}");
        }
    }
    out
}

fn snippet(out: &mut String, source: &str, range: Range, line: u32, column: u32) {
    let Some(text) = source.lines().nth(line as usize - 1) else {
        return;
    };
    let gutter = line.to_string().len();
    let start = range.start_byte as usize;
    let end = (range.end_byte as usize).min(source.len());
    let underlined = source
        .get(start..end)
        .map_or(0, |s| s.lines().next().unwrap_or_default().chars().count())
        .max(1);
    let _ = writeln!(out, "{line:>gutter$} | {text}");
    let _ = writeln!(
        out,
        "{:gutter$} | {}{}",
        "",
        " ".repeat(column as usize - 1),
        "^".repeat(underlined)
    );
}

#[cfg(test)]
mod tests;
