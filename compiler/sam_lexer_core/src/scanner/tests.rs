use super::*;
use crate::SourceBuffer;
use pretty_assertions::assert_eq;

/// Recognizes `/* ... */` comments with nesting.
struct NestedComment;

impl ExternalScanner for NestedComment {
    fn scan(&mut self, ctx: &mut ScanContext<'_, '_>, valid_symbols: &[bool]) -> bool {
        if !valid_symbols.first().copied().unwrap_or(false) {
            return false;
        }
        if ctx.lookahead() != Some('/') {
            return false;
        }
        ctx.advance();
        if ctx.lookahead() != Some('*') {
            return false;
        }
        ctx.advance();
        let mut depth = 1u32;
        let mut prev = '\0';
        while let Some(c) = ctx.lookahead() {
            ctx.advance();
            match (prev, c) {
                ('/', '*') => {
                    depth += 1;
                    prev = '\0';
                    continue;
                }
                ('*', '/') => {
                    depth -= 1;
                    if depth == 0 {
                        ctx.mark_end();
                        ctx.set_result(0);
                        return true;
                    }
                    prev = '\0';
                    continue;
                }
                _ => {}
            }
            prev = c;
        }
        false
    }

    fn serialize(&self, _buffer: &mut Vec<u8>) {}

    fn deserialize(&mut self, _state: &[u8]) {}
}

fn run(source: &str) -> Option<ScannedToken> {
    let buf = SourceBuffer::new(source);
    let mut cursor = buf.cursor();
    let mut ctx = ScanContext::new(&mut cursor);
    let accepted = NestedComment.scan(&mut ctx, &[true]);
    ctx.finish(accepted)
}

#[test]
fn scans_nested_comment() {
    let token = run("/* a /* b */ c */ rest");
    assert_eq!(token.map(|t| t.end.byte), Some(17));
    assert_eq!(token.map(|t| t.index), Some(0));
}

#[test]
fn unterminated_comment_is_rejected() {
    assert_eq!(run("/* a /* b */"), None);
}

#[test]
fn rejection_rewinds_cursor() {
    let buf = SourceBuffer::new("/x");
    let mut cursor = buf.cursor();
    let mut ctx = ScanContext::new(&mut cursor);
    let accepted = NestedComment.scan(&mut ctx, &[true]);
    assert!(ctx.finish(accepted).is_none());
    assert_eq!(cursor.pos(), 0);
}

#[test]
fn invalid_symbol_is_not_scanned() {
    let buf = SourceBuffer::new("/* x */");
    let mut cursor = buf.cursor();
    let mut ctx = ScanContext::new(&mut cursor);
    let accepted = NestedComment.scan(&mut ctx, &[false]);
    assert!(ctx.finish(accepted).is_none());
}

#[test]
fn reach_covers_examined_input() {
    let token = run("/**/x");
    assert_eq!(token.map(|t| t.end.byte), Some(4));
    // The scanner never looked past the closing `/`.
    assert_eq!(token.map(|t| t.reach), Some(4));
}
