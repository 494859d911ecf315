use sam_ir::{Node, Tree};
use sam_stack::ensure_sufficient_stack;

use crate::{Diagnostic, ErrorCode};

/// Longest excerpt of skipped text quoted in a message.
const MAX_EXCERPT: usize = 24;

/// Diagnostics for every ERROR and MISSING node in `tree`, in source
/// order. `source` is the text the tree was parsed from.
///
/// An ERROR node holding nothing but lexer ERROR leaves is reported through
/// its leaves only.
pub fn collect(tree: &Tree, source: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if tree.has_error() {
        visit(tree.root_node(), source, &mut diagnostics);
    }
    diagnostics
}

fn visit(node: Node<'_>, source: &str, diagnostics: &mut Vec<Diagnostic>) {
    ensure_sufficient_stack(|| {
        if node.is_missing() {
            diagnostics.push(missing(node));
            return;
        }
        if node.is_error() {
            if node.subtree().is_leaf() {
                diagnostics.push(unrecognized(node, source));
                return;
            }
            if !holds_only_lexer_errors(node) {
                diagnostics.push(unexpected(node, source));
                return;
            }
        }
        for child in node.children().filter(Node::has_error) {
            visit(child, source, diagnostics);
        }
    });
}

fn holds_only_lexer_errors(node: Node<'_>) -> bool {
    let mut children = node.children().peekable();
    children.peek().is_some() && children.all(|c| c.is_error() && c.subtree().is_leaf())
}

fn missing(node: Node<'_>) -> Diagnostic {
    let message = if node.is_named() {
        format!("missing {}", node.kind().trim_start_matches('_'))
    } else {
        format!("missing `{}`", node.kind())
    };
    Diagnostic::error(ErrorCode::E1002, message).with_range(node.range())
}

fn unrecognized(node: Node<'_>, source: &str) -> Diagnostic {
    let text = node.utf8_text(source).unwrap_or_default();
    let noun = if text.chars().count() == 1 {
        "character"
    } else {
        "characters"
    };
    Diagnostic::error(
        ErrorCode::E0001,
        format!("unrecognized {noun} `{}`", excerpt(text)),
    )
    .with_range(node.range())
}

fn unexpected(node: Node<'_>, source: &str) -> Diagnostic {
    let text = node.utf8_text(source).unwrap_or_default().trim();
    let message = if text.is_empty() {
        "unexpected end of input".to_owned()
    } else {
        format!("unexpected `{}`", excerpt(text))
    };
    let mut diagnostic = Diagnostic::error(ErrorCode::E1001, message).with_range(node.range());
    if let Some(kinds) = skipped_kinds(node) {
        diagnostic = diagnostic.with_note(format!("skipped {kinds}"));
    }
    diagnostic
}

/// Named kinds directly inside an ERROR node, when there are any.
fn skipped_kinds(node: Node<'_>) -> Option<String> {
    let kinds: Vec<&str> = node.named_children().map(|c| c.kind()).collect();
    (!kinds.is_empty()).then(|| kinds.join(", "))
}

/// First line of `text`, cut to `MAX_EXCERPT` characters.
fn excerpt(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut excerpt: String = line.chars().take(MAX_EXCERPT).collect();
    if excerpt.len() < text.len() {
        excerpt.push_str("...");
    }
    excerpt
}
