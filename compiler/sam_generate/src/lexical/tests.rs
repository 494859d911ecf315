use pretty_assertions::assert_eq;
use sam_ir::SymbolId;

use super::pattern::parse;
use super::{build_dfa, matches, to_regex, CharSet, Nfa, NfaState, Regex};
use crate::rules::{choice, pattern, repeat1, seq, string, sym};
use crate::GenerateError;

fn accepts(source: &str, text: &str) -> bool {
    matches(&parse(source).unwrap(), text)
}

#[test]
fn charset_merges_and_negates() {
    let mut set = CharSet::single('b');
    set.add_char('a');
    set.add_range(u32::from('c'), u32::from('e'));
    assert_eq!(set.ranges(), &[(u32::from('a'), u32::from('e'))]);

    let negated = set.negated();
    assert!(!negated.contains(u32::from('c')));
    assert!(negated.contains(u32::from('z')));
    assert!(negated.contains(0));
    assert_eq!(negated.negated(), set);
}

#[test]
fn literals_and_classes() {
    assert!(accepts("abc", "abc"));
    assert!(!accepts("abc", "ab"));
    assert!(accepts("[a-c]x", "bx"));
    assert!(!accepts("[^a-c]", "b"));
    assert!(accepts("[^a-c]", "\u{2028}"));
    assert!(accepts(r"[\da-fA-F]", "E"));
    assert!(accepts("a.c", "a-c"));
    assert!(!accepts("a.c", "a\nc"));
}

#[test]
fn quantifiers() {
    assert!(accepts("a*", ""));
    assert!(accepts("a*", "aaaa"));
    assert!(!accepts("a+", ""));
    assert!(accepts("ab?c", "ac"));
    assert!(accepts("ab?c", "abc"));
    assert!(accepts("[0-7]{1,3}", "777"));
    assert!(!accepts("[0-7]{1,3}", "7777"));
    assert!(accepts("x{2}", "xx"));
    assert!(!accepts("x{2}", "x"));
    assert!(accepts("x{2,}", "xxxxx"));
    assert!(accepts(r"\d(_?\d)*", "1_000_0"));
    assert!(!accepts(r"\d(_?\d)*", "1__0"));
}

#[test]
fn a_brace_without_count_is_literal() {
    assert!(accepts(r"u\{[0-9a-fA-F]+\}", "u{1F600}"));
    assert!(accepts("a{", "a{"));
    assert!(accepts("a{x}", "a{x}"));
}

#[test]
fn escapes() {
    assert!(accepts(r"\x41B\u{43}", "ABC"));
    assert!(accepts(r"\s+", " \t\u{a0}\n"));
    assert!(accepts(r"[^\r\n]*", "// anything"));
    assert!(accepts(r"[\r?][\n\u2028\u2029]", "?\u{2029}"));
    assert!(accepts(r"\\", "\\"));
}

#[test]
fn groups_and_alternation() {
    assert!(accepts("(ab|cd)+", "abcdab"));
    assert!(accepts("(?:0x|0X)[0-9]", "0X9"));
    assert!(accepts("a|", ""));
}

#[test]
fn rejects_unsupported_syntax() {
    for source in ["^a", "a$", r"\bword", r"(a)\1", "a*?", "(?=a)", "[a-", "(a", "a)", "*", "[z-a]", "x{3,1}"] {
        assert!(
            matches!(parse(source), Err(GenerateError::InvalidPattern { .. })),
            "{source} should be rejected"
        );
    }
}

#[test]
fn token_rules_lower_to_regexes() {
    let rule = seq([string("0x"), repeat1(pattern("[0-9a-f]")), choice([string("u"), crate::rules::blank()])]);
    let regex = to_regex(&rule, "hex").unwrap();
    assert!(matches(&regex, "0xffu"));
    assert!(matches(&regex, "0x1"));
    assert!(!matches(&regex, "0x"));

    assert_eq!(
        to_regex(&seq([string("a"), sym("b")]), "t").unwrap_err().to_string(),
        "token `t` refers to symbol `b`; tokens may only contain strings and patterns"
    );
}

#[test]
fn dfa_prefers_longest_then_rank() {
    let keyword = to_regex(&string("if"), "if").unwrap();
    let identifier = parse("[a-z]+").unwrap();
    let mut nfa = Nfa::default();
    let mut entries = Vec::new();
    for (terminal, regex) in [&keyword, &identifier].into_iter().enumerate() {
        let accept = nfa.push(NfaState::Accept(terminal));
        entries.push(nfa.add_regex(regex, accept));
    }
    let start = nfa.push(NfaState::Split(entries));
    let symbols = [SymbolId(1), SymbolId(2)];
    let states = build_dfa(&nfa, start, &symbols, &[0, 1]);

    let run = |text: &str| {
        let mut state = 0usize;
        for c in text.chars() {
            state = states[state].next(c).map(|s| s as usize)?;
        }
        Some(states[state].accepts.clone())
    };
    assert_eq!(run("if"), Some(vec![SymbolId(1), SymbolId(2)]));
    assert_eq!(run("ifx"), Some(vec![SymbolId(2)]));
    assert_eq!(run("i"), Some(vec![SymbolId(2)]));
    assert_eq!(run("I"), None);

    for state in &states {
        for pair in state.transitions.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
    }
}

#[test]
fn empty_regex_matches_only_empty() {
    assert!(matches(&Regex::Empty, ""));
    assert!(!matches(&Regex::Empty, "a"));
}
