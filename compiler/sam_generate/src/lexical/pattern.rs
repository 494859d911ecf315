//! Parser for the regular expression subset used by grammars.
//!
//! Supported: literals, `.`, classes (`[a-z]`, `[^..]`), the escapes
//! `\d \D \s \S \w \W \n \r \t \f \v \0 \xHH \uHHHH \u{H..}`, groups
//! (`(..)`, `(?:..)`), alternation and the quantifiers `* + ? {n} {n,}
//! {n,m}`. Anchors, backreferences and lazy quantifiers are rejected.

use super::charset::CharSet;
use super::Regex;
use crate::GenerateError;

pub(crate) fn parse(source: &str) -> Result<Regex, GenerateError> {
    let mut parser = PatternParser {
        source,
        chars: source.chars().collect(),
        pos: 0,
    };
    let regex = parser.alternation()?;
    if parser.pos < parser.chars.len() {
        return Err(parser.error("unbalanced `)`"));
    }
    Ok(regex)
}

struct PatternParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl PatternParser<'_> {
    fn error(&self, message: &'static str) -> GenerateError {
        GenerateError::InvalidPattern {
            pattern: self.source.to_string(),
            offset: self.pos,
            message,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn alternation(&mut self) -> Result<Regex, GenerateError> {
        let mut alternatives = vec![self.sequence()?];
        while self.eat('|') {
            alternatives.push(self.sequence()?);
        }
        Ok(if alternatives.len() == 1 {
            alternatives.swap_remove(0)
        } else {
            Regex::Alt(alternatives)
        })
    }

    fn sequence(&mut self) -> Result<Regex, GenerateError> {
        let mut items = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            let atom = self.atom()?;
            items.push(self.quantified(atom)?);
        }
        Ok(match items.len() {
            0 => Regex::Empty,
            1 => items.swap_remove(0),
            _ => Regex::Seq(items),
        })
    }

    fn quantified(&mut self, atom: Regex) -> Result<Regex, GenerateError> {
        let (min, max) = match self.peek() {
            Some('*') => {
                self.pos += 1;
                (0, None)
            }
            Some('+') => {
                self.pos += 1;
                (1, None)
            }
            Some('?') => {
                self.pos += 1;
                (0, Some(1))
            }
            Some('{') => match self.counted() {
                Some(bounds) => bounds,
                None => return Ok(atom),
            },
            _ => return Ok(atom),
        };
        if self.peek() == Some('?') {
            return Err(self.error("lazy quantifiers are not supported"));
        }
        if max.is_some_and(|max| max < min) {
            return Err(self.error("quantifier range is inverted"));
        }
        Ok(Regex::Repeat {
            inner: Box::new(atom),
            min,
            max,
        })
    }

    /// `{n}`, `{n,}` or `{n,m}`, consumed through the closing brace. A `{`
    /// that does not start a valid count is left alone and lexes as a
    /// literal.
    fn counted(&mut self) -> Option<(u32, Option<u32>)> {
        let start = self.pos;
        self.pos += 1;
        let bounds = self.count_bounds();
        if bounds.is_none() {
            self.pos = start;
        }
        bounds
    }

    fn count_bounds(&mut self) -> Option<(u32, Option<u32>)> {
        let min = self.number()?;
        let max = if self.eat(',') {
            if self.peek() == Some('}') {
                None
            } else {
                Some(self.number()?)
            }
        } else {
            Some(min)
        };
        self.eat('}').then_some((min, max))
    }

    fn number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        self.chars[start..self.pos].iter().collect::<String>().parse().ok()
    }

    fn atom(&mut self) -> Result<Regex, GenerateError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unexpected end of pattern"));
        };
        match c {
            '(' => {
                if self.eat('?') && !self.eat(':') {
                    return Err(self.error("only `(?:` groups are supported"));
                }
                let inner = self.alternation()?;
                if !self.eat(')') {
                    return Err(self.error("unclosed group"));
                }
                Ok(inner)
            }
            '[' => self.class().map(Regex::Set),
            '.' => Ok(Regex::Set(CharSet::single('\n').negated())),
            '\\' => self.escape(false).map(Regex::Set),
            '*' | '+' | '?' => Err(self.error("nothing to repeat")),
            '^' | '$' => Err(self.error("anchors are not supported")),
            c => Ok(Regex::Set(CharSet::single(c))),
        }
    }

    fn class(&mut self) -> Result<CharSet, GenerateError> {
        let negated = self.eat('^');
        let mut set = CharSet::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error("unclosed character class"));
            };
            if c == ']' {
                break;
            }
            let item = if c == '\\' { self.escape(true)? } else { CharSet::single(c) };
            let single = item.ranges().first().filter(|&&(s, e)| s == e && item.ranges().len() == 1).map(|&(s, _)| s);
            if let (Some(low), Some('-')) = (single, self.peek()) {
                if self.chars.get(self.pos + 1).is_some_and(|&next| next != ']') {
                    self.pos += 1;
                    let high = match self.bump() {
                        Some('\\') => self.escape(true)?,
                        Some(c) => CharSet::single(c),
                        None => return Err(self.error("unclosed character class")),
                    };
                    let Some(&(high, _)) = high.ranges().first() else {
                        return Err(self.error("invalid class range"));
                    };
                    if high < low {
                        return Err(self.error("class range is inverted"));
                    }
                    set.add_range(low, high);
                    continue;
                }
            }
            set.add_set(&item);
        }
        Ok(if negated { set.negated() } else { set })
    }

    fn escape(&mut self, in_class: bool) -> Result<CharSet, GenerateError> {
        let Some(c) = self.bump() else {
            return Err(self.error("dangling escape"));
        };
        let set = match c {
            'd' => CharSet::digits(),
            'D' => CharSet::digits().negated(),
            's' => CharSet::whitespace(),
            'S' => CharSet::whitespace().negated(),
            'w' => CharSet::word(),
            'W' => CharSet::word().negated(),
            'n' => CharSet::single('\n'),
            'r' => CharSet::single('\r'),
            't' => CharSet::single('\t'),
            'f' => CharSet::single('\u{c}'),
            'v' => CharSet::single('\u{b}'),
            '0' => CharSet::single('\0'),
            'x' => self.hex(2).map(|v| CharSet::range(v, v))?,
            'u' if self.eat('{') => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                if !self.eat('}') {
                    return Err(self.error("unclosed `\\u{`"));
                }
                let value = u32::from_str_radix(&digits, 16).map_err(|_| self.error("invalid `\\u{}` escape"))?;
                CharSet::range(value, value)
            }
            'u' => self.hex(4).map(|v| CharSet::range(v, v))?,
            'b' if in_class => CharSet::single('\u{8}'),
            'b' | 'B' => return Err(self.error("word boundaries are not supported")),
            c if c.is_ascii_digit() => return Err(self.error("backreferences are not supported")),
            c => CharSet::single(c),
        };
        Ok(set)
    }

    fn hex(&mut self, digits: usize) -> Result<u32, GenerateError> {
        let end = self.pos + digits;
        let Some(slice) = self.chars.get(self.pos..end) else {
            return Err(self.error("truncated hex escape"));
        };
        let text: String = slice.iter().collect();
        let value = u32::from_str_radix(&text, 16).map_err(|_| self.error("invalid hex escape"))?;
        self.pos = end;
        Ok(value)
    }
}
