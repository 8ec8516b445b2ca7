//! Restricted literal evaluator for parameter defaults.
//!
//! Accepts a narrow Python literal grammar and produces JSON values:
//! numbers (ints, floats, `0x`/`0o`/`0b`, `_` separators, unary sign),
//! strings (single, double, triple quoted, `r` prefix, adjacent
//! concatenation), `True`/`False`/`None`, lists, tuples (as lists) and
//! dicts with string keys. Names, calls, operators, sets and everything
//! else are rejected; nothing is ever executed.

use crate::error::LiteralError;
use serde_json::{Map, Number, Value};

/// Bracket nesting limit, same as serde_json's recursion limit.
const MAX_DEPTH: usize = 128;

/// Evaluate `src` as a single literal expression.
pub fn parse_literal(src: &str) -> Result<Value, LiteralError> {
    let mut p = Parser {
        src,
        pos: 0,
        depth: 0,
    };
    p.skip_ws();
    if p.at_end() {
        return Err(p.error("empty expression"));
    }
    let value = p.value()?;
    p.skip_ws();
    if !p.at_end() {
        return Err(p.error("unexpected trailing input"));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, want: char) -> Result<(), LiteralError> {
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected `{want}`, found `{c}`"))),
            None => Err(self.error(format!("expected `{want}`, found end of input"))),
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => self.sequence('[', ']').map(|(items, _)| Value::Array(items)),
            Some('(') => self.parenthesized(),
            Some('{') => self.dict(),
            Some('\'') | Some('"') => self.strings(),
            Some('-') | Some('+') => self.signed(),
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(false),
            Some(c) if c.is_alphabetic() || c == '_' => self.word(),
            Some(c) => Err(self.error(format!("unsupported syntax `{c}`"))),
        }
    }

    fn signed(&mut self) -> Result<Value, LiteralError> {
        let negative = self.bump() == Some('-');
        self.skip_ws();
        match self.peek() {
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(negative),
            _ => Err(self.error("unary sign is only allowed before a number")),
        }
    }

    // Identifier-like tokens: constants, string prefixes, or rejected names.
    fn word(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(self.rest().len());
        let word = &self.src[start..start + len];
        let followed_by_quote = matches!(
            self.src[start + len..].chars().next(),
            Some('\'') | Some('"')
        );
        if followed_by_quote {
            return match word {
                "r" | "R" | "u" | "U" => self.strings(),
                _ => Err(self.error(format!("unsupported string prefix `{word}`"))),
            };
        }
        let value = match word {
            "True" => Value::Bool(true),
            "False" => Value::Bool(false),
            "None" => Value::Null,
            _ => return Err(self.error(format!("unsupported name `{word}`"))),
        };
        self.pos += len;
        Ok(value)
    }

    // One or more adjacent string literals, concatenated.
    fn strings(&mut self) -> Result<Value, LiteralError> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_ws();
            let next_is_string = match self.peek() {
                Some('\'') | Some('"') => true,
                Some('r') | Some('R') | Some('u') | Some('U') => {
                    matches!(self.rest()[1..].chars().next(), Some('\'') | Some('"'))
                }
                _ => false,
            };
            if !next_is_string {
                self.pos = save;
                break;
            }
            out.push_str(&self.string()?);
        }
        Ok(Value::String(out))
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let mut raw = false;
        if let Some(c) = self.peek() {
            if matches!(c, 'r' | 'R') {
                raw = true;
                self.bump();
            } else if matches!(c, 'u' | 'U') {
                self.bump();
            }
        }
        let start = self.pos;
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected string literal")),
        };
        let triple: String = std::iter::repeat(quote).take(3).collect();
        let is_triple = self.src[start..].starts_with(&triple);
        if is_triple {
            self.pos = start + 3;
        }
        let mut out = String::new();
        loop {
            if is_triple && self.rest().starts_with(&triple) {
                self.pos += 3;
                return Ok(out);
            }
            let c = match self.bump() {
                Some(c) => c,
                None => {
                    return Err(LiteralError {
                        offset: start,
                        message: "unterminated string literal".into(),
                    })
                }
            };
            match c {
                c if c == quote && !is_triple => return Ok(out),
                '\n' if !is_triple => {
                    return Err(LiteralError {
                        offset: start,
                        message: "unterminated string literal".into(),
                    })
                }
                '\\' if raw => {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                }
                '\\' => self.escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let c = self
            .bump()
            .ok_or_else(|| self.error("unterminated escape sequence"))?;
        match c {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            'x' => out.push(self.hex_escape(2)?),
            'u' => out.push(self.hex_escape(4)?),
            'U' => out.push(self.hex_escape(8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, LiteralError> {
        let rest = self.rest();
        let hex = rest.get(..digits).filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()));
        let code = hex
            .and_then(|h| u32::from_str_radix(h, 16).ok())
            .ok_or_else(|| self.error("invalid hex escape"))?;
        let ch = char::from_u32(code).ok_or_else(|| self.error("invalid unicode escape"))?;
        self.pos += digits;
        Ok(ch)
    }

    fn number(&mut self, negative: bool) -> Result<Value, LiteralError> {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(self.rest().len());
        let mut token = &self.src[start..start + len];
        // Exponent signs are not part of the scan above.
        let mut end = start + len;
        if (token.ends_with('e') || token.ends_with('E'))
            && !token.starts_with("0x")
            && !token.starts_with("0X")
        {
            let tail = &self.src[end..];
            if tail.starts_with('+') || tail.starts_with('-') {
                let digits = tail[1..]
                    .find(|c: char| !(c.is_ascii_digit() || c == '_'))
                    .unwrap_or(tail.len() - 1);
                end += 1 + digits;
                token = &self.src[start..end];
            }
        }
        if token.contains("__") || token.ends_with('_') {
            return Err(self.error(format!("invalid number `{token}`")));
        }
        let cleaned = token.replace('_', "");
        let value = parse_number(&cleaned, negative)
            .ok_or_else(|| self.error(format!("invalid number `{token}`")))?;
        self.pos = end;
        Ok(value)
    }

    fn parenthesized(&mut self) -> Result<Value, LiteralError> {
        let (mut items, trailing_comma) = self.sequence('(', ')')?;
        if items.len() == 1 && !trailing_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Array(items))
    }

    // Comma separated values between `open` and `close`; reports whether a
    // comma followed the last item so `(1)` and `(1,)` can be told apart.
    fn sequence(&mut self, open: char, close: char) -> Result<(Vec<Value>, bool), LiteralError> {
        self.nested(|p| p.sequence_items(open, close))
    }

    fn sequence_items(
        &mut self,
        open: char,
        close: char,
    ) -> Result<(Vec<Value>, bool), LiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.bump();
                return Ok((items, trailing_comma));
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                    trailing_comma = true;
                }
                Some(c) if c == close => {
                    trailing_comma = false;
                }
                _ => return Err(self.error(format!("expected `,` or `{close}`"))),
            }
        }
    }

    fn dict(&mut self) -> Result<Value, LiteralError> {
        self.nested(Self::dict_items)
    }

    // Brackets recurse; bail out before the stack does.
    fn nested<T>(
        &mut self,
        inner: impl FnOnce(&mut Self) -> Result<T, LiteralError>,
    ) -> Result<T, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let result = inner(self);
        self.depth -= 1;
        result
    }

    fn dict_items(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }
            let key_at = self.pos;
            let key = match self.value()? {
                Value::String(s) => s,
                _ => {
                    return Err(LiteralError {
                        offset: key_at,
                        message: "dict keys must be strings".into(),
                    })
                }
            };
            self.skip_ws();
            match self.peek() {
                Some(':') => {
                    self.bump();
                }
                Some(',') | Some('}') => return Err(self.error("sets are not supported")),
                _ => return Err(self.error("expected `:` after dict key")),
            }
            let value = self.value()?;
            map.insert(key, value);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                _ => return Err(self.error("expected `,` or `}`")),
            }
        }
    }
}

fn parse_number(token: &str, negative: bool) -> Option<Value> {
    let lower = token.to_ascii_lowercase();
    let radix = match lower.get(..2) {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let n = i64::from_str_radix(&lower[2..], radix).ok()?;
        return Some(Value::from(if negative { -n } else { n }));
    }
    let is_float = lower.contains('.') || lower.contains('e');
    if !is_float {
        if !lower.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        // Python rejects leading zeros on non-zero decimals.
        if lower.len() > 1 && lower.starts_with('0') && lower.chars().any(|c| c != '0') {
            return None;
        }
        let n: i64 = lower.parse().ok()?;
        return Some(Value::from(if negative { -n } else { n }));
    }
    if !lower
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | '+' | '-'))
    {
        return None;
    }
    let f: f64 = lower.parse().ok()?;
    Number::from_f64(if negative { -f } else { f }).map(Value::Number)
}
