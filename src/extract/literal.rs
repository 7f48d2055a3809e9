//! Restricted JS object-literal evaluation.
//!
//! A recursive-descent parser for the data subset of JS literals: objects,
//! arrays, strings (single- or double-quoted), numbers, booleans, `null`, and
//! `undefined` (mapped to null), with unquoted keys and trailing commas.
//! Anything executable — identifiers, calls, operators — fails the parse, so
//! captured page state is evaluated with no dynamic-code surface at all.

use serde_json::{Map, Number, Value};

/// Maximum container nesting accepted before the parse fails. Matches the
/// recursion limit `serde_json` applies to untrusted input.
const MAX_LITERAL_DEPTH: usize = 128;

/// Parses a JS data literal into a JSON value.
///
/// Returns `None` unless the whole input is a single literal value. Nesting
/// deeper than [`MAX_LITERAL_DEPTH`] fails the parse.
pub fn parse_literal(input: &str) -> Option<Value> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
        depth: 0,
    };
    parser.skip_trivia();
    let value = parser.parse_value()?;
    parser.skip_trivia();
    if parser.pos != parser.chars.len() {
        return None;
    }
    Some(value)
}

/// Captures a brace-balanced `{...}` block starting at `open`, skipping
/// braces inside string literals. Returns the block including both braces.
pub fn capture_balanced(content: &str, open: usize) -> Option<&str> {
    let bytes = content.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string: Option<u8> = None;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == quote {
                in_string = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' | b'`' => in_string = Some(b),
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[open..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
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

    /// Skips whitespace and `//` / `/* */` comments.
    fn skip_trivia(&mut self) {
        loop {
            while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.pos += 1;
            }
            if self.peek() == Some('/') && self.chars.get(self.pos + 1) == Some(&'/') {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.pos += 1;
                }
                continue;
            }
            if self.peek() == Some('/') && self.chars.get(self.pos + 1) == Some(&'*') {
                self.pos += 2;
                while self.pos < self.chars.len() {
                    if self.peek() == Some('*') && self.chars.get(self.pos + 1) == Some(&'/') {
                        self.pos += 2;
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }
            return;
        }
    }

    fn parse_value(&mut self) -> Option<Value> {
        self.skip_trivia();
        if self.depth >= MAX_LITERAL_DEPTH {
            return None;
        }
        self.depth += 1;
        let value = match self.peek()? {
            '{' => self.parse_object(),
            '[' => self.parse_array(),
            '"' | '\'' => self.parse_string().map(Value::String),
            c if c == '-' || c.is_ascii_digit() => self.parse_number(),
            c if c.is_alphabetic() => self.parse_keyword(),
            _ => None,
        }?;
        self.depth -= 1;
        Some(value)
    }

    fn parse_object(&mut self) -> Option<Value> {
        if !self.eat('{') {
            return None;
        }
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            if self.eat('}') {
                return Some(Value::Object(map));
            }
            let key = self.parse_key()?;
            self.skip_trivia();
            if !self.eat(':') {
                return None;
            }
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                return Some(Value::Object(map));
            }
            return None;
        }
    }

    fn parse_array(&mut self) -> Option<Value> {
        if !self.eat('[') {
            return None;
        }
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(']') {
                return Some(Value::Array(items));
            }
            items.push(self.parse_value()?);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat(']') {
                return Some(Value::Array(items));
            }
            return None;
        }
    }

    /// Object keys: quoted strings, bare identifiers, or bare numbers.
    fn parse_key(&mut self) -> Option<String> {
        match self.peek()? {
            '"' | '\'' => self.parse_string(),
            c if c.is_alphanumeric() || c == '_' || c == '$' => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '$')
                {
                    self.pos += 1;
                }
                Some(self.chars[start..self.pos].iter().collect())
            }
            _ => None,
        }
    }

    fn parse_string(&mut self) -> Option<String> {
        let quote = self.bump()?;
        let mut out = String::new();
        loop {
            let c = self.bump()?;
            if c == quote {
                return Some(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            match self.bump()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                '0' => out.push('\0'),
                'u' => {
                    let mut code = 0u32;
                    for _ in 0..4 {
                        code = code * 16 + self.bump()?.to_digit(16)?;
                    }
                    out.push(char::from_u32(code)?);
                }
                other => out.push(other),
            }
        }
    }

    fn parse_number(&mut self) -> Option<Value> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || c == '+' || c == '-')
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if let Ok(i) = text.parse::<i64>() {
            return Some(Value::Number(Number::from(i)));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    }

    /// Bare words: only the data keywords are allowed. Any other identifier
    /// means executable code and fails the parse.
    fn parse_keyword(&mut self) -> Option<Value> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '$') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            "null" | "undefined" => Some(Value::Null),
            _ => None,
        }
    }
}
