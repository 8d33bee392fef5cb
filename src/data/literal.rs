// src/data/literal.rs

//! A strict parser and printer for the small literal language used by the
//! state file: one mapping per line, e.g.
//!
//! ```text
//! {'file': b'/var/log/messages', 'offset': 1234, 'inode': 98765}
//! ```
//!
//! Only literal values are recognized: dicts, tuples, lists, integers,
//! `str` and `bytes` strings, `None`, `True` and `False`. Anything else,
//! e.g. a name or an operator, is an error.

use std::fmt;
use std::io::{Error, ErrorKind, Result};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// A parsed literal value.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<Literal>),
    List(Vec<Literal>),
    /// key/value pairs in source order
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Look up the value of a `str` key in a [`Literal::Dict`].
    pub fn dict_get(&self, key: &str) -> Option<&Literal> {
        match self {
            Literal::Dict(pairs) => pairs
                .iter()
                .find(|(k, _)| matches!(k, Literal::Str(s) if s == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(i) => Some(*i),
            Literal::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }
}

/// Parse exactly one literal from `src`, surrounding whitespace allowed.
pub fn parse_literal(src: &str) -> Result<Literal> {
    defn!("({:?})", src);
    let mut parser = Parser { src, pos: 0, depth: 0 };
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos != src.len() {
        defx!("trailing data at {}", parser.pos);
        return Err(parser.error("unexpected trailing data"));
    }
    defx!("{:?}", value);

    Ok(value)
}

/// Deepest nesting of dicts, tuples and lists accepted.
pub const LITERAL_NESTING_MAX: usize = 64;

struct Parser<'a> {
    src: &'a str,
    /// byte offset into `src`
    pos: usize,
    /// open dicts, tuples and lists
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, msg: &str) -> Error {
        Error::new(
            ErrorKind::InvalidData,
            format!("{} at offset {} of literal {:?}", msg, self.pos, self.src),
        )
    }

    #[inline(always)]
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, want: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            _ => Err(self.error(&format!("expected {:?}", want))),
        }
    }

    fn parse_value(&mut self) -> Result<Literal> {
        self.skip_whitespace();
        match self.peek() {
            Some('{') | Some('(') | Some('[') => {
                if self.depth >= LITERAL_NESTING_MAX {
                    return Err(self.error("nested too deeply"));
                }
                self.depth += 1;
                let value = self.parse_container();
                self.depth -= 1;
                value
            }
            _ => self.parse_scalar(),
        }
    }

    fn parse_container(&mut self) -> Result<Literal> {
        match self.peek() {
            Some('{') => self.parse_dict(),
            Some('(') => {
                self.pos += 1;
                let (items, trailing_comma) = self.parse_items(')')?;
                // `(1)` is a parenthesized value, `(1,)` is a tuple
                if items.len() == 1 && !trailing_comma {
                    return Ok(items.into_iter().next().unwrap_or(Literal::None));
                }
                Ok(Literal::Tuple(items))
            }
            Some('[') => {
                self.pos += 1;
                let (items, _) = self.parse_items(']')?;
                Ok(Literal::List(items))
            }
            _ => Err(self.error("unexpected character")),
        }
    }

    fn parse_scalar(&mut self) -> Result<Literal> {
        match self.peek() {
            None => Err(self.error("unexpected end")),
            Some('\'') | Some('"') => Ok(Literal::Str(self.parse_string(false, false)?.1)),
            Some(c) if c == '-' || c == '+' || c.is_ascii_digit() => self.parse_int(),
            Some(c) if c.is_ascii_alphabetic() => self.parse_word(),
            Some(_) => Err(self.error("unexpected character")),
        }
    }

    /// Comma separated values up to `close`. Also returns whether the last
    /// value was followed by a comma.
    fn parse_items(&mut self, close: char) -> Result<(Vec<Literal>, bool)> {
        let mut items = Vec::<Literal>::new();
        let mut trailing_comma = false;
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok((items, trailing_comma));
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => trailing_comma = true,
                Some(c) if c == close => return Ok((items, false)),
                _ => return Err(self.error(&format!("expected ',' or {:?}", close))),
            }
        }
    }

    fn parse_dict(&mut self) -> Result<Literal> {
        self.expect('{')?;
        let mut pairs = Vec::<(Literal, Literal)>::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Literal::Dict(pairs));
            }
            let key = self.parse_value()?;
            self.skip_whitespace();
            self.expect(':')?;
            let value = self.parse_value()?;
            pairs.push((key, value));
            self.skip_whitespace();
            match self.bump() {
                Some(',') => {}
                Some('}') => return Ok(Literal::Dict(pairs)),
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn parse_int(&mut self) -> Result<Literal> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }
        while let Some(c) = self.peek() {
            if !(c.is_ascii_digit() || c == '_') {
                break;
            }
            self.pos += 1;
        }
        let digits: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        match digits.parse::<i64>() {
            Ok(i) => Ok(Literal::Int(i)),
            Err(_) => Err(self.error("invalid integer")),
        }
    }

    /// Keywords and string prefixes.
    fn parse_word(&mut self) -> Result<Literal> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            self.pos += 1;
        }
        let word = &self.src[start..self.pos];
        match word {
            "None" => return Ok(Literal::None),
            "True" => return Ok(Literal::Bool(true)),
            "False" => return Ok(Literal::Bool(false)),
            _ => {}
        }
        if !matches!(self.peek(), Some('\'') | Some('"')) {
            self.pos = start;
            return Err(self.error("names are not literals"));
        }
        let lower = word.to_ascii_lowercase();
        let (bytes, raw) = match lower.as_str() {
            "b" => (true, false),
            "u" => (false, false),
            "r" => (false, true),
            "br" | "rb" => (true, true),
            _ => {
                self.pos = start;
                return Err(self.error("unknown string prefix"));
            }
        };
        let (data, text) = self.parse_string(bytes, raw)?;
        if bytes {
            return Ok(Literal::Bytes(data));
        }

        Ok(Literal::Str(text))
    }

    /// Parse a quoted string. Returns the raw bytes (for `bytes` literals)
    /// and the text (for `str` literals); only the one asked for is filled.
    fn parse_string(
        &mut self,
        bytes: bool,
        raw: bool,
    ) -> Result<(Vec<u8>, String)> {
        let quote = match self.bump() {
            Some(q @ '\'') | Some(q @ '"') => q,
            _ => return Err(self.error("expected quote")),
        };
        let mut data = Vec::<u8>::new();
        let mut text = String::new();
        macro_rules! push_char {
            ($c:expr) => {{
                let c: char = $c;
                if bytes {
                    if !c.is_ascii() {
                        return Err(self.error("bytes can only contain ASCII literal characters"));
                    }
                    data.push(c as u8);
                } else {
                    text.push(c);
                }
            }};
        }
        loop {
            let c = match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated string")),
                Some(c) => c,
            };
            if c == quote {
                return Ok((data, text));
            }
            if c != '\\' {
                push_char!(c);
                continue;
            }
            let esc = match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(e) => e,
            };
            if raw {
                push_char!('\\');
                push_char!(esc);
                continue;
            }
            match esc {
                '\\' => push_char!('\\'),
                '\'' => push_char!('\''),
                '"' => push_char!('"'),
                'a' => push_char!('\x07'),
                'b' => push_char!('\x08'),
                'f' => push_char!('\x0c'),
                'n' => push_char!('\n'),
                'r' => push_char!('\r'),
                't' => push_char!('\t'),
                'v' => push_char!('\x0b'),
                'x' => {
                    let value = self.parse_hex(2)?;
                    if bytes {
                        data.push(value as u8);
                    } else {
                        text.push(char::from_u32(value).ok_or_else(|| self.error("invalid \\x escape"))?);
                    }
                }
                'u' | 'U' if !bytes => {
                    let len = if esc == 'u' { 4 } else { 8 };
                    let value = self.parse_hex(len)?;
                    text.push(char::from_u32(value).ok_or_else(|| self.error("invalid unicode escape"))?);
                }
                '0'..='7' => {
                    let mut value: u32 = esc as u32 - '0' as u32;
                    for _ in 0..2 {
                        match self.peek() {
                            Some(d @ '0'..='7') => {
                                value = value * 8 + (d as u32 - '0' as u32);
                                self.pos += 1;
                            }
                            _ => break,
                        }
                    }
                    if bytes {
                        data.push((value & 0xFF) as u8);
                    } else {
                        text.push(char::from_u32(value).ok_or_else(|| self.error("invalid octal escape"))?);
                    }
                }
                _ => {
                    // unknown escapes are kept verbatim
                    push_char!('\\');
                    push_char!(esc);
                }
            }
        }
    }

    fn parse_hex(&mut self, len: usize) -> Result<u32> {
        let end = self.pos + len;
        if end > self.src.len() || !self.src.is_char_boundary(end) {
            return Err(self.error("truncated hex escape"));
        }
        let value = u32::from_str_radix(&self.src[self.pos..end], 16)
            .map_err(|_| self.error("invalid hex escape"))?;
        self.pos = end;

        Ok(value)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// printing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Write `data` as a `bytes` literal, e.g. `b'/var/log/x\xff'`.
pub fn repr_bytes(data: &[u8]) -> String {
    let quote: u8 = if data.contains(&b'\'') && !data.contains(&b'"') { b'"' } else { b'\'' };
    let mut out = String::with_capacity(data.len() + 3);
    out.push('b');
    out.push(quote as char);
    for byte in data.iter() {
        match *byte {
            b'\\' => out.push_str("\\\\"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if b == quote => {
                out.push('\\');
                out.push(b as char);
            }
            b if !(0x20..0x7f).contains(&b) => out.push_str(&format!("\\x{:02x}", b)),
            b => out.push(b as char),
        }
    }
    out.push(quote as char);

    out
}

/// Write `text` as a `str` literal, e.g. `'file'`.
pub fn repr_str(text: &str) -> String {
    let quote: char = if text.contains('\'') && !text.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);

    out
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::None => write!(f, "None"),
            Literal::Bool(true) => write!(f, "True"),
            Literal::Bool(false) => write!(f, "False"),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Str(s) => write!(f, "{}", repr_str(s)),
            Literal::Bytes(b) => write!(f, "{}", repr_bytes(b)),
            Literal::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Literal::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Literal::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}
