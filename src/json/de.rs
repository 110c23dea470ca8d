//! Lenient single-pass parser for structured-data text.
//!
//! The parser never fails. Structural characters drive a small state machine,
//! a stack remembers whether each open container is an array or an object,
//! and everything between separators is either a quoted string or a bare
//! literal whose kind is inferred when it is flushed.

use super::JsonDocument;
use crate::convert::parse_timestamp;
use crate::tree::NodeId;
use crate::value::Value;
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scan {
    Structure,
    Quoted,
    Escape,
    /// Inside `\uXXXX`.
    Unicode { code: u32, digits: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Level {
    Array,
    Object,
}

struct Parser<'d> {
    doc: &'d mut JsonDocument,
    scan: Scan,
    levels: Vec<(NodeId, Level)>,
    containers: usize,
    /// String currently being read.
    buf: String,
    high_surrogate: Option<u32>,
    /// Completed string waiting to become a key or a value.
    quoted: Option<String>,
    bare: String,
    key: Option<String>,
}

impl<'d> Parser<'d> {
    fn new(doc: &'d mut JsonDocument) -> Self {
        Parser {
            doc,
            scan: Scan::Structure,
            levels: Vec::new(),
            containers: 0,
            buf: String::new(),
            high_surrogate: None,
            quoted: None,
            bare: String::new(),
            key: None,
        }
    }

    fn run(mut self, text: &str) {
        for c in text.chars() {
            self.step(c);
        }
        if self.containers == 0 {
            let value = match self.quoted.take() {
                Some(text) => text_value(text),
                None if self.bare.trim().is_empty() => Value::Empty,
                None => infer_literal(self.bare.trim()),
            };
            let root = self.doc.root();
            self.doc.set_value(root, value);
        }
    }

    fn step(&mut self, c: char) {
        match self.scan {
            Scan::Structure => match c {
                '"' => {
                    self.buf.clear();
                    self.scan = Scan::Quoted;
                }
                ':' => {
                    let bare = std::mem::take(&mut self.bare);
                    self.key = self.quoted.take().or_else(|| {
                        let bare = bare.trim();
                        (!bare.is_empty()).then(|| bare.to_string())
                    });
                }
                ',' => self.flush(),
                '{' => self.open(Level::Object),
                '[' => self.open(Level::Array),
                '}' | ']' => {
                    self.flush();
                    self.levels.pop();
                }
                c if c.is_whitespace() && self.bare.is_empty() => {}
                _ => self.bare.push(c),
            },
            Scan::Quoted => match c {
                '\\' => self.scan = Scan::Escape,
                '"' => {
                    self.flush_surrogate();
                    self.quoted = Some(std::mem::take(&mut self.buf));
                    self.scan = Scan::Structure;
                }
                _ => self.push_char(c),
            },
            Scan::Escape => {
                self.scan = Scan::Quoted;
                let decoded = match c {
                    'u' => {
                        self.scan = Scan::Unicode { code: 0, digits: 0 };
                        return;
                    }
                    'b' => '\u{8}',
                    'f' => '\u{c}',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    other => other,
                };
                self.push_char(decoded);
            }
            Scan::Unicode { code, digits } => match c.to_digit(16) {
                Some(digit) => {
                    let code = code * 16 + digit;
                    if digits == 3 {
                        self.scan = Scan::Quoted;
                        self.push_code(code);
                    } else {
                        self.scan = Scan::Unicode {
                            code,
                            digits: digits + 1,
                        };
                    }
                }
                None => {
                    self.scan = Scan::Quoted;
                    self.step(c);
                }
            },
        }
    }

    fn push_char(&mut self, c: char) {
        self.flush_surrogate();
        self.buf.push(c);
    }

    fn push_code(&mut self, code: u32) {
        match (self.high_surrogate.take(), code) {
            (None, 0xD800..=0xDBFF) => self.high_surrogate = Some(code),
            (Some(high), 0xDC00..=0xDFFF) => {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (code - 0xDC00);
                self.buf
                    .push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            (Some(_), 0xD800..=0xDBFF) => {
                self.buf.push(char::REPLACEMENT_CHARACTER);
                self.high_surrogate = Some(code);
            }
            (Some(_), _) => {
                self.buf.push(char::REPLACEMENT_CHARACTER);
                self.buf
                    .push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            (None, _) => self
                .buf
                .push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)),
        }
    }

    fn flush_surrogate(&mut self) {
        if self.high_surrogate.take().is_some() {
            self.buf.push(char::REPLACEMENT_CHARACTER);
        }
    }

    /// `{` or `[`: re-enters the root at depth 0, otherwise appends a child
    /// named after the pending key.
    fn open(&mut self, level: Level) {
        let id = match self.levels.last() {
            None => self.doc.root(),
            Some(&(parent, _)) => {
                let name = self.key.take().unwrap_or_default();
                self.doc.append(parent, &name)
            }
        };
        if level == Level::Object {
            self.doc.set_object(id, true);
        }
        self.key = None;
        self.quoted = None;
        self.bare.clear();
        self.levels.push((id, level));
        self.containers += 1;
    }

    /// Stores the pending literal as a keyed member or an array element. A
    /// value without a key in object position is dropped.
    fn flush(&mut self) {
        let Some(&(parent, level)) = self.levels.last() else {
            return;
        };
        let key = self.key.take();
        let bare = std::mem::take(&mut self.bare);
        let value = match self.quoted.take() {
            Some(text) => text_value(text),
            None if bare.trim().is_empty() => return,
            None => infer_literal(bare.trim()),
        };
        let name = match (key, level) {
            (Some(key), _) => key,
            (None, Level::Array) => String::new(),
            (None, Level::Object) => return,
        };
        let child = self.doc.append(parent, &name);
        self.doc.set_value(child, value);
    }
}

/// A quoted value: a timestamp when it looks like one and parses, text otherwise.
fn text_value(text: String) -> Value {
    if text.contains('T') && text.contains('-') && text.contains(':') {
        if let Some(ts) = parse_timestamp(&text) {
            return Value::Timestamp(ts);
        }
    }
    Value::Text(text)
}

/// Infers the kind of an unquoted literal.
pub(crate) fn infer_literal(literal: &str) -> Value {
    match literal.to_ascii_lowercase().as_str() {
        "null" => return Value::Empty,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = literal.parse::<i32>() {
        return Value::Int32(n);
    }
    if let Ok(n) = literal.parse::<i64>() {
        return Value::Int64(n);
    }
    if let Some((_, fraction)) = literal.split_once('.') {
        let fraction = fraction.split('.').next().unwrap_or_default();
        let parsed = if fraction.len() > 2 {
            literal.parse::<f64>().ok().map(Value::Float64)
        } else {
            Decimal::from_str(literal).ok().map(Value::Decimal)
        };
        if let Some(value) = parsed {
            return value;
        }
    }
    Value::Text(literal.to_string())
}

/// Replaces the content of `doc` with the tree parsed from `text`.
pub(crate) fn load(doc: &mut JsonDocument, text: &str) {
    doc.reset();
    Parser::new(doc).run(text);
    tracing::debug!(
        entries = doc.len(),
        chars = text.len(),
        "parsed data document"
    );
}
