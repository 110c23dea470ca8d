//! Indented block rendering of a data document.
//!
//! Object members are written as `key: value` lines, array elements as
//! `- value` lines, and nested containers one indent step deeper. When an
//! array element is itself a container, its first line shares the `- ` line;
//! the dash is padded to the indent width so continuation lines align.

use super::{ser, JsonDocument, UNNAMED_KEY};
use crate::options::JsonOptions;
use crate::tree::NodeId;
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;

/// Text that a block reader would take for a number or for syntax.
static NEEDS_SINGLE_QUOTES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^-?[0-9]*\.?[0-9]+$)|([#&%:*]+)").expect("valid quoting pattern")
});

struct Writer<'a> {
    doc: &'a JsonDocument,
    out: &'a mut String,
    options: &'a JsonOptions,
}

pub(crate) fn write_document(doc: &JsonDocument, out: &mut String, options: &JsonOptions) {
    let root = doc.root();
    let mut writer = Writer { doc, out, options };
    let name = doc.name(root);
    if name.is_empty() {
        if doc.child_count(root) == 0 {
            writer.scalar(root);
        } else {
            writer.members(root, 0, true);
        }
    } else {
        writer.out.push_str(name);
        writer.out.push(':');
        writer.value(root, 0);
    }
}

impl Writer<'_> {
    /// Indent step of one nesting level; an array dash needs at least two columns.
    fn step(&self) -> usize {
        self.options.indent.max(2)
    }

    /// Starts a new line at `indent`, unless the cursor already sits on a
    /// line prepared by the caller.
    fn line(&mut self, indent: usize, inline: bool) {
        if inline {
            return;
        }
        if !self.out.is_empty() {
            self.out.push_str(&self.options.newline);
        }
        for _ in 0..indent {
            self.out.push(' ');
        }
    }

    /// Writes the children of `id`, one per line.
    fn members(&mut self, id: NodeId, indent: usize, first_inline: bool) {
        let doc = self.doc;
        let object = doc.is_object(id);
        for (index, &child) in doc.children(id).iter().enumerate() {
            self.line(indent, first_inline && index == 0);
            if object {
                let name = match doc.name(child) {
                    "" => UNNAMED_KEY,
                    name => name,
                };
                self.out.push_str(name);
                self.out.push(':');
                self.value(child, indent);
            } else {
                let step = self.step();
                self.out.push('-');
                for _ in 1..step {
                    self.out.push(' ');
                }
                if doc.child_count(child) == 0 {
                    self.scalar(child);
                } else {
                    self.members(child, indent + step, true);
                }
            }
        }
    }

    /// Writes what follows `key:` for an object member at `indent`.
    fn value(&mut self, id: NodeId, indent: usize) {
        if self.doc.child_count(id) == 0 {
            self.out.push(' ');
            self.scalar(id);
        } else {
            self.members(id, indent + self.step(), false);
        }
    }

    fn scalar(&mut self, id: NodeId) {
        let doc = self.doc;
        match doc.value(id) {
            Value::Empty if doc.is_object(id) => self.out.push_str("{}"),
            Value::Empty => self.out.push_str("[]"),
            Value::Text(text) => quote_into(self.out, text),
            value @ Value::Timestamp(_) => quote_into(self.out, &value.to_string()),
            value => self.out.push_str(&value.to_string()),
        }
    }
}

fn quote_into(out: &mut String, text: &str) {
    if text.contains('\n') {
        ser::write_string(out, text);
    } else if text.is_empty() || NEEDS_SINGLE_QUOTES.is_match(text) {
        out.push('\'');
        out.push_str(&text.replace('\'', "''"));
        out.push('\'');
    } else {
        out.push_str(text);
    }
}
