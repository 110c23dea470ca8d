//! Structured-data writer.

use super::{JsonDocument, UNNAMED_KEY};
use crate::options::JsonOptions;
use crate::tree::NodeId;
use crate::value::Value;
use std::fmt::Write;

/// Writes the whole document. A named root is wrapped in an enclosing object.
pub(crate) fn write_document(doc: &JsonDocument, out: &mut String, options: &JsonOptions) {
    let root = doc.root();
    if doc.name(root).is_empty() {
        write_body(doc, root, out, options, 0);
        return;
    }
    out.push('{');
    if options.pretty {
        out.push_str(&options.newline);
    }
    write_member(doc, root, out, options, 1, true);
    if options.pretty {
        out.push_str(&options.newline);
    }
    out.push('}');
}

fn write_member(
    doc: &JsonDocument,
    id: NodeId,
    out: &mut String,
    options: &JsonOptions,
    level: usize,
    in_object: bool,
) {
    if options.pretty {
        write_indent(out, options, level);
    }
    let name = doc.name(id);
    if in_object || !name.is_empty() {
        write_string(out, if name.is_empty() { UNNAMED_KEY } else { name });
        out.push(':');
        if options.pretty {
            out.push(' ');
        }
    }
    write_body(doc, id, out, options, level);
}

fn write_body(doc: &JsonDocument, id: NodeId, out: &mut String, options: &JsonOptions, level: usize) {
    let children = doc.children(id);
    let object = doc.is_object(id);
    if children.is_empty() {
        write_leaf(doc.value(id), object, out);
        return;
    }
    out.push(if object { '{' } else { '[' });
    for (index, &child) in children.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        if options.pretty {
            out.push_str(&options.newline);
        }
        write_member(doc, child, out, options, level + 1, object);
    }
    if options.pretty {
        out.push_str(&options.newline);
        write_indent(out, options, level);
    }
    out.push(if object { '}' } else { ']' });
}

fn write_leaf(value: &Value, object: bool, out: &mut String) {
    match value {
        Value::Empty if object => out.push_str("{}"),
        Value::Empty => out.push_str("null"),
        Value::Float64(f) if !f.is_finite() => out.push_str("null"),
        Value::Text(text) => write_string(out, text),
        Value::Timestamp(_) => write_string(out, &value.to_string()),
        other => out.push_str(&other.to_string()),
    }
}

#[inline]
fn write_indent(out: &mut String, options: &JsonOptions, level: usize) {
    for _ in 0..level * options.indent {
        out.push(' ');
    }
}

/// Writes `text` as a quoted string literal.
pub(crate) fn write_string(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_layout() {
        let doc = JsonDocument::parse(r#"{"a":1,"b":[true,"x"],"c":{}}"#);
        let options = JsonOptions::pretty().with_newline("\n");
        let expected = "{\n  \"a\": 1,\n  \"b\": [\n    true,\n    \"x\"\n  ],\n  \"c\": {}\n}";
        assert_eq!(doc.to_string_with(&options), expected);
    }

    #[test]
    fn test_unnamed_members_of_object() {
        let mut doc = JsonDocument::new();
        let root = doc.root();
        let named = doc.append(root, "k");
        doc.set_value(named, 1);
        let unnamed = doc.append(root, "");
        doc.set_value(unnamed, 2);
        assert_eq!(doc.to_json_string(true), r#"{"k":1,"Item":2}"#);
    }

    #[test]
    fn test_leaf_rendering() {
        let mut doc = JsonDocument::new();
        let root = doc.root();
        for value in [
            Value::Float64(f64::NAN),
            Value::Float64(f64::INFINITY),
            Value::Float64(0.5),
            Value::Int64(-9),
            Value::Empty,
        ] {
            let child = doc.append(root, "");
            doc.set_value(child, value);
        }
        let marked = doc.append(root, "");
        doc.set_object(marked, true);
        assert_eq!(doc.to_json_string(true), "[null,null,0.5,-9,null,{}]");
    }

    #[test]
    fn test_string_escaping() {
        let mut out = String::new();
        write_string(&mut out, "q\"b\\\r\n\t\u{1}é");
        assert_eq!(out, r#""q\"b\\\r\n\t\u0001é""#);
    }

    #[test]
    fn test_named_root_pretty() {
        let mut doc = JsonDocument::parse("[1]");
        let root = doc.root();
        doc.set_name(root, "list");
        let options = JsonOptions::pretty().with_newline("\n");
        assert_eq!(doc.to_string_with(&options), "{\n  \"list\": [\n    1\n  ]\n}");
        assert_eq!(doc.to_json_string(true), r#"{"list":[1]}"#);
    }
}
