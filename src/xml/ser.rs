//! Markup writer.
//!
//! Output is appended to a `String`. Pretty output puts every element on its
//! own line, indented once per nesting level; compact output drops all
//! inter-tag whitespace. Attributes holding [`crate::Value::Empty`] are not
//! written.

use super::{entity, XmlDocument};
use crate::codec::Codec;
use crate::options::XmlOptions;
use crate::tree::NodeId;

/// Writes the optional declaration followed by the root element.
pub(crate) fn write_document(doc: &XmlDocument, out: &mut String, options: &XmlOptions, codec: Codec) {
    if options.declaration {
        out.push_str("<?xml version=\"1.0\" encoding=\"");
        out.push_str(&codec.label());
        out.push_str("\"?>");
        if !options.compact {
            out.push_str(&options.newline);
        }
    }
    write_element(doc, doc.root(), out, options, 0);
}

/// Writes `id` and its subtree at nesting depth `level`.
pub(crate) fn write_element(
    doc: &XmlDocument,
    id: NodeId,
    out: &mut String,
    options: &XmlOptions,
    level: usize,
) {
    let element = doc.element(id);
    let pretty = !options.compact;
    if pretty {
        write_indent(out, options, level);
    }
    out.push('<');
    out.push_str(element.name());
    for (name, value) in element.attributes().iter_set() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        entity::encode_into(out, &value.to_string());
        out.push('"');
    }

    let text = element.value().text().unwrap_or_default();
    let children = doc.children(id);
    if children.is_empty() && text.is_empty() {
        out.push_str("/>");
    } else if children.is_empty() {
        out.push('>');
        entity::encode_into(out, &text);
        write_close(out, element.name());
    } else {
        out.push('>');
        entity::encode_into(out, &text);
        if pretty {
            out.push_str(&options.newline);
        }
        for &child in children {
            write_element(doc, child, out, options, level + 1);
        }
        if pretty {
            write_indent(out, options, level);
        }
        write_close(out, element.name());
    }
    if pretty {
        out.push_str(&options.newline);
    }
}

#[inline]
fn write_indent(out: &mut String, options: &XmlOptions, level: usize) {
    for _ in 0..level {
        out.push_str(&options.indent);
    }
}

#[inline]
fn write_close(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}
