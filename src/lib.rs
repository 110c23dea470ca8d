//! # doctree
//!
//! Mutable document trees for markup and structured data, sharing one typed value cell.
//!
//! ## What is in the box?
//!
//! - **[`XmlDocument`]**: a markup tree with ordered attributes, a lenient single-pass
//!   parser that reports the line, column and element of structural errors, and an
//!   escaping serializer with pretty and compact layouts.
//! - **[`JsonDocument`]**: a structured-data tree whose entries are objects or arrays
//!   depending on whether their children are named, with compact, pretty and
//!   indented block renderings.
//! - **[`Value`]**: the content of every node and attribute. A value stored as one kind
//!   can be read back as any other (text, 32/64-bit integer, boolean, float, decimal,
//!   timestamp) with deterministic conversion rules.
//! - **[`Codec`]**: byte-level encodings, including detection from byte order marks
//!   and markup declarations.
//!
//! ## Quick Start
//!
//! ```rust
//! use doctree::{parse_xml, XmlOptions};
//!
//! let mut doc = parse_xml(r#"<order id="17"><line sku="A1">2</line></order>"#).unwrap();
//! let root = doc.root();
//!
//! assert_eq!(doc.attributes(root).get("id").and_then(|v| v.int32()), Some(17));
//!
//! let line = doc.find(root, "line", false).unwrap();
//! assert_eq!(doc.value(line).int64(), Some(2));
//!
//! let extra = doc.append(root, "line");
//! doc.set_attr(extra, "sku", "B2").unwrap();
//! doc.set_value(extra, 5);
//!
//! let options = XmlOptions::compact().with_declaration(false);
//! assert_eq!(
//!     doc.to_string_with(&options),
//!     r#"<order id="17"><line sku="A1">2</line><line sku="B2">5</line></order>"#
//! );
//! ```
//!
//! ### Structured data
//!
//! ```rust
//! use doctree::parse_json;
//!
//! let doc = parse_json(r#"{"user": {"name": "Ada", "roles": ["admin", "dev"]}}"#);
//! let root = doc.root();
//! let roles = doc.find_path(root, "user roles").unwrap();
//! assert_eq!(doc.child_count(roles), 2);
//! assert!(!doc.is_object(roles));
//!
//! assert_eq!(
//!     doc.to_block_string(),
//!     "user:\r\n  name: Ada\r\n  roles:\r\n    - admin\r\n    - dev"
//! );
//! ```
//!
//! ## Handles
//!
//! Nodes are owned by their document and addressed by [`NodeId`] handles. A
//! handle stays valid until its node is destroyed; using a destroyed handle
//! panics. [`XmlDocument::contains`] and [`JsonDocument::contains`] check
//! validity up front.
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Parse failures are reported as [`Error`] values; structured-data parsing never fails
//! - Value getters never fail; they return `None` only for an empty cell

mod attributes;
mod codec;
pub mod convert;
pub mod error;
pub mod json;
pub mod options;
mod tree;
pub mod value;
pub mod xml;

pub use attributes::Attributes;
pub use codec::Codec;
pub use error::{Error, Result};
pub use json::JsonDocument;
pub use options::{JsonOptions, NumberFormat, XmlOptions};
pub use tree::NodeId;
pub use value::{Value, ValueKind};
pub use xml::XmlDocument;

use std::io;

/// Parses markup text with default options.
///
/// # Examples
///
/// ```rust
/// use doctree::parse_xml;
///
/// let doc = parse_xml("<greeting>hello</greeting>").unwrap();
/// assert_eq!(doc.text(doc.root()), "hello");
/// ```
///
/// # Errors
///
/// Returns [`Error::XmlParse`] for mismatched or unclosed tags, input without
/// any element, or an invalid attribute name.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_xml(text: &str) -> Result<XmlDocument> {
    XmlDocument::parse(text)
}

/// Decodes and parses markup bytes, detecting the encoding when `codec` is `None`.
///
/// # Examples
///
/// ```rust
/// use doctree::{parse_xml_bytes, Codec};
///
/// let bytes = b"\xEF\xBB\xBF<a>caf\xC3\xA9</a>";
/// let doc = parse_xml_bytes(bytes, None).unwrap();
/// assert_eq!(doc.text(doc.root()), "café");
/// assert_eq!(doc.last_codec(), Codec::Utf8);
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedCodec`] for an unknown declared encoding, or
/// any error of [`parse_xml`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_xml_bytes(bytes: &[u8], codec: Option<Codec>) -> Result<XmlDocument> {
    XmlDocument::from_bytes(bytes, codec)
}

/// Reads a whole stream and parses it as markup, detecting the encoding.
///
/// # Examples
///
/// ```rust
/// use doctree::xml_from_reader;
/// use std::io::Cursor;
///
/// let doc = xml_from_reader(Cursor::new(b"<a><b/></a>")).unwrap();
/// assert_eq!(doc.child_count(doc.root()), 1);
/// ```
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails, or any error of [`parse_xml_bytes`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn xml_from_reader<R>(mut reader: R) -> Result<XmlDocument>
where
    R: io::Read,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_xml_bytes(&bytes, None)
}

/// Serializes a markup document to a writer.
///
/// Uses the document's options; `codec` overrides their default codec.
///
/// # Examples
///
/// ```rust
/// use doctree::{xml_to_writer, XmlDocument};
///
/// let doc = XmlDocument::new("empty");
/// let mut buffer = Vec::new();
/// xml_to_writer(&mut buffer, &doc, None, false).unwrap();
/// assert!(buffer.ends_with(b"<empty/>\r\n"));
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedCodec`] if encoding fails or [`Error::Io`] if
/// writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn xml_to_writer<W>(
    mut writer: W,
    doc: &XmlDocument,
    codec: Option<Codec>,
    include_bom: bool,
) -> Result<()>
where
    W: io::Write,
{
    let bytes = doc.to_bytes(codec, include_bom)?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Parses structured-data text with default options.
///
/// # Examples
///
/// ```rust
/// use doctree::{parse_json, ValueKind};
///
/// let doc = parse_json("[1, 2.5, 2.125]");
/// let kinds: Vec<_> = doc
///     .children(doc.root())
///     .iter()
///     .map(|&id| doc.value(id).kind())
///     .collect();
/// assert_eq!(kinds, vec![ValueKind::Int32, ValueKind::Decimal, ValueKind::Float64]);
/// ```
#[must_use]
pub fn parse_json(text: &str) -> JsonDocument {
    JsonDocument::parse(text)
}

/// Reads a whole stream and parses it as structured data, detecting the encoding.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails or [`Error::UnsupportedCodec`] for
/// an unknown declared encoding.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn json_from_reader<R>(mut reader: R) -> Result<JsonDocument>
where
    R: io::Read,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    JsonDocument::from_bytes(&bytes, None)
}

/// Serializes a structured-data document to a writer as UTF-8 text.
///
/// # Examples
///
/// ```rust
/// use doctree::{json_to_writer, parse_json};
///
/// let doc = parse_json(r#"{"ok": true}"#);
/// let mut buffer = Vec::new();
/// json_to_writer(&mut buffer, &doc, true).unwrap();
/// assert_eq!(buffer, br#"{"ok":true}"#);
/// ```
///
/// # Errors
///
/// Returns [`Error::Io`] if writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn json_to_writer<W>(mut writer: W, doc: &JsonDocument, compact: bool) -> Result<()>
where
    W: io::Write,
{
    writer.write_all(doc.to_json_string(compact).as_bytes())?;
    Ok(())
}
