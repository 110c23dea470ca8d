//! Mutable structured-data documents.
//!
//! A [`JsonDocument`] is a tree of entries. Each entry has a name (empty for
//! array elements), a [`Value`] and ordered children. Whether an entry with
//! children is written as an object or an array is not stored: an entry is an
//! object when any child has a name, or when it was explicitly marked with
//! [`JsonDocument::set_object`].
//!
//! ## Examples
//!
//! ```rust
//! use doctree::{JsonDocument, ValueKind};
//!
//! let mut doc = JsonDocument::parse(r#"{"name": "tea", "price": 3.14, "tags": ["hot"]}"#);
//! let root = doc.root();
//!
//! let price = doc.find(root, "price").unwrap();
//! assert_eq!(doc.value(price).kind(), ValueKind::Decimal);
//!
//! let tags = doc.find(root, "tags").unwrap();
//! assert!(!doc.is_object(tags));
//! let tag = doc.append(tags, "");
//! doc.set_value(tag, "iced");
//!
//! assert_eq!(
//!     doc.to_json_string(true),
//!     r#"{"name":"tea","price":3.1400,"tags":["hot","iced"]}"#
//! );
//! ```

pub(crate) mod block;
pub(crate) mod de;
pub(crate) mod ser;

use crate::codec::Codec;
use crate::error::Result;
use crate::options::JsonOptions;
use crate::tree::{split_path, Arena, NodeId};
use crate::value::Value;
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;

/// Key written for unnamed members of an object.
pub(crate) const UNNAMED_KEY: &str = "Item";

fn normalize_name(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// Payload of one data entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entry {
    name: String,
    value: Value,
    object: bool,
}

impl Entry {
    fn named(name: &str) -> Self {
        Entry {
            name: normalize_name(name),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// A structured-data document: an arena of entries with one root.
#[derive(Debug)]
pub struct JsonDocument {
    arena: Arena<Entry>,
    root: NodeId,
    options: JsonOptions,
    last_codec: Codec,
}

impl Default for JsonDocument {
    fn default() -> Self {
        Self::with_options(JsonOptions::default())
    }
}

impl JsonDocument {
    /// Creates an empty document with an unnamed root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: JsonOptions) -> Self {
        let mut arena = Arena::new();
        let root = arena.alloc(Entry::default());
        JsonDocument {
            arena,
            root,
            options,
            last_codec: Codec::Utf8,
        }
    }

    /// Parses text with default options. Parsing is lenient and never fails.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self::parse_with_options(text, JsonOptions::default())
    }

    #[must_use]
    pub fn parse_with_options(text: &str, options: JsonOptions) -> Self {
        let mut doc = Self::with_options(options);
        doc.load_str(text);
        doc
    }

    /// Decodes and parses a byte buffer; without a `codec` the encoding is
    /// detected with [`Codec::sniff`], falling back to UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedCodec`] for an unknown declared encoding.
    pub fn from_bytes(bytes: &[u8], codec: Option<Codec>) -> Result<Self> {
        let mut doc = Self::new();
        doc.load_bytes(bytes, codec)?;
        Ok(doc)
    }

    /// Replaces the content of this document with parsed text.
    ///
    /// All previously issued handles except [`JsonDocument::root`] become invalid.
    pub fn load_str(&mut self, text: &str) {
        de::load(self, text);
    }

    /// Replaces the content of this document with a decoded byte buffer.
    ///
    /// # Errors
    ///
    /// Same as [`JsonDocument::from_bytes`].
    pub fn load_bytes(&mut self, bytes: &[u8], codec: Option<Codec>) -> Result<()> {
        let codec = match codec {
            Some(codec) => codec,
            None => Codec::sniff(bytes)?.unwrap_or_default(),
        };
        tracing::debug!(codec = %codec, bytes = bytes.len(), "decoding data document");
        self.last_codec = codec;
        let text = codec.decode(bytes)?;
        self.load_str(&text);
        Ok(())
    }

    #[must_use]
    pub fn options(&self) -> &JsonOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: JsonOptions) {
        self.options = options;
    }

    /// Codec used by the last byte load, UTF-8 before any.
    #[must_use]
    pub fn last_codec(&self) -> Codec {
        self.last_codec
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    /// Number of live entries, detached ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.child_count(self.root) == 0 && self.value(self.root).is_empty()
    }

    /// Entry payload of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was destroyed, as does every other method taking a `NodeId`.
    #[must_use]
    pub fn entry(&self, id: NodeId) -> &Entry {
        self.arena.get(id)
    }

    fn entry_mut(&mut self, id: NodeId) -> &mut Entry {
        self.arena.get_mut(id)
    }

    pub(crate) fn reset(&mut self) {
        self.arena.retain_only(self.root);
        *self.entry_mut(self.root) = Entry::default();
    }

    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self.entry(id).name
    }

    /// Renames an entry; the name is trimmed and spaces become `_`.
    pub fn set_name(&mut self, id: NodeId, name: &str) {
        self.entry_mut(id).name = normalize_name(name);
    }

    #[must_use]
    pub fn value(&self, id: NodeId) -> &Value {
        &self.entry(id).value
    }

    pub fn value_mut(&mut self, id: NodeId) -> &mut Value {
        &mut self.entry_mut(id).value
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<Value>) {
        self.entry_mut(id).value = value.into();
    }

    /// Entry value as text; an empty value reads as `""`.
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        self.value(id).text().unwrap_or_default()
    }

    #[must_use]
    pub fn float64(&self, id: NodeId) -> Option<f64> {
        self.value(id).float64_with(&self.options.number_format)
    }

    #[must_use]
    pub fn decimal(&self, id: NodeId) -> Option<Decimal> {
        self.value(id).decimal_with(&self.options.number_format)
    }

    /// `true` if the entry was marked as an object or has a named child.
    #[must_use]
    pub fn is_object(&self, id: NodeId) -> bool {
        self.entry(id).object
            || self
                .children(id)
                .iter()
                .any(|&child| !self.name(child).is_empty())
    }

    /// Forces object output even without named children. An empty entry
    /// marked this way is written as `{}` instead of `null`.
    pub fn set_object(&mut self, id: NodeId, object: bool) {
        self.entry_mut(id).object = object;
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena.children(id)
    }

    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    #[must_use]
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    /// Child at `index`, appending unnamed entries until it exists.
    pub fn child_at(&mut self, id: NodeId, index: usize) -> NodeId {
        while self.child_count(id) <= index {
            self.append(id, "");
        }
        self.children(id)[index]
    }

    /// Follows child names separated by spaces or dots, creating missing steps.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use doctree::JsonDocument;
    ///
    /// let mut doc = JsonDocument::new();
    /// let root = doc.root();
    /// let host = doc.get(root, "server.http host");
    /// doc.set_value(host, "localhost");
    /// assert_eq!(
    ///     doc.to_json_string(true),
    ///     r#"{"server":{"http":{"host":"localhost"}}}"#
    /// );
    /// ```
    pub fn get(&mut self, id: NodeId, path: &str) -> NodeId {
        let mut current = id;
        for step in split_path(path) {
            current = match self.find(current, step) {
                Some(found) => found,
                None => self.append(current, step),
            };
        }
        current
    }

    /// Follows a path like [`JsonDocument::get`] without creating anything.
    #[must_use]
    pub fn find_path(&self, id: NodeId, path: &str) -> Option<NodeId> {
        let mut current = id;
        for step in split_path(path) {
            current = self.find(current, step)?;
        }
        Some(current)
    }

    /// First direct child with the given name.
    #[must_use]
    pub fn find(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let name = name.trim();
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.name(child) == name)
    }

    /// Appends a new entry; pass `""` for an array element.
    pub fn append(&mut self, parent: NodeId, name: &str) -> NodeId {
        let child = self.arena.alloc(Entry::named(name));
        self.arena.append(parent, child);
        child
    }

    /// Detaches and destroys `id` with its subtree. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        self.arena.remove(id);
        true
    }

    /// Destroys all children of `id`.
    pub fn clear(&mut self, id: NodeId) {
        self.arena.clear_children(id);
    }

    /// Detaches `id` from its parent without destroying it.
    pub fn unbind(&mut self, id: NodeId) -> NodeId {
        self.arena.detach(id);
        id
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.parent(id)
    }

    #[must_use]
    pub fn parent_index(&self, id: NodeId) -> Option<usize> {
        self.arena.index_in_parent(id)
    }

    /// All entries below `id` in document order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.arena.descendants(id)
    }

    /// Serializes the document, compact or indented.
    #[must_use]
    pub fn to_json_string(&self, compact: bool) -> String {
        let options = JsonOptions {
            pretty: !compact,
            ..self.options.clone()
        };
        self.to_string_with(&options)
    }

    /// Serializes the document with explicit options.
    #[must_use]
    pub fn to_string_with(&self, options: &JsonOptions) -> String {
        let mut out = String::new();
        ser::write_document(self, &mut out, options);
        out
    }

    /// Renders the document in indented block style.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use doctree::{JsonDocument, JsonOptions};
    ///
    /// let mut doc = JsonDocument::parse(r#"{"a": 1, "list": [{"x": "1.5", "y": true}]}"#);
    /// doc.set_options(JsonOptions::new().with_newline("\n"));
    /// assert_eq!(doc.to_block_string(), "a: 1\nlist:\n  - x: '1.5'\n    y: true");
    /// ```
    #[must_use]
    pub fn to_block_string(&self) -> String {
        let mut out = String::new();
        block::write_document(self, &mut out, &self.options);
        out
    }

    /// Serializes and encodes the document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedCodec`] for a `Windows` page outside
    /// the supported set.
    pub fn to_bytes(&self, compact: bool, codec: Option<Codec>, include_bom: bool) -> Result<Vec<u8>> {
        encode_with_bom(&self.to_json_string(compact), codec.unwrap_or_default(), include_bom)
    }

    /// Renders the block style and encodes it.
    ///
    /// # Errors
    ///
    /// Same as [`JsonDocument::to_bytes`].
    pub fn to_block_bytes(&self, codec: Option<Codec>, include_bom: bool) -> Result<Vec<u8>> {
        encode_with_bom(&self.to_block_string(), codec.unwrap_or_default(), include_bom)
    }

    fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }
}

fn encode_with_bom(text: &str, codec: Codec, include_bom: bool) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(text.len() + 3);
    if include_bom {
        if let Some(bom) = codec.bom() {
            bytes.extend_from_slice(bom);
        }
    }
    bytes.extend(codec.encode(text)?);
    Ok(bytes)
}

impl fmt::Display for JsonDocument {
    /// Serializes with the document's own options.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(&self.options))
    }
}

/// Borrowed view of one entry, serialized the way the writer lays it out.
struct NodeRef<'a> {
    doc: &'a JsonDocument,
    id: NodeId,
}

impl Serialize for NodeRef<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let doc = self.doc;
        let children = doc.children(self.id);
        if doc.is_object(self.id) {
            let mut map = serializer.serialize_map(Some(children.len()))?;
            for &child in children {
                let name = match doc.name(child) {
                    "" => UNNAMED_KEY,
                    name => name,
                };
                map.serialize_entry(name, &doc.node(child))?;
            }
            map.end()
        } else if children.is_empty() {
            match doc.value(self.id) {
                Value::Float64(f) if !f.is_finite() => serializer.serialize_none(),
                value => value.serialize(serializer),
            }
        } else {
            let mut seq = serializer.serialize_seq(Some(children.len()))?;
            for &child in children {
                seq.serialize_element(&doc.node(child))?;
            }
            seq.end()
        }
    }
}

impl Serialize for JsonDocument {
    /// Objects become maps, arrays sequences and leaves scalars. A named root
    /// is wrapped in a one-entry map.
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let root = self.node(self.root);
        match self.name(self.root) {
            "" => root.serialize(serializer),
            name => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(name, &root)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    #[test]
    fn test_is_object_is_computed() {
        let mut doc = JsonDocument::new();
        let root = doc.root();
        let first = doc.append(root, "");
        assert!(!doc.is_object(root));
        doc.set_name(first, " my key ");
        assert_eq!(doc.name(first), "my_key");
        assert!(doc.is_object(root));
        doc.set_name(first, "");
        assert!(!doc.is_object(root));
        doc.set_object(root, true);
        assert!(doc.is_object(root));
    }

    #[test]
    fn test_child_at_creates_unnamed() {
        let mut doc = JsonDocument::new();
        let root = doc.root();
        let third = doc.child_at(root, 2);
        assert_eq!(doc.child_count(root), 3);
        assert_eq!(doc.name(third), "");
        assert_eq!(doc.child(root, 3), None);
    }

    #[test]
    fn test_get_and_find_path() {
        let mut doc = JsonDocument::new();
        let root = doc.root();
        let leaf = doc.get(root, "a  b");
        assert_eq!(doc.get(root, "a b"), leaf);
        assert_eq!(doc.find_path(root, "a b"), Some(leaf));
        assert_eq!(doc.find_path(root, "a c"), None);
        assert_eq!(doc.descendants(root).len(), 2);
    }

    #[test]
    fn test_dotted_paths() {
        let mut doc = JsonDocument::new();
        let root = doc.root();
        let b = doc.get(root, "a.b");
        doc.set_value(b, 1);
        assert_eq!(doc.to_json_string(true), r#"{"a":{"b":1}}"#);
        assert_eq!(doc.find_path(root, "a b"), Some(b));
        assert_eq!(doc.find_path(root, "a.b"), Some(b));
    }

    #[test]
    fn test_remove_and_unbind() {
        let mut doc = JsonDocument::parse("[1,2,3]");
        let root = doc.root();
        let second = doc.children(root)[1];
        assert!(doc.remove(second));
        assert!(!doc.remove(root));
        let first = doc.unbind(doc.children(root)[0]);
        assert!(doc.contains(first));
        assert_eq!(doc.parent(first), None);
        assert_eq!(doc.to_json_string(true), "[3]");
        doc.clear(root);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_float_and_decimal_getters() {
        let mut doc = JsonDocument::with_options(JsonOptions::new().with_number_format(
            crate::options::NumberFormat::new().with_decimal_separator(','),
        ));
        let root = doc.root();
        doc.set_value(root, "1,5");
        assert_eq!(doc.float64(root), Some(1.5));
        assert_eq!(doc.decimal(root), Some(Decimal::new(15, 1)));
        assert_eq!(doc.value(root).kind(), ValueKind::Text);
    }

    #[test]
    fn test_serialize_matches_writer() {
        let doc = JsonDocument::parse(r#"{"a":[1,true,null],"b":{"c":"x"},"d":2.5}"#);
        let via_serde = serde_json::to_string(&doc).unwrap();
        assert_eq!(via_serde, r#"{"a":[1,true,null],"b":{"c":"x"},"d":2.5}"#);
    }

    #[test]
    fn test_serialize_named_root() {
        let mut doc = JsonDocument::new();
        let root = doc.root();
        doc.set_name(root, "count");
        doc.set_value(root, 3);
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"count":3}"#);
        assert_eq!(doc.to_json_string(true), r#"{"count":3}"#);
    }

    #[test]
    fn test_to_bytes_with_bom() {
        let doc = JsonDocument::parse("[1]");
        let bytes = doc.to_bytes(true, Some(Codec::Utf16Le), true).unwrap();
        assert_eq!(bytes, vec![0xFF, 0xFE, b'[', 0, b'1', 0, b']', 0]);
        let back = JsonDocument::from_bytes(&bytes, None).unwrap();
        assert_eq!(back.last_codec(), Codec::Utf16Le);
        assert_eq!(back.to_json_string(true), "[1]");
    }
}
