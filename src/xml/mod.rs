//! Mutable markup documents.
//!
//! An [`XmlDocument`] owns every element of one tree. Elements are addressed
//! by [`NodeId`] handles; all navigation and mutation goes through the
//! document, which keeps parent links, child order and handle validity
//! consistent.
//!
//! ## Examples
//!
//! ```rust
//! use doctree::XmlDocument;
//!
//! let mut doc = XmlDocument::parse(r#"<shop><item id="1">Tea</item></shop>"#).unwrap();
//! let root = doc.root();
//!
//! let tea = doc.find(root, "item", false).unwrap();
//! assert_eq!(doc.text(tea), "Tea");
//!
//! let coffee = doc.append(root, "item");
//! doc.set_attr(coffee, "id", 2).unwrap();
//! doc.value_mut(coffee).set_text("Coffee");
//!
//! assert_eq!(
//!     doc.to_string_compact(),
//!     r#"<?xml version="1.0" encoding="utf-8"?><shop><item id="1">Tea</item><item id="2">Coffee</item></shop>"#
//! );
//! ```

pub(crate) mod de;
pub mod entity;
pub(crate) mod ser;

use crate::attributes::Attributes;
use crate::codec::Codec;
use crate::error::Result;
use crate::options::XmlOptions;
use crate::tree::{split_path, Arena, NodeId};
use crate::value::Value;
use rust_decimal::Decimal;
use std::any::Any;
use std::cmp::Reverse;
use std::fmt;
use std::rc::Rc;

const DEFAULT_NAME: &str = "item";

/// Normalizes an element name: trims it, replaces `<`, `>` and spaces with
/// `_`, replaces a leading digit with `_`, and falls back to `item`.
pub(crate) fn normalize_name(name: &str) -> String {
    let mut out: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '<' | '>' | ' ' => '_',
            other => other,
        })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.replace_range(..1, "_");
    }
    if out.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        out
    }
}

fn names_equal(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

/// Payload of one markup element.
#[derive(Clone, Default)]
pub struct Element {
    name: String,
    attributes: Attributes,
    value: Value,
    tag: i32,
    user_data: Option<Rc<dyn Any>>,
}

impl Element {
    fn named(name: &str) -> Self {
        Element {
            name: normalize_name(name),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn tag(&self) -> i32 {
        self.tag
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("value", &self.value)
            .field("tag", &self.tag)
            .field("user_data", &self.user_data.is_some())
            .finish()
    }
}

struct Snapshot {
    element: Element,
    children: Vec<Snapshot>,
}

/// A markup document: an arena of elements with one root.
#[derive(Debug)]
pub struct XmlDocument {
    arena: Arena<Element>,
    root: NodeId,
    options: XmlOptions,
    last_codec: Codec,
    loaded: bool,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::with_options("", XmlOptions::default())
    }
}

impl XmlDocument {
    /// Creates a document whose root element has the given (normalized) name.
    #[must_use]
    pub fn new(root_name: &str) -> Self {
        Self::with_options(root_name, XmlOptions::default())
    }

    #[must_use]
    pub fn with_options(root_name: &str, options: XmlOptions) -> Self {
        let mut arena = Arena::new();
        let root = arena.alloc(Element::named(root_name));
        XmlDocument {
            arena,
            root,
            last_codec: options.default_codec,
            options,
            loaded: false,
        }
    }

    /// Parses markup text with default options.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::XmlParse`] for mismatched or unclosed tags, a
    /// document without elements, or an invalid attribute name.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_options(text, XmlOptions::default())
    }

    /// Parses markup text.
    ///
    /// # Errors
    ///
    /// Same as [`XmlDocument::parse`].
    pub fn parse_with_options(text: &str, options: XmlOptions) -> Result<Self> {
        let mut doc = Self::with_options("", options);
        doc.load_str(text)?;
        Ok(doc)
    }

    /// Decodes and parses a byte buffer with default options.
    ///
    /// Without an explicit `codec` the encoding is detected with
    /// [`Codec::sniff`], falling back to the default codec of the options.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedCodec`] for an unknown declared
    /// encoding, or any error of [`XmlDocument::parse`].
    pub fn from_bytes(bytes: &[u8], codec: Option<Codec>) -> Result<Self> {
        Self::from_bytes_with_options(bytes, codec, XmlOptions::default())
    }

    /// Decodes and parses a byte buffer.
    ///
    /// # Errors
    ///
    /// Same as [`XmlDocument::from_bytes`].
    pub fn from_bytes_with_options(
        bytes: &[u8],
        codec: Option<Codec>,
        options: XmlOptions,
    ) -> Result<Self> {
        let mut doc = Self::with_options("", options);
        doc.load_bytes(bytes, codec)?;
        Ok(doc)
    }

    /// Replaces the content of this document with parsed markup.
    ///
    /// All previously issued handles except [`XmlDocument::root`] become
    /// invalid. On failure the document is left empty and not loaded.
    ///
    /// # Errors
    ///
    /// Same as [`XmlDocument::parse`].
    pub fn load_str(&mut self, text: &str) -> Result<()> {
        de::load(self, text)
    }

    /// Replaces the content of this document with a decoded byte buffer.
    ///
    /// # Errors
    ///
    /// Same as [`XmlDocument::from_bytes`].
    pub fn load_bytes(&mut self, bytes: &[u8], codec: Option<Codec>) -> Result<()> {
        let codec = match codec {
            Some(codec) => codec,
            None => Codec::sniff(bytes)?.unwrap_or(self.options.default_codec),
        };
        tracing::debug!(codec = %codec, bytes = bytes.len(), "decoding markup");
        self.last_codec = codec;
        let text = codec.decode(bytes)?;
        self.load_str(text.trim())
    }

    #[must_use]
    pub fn options(&self) -> &XmlOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: XmlOptions) {
        self.options = options;
    }

    /// `true` once a parse has completed without error.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Codec used by the last byte load, or the default codec.
    #[must_use]
    pub fn last_codec(&self) -> Codec {
        self.last_codec
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// `true` if `id` still refers to a live element of this document.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    /// Number of live elements, detached ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.child_count(self.root) == 0
            && self.value(self.root).is_empty()
            && self.attributes(self.root).is_empty()
    }

    /// Element payload of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was destroyed. Every other method taking a `NodeId` does too.
    #[must_use]
    pub fn element(&self, id: NodeId) -> &Element {
        self.arena.get(id)
    }

    fn element_mut(&mut self, id: NodeId) -> &mut Element {
        self.arena.get_mut(id)
    }

    // ---- names ----

    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self.element(id).name
    }

    /// Renames an element; the name is normalized.
    pub fn set_name(&mut self, id: NodeId, name: &str) {
        self.element_mut(id).name = normalize_name(name);
    }

    /// Part of the name before the first `:`, or `""`.
    #[must_use]
    pub fn schema_name(&self, id: NodeId) -> &str {
        self.name(id).split_once(':').map_or("", |(schema, _)| schema)
    }

    /// Part of the name after the first `:`, or the whole name.
    #[must_use]
    pub fn short_name(&self, id: NodeId) -> &str {
        let name = self.name(id);
        name.split_once(':').map_or(name, |(_, short)| short)
    }

    /// Replaces the schema prefix; a blank schema removes it.
    pub fn set_schema_name(&mut self, id: NodeId, schema: &str) {
        let short = self.short_name(id).to_string();
        self.element_mut(id).name = if schema.trim().is_empty() {
            short
        } else {
            format!("{}:{}", normalize_name(schema), short)
        };
    }

    /// Replaces the part after the schema prefix.
    pub fn set_short_name(&mut self, id: NodeId, short: &str) {
        let schema = self.schema_name(id);
        let name = if schema.is_empty() {
            normalize_name(short)
        } else {
            format!("{}:{}", schema, normalize_name(short))
        };
        self.element_mut(id).name = name;
    }

    #[must_use]
    pub fn is_name(&self, id: NodeId, name: &str, ignore_case: bool) -> bool {
        names_equal(self.name(id), name.trim(), ignore_case)
    }

    #[must_use]
    pub fn is_schema_name(&self, id: NodeId, schema: &str, ignore_case: bool) -> bool {
        names_equal(self.schema_name(id), schema.trim(), ignore_case)
    }

    #[must_use]
    pub fn is_short_name(&self, id: NodeId, short: &str, ignore_case: bool) -> bool {
        names_equal(self.short_name(id), short.trim(), ignore_case)
    }

    // ---- values ----

    #[must_use]
    pub fn value(&self, id: NodeId) -> &Value {
        &self.element(id).value
    }

    pub fn value_mut(&mut self, id: NodeId) -> &mut Value {
        &mut self.element_mut(id).value
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<Value>) {
        self.element_mut(id).value = value.into();
    }

    /// Element text; an empty value reads as `""`.
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        self.value(id).text().unwrap_or_default()
    }

    /// Element value as a float, using the document's number format for text.
    #[must_use]
    pub fn float64(&self, id: NodeId) -> Option<f64> {
        self.value(id).float64_with(&self.options.number_format)
    }

    /// Element value as a decimal, using the document's number format for text.
    #[must_use]
    pub fn decimal(&self, id: NodeId) -> Option<Decimal> {
        self.value(id).decimal_with(&self.options.number_format)
    }

    #[must_use]
    pub fn tag(&self, id: NodeId) -> i32 {
        self.element(id).tag
    }

    pub fn set_tag(&mut self, id: NodeId, tag: i32) {
        self.element_mut(id).tag = tag;
    }

    /// Caller-owned data attached to an element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use doctree::XmlDocument;
    /// use std::rc::Rc;
    ///
    /// let mut doc = XmlDocument::new("root");
    /// let root = doc.root();
    /// doc.set_user_data(root, Some(Rc::new(String::from("cache"))));
    /// let data = doc.user_data(root).and_then(|d| d.downcast_ref::<String>());
    /// assert_eq!(data.map(String::as_str), Some("cache"));
    /// ```
    #[must_use]
    pub fn user_data(&self, id: NodeId) -> Option<&Rc<dyn Any>> {
        self.element(id).user_data.as_ref()
    }

    pub fn set_user_data(&mut self, id: NodeId, data: Option<Rc<dyn Any>>) {
        self.element_mut(id).user_data = data;
    }

    // ---- attributes ----

    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &Attributes {
        &self.element(id).attributes
    }

    pub fn attributes_mut(&mut self, id: NodeId) -> &mut Attributes {
        &mut self.element_mut(id).attributes
    }

    /// Mutable attribute access that creates a missing attribute.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidName`] for a name that cannot be created.
    pub fn attr(&mut self, id: NodeId, name: &str) -> Result<&mut Value> {
        self.attributes_mut(id).attr(name)
    }

    /// Sets an attribute value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidName`] for a name that cannot be created.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<Value>) -> Result<()> {
        self.attributes_mut(id).set(name, value)
    }

    /// `true` if the attribute exists and holds a value.
    #[must_use]
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attributes(id).exists(name)
    }

    // ---- children ----

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena.children(id)
    }

    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Child at `index`, without creating anything.
    #[must_use]
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    /// Child at `index`, appending `item` children until it exists.
    pub fn child_at(&mut self, id: NodeId, index: usize) -> NodeId {
        while self.child_count(id) <= index {
            self.append(id, DEFAULT_NAME);
        }
        self.children(id)[index]
    }

    /// Follows a path of child names separated by spaces or dots, creating
    /// missing steps.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use doctree::XmlDocument;
    ///
    /// let mut doc = XmlDocument::new("config");
    /// let root = doc.root();
    /// let port = doc.get(root, "server.http port");
    /// doc.set_value(port, 8080);
    /// assert_eq!(doc.root_path(port), "config server http port");
    /// assert_eq!(doc.find_path(root, "server http port"), Some(port));
    /// assert_eq!(doc.find_path(root, "server ftp"), None);
    /// ```
    pub fn get(&mut self, id: NodeId, path: &str) -> NodeId {
        let mut current = id;
        for step in split_path(path) {
            current = match self.find(current, step, false) {
                Some(found) => found,
                None => self.append(current, step),
            };
        }
        current
    }

    /// Follows a path like [`XmlDocument::get`] without creating anything.
    #[must_use]
    pub fn find_path(&self, id: NodeId, path: &str) -> Option<NodeId> {
        let mut current = id;
        for step in split_path(path) {
            current = self.find(current, step, false)?;
        }
        Some(current)
    }

    /// Appends a new element as the last child.
    pub fn append(&mut self, parent: NodeId, name: &str) -> NodeId {
        let child = self.arena.alloc(Element::named(name));
        self.arena.append(parent, child);
        child
    }

    /// Inserts a new element at `index` (clamped to the child count).
    pub fn insert(&mut self, parent: NodeId, index: usize, name: &str) -> NodeId {
        let child = self.arena.alloc(Element::named(name));
        self.arena.insert(parent, index, child);
        child
    }

    /// Inserts `count` new elements at `index`.
    pub fn insert_many(&mut self, parent: NodeId, index: usize, count: usize, name: &str) {
        for _ in 0..count {
            self.insert(parent, index, name);
        }
    }

    // ---- search ----

    /// First direct child with the given name.
    #[must_use]
    pub fn find(&self, id: NodeId, name: &str, ignore_case: bool) -> Option<NodeId> {
        let name = name.trim();
        self.children(id)
            .iter()
            .copied()
            .find(|&child| names_equal(self.name(child), name, ignore_case))
    }

    /// First direct child named `schema:short`.
    #[must_use]
    pub fn find_qualified(
        &self,
        id: NodeId,
        schema: &str,
        short: &str,
        ignore_case: bool,
    ) -> Option<NodeId> {
        self.find(id, &format!("{}:{}", schema, short), ignore_case)
    }

    /// First child whose attribute `name` is set and matches `needle`.
    ///
    /// The attribute is read under the needle's kind, so `"7"` matches `7`.
    /// With `recursive`, the direct children are checked first, then each
    /// child's subtree in order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use doctree::XmlDocument;
    ///
    /// let doc = XmlDocument::parse(r#"<r><a id="1"><b id="7"/></a></r>"#).unwrap();
    /// let root = doc.root();
    /// assert_eq!(doc.find_by_attribute(root, "id", 7, false), None);
    /// let b = doc.find_by_attribute(root, "id", 7, true).unwrap();
    /// assert_eq!(doc.name(b), "b");
    /// ```
    #[must_use]
    pub fn find_by_attribute(
        &self,
        id: NodeId,
        name: &str,
        needle: impl Into<Value>,
        recursive: bool,
    ) -> Option<NodeId> {
        self.find_by_attribute_value(id, name, &needle.into(), recursive)
    }

    fn find_by_attribute_value(
        &self,
        id: NodeId,
        name: &str,
        needle: &Value,
        recursive: bool,
    ) -> Option<NodeId> {
        let direct = self.children(id).iter().copied().find(|&child| {
            self.attributes(child)
                .get(name)
                .is_some_and(|v| !v.is_empty() && v.matches(needle))
        });
        if direct.is_some() || !recursive {
            return direct;
        }
        self.children(id)
            .iter()
            .find_map(|&child| self.find_by_attribute_value(child, name, needle, true))
    }

    /// First direct child carrying the given tag.
    #[must_use]
    pub fn find_by_tag(&self, id: NodeId, tag: i32) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.tag(child) == tag)
    }

    // ---- removal ----

    /// Destroys all children of `id`.
    pub fn clear(&mut self, id: NodeId) {
        self.arena.clear_children(id);
    }

    /// Destroys the child at `index`; out-of-range indices are ignored.
    pub fn delete(&mut self, id: NodeId, index: usize) {
        if let Some(child) = self.child(id, index) {
            self.arena.remove(child);
        }
    }

    /// Detaches and destroys `id` with its subtree. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        self.arena.remove(id);
        true
    }

    /// Empties the document: every element but the root is destroyed and the
    /// root loses its attributes, value and name.
    pub fn reset(&mut self) {
        self.arena.retain_only(self.root);
        *self.element_mut(self.root) = Element::named("");
        self.loaded = false;
    }

    /// Copies name, tag, caller data, value and attributes of `source` onto
    /// `target`; with `with_subtree` the children are replaced by a deep copy
    /// of the source's children.
    pub fn assign(&mut self, target: NodeId, source: NodeId, with_subtree: bool) {
        let snapshot = self.snapshot(source, with_subtree);
        self.apply(target, snapshot, with_subtree);
    }

    /// Like [`XmlDocument::assign`], reading `source` from another document.
    pub fn assign_from(
        &mut self,
        target: NodeId,
        other: &XmlDocument,
        source: NodeId,
        with_subtree: bool,
    ) {
        let snapshot = other.snapshot(source, with_subtree);
        self.apply(target, snapshot, with_subtree);
    }

    fn snapshot(&self, id: NodeId, with_subtree: bool) -> Snapshot {
        let children = if with_subtree {
            self.children(id)
                .iter()
                .map(|&child| self.snapshot(child, true))
                .collect()
        } else {
            Vec::new()
        };
        Snapshot {
            element: self.element(id).clone(),
            children,
        }
    }

    fn apply(&mut self, target: NodeId, snapshot: Snapshot, with_subtree: bool) {
        *self.element_mut(target) = snapshot.element;
        if with_subtree {
            self.clear(target);
            for child in snapshot.children {
                self.graft(target, child);
            }
        }
    }

    fn graft(&mut self, parent: NodeId, snapshot: Snapshot) {
        let id = self.arena.alloc(snapshot.element);
        self.arena.append(parent, id);
        for child in snapshot.children {
            self.graft(id, child);
        }
    }

    // ---- ordering ----

    /// Stable sort of the children of `id` by one attribute.
    ///
    /// Text sorting compares the attribute text; numeric sorting compares it
    /// as a 64-bit integer. Missing attributes sort as `""` or `0`.
    pub fn sort_by_attribute(&mut self, id: NodeId, name: &str, reverse: bool, numeric: bool) {
        let name = name.trim().to_string();
        match (numeric, reverse) {
            (true, false) => self.arena.sort_children_by_key(id, |e| {
                e.attributes.get(&name).and_then(Value::int64).unwrap_or(0)
            }),
            (true, true) => self.arena.sort_children_by_key(id, |e| {
                Reverse(e.attributes.get(&name).and_then(Value::int64).unwrap_or(0))
            }),
            (false, false) => self
                .arena
                .sort_children_by_key(id, |e| e.attributes.text(&name)),
            (false, true) => self
                .arena
                .sort_children_by_key(id, |e| Reverse(e.attributes.text(&name))),
        }
    }

    /// Swaps `id` with its previous sibling; `false` if it is first or detached.
    pub fn move_up(&mut self, id: NodeId) -> bool {
        match self.parent_index(id) {
            Some(index) if index > 0 => self.arena.reorder(id, index - 1),
            _ => false,
        }
    }

    /// Swaps `id` with its next sibling; `false` if it is last or detached.
    pub fn move_down(&mut self, id: NodeId) -> bool {
        match self.parent_index(id) {
            Some(index) => self.arena.reorder(id, index + 1),
            None => false,
        }
    }

    /// Moves `id` to position `index` among its siblings (clamped to the last
    /// position); `false` if nothing moved.
    pub fn move_to(&mut self, id: NodeId, index: usize) -> bool {
        self.arena.reorder(id, index)
    }

    /// Reparents `id` as the last child of `new_parent`.
    ///
    /// Refuses (returns `false`) to move the document root or to move an
    /// element into its own subtree.
    pub fn move_to_parent(&mut self, id: NodeId, new_parent: NodeId) -> bool {
        if id == self.root || self.arena.is_ancestor_or_self(id, new_parent) {
            return false;
        }
        self.arena.detach(id);
        self.arena.append(new_parent, id);
        true
    }

    /// Moves the children of `id` into its parent at its position, then
    /// destroys `id`. `false` if `id` has no parent.
    pub fn pull_up(&mut self, id: NodeId) -> bool {
        let (Some(parent), Some(index)) = (self.parent(id), self.parent_index(id)) else {
            return false;
        };
        let children = self.children(id).to_vec();
        for (offset, child) in children.into_iter().enumerate() {
            self.arena.detach(child);
            self.arena.insert(parent, index + 1 + offset, child);
        }
        self.arena.remove(id);
        true
    }

    /// Detaches `id` from its parent without destroying it.
    ///
    /// The element keeps its subtree and can be reattached with
    /// [`XmlDocument::move_to_parent`]. Detached elements are not serialized
    /// with the document.
    pub fn unbind(&mut self, id: NodeId) -> NodeId {
        self.arena.detach(id);
        id
    }

    // ---- navigation ----

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.parent(id)
    }

    /// Position of `id` among its siblings.
    #[must_use]
    pub fn parent_index(&self, id: NodeId) -> Option<usize> {
        self.arena.index_in_parent(id)
    }

    /// Topmost ancestor of `id` (the root, unless `id` is detached).
    #[must_use]
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.arena.root_of(id)
    }

    /// Names from the topmost ancestor down to `id`, joined by spaces.
    #[must_use]
    pub fn root_path(&self, id: NodeId) -> String {
        let mut names = vec![self.name(id)];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            names.push(self.name(parent));
            current = parent;
        }
        names.reverse();
        names.join(" ")
    }

    /// All elements below `id` in document order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.arena.descendants(id)
    }

    // ---- output ----

    /// Serializes without inter-tag whitespace.
    #[must_use]
    pub fn to_string_compact(&self) -> String {
        let options = self.options.clone().with_compact(true);
        self.to_string_with(&options)
    }

    /// Serializes the whole document with explicit options.
    #[must_use]
    pub fn to_string_with(&self, options: &XmlOptions) -> String {
        let mut out = String::new();
        ser::write_document(self, &mut out, options, options.default_codec);
        out
    }

    /// Serializes one element and its subtree, without a declaration.
    #[must_use]
    pub fn node_to_string(&self, id: NodeId) -> String {
        let mut out = String::new();
        ser::write_element(self, id, &mut out, &self.options, 0);
        out
    }

    /// Serializes and encodes the document.
    ///
    /// The declaration names the codec actually used: `codec`, or the default
    /// codec of the options.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedCodec`] for a `Windows` page outside
    /// the supported set.
    pub fn to_bytes(&self, codec: Option<Codec>, include_bom: bool) -> Result<Vec<u8>> {
        let codec = codec.unwrap_or(self.options.default_codec);
        let mut text = String::new();
        ser::write_document(self, &mut text, &self.options, codec);
        let mut bytes = Vec::with_capacity(text.len() + 3);
        if include_bom {
            if let Some(bom) = codec.bom() {
                bytes.extend_from_slice(bom);
            }
        }
        bytes.extend(codec.encode(&text)?);
        Ok(bytes)
    }
}

impl fmt::Display for XmlDocument {
    /// Serializes with the document's own options.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(&self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (XmlDocument, NodeId, NodeId, NodeId) {
        let mut doc = XmlDocument::new("root");
        let root = doc.root();
        let a = doc.append(root, "a");
        let b = doc.append(root, "b");
        (doc, root, a, b)
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  my name "), "my_name");
        assert_eq!(normalize_name("<x>"), "_x_");
        assert_eq!(normalize_name("1st"), "_st");
        assert_eq!(normalize_name("   "), "item");
        assert_eq!(normalize_name("ns:tag"), "ns:tag");
    }

    #[test]
    fn test_schema_and_short_names() {
        let (mut doc, _, a, _) = sample();
        doc.set_schema_name(a, "soap");
        assert_eq!(doc.name(a), "soap:a");
        doc.set_short_name(a, "Body");
        assert_eq!(doc.name(a), "soap:Body");
        assert_eq!(doc.schema_name(a), "soap");
        assert!(doc.is_short_name(a, "body", true));
        assert!(!doc.is_short_name(a, "body", false));
        doc.set_schema_name(a, " ");
        assert_eq!(doc.name(a), "Body");
        assert_eq!(doc.schema_name(a), "");
    }

    #[test]
    fn test_child_at_auto_creates_items() {
        let mut doc = XmlDocument::new("list");
        let root = doc.root();
        assert_eq!(doc.child(root, 2), None);
        let third = doc.child_at(root, 2);
        assert_eq!(doc.child_count(root), 3);
        assert_eq!(doc.name(third), "item");
        assert_eq!(doc.child_at(root, 0), doc.children(root)[0]);
        assert_eq!(doc.child_count(root), 3);
    }

    #[test]
    fn test_move_operations() {
        let (mut doc, root, a, b) = sample();
        let c = doc.append(root, "c");
        assert!(!doc.move_up(a));
        assert!(!doc.move_down(c));
        assert!(doc.move_down(a));
        assert_eq!(doc.children(root), &[b, a, c]);
        assert!(doc.move_to(c, 0));
        assert!(!doc.move_to(c, 0));
        assert_eq!(doc.children(root), &[c, b, a]);
    }

    #[test]
    fn test_move_to_parent_refuses_cycles() {
        let (mut doc, root, a, b) = sample();
        let leaf = doc.append(a, "leaf");
        assert!(!doc.move_to_parent(a, leaf));
        assert!(!doc.move_to_parent(a, a));
        assert!(!doc.move_to_parent(root, b));
        assert!(doc.move_to_parent(a, b));
        assert_eq!(doc.root_path(leaf), "root b a leaf");
    }

    #[test]
    fn test_pull_up_keeps_position() {
        let (mut doc, root, a, b) = sample();
        let x = doc.append(a, "x");
        let y = doc.append(a, "y");
        assert!(doc.pull_up(a));
        assert!(!doc.contains(a));
        assert_eq!(doc.children(root), &[x, y, b]);
        assert!(!doc.pull_up(root));
    }

    #[test]
    fn test_unbind_and_reattach() {
        let (mut doc, root, a, b) = sample();
        doc.unbind(a);
        assert_eq!(doc.parent(a), None);
        assert_eq!(doc.root_of(a), a);
        assert_eq!(doc.children(root), &[b]);
        assert!(doc.move_to_parent(a, b));
        assert_eq!(doc.parent_index(a), Some(0));
    }

    #[test]
    fn test_assign_with_subtree() {
        let (mut doc, _, a, b) = sample();
        doc.set_attr(a, "k", "v").unwrap();
        doc.append(a, "inner");
        doc.append(b, "old");
        doc.assign(b, a, true);
        assert_eq!(doc.name(b), "a");
        assert_eq!(doc.attributes(b).text("k"), "v");
        assert_eq!(doc.child_count(b), 1);
        assert_eq!(doc.name(doc.children(b)[0]), "inner");
        assert_ne!(doc.children(a)[0], doc.children(b)[0]);
    }

    #[test]
    fn test_assign_into_own_descendant() {
        let (mut doc, _, a, _) = sample();
        let inner = doc.append(a, "inner");
        doc.assign(inner, a, true);
        assert_eq!(doc.name(inner), "a");
        assert_eq!(doc.child_count(inner), 1);
        assert_eq!(doc.root_path(doc.children(inner)[0]), "root a a inner");
    }

    #[test]
    fn test_sort_by_attribute() {
        let mut doc = XmlDocument::new("r");
        let root = doc.root();
        for (name, rank) in [("x", "10"), ("y", "9"), ("z", "10")] {
            let id = doc.append(root, name);
            doc.set_attr(id, "rank", rank).unwrap();
        }
        let names = |doc: &XmlDocument| -> Vec<String> {
            doc.children(root).iter().map(|&c| doc.name(c).to_string()).collect()
        };
        doc.sort_by_attribute(root, "rank", false, false);
        assert_eq!(names(&doc), vec!["x", "z", "y"]);
        doc.sort_by_attribute(root, "rank", false, true);
        assert_eq!(names(&doc), vec!["y", "x", "z"]);
        doc.sort_by_attribute(root, "rank", true, true);
        assert_eq!(names(&doc), vec!["x", "z", "y"]);
    }

    #[test]
    fn test_delete_remove_reset() {
        let (mut doc, root, a, b) = sample();
        doc.delete(root, 5);
        doc.delete(root, 0);
        assert!(!doc.contains(a));
        assert!(doc.remove(b));
        assert!(!doc.remove(root));
        doc.set_attr(root, "x", 1).unwrap();
        doc.reset();
        assert_eq!(doc.name(root), "item");
        assert!(doc.attributes(root).is_empty());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_find_by_tag_and_case() {
        let (mut doc, root, _, b) = sample();
        doc.set_tag(b, 42);
        assert_eq!(doc.find_by_tag(root, 42), Some(b));
        assert_eq!(doc.find(root, "B", false), None);
        assert_eq!(doc.find(root, " B ", true), Some(b));
    }
}
