//! Ordered attribute collection of a markup element.
//!
//! [`Attributes`] wraps an [`IndexMap`] so attributes keep the order in which
//! they were created, which is the order they are written back out. Names are
//! trimmed and validated on creation; a name that could never be serialized as
//! markup is rejected with [`Error::InvalidName`].
//!
//! An attribute that exists but holds [`Value::Empty`] stays addressable and
//! keeps its position, but is skipped by the serializer and reported as absent
//! by [`Attributes::exists`].
//!
//! ## Examples
//!
//! ```rust
//! use doctree::{Attributes, Value};
//!
//! let mut attrs = Attributes::new();
//! attrs.set("id", 7).unwrap();
//! attrs.attr("state").unwrap().set_text("open");
//!
//! assert!(attrs.exists("id"));
//! assert_eq!(attrs.text("state"), "open");
//! assert_eq!(attrs.get("id").and_then(Value::int32), Some(7));
//!
//! let names: Vec<_> = attrs.iter().map(|(name, _)| name).collect();
//! assert_eq!(names, vec!["id", "state"]);
//!
//! assert!(attrs.set("1st", "x").is_err());
//! ```

use crate::error::{Error, Result};
use crate::value::Value;
use indexmap::IndexMap;

const FORBIDDEN: [(char, &str); 6] = [
    ('=', "="),
    (' ', "space"),
    ('>', ">"),
    ('<', "<"),
    ('"', "\""),
    ('\'', "'"),
];

/// Checks that a trimmed name can be used as an attribute name.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let Some(first) = name.chars().next() else {
        return Err(Error::invalid_name(name, "Index must not be empty"));
    };
    for (c, label) in FORBIDDEN {
        if name.contains(c) {
            let reason = format!("Index cannot contain character {}", label);
            return Err(Error::invalid_name(name, &reason));
        }
    }
    if first.is_ascii_digit() {
        return Err(Error::invalid_name(
            name,
            "Index cannot contain a number in the first character",
        ));
    }
    Ok(())
}

/// Name-unique, insertion-ordered attributes of one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(IndexMap<String, Value>);

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Attributes(IndexMap::new())
    }

    /// Number of attributes, including empty ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name.trim())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.0.get_mut(name.trim())
    }

    /// Attribute at `index` in creation order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&str, &Value)> {
        self.0.get_index(index).map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable access by name, creating an empty attribute if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the attribute has to be created and
    /// the trimmed name is empty, contains `=`, a space, `<`, `>`, or a quote,
    /// or starts with a digit.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use doctree::Attributes;
    ///
    /// let mut attrs = Attributes::new();
    /// assert!(attrs.attr("fresh").unwrap().is_empty());
    /// assert_eq!(attrs.len(), 1);
    /// assert!(!attrs.exists("fresh"));
    ///
    /// let err = attrs.attr("a=b").unwrap_err();
    /// assert_eq!(err.reason(), Some("Index cannot contain character ="));
    /// ```
    pub fn attr(&mut self, name: &str) -> Result<&mut Value> {
        let name = name.trim();
        if !self.0.contains_key(name) {
            validate_name(name)?;
        }
        Ok(self.0.entry(name.to_string()).or_default())
    }

    /// Sets an attribute, creating it if needed.
    ///
    /// # Errors
    ///
    /// Same as [`Attributes::attr`].
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        *self.attr(name)? = value.into();
        Ok(())
    }

    /// `true` if the attribute exists and holds a value.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Attribute value as text; missing and empty attributes read as `""`.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.get(name).and_then(Value::text).unwrap_or_default()
    }

    /// Removes an attribute, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name.trim())
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// All attributes in creation order, empty ones included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Attributes that hold a value, in creation order.
    pub fn iter_set(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.iter().filter(|(_, v)| !v.is_empty())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_trimmed() {
        let mut attrs = Attributes::new();
        attrs.set("  key ", "v").unwrap();
        assert!(attrs.exists("key"));
        assert_eq!(attrs.get(" key").and_then(Value::as_str), Some("v"));
    }

    #[test]
    fn test_validation_messages() {
        let reason = |name: &str| {
            Attributes::new()
                .attr(name)
                .unwrap_err()
                .reason()
                .map(str::to_string)
        };
        assert_eq!(reason("   ").as_deref(), Some("Index must not be empty"));
        assert_eq!(reason("a b").as_deref(), Some("Index cannot contain character space"));
        assert_eq!(reason("a<b").as_deref(), Some("Index cannot contain character <"));
        assert_eq!(reason("a\"b").as_deref(), Some("Index cannot contain character \""));
        assert_eq!(
            reason("9lives").as_deref(),
            Some("Index cannot contain a number in the first character")
        );
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut attrs = Attributes::new();
        for name in ["a", "b", "c"] {
            attrs.set(name, 1).unwrap();
        }
        assert_eq!(attrs.remove("b"), Some(Value::Int32(1)));
        assert_eq!(attrs.names().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(attrs.get_index(1).map(|(k, _)| k), Some("c"));
    }

    #[test]
    fn test_empty_attribute_is_not_set() {
        let mut attrs = Attributes::new();
        attrs.attr("x").unwrap();
        attrs.set("y", None::<i32>).unwrap();
        attrs.set("z", "").unwrap();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs.iter_set().count(), 1);
        assert_eq!(attrs.text("x"), "");
        assert_eq!(attrs.text("missing"), "");
    }
}
