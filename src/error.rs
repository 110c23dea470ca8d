//! Error types for document parsing and manipulation.
//!
//! ## Error Categories
//!
//! - **Markup parse errors**: a closing tag that does not match, or input that ends while
//!   an element is still open. These carry the 1-based line and column where the problem
//!   was detected plus the name of the element that was current at that point.
//! - **Name errors**: attribute or index names that can never be written back as markup
//!   (they contain `=`, a space, `<`, `>`, a quote, or start with a digit).
//! - **Codec errors**: unknown code pages or encoding labels.
//! - **I/O errors**: reader/writer failures in the thin stream helpers.
//!
//! Lenient value getters never produce errors; see [`crate::Value`].
//!
//! ## Examples
//!
//! ```rust
//! use doctree::{parse_xml, Error};
//!
//! let err = parse_xml("<a><b></a>").unwrap_err();
//! assert_eq!(err.line(), Some(1));
//! assert_eq!(err.column(), Some(10));
//! assert_eq!(err.tag_name(), Some("b"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents every failure the crate can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Structural markup error with position
    #[error("XML parse error: {reason}. Line {line}, Col: {col}, Tag: {tag}")]
    XmlParse {
        reason: String,
        line: usize,
        col: usize,
        tag: String,
    },

    /// Attribute or index name that cannot be used
    #[error("Invalid name `{name}`: {reason}")]
    InvalidName { name: String, reason: String },

    /// Unknown code page or encoding label
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Creates a markup parse error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use doctree::Error;
    ///
    /// let err = Error::xml_parse("Tag not closed", 3, 7, "item");
    /// assert!(err.to_string().contains("Line 3, Col: 7, Tag: item"));
    /// ```
    pub fn xml_parse(reason: &str, line: usize, col: usize, tag: &str) -> Self {
        Error::XmlParse {
            reason: reason.to_string(),
            line,
            col,
            tag: tag.to_string(),
        }
    }

    /// Creates a name validation error.
    pub fn invalid_name(name: &str, reason: &str) -> Self {
        Error::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates an unsupported codec error.
    pub fn unsupported_codec<T: fmt::Display>(what: T) -> Self {
        Error::UnsupportedCodec(what.to_string())
    }

    /// Line of a markup parse error.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::XmlParse { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Column of a markup parse error.
    #[must_use]
    pub fn column(&self) -> Option<usize> {
        match self {
            Error::XmlParse { col, .. } => Some(*col),
            _ => None,
        }
    }

    /// Element that was current when a markup parse error was raised.
    #[must_use]
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Error::XmlParse { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Reason text of a markup parse error or name error.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Error::XmlParse { reason, .. } | Error::InvalidName { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_parse_display() {
        let err = Error::xml_parse("Opening and closing tags do not match", 1, 10, "b");
        assert_eq!(
            err.to_string(),
            "XML parse error: Opening and closing tags do not match. Line 1, Col: 10, Tag: b"
        );
        assert_eq!(err.reason(), Some("Opening and closing tags do not match"));
    }

    #[test]
    fn test_accessors_on_other_variants() {
        let err = Error::invalid_name("1st", "Index cannot contain a number in the first character");
        assert_eq!(err.line(), None);
        assert_eq!(err.tag_name(), None);
        assert!(err.to_string().contains("1st"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "stream ended");
        let err: Error = io.into();
        assert_eq!(err, Error::Io("stream ended".to_string()));
        assert_eq!(err.to_string(), "IO error: stream ended");
    }
}
