//! Configuration options for parsing and serialization.
//!
//! - [`NumberFormat`]: the decimal separator used when text is read as a number
//! - [`XmlOptions`]: markup layout, declaration and codec defaults
//! - [`JsonOptions`]: compact or indented JSON layout
//!
//! ## Examples
//!
//! ```rust
//! use doctree::{Codec, XmlOptions, JsonOptions, NumberFormat};
//!
//! let xml = XmlOptions::new()
//!     .with_indent("  ")
//!     .with_newline("\n")
//!     .with_default_codec(Codec::Windows(1251));
//!
//! let json = JsonOptions::pretty().with_indent(4);
//!
//! let comma = NumberFormat::new().with_decimal_separator(',');
//! assert_eq!(comma.normalize("3,25"), "3.25");
//! ```

use crate::codec::Codec;
use std::borrow::Cow;

/// Decimal separator configuration for text → number conversions.
///
/// Text is always *written* with `.`; the separator only affects how text
/// is *read*: the configured separator is rewritten to `.` before parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimal_separator: char,
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            decimal_separator: '.',
        }
    }
}

impl NumberFormat {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the separator that marks the fractional part in text values.
    #[must_use]
    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    /// Rewrites the configured separator to `.`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use doctree::NumberFormat;
    ///
    /// assert_eq!(NumberFormat::new().normalize("1.5"), "1.5");
    /// assert_eq!(NumberFormat::new().with_decimal_separator(',').normalize("1,5"), "1.5");
    /// ```
    #[must_use]
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.decimal_separator == '.' || !text.contains(self.decimal_separator) {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(text.replace(self.decimal_separator, "."))
        }
    }
}

/// Configuration for markup parsing and serialization.
///
/// # Examples
///
/// ```rust
/// use doctree::XmlOptions;
///
/// let options = XmlOptions::new();
/// assert_eq!(options.indent, "\t");
/// assert!(!options.compact);
///
/// let options = XmlOptions::compact().with_declaration(false);
/// assert!(options.compact);
/// ```
#[derive(Clone, Debug)]
pub struct XmlOptions {
    /// Text repeated once per nesting level in pretty mode.
    pub indent: String,
    /// Line break written after every tag in pretty mode.
    pub newline: String,
    pub compact: bool,
    /// Emit the `<?xml ...?>` declaration line.
    pub declaration: bool,
    /// Codec used when a byte buffer has neither a BOM nor an encoding declaration.
    pub default_codec: Codec,
    pub number_format: NumberFormat,
}

impl Default for XmlOptions {
    fn default() -> Self {
        XmlOptions {
            indent: "\t".to_string(),
            newline: "\r\n".to_string(),
            compact: false,
            declaration: true,
            default_codec: Codec::Utf8,
            number_format: NumberFormat::default(),
        }
    }
}

impl XmlOptions {
    /// Creates default options (pretty, tab indent, CRLF, declaration, UTF-8).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for compact output without inter-tag whitespace.
    #[must_use]
    pub fn compact() -> Self {
        XmlOptions {
            compact: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    #[must_use]
    pub fn with_newline(mut self, newline: &str) -> Self {
        self.newline = newline.to_string();
        self
    }

    #[must_use]
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    #[must_use]
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    #[must_use]
    pub fn with_default_codec(mut self, codec: Codec) -> Self {
        self.default_codec = codec;
        self
    }

    #[must_use]
    pub fn with_number_format(mut self, number_format: NumberFormat) -> Self {
        self.number_format = number_format;
        self
    }
}

/// Configuration for JSON serialization.
///
/// # Examples
///
/// ```rust
/// use doctree::JsonOptions;
///
/// let options = JsonOptions::new();
/// assert!(!options.pretty);
///
/// let options = JsonOptions::pretty();
/// assert_eq!(options.indent, 2);
/// ```
#[derive(Clone, Debug)]
pub struct JsonOptions {
    pub pretty: bool,
    /// Spaces per nesting level in pretty mode and in the block rendering.
    pub indent: usize,
    pub newline: String,
    pub number_format: NumberFormat,
}

impl Default for JsonOptions {
    fn default() -> Self {
        JsonOptions {
            pretty: false,
            indent: 2,
            newline: "\r\n".to_string(),
            number_format: NumberFormat::default(),
        }
    }
}

impl JsonOptions {
    /// Creates default options (compact output).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for indented output.
    #[must_use]
    pub fn pretty() -> Self {
        JsonOptions {
            pretty: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_newline(mut self, newline: &str) -> Self {
        self.newline = newline.to_string();
        self
    }

    #[must_use]
    pub fn with_number_format(mut self, number_format: NumberFormat) -> Self {
        self.number_format = number_format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_borrows_when_unchanged() {
        let fmt = NumberFormat::new().with_decimal_separator(',');
        assert!(matches!(fmt.normalize("12"), Cow::Borrowed(_)));
        assert_eq!(fmt.normalize("1,25"), "1.25");
    }

    #[test]
    fn test_xml_builder() {
        let options = XmlOptions::new().with_indent("  ").with_newline("\n");
        assert_eq!(options.indent, "  ");
        assert_eq!(options.newline, "\n");
        assert_eq!(options.default_codec, Codec::Utf8);
    }
}
