//! Single-pass markup parser.
//!
//! The parser walks the source once, character by character, and builds the
//! element tree directly in the document arena. What a character means depends
//! on the current [`Scan`] state; token text is sliced out of the source when a
//! delimiter ends it, so nothing is copied until a name or value is stored.
//!
//! Comments and CDATA sections switch off every other interpretation until
//! their terminator. `<?...?>` and other `<!...>` constructs are skipped.

use super::{entity, normalize_name, XmlDocument};
use crate::attributes::validate_name;
use crate::error::{Error, Result};
use crate::tree::NodeId;
use crate::value::Value;

const MISMATCH: &str = "Opening and closing tags do not match";
const NOT_CLOSED: &str = "Tag not closed";
const NO_ROOT: &str = "Document has no root element";

const COMMENT_OPEN: &str = "--";
const CDATA_OPEN: &str = "[CDATA[";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scan {
    /// Character data; `start` is where the current segment began.
    Text { start: usize },
    /// Just read `<`.
    Open,
    /// Read `<!`; deciding between comment, CDATA and declaration.
    Bang { start: usize },
    Comment { dashes: u8 },
    CData { start: usize, brackets: u8 },
    /// `<?...?>` or `<!...>`, skipped up to the first unquoted `>`.
    Declaration { quote: Option<char> },
    TagName { start: usize },
    CloseName { start: usize },
    AfterCloseName,
    /// Inside a start tag, between attributes.
    InTag,
    AttrName { start: usize },
    AfterAttrName,
    /// Read `=`, waiting for the value.
    AttrEquals,
    AttrValue { start: usize, quote: Option<char> },
    /// Read `/` inside a start tag.
    SelfClose,
}

struct Parser<'s, 'd> {
    src: &'s str,
    doc: &'d mut XmlDocument,
    scan: Scan,
    current: Option<NodeId>,
    has_root: bool,
    attr_name: &'s str,
    line: usize,
    col: usize,
}

impl<'s, 'd> Parser<'s, 'd> {
    fn new(doc: &'d mut XmlDocument, src: &'s str) -> Self {
        Parser {
            src,
            doc,
            scan: Scan::Text { start: 0 },
            current: None,
            has_root: false,
            attr_name: "",
            line: 1,
            col: 0,
        }
    }

    fn run(mut self) -> Result<()> {
        let mut prev = None;
        for (i, c) in self.src.char_indices() {
            match prev {
                Some('\n') => self.new_line(),
                Some('\r') if c != '\n' => self.new_line(),
                _ => self.col += 1,
            }
            prev = Some(c);
            self.step(i, c)?;
        }
        self.finish()
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.col = 1;
    }

    fn error(&self, reason: &str) -> Error {
        let tag = match self.current {
            Some(id) => self.doc.name(id),
            None => "-",
        };
        Error::xml_parse(reason, self.line, self.col.max(1), tag)
    }

    fn finish(self) -> Result<()> {
        if !matches!(self.scan, Scan::Text { .. }) || self.current.is_some() {
            return Err(self.error(NOT_CLOSED));
        }
        if !self.has_root {
            return Err(self.error(NO_ROOT));
        }
        Ok(())
    }

    fn step(&mut self, i: usize, c: char) -> Result<()> {
        let src = self.src;
        match self.scan {
            Scan::Text { start } => {
                if c == '<' {
                    self.push_text(&src[start..i], true);
                    self.scan = Scan::Open;
                }
            }
            Scan::Open => match c {
                '!' => self.scan = Scan::Bang { start: i + 1 },
                '?' => self.scan = Scan::Declaration { quote: None },
                '/' => self.scan = Scan::CloseName { start: i + 1 },
                '>' => self.scan = Scan::Text { start: i + 1 },
                c if c.is_whitespace() => {}
                _ => {
                    self.open_element();
                    self.scan = Scan::TagName { start: i };
                }
            },
            Scan::Bang { start } => {
                let head = &src[start..i + c.len_utf8()];
                if head == COMMENT_OPEN {
                    self.scan = Scan::Comment { dashes: 0 };
                } else if head == CDATA_OPEN {
                    self.scan = Scan::CData {
                        start: i + 1,
                        brackets: 0,
                    };
                } else if !COMMENT_OPEN.starts_with(head) && !CDATA_OPEN.starts_with(head) {
                    self.scan = Scan::Declaration { quote: None };
                    return self.step(i, c);
                }
            }
            Scan::Comment { dashes } => {
                self.scan = match c {
                    '-' => Scan::Comment {
                        dashes: (dashes + 1).min(2),
                    },
                    '>' if dashes >= 2 => Scan::Text { start: i + 1 },
                    _ => Scan::Comment { dashes: 0 },
                };
            }
            Scan::CData { start, brackets } => {
                self.scan = match c {
                    ']' => Scan::CData {
                        start,
                        brackets: (brackets + 1).min(2),
                    },
                    '>' if brackets >= 2 => {
                        self.push_text(&src[start..i - 2], false);
                        Scan::Text { start: i + 1 }
                    }
                    _ => Scan::CData { start, brackets: 0 },
                };
            }
            Scan::Declaration { quote } => match (quote, c) {
                (Some(q), c) if c == q => self.scan = Scan::Declaration { quote: None },
                (Some(_), _) => {}
                (None, '"' | '\'') => self.scan = Scan::Declaration { quote: Some(c) },
                (None, '>') => self.scan = Scan::Text { start: i + 1 },
                (None, _) => {}
            },
            Scan::TagName { start } => {
                let next = match c {
                    '/' => Scan::SelfClose,
                    '>' => Scan::Text { start: i + 1 },
                    c if c.is_whitespace() => Scan::InTag,
                    _ => return Ok(()),
                };
                if let Some(id) = self.current {
                    self.doc.set_name(id, &src[start..i]);
                }
                self.scan = next;
            }
            Scan::CloseName { start } => match c {
                '>' => {
                    self.check_close(&src[start..i])?;
                    self.close_element();
                    self.scan = Scan::Text { start: i + 1 };
                }
                c if c.is_whitespace() => {
                    if start == i {
                        self.scan = Scan::CloseName {
                            start: i + c.len_utf8(),
                        };
                    } else {
                        self.check_close(&src[start..i])?;
                        self.scan = Scan::AfterCloseName;
                    }
                }
                _ => {}
            },
            Scan::AfterCloseName => {
                if c == '>' {
                    self.close_element();
                    self.scan = Scan::Text { start: i + 1 };
                }
            }
            Scan::InTag => match c {
                '/' => self.scan = Scan::SelfClose,
                '>' => self.scan = Scan::Text { start: i + 1 },
                '=' | '"' | '\'' => {}
                c if c.is_whitespace() => {}
                _ => self.scan = Scan::AttrName { start: i },
            },
            Scan::AttrName { start } => match c {
                '=' => {
                    self.attr_name = &src[start..i];
                    self.scan = Scan::AttrEquals;
                }
                '/' => self.scan = Scan::SelfClose,
                '>' => self.scan = Scan::Text { start: i + 1 },
                c if c.is_whitespace() => {
                    self.attr_name = &src[start..i];
                    self.scan = Scan::AfterAttrName;
                }
                _ => {}
            },
            // An attribute without `=` has no value and is dropped.
            Scan::AfterAttrName => match c {
                '=' => self.scan = Scan::AttrEquals,
                '/' => self.scan = Scan::SelfClose,
                '>' => self.scan = Scan::Text { start: i + 1 },
                c if c.is_whitespace() => {}
                _ => self.scan = Scan::AttrName { start: i },
            },
            Scan::AttrEquals => match c {
                '"' | '\'' => {
                    self.scan = Scan::AttrValue {
                        start: i + 1,
                        quote: Some(c),
                    }
                }
                '/' => self.scan = Scan::SelfClose,
                '>' => self.scan = Scan::Text { start: i + 1 },
                c if c.is_whitespace() => {}
                _ => {
                    self.scan = Scan::AttrValue {
                        start: i,
                        quote: None,
                    }
                }
            },
            Scan::AttrValue {
                start,
                quote: Some(q),
            } => {
                if c == q {
                    self.set_attribute(&src[start..i])?;
                    self.scan = Scan::InTag;
                }
            }
            Scan::AttrValue { start, quote: None } => {
                let next = match c {
                    '>' => Scan::Text { start: i + 1 },
                    '/' if src[i + 1..].starts_with('>') => Scan::SelfClose,
                    c if c.is_whitespace() => Scan::InTag,
                    _ => return Ok(()),
                };
                self.set_attribute(&src[start..i])?;
                self.scan = next;
            }
            Scan::SelfClose => match c {
                '>' => {
                    self.close_element();
                    self.scan = Scan::Text { start: i + 1 };
                }
                c if c.is_whitespace() => {}
                _ => {
                    self.scan = Scan::InTag;
                    return self.step(i, c);
                }
            },
        }
        Ok(())
    }

    /// Creates the element whose start tag begins here and makes it current.
    /// A second top-level element re-enters the root.
    fn open_element(&mut self) {
        let id = match self.current {
            Some(parent) => self.doc.append(parent, ""),
            None => {
                self.has_root = true;
                self.doc.root()
            }
        };
        self.current = Some(id);
    }

    fn close_element(&mut self) {
        self.current = self.current.and_then(|id| self.doc.parent(id));
    }

    fn check_close(&self, name: &str) -> Result<()> {
        match self.current {
            Some(id) if self.doc.name(id) == normalize_name(name) => Ok(()),
            _ => Err(self.error(MISMATCH)),
        }
    }

    fn set_attribute(&mut self, raw: &str) -> Result<()> {
        let Some(id) = self.current else {
            return Ok(());
        };
        let name = self.attr_name.trim();
        if let Err(err) = validate_name(name) {
            let reason = err.reason().unwrap_or("Invalid attribute name").to_string();
            return Err(self.error(&reason));
        }
        self.doc
            .set_attr(id, name, entity::decode(raw).into_owned())
    }

    /// Appends a body segment to the current element; `decode` is false for CDATA.
    fn push_text(&mut self, segment: &str, decode: bool) {
        let Some(id) = self.current else {
            return;
        };
        let text = if decode {
            if segment.trim().is_empty() {
                return;
            }
            entity::decode(segment)
        } else if segment.is_empty() {
            return;
        } else {
            segment.into()
        };
        match self.doc.value_mut(id) {
            Value::Text(existing) => existing.push_str(&text),
            other => *other = Value::Text(text.into_owned()),
        }
    }
}

/// Replaces the content of `doc` with the tree parsed from `text`.
pub(crate) fn load(doc: &mut XmlDocument, text: &str) -> Result<()> {
    doc.reset();
    match Parser::new(doc, text).run() {
        Ok(()) => {
            doc.loaded = true;
            tracing::debug!(
                elements = doc.len(),
                chars = text.len(),
                "parsed markup document"
            );
            Ok(())
        }
        Err(err) => {
            tracing::debug!(error = %err, "markup parse failed");
            doc.reset();
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> XmlDocument {
        XmlDocument::parse(text).unwrap()
    }

    fn parse_err(text: &str) -> Error {
        XmlDocument::parse(text).unwrap_err()
    }

    #[test]
    fn test_mismatched_close_position() {
        let err = parse_err("<a><b></a>");
        assert_eq!(err.reason(), Some(MISMATCH));
        assert_eq!(err.line(), Some(1));
        assert_eq!(err.column(), Some(10));
        assert_eq!(err.tag_name(), Some("b"));
    }

    #[test]
    fn test_line_counting() {
        let err = parse_err("<a>\r\n<b>\n</c>");
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.column(), Some(4));
        let err = parse_err("<a>\r<b>\r</c>");
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_unclosed_and_empty() {
        let err = parse_err("<a><b/>");
        assert_eq!(err.reason(), Some(NOT_CLOSED));
        assert_eq!(err.tag_name(), Some("a"));
        assert_eq!(parse_err("<a><!-- open").reason(), Some(NOT_CLOSED));
        assert_eq!(parse_err("<a x=\"1").reason(), Some(NOT_CLOSED));
        assert_eq!(parse_err("").reason(), Some(NO_ROOT));
        assert_eq!(parse_err("just text").reason(), Some(NO_ROOT));
        assert_eq!(parse_err("<?xml version=\"1.0\"?>").reason(), Some(NO_ROOT));
    }

    #[test]
    fn test_stray_close_tag() {
        let err = parse_err("</a>");
        assert_eq!(err.reason(), Some(MISMATCH));
        assert_eq!(err.tag_name(), Some("-"));
    }

    #[test]
    fn test_attributes_quoted_and_bare() {
        let doc = parse("<a x='1' y=\"two words\" z=3 flag w=a&amp;b/>");
        let root = doc.root();
        let attrs = doc.attributes(root);
        assert_eq!(attrs.text("x"), "1");
        assert_eq!(attrs.text("y"), "two words");
        assert_eq!(attrs.text("z"), "3");
        assert_eq!(attrs.text("w"), "a&b");
        assert!(attrs.get("flag").is_none());
        assert_eq!(attrs.len(), 4);
    }

    #[test]
    fn test_invalid_attribute_name() {
        let err = parse_err("<a 1x=\"v\"/>");
        assert_eq!(
            err.reason(),
            Some("Index cannot contain a number in the first character")
        );
        assert_eq!(err.tag_name(), Some("a"));
    }

    #[test]
    fn test_comments_and_cdata_are_opaque() {
        let doc = parse("<a><!-- <b> --><![CDATA[<raw> & ]]]></a>");
        let root = doc.root();
        assert_eq!(doc.child_count(root), 0);
        assert_eq!(doc.text(root), "<raw> & ]");
    }

    #[test]
    fn test_text_segments_concatenate() {
        let doc = parse("<a>one<b/> \n <c/>two &lt;3</a>");
        assert_eq!(doc.text(doc.root()), "onetwo <3");
    }

    #[test]
    fn test_declaration_and_doctype_skipped() {
        let doc = parse("<?xml version=\"1.0\" encoding=\"utf-8\"?>\r\n<!DOCTYPE note>\r\n<note a='?>'/>");
        assert_eq!(doc.name(doc.root()), "note");
        assert_eq!(doc.attributes(doc.root()).text("a"), "?>");
        assert!(doc.is_loaded());
    }

    #[test]
    fn test_second_top_level_element_reenters_root() {
        let doc = parse("<a><x/></a><b><y/></b>");
        let root = doc.root();
        assert_eq!(doc.name(root), "b");
        assert_eq!(doc.child_count(root), 2);
    }

    #[test]
    fn test_failed_load_leaves_document_empty() {
        let mut doc = parse("<a><b/></a>");
        assert!(doc.load_str("<a><b></a>").is_err());
        assert!(!doc.is_loaded());
        assert_eq!(doc.child_count(doc.root()), 0);
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_close_tag_with_whitespace() {
        let doc = parse("<a ><b></b ></ a>");
        assert_eq!(doc.child_count(doc.root()), 1);
    }
}
