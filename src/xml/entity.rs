//! Character entity escaping for markup text and attribute values.
//!
//! [`encode`] replaces the five markup-significant characters with their
//! named entities. [`decode`] reverses it, case-insensitively, and also
//! resolves decimal and hexadecimal character references. Anything that does
//! not form a known entity is left untouched.
//!
//! ```rust
//! use doctree::xml::entity::{decode, encode};
//!
//! assert_eq!(encode(r#"a<b & "c""#), "a&lt;b &amp; &quot;c&quot;");
//! assert_eq!(decode("&LT;&#65;&#x42;&unknown;"), "<AB&unknown;");
//! ```

use std::borrow::Cow;

// Longest entity body accepted between `&` and `;`.
const MAX_ENTITY_LEN: usize = 10;

#[inline]
fn escape_of(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '\'' => Some("&apos;"),
        '"' => Some("&quot;"),
        _ => None,
    }
}

/// Escapes `< > & ' "`; borrows the input when nothing needs escaping.
#[must_use]
pub fn encode(text: &str) -> Cow<'_, str> {
    let Some(first) = text.find(|c: char| escape_of(c).is_some()) else {
        return Cow::Borrowed(text);
    };
    let mut out = String::with_capacity(text.len() + 16);
    out.push_str(&text[..first]);
    for c in text[first..].chars() {
        match escape_of(c) {
            Some(entity) => out.push_str(entity),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Appends the escaped form of `text` to `out`.
pub(crate) fn encode_into(out: &mut String, text: &str) {
    out.push_str(&encode(text));
}

fn resolve(body: &str) -> Option<char> {
    if let Some(number) = body.strip_prefix('#') {
        let hex = number
            .strip_prefix('x')
            .or_else(|| number.strip_prefix('X'));
        let code = match hex {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match body.to_ascii_lowercase().as_str() {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => None,
    }
}

/// Resolves named and numeric entities; borrows the input when there are none.
#[must_use]
pub fn decode(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let resolved = tail
            .find(';')
            .filter(|&end| end <= MAX_ENTITY_LEN)
            .and_then(|end| resolve(&tail[..end]).map(|c| (c, end)));
        match resolved {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
