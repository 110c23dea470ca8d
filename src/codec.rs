//! Byte encodings for loading and saving documents.
//!
//! A [`Codec`] names one of the supported text encodings by its Windows code
//! page number. Byte buffers are decoded before parsing and serialized text is
//! encoded afterwards; when a buffer carries no explicit codec,
//! [`Codec::sniff`] looks at the byte-order mark and the `<?xml encoding=...?>`
//! declaration.
//!
//! ## Examples
//!
//! ```rust
//! use doctree::Codec;
//!
//! let codec = Codec::from_code_page(1251).unwrap();
//! assert_eq!(codec.label(), "Windows-1251");
//!
//! let bytes = codec.encode("Привет").unwrap();
//! assert_eq!(bytes.len(), 6);
//! assert_eq!(codec.decode(&bytes).unwrap(), "Привет");
//!
//! let sniffed = Codec::sniff(br#"<?xml version="1.0" encoding="utf-7"?><a/>"#).unwrap();
//! assert_eq!(sniffed, Some(Codec::Utf7));
//! ```

use crate::error::{Error, Result};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use encoding_rs::Encoding;
use std::fmt;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

// Only the head of a buffer is searched for an encoding declaration.
const DECLARATION_WINDOW: usize = 1024;

// Modified base64 of UTF-7: standard alphabet, never padded.
const UTF7_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// A supported text encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Codec {
    /// Code page 65001.
    #[default]
    Utf8,
    /// Code page 65000.
    Utf7,
    /// Code page 1200.
    Utf16Le,
    /// Code page 1201.
    Utf16Be,
    /// A single-byte Windows code page: 874 or 1250 to 1258.
    Windows(u16),
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Codec {
    /// Looks up a codec by its Windows code page number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCodec`] for any other number.
    pub fn from_code_page(code_page: u32) -> Result<Self> {
        let codec = match code_page {
            65001 => Codec::Utf8,
            65000 => Codec::Utf7,
            1200 => Codec::Utf16Le,
            1201 => Codec::Utf16Be,
            874 | 1250..=1258 => Codec::Windows(code_page as u16),
            _ => return Err(Error::unsupported_codec(format!("code page {}", code_page))),
        };
        Ok(codec)
    }

    #[must_use]
    pub fn code_page(&self) -> u32 {
        match self {
            Codec::Utf8 => 65001,
            Codec::Utf7 => 65000,
            Codec::Utf16Le => 1200,
            Codec::Utf16Be => 1201,
            Codec::Windows(page) => u32::from(*page),
        }
    }

    /// Name written into the `encoding` attribute of a markup declaration.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Codec::Utf8 => "utf-8".to_string(),
            Codec::Utf7 => "utf-7".to_string(),
            Codec::Utf16Le => "utf-16".to_string(),
            Codec::Utf16Be => "unicodeFFFE".to_string(),
            Codec::Windows(page) => format!("Windows-{}", page),
        }
    }

    /// Byte-order mark for this codec, if it has one.
    #[must_use]
    pub fn bom(&self) -> Option<&'static [u8]> {
        match self {
            Codec::Utf8 => Some(UTF8_BOM),
            Codec::Utf16Le => Some(UTF16LE_BOM),
            Codec::Utf16Be => Some(UTF16BE_BOM),
            Codec::Utf7 | Codec::Windows(_) => None,
        }
    }

    fn single_byte(page: u16) -> Result<&'static Encoding> {
        let encoding = match page {
            874 => encoding_rs::WINDOWS_874,
            1250 => encoding_rs::WINDOWS_1250,
            1251 => encoding_rs::WINDOWS_1251,
            1252 => encoding_rs::WINDOWS_1252,
            1253 => encoding_rs::WINDOWS_1253,
            1254 => encoding_rs::WINDOWS_1254,
            1255 => encoding_rs::WINDOWS_1255,
            1256 => encoding_rs::WINDOWS_1256,
            1257 => encoding_rs::WINDOWS_1257,
            1258 => encoding_rs::WINDOWS_1258,
            _ => return Err(Error::unsupported_codec(format!("code page {}", page))),
        };
        Ok(encoding)
    }

    /// Decodes a byte buffer, skipping this codec's byte-order mark when present.
    ///
    /// Malformed sequences decode to U+FFFD.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCodec`] for a `Windows` page outside the supported set.
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        let bytes = match self.bom() {
            Some(bom) if bytes.starts_with(bom) => &bytes[bom.len()..],
            _ => bytes,
        };
        let text = match self {
            Codec::Utf8 => encoding_rs::UTF_8.decode_without_bom_handling(bytes).0,
            Codec::Utf16Le => encoding_rs::UTF_16LE.decode_without_bom_handling(bytes).0,
            Codec::Utf16Be => encoding_rs::UTF_16BE.decode_without_bom_handling(bytes).0,
            Codec::Windows(page) => Self::single_byte(*page)?
                .decode_without_bom_handling(bytes)
                .0,
            Codec::Utf7 => return Ok(decode_utf7(bytes)),
        };
        Ok(text.into_owned())
    }

    /// Encodes text without a byte-order mark.
    ///
    /// Characters a single-byte page cannot represent are written as numeric
    /// character references (`&#NNNN;`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCodec`] for a `Windows` page outside the supported set.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let bytes = match self {
            Codec::Utf8 => text.as_bytes().to_vec(),
            Codec::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Codec::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Codec::Utf7 => encode_utf7(text),
            Codec::Windows(page) => Self::single_byte(*page)?.encode(text).0.into_owned(),
        };
        Ok(bytes)
    }

    /// Detects the codec of a markup buffer.
    ///
    /// Checks, in order: a UTF-16 byte-order mark, a UTF-8 byte-order mark, and
    /// the `encoding` of a leading `<?xml ...?>` declaration. Returns `None`
    /// when nothing identifies the codec, leaving the choice to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCodec`] when the declaration names a Windows
    /// code page that is not supported.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use doctree::Codec;
    ///
    /// assert_eq!(Codec::sniff(&[0xFF, 0xFE, b'<', 0]).unwrap(), Some(Codec::Utf16Le));
    /// assert_eq!(Codec::sniff(b"<a/>").unwrap(), None);
    /// assert_eq!(
    ///     Codec::sniff(b"<?xml version=\"1.0\" encoding=\"windows-1252\"?><a/>").unwrap(),
    ///     Some(Codec::Windows(1252))
    /// );
    /// ```
    pub fn sniff(bytes: &[u8]) -> Result<Option<Codec>> {
        if bytes.starts_with(UTF16LE_BOM) {
            return Ok(Some(Codec::Utf16Le));
        }
        if bytes.starts_with(UTF16BE_BOM) {
            return Ok(Some(Codec::Utf16Be));
        }
        if bytes.starts_with(UTF8_BOM) {
            return Ok(Some(Codec::Utf8));
        }
        match declared_encoding(bytes) {
            Some(label) => Self::from_label(&label),
            None => Ok(None),
        }
    }

    fn from_label(label: &str) -> Result<Option<Codec>> {
        if label.contains("utf-8") {
            return Ok(Some(Codec::Utf8));
        }
        if label.contains("utf-7") {
            return Ok(Some(Codec::Utf7));
        }
        if label.contains("unicodefffe") {
            return Ok(Some(Codec::Utf16Be));
        }
        if label.contains("unicode") || label.contains("utf-16") {
            return Ok(Some(Codec::Utf16Le));
        }
        if let Some(pos) = label.find("windows-") {
            let digits = label[pos + "windows-".len()..].trim();
            let page: u32 = digits
                .parse()
                .map_err(|_| Error::unsupported_codec(label))?;
            return Self::from_code_page(page).map(Some);
        }
        Ok(None)
    }
}

/// Lower-cased `encoding` value of a leading `<?xml ...?>` declaration.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(DECLARATION_WINDOW)];
    let start = head.windows(2).position(|w| w == b"<?")? + 2;
    let len = head[start..].windows(2).position(|w| w == b"?>")?;
    let declaration = String::from_utf8_lossy(&head[start..start + len]).to_ascii_lowercase();
    if !declaration.starts_with("xml") {
        return None;
    }
    let value = &declaration[declaration.find("encoding")? + "encoding".len()..];
    let value = value.trim_start().strip_prefix('=')?.trim_start();
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'');
    let value = match quote {
        Some(q) => {
            let rest = &value[1..];
            &rest[..rest.find(q).unwrap_or(rest.len())]
        }
        None => value.split_whitespace().next().unwrap_or_default(),
    };
    Some(value.trim().to_string())
}

fn is_utf7_direct(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | ' '..='~') && c != '+' && c != '\\' && c != '~'
}

fn is_base64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/'
}

fn encode_utf7(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut pending: Vec<u8> = Vec::new();

    let flush = |pending: &mut Vec<u8>, out: &mut Vec<u8>| {
        if !pending.is_empty() {
            out.push(b'+');
            out.extend_from_slice(UTF7_ENGINE.encode(&pending[..]).as_bytes());
            out.push(b'-');
            pending.clear();
        }
    };

    for c in text.chars() {
        if c == '+' {
            flush(&mut pending, &mut out);
            out.extend_from_slice(b"+-");
        } else if is_utf7_direct(c) {
            flush(&mut pending, &mut out);
            out.push(c as u8);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                pending.extend_from_slice(&unit.to_be_bytes());
            }
        }
    }
    flush(&mut pending, &mut out);
    out
}

fn decode_utf7(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'+' {
            out.push(char::from(b));
            i += 1;
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && is_base64_byte(bytes[end]) {
            end += 1;
        }
        if end == start {
            // "+-" is a literal plus; a lone "+" is kept as is.
            out.push('+');
        } else {
            match UTF7_ENGINE.decode(&bytes[start..end]) {
                Ok(raw) => {
                    let units = raw
                        .chunks_exact(2)
                        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                    out.extend(
                        char::decode_utf16(units)
                            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)),
                    );
                }
                Err(_) => out.push(char::REPLACEMENT_CHARACTER),
            }
        }
        i = end;
        if i < bytes.len() && bytes[i] == b'-' {
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_page_round_trip() {
        for page in [65001, 65000, 1200, 1201, 874, 1250, 1258] {
            assert_eq!(Codec::from_code_page(page).unwrap().code_page(), page);
        }
        assert!(matches!(
            Codec::from_code_page(437),
            Err(Error::UnsupportedCodec(_))
        ));
    }

    #[test]
    fn test_utf16_encode_decode() {
        let bytes = Codec::Utf16Le.encode("<a/>").unwrap();
        assert_eq!(&bytes[..2], &[b'<', 0]);
        let mut with_bom = UTF16LE_BOM.to_vec();
        with_bom.extend_from_slice(&bytes);
        assert_eq!(Codec::Utf16Le.decode(&with_bom).unwrap(), "<a/>");
        let be = Codec::Utf16Be.encode("é").unwrap();
        assert_eq!(be, vec![0x00, 0xE9]);
    }

    #[test]
    fn test_utf7() {
        assert_eq!(encode_utf7("Hi Mom -\u{263A}-!"), b"Hi Mom -+Jjo--!".to_vec());
        assert_eq!(encode_utf7("1 + 1"), b"1 +- 1".to_vec());
        assert_eq!(decode_utf7(b"Hi Mom -+Jjo--!"), "Hi Mom -\u{263A}-!");
        assert_eq!(decode_utf7(b"A+ImIDkQ."), "A\u{2262}\u{0391}.");
        assert_eq!(decode_utf7(b"1 +- 1"), "1 + 1");
    }

    #[test]
    fn test_sniff_declaration() {
        let sniff = |s: &str| Codec::sniff(s.as_bytes()).unwrap();
        assert_eq!(sniff("<?xml version='1.0' encoding='UTF-8'?><a/>"), Some(Codec::Utf8));
        assert_eq!(sniff("<?xml version=\"1.0\" encoding=\"unicode\"?>"), Some(Codec::Utf16Le));
        assert_eq!(sniff("<?xml version=\"1.0\" encoding=\"iso-8859-1\"?>"), None);
        assert_eq!(sniff("<?xml version=\"1.0\"?><a/>"), None);
        assert!(Codec::sniff(b"<?xml version=\"1.0\" encoding=\"windows-9999\"?>").is_err());
    }

    #[test]
    fn test_sniff_bom_wins() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"windows-1251\"?><a/>");
        assert_eq!(Codec::sniff(&bytes).unwrap(), Some(Codec::Utf8));
        assert_eq!(Codec::Utf8.decode(&bytes).unwrap().chars().next(), Some('<'));
    }
}
