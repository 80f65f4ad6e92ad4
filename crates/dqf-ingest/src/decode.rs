//! Text decoding with a Latin-1 fallback.

use std::fmt;

use encoding_rs::{UTF_8, WINDOWS_1252};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf8Bom,
    /// Windows-1252, the superset browsers use for `latin1` labels.
    Latin1,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Bom => "utf-8 (bom)",
            Self::Latin1 => "latin-1",
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UTF-16 byte order mark name, if `bytes` starts with one.
pub(crate) fn utf16_bom(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xFE, ..] => Some("UTF-16 LE"),
        [0xFE, 0xFF, ..] => Some("UTF-16 BE"),
        _ => None,
    }
}

/// Decodes `bytes` as UTF-8, stripping a byte order mark, or as Latin-1 when
/// the bytes are not valid UTF-8.
pub fn decode_bytes(bytes: &[u8]) -> (String, TextEncoding) {
    let (body, encoding) = match bytes.strip_prefix(UTF8_BOM) {
        Some(body) => (body, TextEncoding::Utf8Bom),
        None => (bytes, TextEncoding::Utf8),
    };
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(body) {
        return (text.into_owned(), encoding);
    }
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(body);
    (text.into_owned(), TextEncoding::Latin1)
}
