//! Character set helpers over [`encoding_rs`].
//!
//! Encoders for UTF-16 variants produce UTF-8, as `encoding_rs` does for
//! every encoding without an encoder of its own.

use std::{borrow::Cow, fmt};

pub use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};

use crate::error::{DataBindError, Result};

/// Character set of a stream.
pub type Charset = &'static Encoding;

/// Looks up a charset by its label (`"UTF-8"`, `"Shift_JIS"`, `"Windows-31J"`, ...).
///
/// # Examples
///
/// ```
/// use databind::charset;
///
/// assert_eq!(charset::for_label("windows-31j").unwrap(), charset::SHIFT_JIS);
/// assert!(charset::for_label("no-such-charset").is_err());
/// ```
pub fn for_label(label: &str) -> Result<Charset> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| DataBindError::Config(format!("unsupported charset. charset = [{label}]")))
}

/// A character the target charset has no mapping for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Unmappable {
    pub(crate) charset: Charset,
    pub(crate) character: char,
}

impl fmt::Display for Unmappable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "character can not be encoded. charset = [{}], character = [{}]",
            self.charset.name(),
            self.character
        )
    }
}

/// Encodes text; fails on the first character the charset can not represent.
pub(crate) fn encode<'a>(charset: Charset, text: &'a str) -> std::result::Result<Cow<'a, [u8]>, Unmappable> {
    let (bytes, _, had_unmappable) = charset.encode(text);
    if !had_unmappable {
        return Ok(bytes);
    }
    let mut buf = [0u8; 4];
    let character = text
        .chars()
        .find(|c| charset.encode(c.encode_utf8(&mut buf)).2)
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    Err(Unmappable { charset, character })
}

/// Encodes a single character.
pub(crate) fn encode_char(charset: Charset, c: char) -> std::result::Result<Vec<u8>, Unmappable> {
    let mut buf = [0u8; 4];
    encode(charset, c.encode_utf8(&mut buf)).map(Cow::into_owned)
}

/// Decodes bytes; malformed sequences become U+FFFD.
pub(crate) fn decode(charset: Charset, bytes: &[u8]) -> Cow<'_, str> {
    let (text, _) = charset.decode_without_bom_handling(bytes);
    text
}
