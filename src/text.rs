//! Text encoding at presentation boundaries.
//!
//! Wire data stays as bytes everywhere in this crate. [`TextEncoding`] is the
//! session's hint for turning those bytes into text for display and for
//! encoding text the library generates itself (CTCP replies). With the
//! `encoding` feature it is backed by `encoding_rs` and understands any WHATWG
//! label; without it only UTF-8 is available and decoding is lossy.

use std::borrow::Cow;
use std::fmt;

#[cfg(feature = "encoding")]
use encoding::Encoding;

/// A text encoding selected by label.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding {
    #[cfg(feature = "encoding")]
    inner: &'static Encoding,
}

impl TextEncoding {
    /// UTF-8.
    pub fn utf8() -> Self {
        Self {
            #[cfg(feature = "encoding")]
            inner: encoding::UTF_8,
        }
    }

    /// Look up an encoding by label (e.g. `"utf-8"`, `"iso-8859-1"`).
    ///
    /// Returns `None` for unknown labels.
    pub fn for_label(label: &str) -> Option<Self> {
        #[cfg(feature = "encoding")]
        {
            Encoding::for_label(label.trim().as_bytes()).map(|inner| Self { inner })
        }

        #[cfg(not(feature = "encoding"))]
        {
            let label = label.trim();
            (label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8"))
                .then(Self::utf8)
        }
    }

    /// Look up an encoding by label, falling back to UTF-8 with a warning.
    pub fn for_label_or_utf8(label: &str) -> Self {
        Self::for_label(label).unwrap_or_else(|| {
            tracing::warn!(label, "unknown text encoding, using utf-8");
            Self::utf8()
        })
    }

    /// Canonical name of the encoding.
    #[must_use]
    pub fn name(&self) -> &'static str {
        #[cfg(feature = "encoding")]
        {
            self.inner.name()
        }

        #[cfg(not(feature = "encoding"))]
        {
            "UTF-8"
        }
    }

    /// Decode bytes for display. Malformed sequences become U+FFFD.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        #[cfg(feature = "encoding")]
        {
            let (text, _had_errors) = self.inner.decode_without_bom_handling(bytes);
            text
        }

        #[cfg(not(feature = "encoding"))]
        {
            String::from_utf8_lossy(bytes)
        }
    }

    /// Encode text into bytes. Unmappable characters become numeric
    /// character references.
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, [u8]> {
        #[cfg(feature = "encoding")]
        {
            let (bytes, _enc, _had_errors) = self.inner.encode(text);
            bytes
        }

        #[cfg(not(feature = "encoding"))]
        {
            Cow::Borrowed(text.as_bytes())
        }
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Debug for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextEncoding").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_round_trip() {
        let enc = TextEncoding::for_label("UTF-8").unwrap();
        assert_eq!(enc, TextEncoding::utf8());
        assert_eq!(enc.name(), "UTF-8");
        assert_eq!(enc.decode("héllo".as_bytes()), "héllo");
        assert_eq!(&*enc.encode("héllo"), "héllo".as_bytes());
    }

    #[test]
    fn test_lossy_decode() {
        let enc = TextEncoding::utf8();
        assert_eq!(enc.decode(b"caf\xe9"), "caf\u{FFFD}");
    }

    #[test]
    fn test_unknown_label() {
        assert!(TextEncoding::for_label("no-such-charset").is_none());
        assert_eq!(TextEncoding::for_label_or_utf8("no-such-charset"), TextEncoding::utf8());
    }

    #[cfg(feature = "encoding")]
    #[test]
    fn test_latin1() {
        let enc = TextEncoding::for_label("iso-8859-1").unwrap();
        assert_eq!(enc.decode(b"caf\xe9"), "café");
        assert_eq!(&*enc.encode("café"), b"caf\xe9");
    }
}
