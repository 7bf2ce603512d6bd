//! IRC case-mapping functions.
//!
//! IRC uses a special case-insensitive comparison where some characters
//! are considered equivalent (e.g., `[` and `{`). Servers advertise the
//! mapping in use through the `CASEMAPPING` ISUPPORT token; the session
//! defaults to `rfc1459` until told otherwise.
//!
//! All functions operate on raw bytes, so nicknames and channel names in
//! legacy 8-bit encodings fold the same way the server folds them.

use std::fmt;

/// A server case-mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CaseMapping {
    /// ASCII letters plus `[]\~` → `{}|^`.
    #[default]
    Rfc1459,
    /// ASCII letters plus `[]\` → `{}|`.
    StrictRfc1459,
    /// ASCII letters only.
    Ascii,
}

impl CaseMapping {
    /// Look up a mapping by its ISUPPORT token value.
    ///
    /// Returns `None` for mappings this library does not implement
    /// (for example `rfc7613`); callers keep their current mapping then.
    pub fn from_token(value: &[u8]) -> Option<Self> {
        if value.eq_ignore_ascii_case(b"rfc1459") {
            Some(Self::Rfc1459)
        } else if value.eq_ignore_ascii_case(b"strict-rfc1459") {
            Some(Self::StrictRfc1459)
        } else if value.eq_ignore_ascii_case(b"ascii") {
            Some(Self::Ascii)
        } else {
            None
        }
    }

    /// The ISUPPORT token value for this mapping.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rfc1459 => "rfc1459",
            Self::StrictRfc1459 => "strict-rfc1459",
            Self::Ascii => "ascii",
        }
    }

    /// Fold a single byte.
    #[inline]
    #[must_use]
    pub fn fold_byte(self, b: u8) -> u8 {
        match (self, b) {
            (_, b'A'..=b'Z') => b.to_ascii_lowercase(),
            (Self::Rfc1459 | Self::StrictRfc1459, b'[') => b'{',
            (Self::Rfc1459 | Self::StrictRfc1459, b']') => b'}',
            (Self::Rfc1459 | Self::StrictRfc1459, b'\\') => b'|',
            (Self::Rfc1459, b'~') => b'^',
            _ => b,
        }
    }

    /// Fold a byte string to its canonical lowercase form.
    #[must_use]
    pub fn fold(self, s: &[u8]) -> Vec<u8> {
        s.iter().map(|&b| self.fold_byte(b)).collect()
    }

    /// Compare two byte strings under this mapping.
    #[must_use]
    pub fn eq(self, a: &[u8], b: &[u8]) -> bool {
        a.len() == b.len()
            && a
                .iter()
                .zip(b)
                .all(|(&x, &y)| self.fold_byte(x) == self.fold_byte(y))
    }
}

impl fmt::Display for CaseMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert a string to IRC lowercase using RFC 1459 case mapping.
///
/// In addition to ASCII lowercase conversion, this maps:
/// - `[` → `{`
/// - `]` → `}`
/// - `\` → `|`
/// - `~` → `^`
pub fn irc_to_lower(s: &[u8]) -> Vec<u8> {
    CaseMapping::Rfc1459.fold(s)
}

/// Compare two byte strings using RFC 1459 case-insensitive comparison.
pub fn irc_eq(a: &[u8], b: &[u8]) -> bool {
    CaseMapping::Rfc1459.eq(a, b)
}
