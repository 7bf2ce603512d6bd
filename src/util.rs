//! Byte helpers for IRC line limits.
//!
//! Outbound text is opaque bytes in whatever encoding the session uses, so
//! truncation here works on byte counts and never inspects code points.

/// Maximum length of an IRC line, including the trailing CRLF.
pub const MAX_LINE_LEN: usize = 512;

/// Maximum length of an IRC line body, excluding the trailing CRLF.
pub const MAX_LINE_BODY: usize = MAX_LINE_LEN - 2;

/// Returns the part of `s` before its first CR or LF.
#[inline]
pub fn cut_at_line_break(s: &[u8]) -> &[u8] {
    match s.iter().position(|&b| b == b'\r' || b == b'\n') {
        Some(i) => &s[..i],
        None => s,
    }
}

/// Truncates `s` to at most `max_bytes` bytes.
#[inline]
pub fn truncate_bytes(s: &[u8], max_bytes: usize) -> &[u8] {
    &s[..s.len().min(max_bytes)]
}

/// Returns true if `s` contains a byte that cannot appear inside a line.
#[inline]
pub fn has_line_break_or_nul(s: &[u8]) -> bool {
    s.iter().any(|&b| matches!(b, b'\r' | b'\n' | 0))
}
