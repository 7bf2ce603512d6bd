//! Outbound line encoding with the 512-byte limit.
//!
//! Every line a client sends goes through [`encode_line`] (or
//! [`encode_raw`]). Parameters are written as opaque bytes. A line that
//! would exceed [`MAX_LINE_LEN`] bytes including CRLF is truncated inside
//! its trailing parameter; middle parameters are never altered.
//!
//! # Example
//!
//! ```
//! use slirc_session::encode::{encode_line, MAX_LINE_LEN};
//!
//! let line = encode_line("PRIVMSG", &[b"#chan"], Some(b"hello there")).unwrap();
//! assert_eq!(line, b"PRIVMSG #chan :hello there\r\n");
//!
//! let long = vec![b'x'; 600];
//! let line = encode_line("PRIVMSG", &[b"#chan"], Some(&long)).unwrap();
//! assert_eq!(line.len(), MAX_LINE_LEN);
//! ```

use crate::ctcp::CTCP_DELIM;
use crate::error::EncodeError;
use crate::util::{cut_at_line_break, has_line_break_or_nul, truncate_bytes, MAX_LINE_BODY};

mod command;

pub use crate::util::MAX_LINE_LEN;

/// A trait for encoding outbound IRC commands into wire lines.
pub trait IrcEncode {
    /// Encode into a complete CRLF-terminated line.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if a middle parameter is invalid or the
    /// fixed part of the line alone exceeds the limit.
    fn encode(&self) -> Result<Vec<u8>, EncodeError>;
}

/// Check if a final parameter needs colon-prefixing.
#[inline]
pub(crate) fn needs_colon_prefix(s: &[u8]) -> bool {
    s.is_empty() || s.contains(&b' ') || s.first() == Some(&b':')
}

#[inline]
fn is_valid_middle(s: &[u8]) -> bool {
    !s.is_empty() && !s.contains(&b' ') && s[0] != b':' && !has_line_break_or_nul(s)
}

/// How the trailing parameter is written.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Trailing {
    /// `:` only when the parameter requires it.
    AsNeeded,
    /// Always `:`-prefixed (message bodies, reasons, realname).
    Freeform,
}

fn write_line(
    command: &str,
    middle: &[&[u8]],
    trailing: Option<&[u8]>,
    form: Trailing,
) -> Result<Vec<u8>, EncodeError> {
    if let Some(index) = middle.iter().position(|p| !is_valid_middle(p)) {
        return Err(EncodeError::InvalidParameter { index });
    }

    let mut line = Vec::with_capacity(MAX_LINE_LEN);
    line.extend_from_slice(command.as_bytes());
    for param in middle {
        line.push(b' ');
        line.extend_from_slice(param);
    }

    let fixed = line.len() + if trailing.is_some() { 2 } else { 0 };
    if fixed > MAX_LINE_BODY {
        return Err(EncodeError::LineTooLong {
            len: fixed + 2,
            limit: MAX_LINE_LEN,
        });
    }

    if let Some(trailing) = trailing {
        let trailing = cut_at_line_break(trailing);
        let colon = form == Trailing::Freeform || needs_colon_prefix(trailing);
        let full = line.len() + 1 + usize::from(colon) + trailing.len();

        if full <= MAX_LINE_BODY {
            line.push(b' ');
            if colon {
                line.push(b':');
            }
            line.extend_from_slice(trailing);
        } else {
            let room = MAX_LINE_BODY - line.len() - 2;
            line.extend_from_slice(b" :");
            line.extend_from_slice(&truncate_trailing(trailing, room));
        }
    }

    line.extend_from_slice(b"\r\n");
    Ok(line)
}

/// Cut a trailing parameter to `room` bytes, keeping a CTCP closing delimiter.
fn truncate_trailing(trailing: &[u8], room: usize) -> Vec<u8> {
    let is_ctcp = trailing.len() >= 2
        && trailing.first() == Some(&CTCP_DELIM)
        && trailing.last() == Some(&CTCP_DELIM);
    if is_ctcp && room >= 2 {
        let mut cut = truncate_bytes(&trailing[..trailing.len() - 1], room - 1).to_vec();
        cut.push(CTCP_DELIM);
        cut
    } else {
        truncate_bytes(trailing, room).to_vec()
    }
}

/// Encode a command line.
///
/// The final parameter is `trailing` if given, and is `:`-prefixed when it
/// is empty, contains a space, or starts with `:`. It is cut at its first
/// CR or LF and truncated to keep the line within [`MAX_LINE_LEN`].
///
/// # Errors
///
/// [`EncodeError::InvalidParameter`] if a middle parameter is empty,
/// contains a space, CR, LF or NUL, or starts with `:`.
/// [`EncodeError::LineTooLong`] if the command and middle parameters
/// alone do not fit.
pub fn encode_line(
    command: &str,
    middle: &[&[u8]],
    trailing: Option<&[u8]>,
) -> Result<Vec<u8>, EncodeError> {
    write_line(command, middle, trailing, Trailing::AsNeeded)
}

/// Encode a command line whose trailing parameter is always `:`-prefixed.
///
/// Used for free text such as message bodies, reasons and topics.
pub fn encode_line_freeform(
    command: &str,
    middle: &[&[u8]],
    trailing: &[u8],
) -> Result<Vec<u8>, EncodeError> {
    write_line(command, middle, Some(trailing), Trailing::Freeform)
}

/// Encode a raw line: cut at the first CR or LF, truncated to 510 bytes,
/// CRLF appended.
pub fn encode_raw(line: &[u8]) -> Vec<u8> {
    let body = truncate_bytes(cut_at_line_break(line), MAX_LINE_BODY);
    let mut out = Vec::with_capacity(body.len() + 2);
    out.extend_from_slice(body);
    out.extend_from_slice(b"\r\n");
    out
}
