//! CTCP (Client-to-Client Protocol) message handling.
//!
//! CTCP payloads are embedded within PRIVMSG and NOTICE bodies between
//! `\x01` delimiters. Payloads are raw bytes; only the command word is
//! interpreted.
//!
//! # Reference
//! - CTCP specification: <https://modern.ircdocs.horse/ctcp.html>
//!
//! # Example
//!
//! ```
//! use slirc_session::ctcp::{Ctcp, CtcpKind};
//!
//! let ctcp = Ctcp::parse(b"\x01ACTION waves hello\x01").unwrap();
//! assert_eq!(ctcp.kind, CtcpKind::Action);
//! assert_eq!(ctcp.params, Some(&b"waves hello"[..]));
//!
//! assert_eq!(Ctcp::action(b"dances").to_bytes(), b"\x01ACTION dances\x01");
//! ```

use std::fmt;

/// The CTCP delimiter byte.
pub const CTCP_DELIM: u8 = 0x01;

/// CTCP commands answered automatically when replies are enabled.
pub const CLIENTINFO_REPLY: &str = "ACTION CLIENTINFO PING TIME VERSION";

/// Known CTCP command types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CtcpKind {
    /// ACTION - describes an action performed by the user.
    Action,
    /// VERSION - requests client version information.
    Version,
    /// PING - measures round-trip latency.
    Ping,
    /// TIME - requests local time from the client.
    Time,
    /// CLIENTINFO - requests list of supported CTCP commands.
    Clientinfo,
    /// Unknown or custom CTCP command, uppercased.
    Unknown(String),
}

impl CtcpKind {
    /// Parse a CTCP command name into a `CtcpKind`.
    pub fn parse(name: &[u8]) -> Self {
        let upper = String::from_utf8_lossy(name).to_ascii_uppercase();
        match upper.as_str() {
            "ACTION" => Self::Action,
            "VERSION" => Self::Version,
            "PING" => Self::Ping,
            "TIME" => Self::Time,
            "CLIENTINFO" => Self::Clientinfo,
            _ => Self::Unknown(upper),
        }
    }

    /// Returns the canonical uppercase name of this CTCP command.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Action => "ACTION",
            Self::Version => "VERSION",
            Self::Ping => "PING",
            Self::Time => "TIME",
            Self::Clientinfo => "CLIENTINFO",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for CtcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed CTCP message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    /// The CTCP command type.
    pub kind: CtcpKind,
    /// Optional parameters following the command.
    pub params: Option<&'a [u8]>,
}

impl<'a> Ctcp<'a> {
    /// Parse a CTCP message from a PRIVMSG/NOTICE body.
    ///
    /// The closing delimiter is optional. Returns `None` if the body does not
    /// start with `\x01` or carries no command.
    pub fn parse(text: &'a [u8]) -> Option<Self> {
        let text = text.strip_prefix(&[CTCP_DELIM])?;
        let text = text.strip_suffix(&[CTCP_DELIM]).unwrap_or(text);

        if text.is_empty() {
            return None;
        }

        let (command, params) = match text.iter().position(|&b| b == b' ') {
            Some(pos) => {
                let params = &text[pos + 1..];
                (&text[..pos], (!params.is_empty()).then_some(params))
            }
            None => (text, None),
        };

        if command.is_empty() {
            return None;
        }

        Some(Self {
            kind: CtcpKind::parse(command),
            params,
        })
    }

    /// Check if a message body carries a CTCP payload.
    #[inline]
    pub fn is_ctcp(text: &[u8]) -> bool {
        text.first() == Some(&CTCP_DELIM)
    }

    /// Create an ACTION CTCP message.
    pub fn action(text: &'a [u8]) -> Self {
        Self {
            kind: CtcpKind::Action,
            params: Some(text),
        }
    }

    /// Serialize to `\x01COMMAND params\x01`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        build(self.kind.as_str().as_bytes(), self.params.unwrap_or_default())
    }
}

/// Build a CTCP payload from a command and argument bytes.
///
/// An empty argument produces `\x01COMMAND\x01`.
pub fn build(command: &[u8], args: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(command.len() + args.len() + 3);
    out.push(CTCP_DELIM);
    out.extend_from_slice(command);
    if !args.is_empty() {
        out.push(b' ');
        out.extend_from_slice(args);
    }
    out.push(CTCP_DELIM);
    out
}

/// Build a CTCP payload from a free-form body such as `PING 12345`.
///
/// The body is wrapped as-is; any delimiters it already carries are removed.
pub fn wrap(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(CTCP_DELIM);
    out.extend(body.iter().copied().filter(|&b| b != CTCP_DELIM));
    out.push(CTCP_DELIM);
    out
}
