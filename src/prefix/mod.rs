//! IRC message prefix (source) helpers.
//!
//! An origin is either a server name or a `nick!user@host` mask. Splitting is
//! lenient: missing parts are `None` and nothing is validated.
//!
//! # Example
//!
//! ```
//! use slirc_session::prefix::{host_from, nick_from, user_from, PrefixRef};
//!
//! let p = PrefixRef::parse(b"alice!ali@example.org");
//! assert_eq!(p.nick, b"alice");
//! assert!(!p.is_server());
//!
//! assert_eq!(nick_from(b"alice!ali@example.org"), b"alice");
//! assert_eq!(user_from(b"alice!ali@example.org"), Some(&b"ali"[..]));
//! assert_eq!(host_from(b"alice!ali@example.org"), Some(&b"example.org"[..]));
//! ```

/// A borrowed, split message origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrefixRef<'a> {
    /// Nickname, or the whole origin for servers.
    pub nick: &'a [u8],
    /// Username, the part between `!` and `@`.
    pub user: Option<&'a [u8]>,
    /// Hostname, the part after `@`.
    pub host: Option<&'a [u8]>,
    /// The unsplit origin.
    pub raw: &'a [u8],
}

impl<'a> PrefixRef<'a> {
    /// Split an origin into its parts.
    pub fn parse(raw: &'a [u8]) -> Self {
        let (before_host, host) = match raw.iter().position(|&b| b == b'@') {
            Some(at) => (&raw[..at], Some(&raw[at + 1..])),
            None => (raw, None),
        };
        let (nick, user) = match before_host.iter().position(|&b| b == b'!') {
            Some(bang) => (&before_host[..bang], Some(&before_host[bang + 1..])),
            None => (before_host, None),
        };
        PrefixRef {
            nick,
            user,
            host,
            raw,
        }
    }

    /// Whether the origin looks like a server rather than a user.
    ///
    /// Any origin without a `!` is treated as a server.
    #[must_use]
    pub fn is_server(&self) -> bool {
        self.user.is_none()
    }
}

/// Nickname part of a `nick!user@host` mask.
pub fn nick_from(mask: &[u8]) -> &[u8] {
    PrefixRef::parse(mask).nick
}

/// Username part of a `nick!user@host` mask.
pub fn user_from(mask: &[u8]) -> Option<&[u8]> {
    PrefixRef::parse(mask).user
}

/// Hostname part of a `nick!user@host` mask.
pub fn host_from(mask: &[u8]) -> Option<&[u8]> {
    PrefixRef::parse(mask).host
}
