use std::fmt;

use crate::encode::needs_colon_prefix;
use crate::error::MessageParseError;

use super::MessageRef;

/// An owned IRC message.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Raw IRCv3 tags, without the leading `@`.
    pub tags: Option<Vec<u8>>,
    /// Raw origin, without the leading `:`.
    pub prefix: Option<Vec<u8>>,
    /// Command name or three-digit numeric.
    pub command: String,
    /// Parameters in order, the trailing parameter last.
    pub params: Vec<Vec<u8>>,
}

impl Message {
    /// Parse a line into an owned message.
    pub fn parse(line: &[u8]) -> Result<Self, MessageParseError> {
        MessageRef::parse(line).map(|m| m.to_owned())
    }

    /// Borrow as a [`MessageRef`].
    #[must_use]
    pub fn borrow(&self) -> MessageRef<'_> {
        MessageRef {
            tags: self.tags.as_deref(),
            prefix: self.prefix.as_deref(),
            command: &self.command,
            params: self.params.iter().map(Vec::as_slice).collect(),
        }
    }

    /// Serialize to wire form without a line terminator.
    ///
    /// No length limit is applied; outbound client lines go through
    /// [`encode_line`](crate::encode::encode_line) instead.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        if let Some(tags) = &self.tags {
            out.push(b'@');
            out.extend_from_slice(tags);
            out.push(b' ');
        }
        if let Some(prefix) = &self.prefix {
            out.push(b':');
            out.extend_from_slice(prefix);
            out.push(b' ');
        }
        out.extend_from_slice(self.command.as_bytes());
        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                out.push(b' ');
                out.extend_from_slice(param);
            }
            out.push(b' ');
            if needs_colon_prefix(last) {
                out.push(b':');
            }
            out.extend_from_slice(last);
        }
        out
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}
