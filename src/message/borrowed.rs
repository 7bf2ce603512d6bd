use crate::error::MessageParseError;
use crate::prefix::PrefixRef;

use super::nom_parser::ParsedMessage;
use super::Message;

/// A parsed IRC line borrowing from its input.
///
/// The session router consumes these immediately; use
/// [`to_owned`](Self::to_owned) to keep a message beyond the input buffer.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MessageRef<'a> {
    /// Raw IRCv3 tags, without the leading `@`.
    pub tags: Option<&'a [u8]>,
    /// Raw origin, without the leading `:`.
    pub prefix: Option<&'a [u8]>,
    /// Command name or three-digit numeric.
    pub command: &'a str,
    /// Parameters in order, the trailing parameter last.
    pub params: Vec<&'a [u8]>,
}

impl<'a> MessageRef<'a> {
    /// Parse a single line. Trailing CR/LF bytes are ignored.
    pub fn parse(s: &'a [u8]) -> Result<MessageRef<'a>, MessageParseError> {
        let parsed = ParsedMessage::parse(s)?;
        Ok(MessageRef {
            tags: parsed.tags,
            prefix: parsed.prefix,
            command: parsed.command,
            params: parsed.params,
        })
    }

    /// Parameter at `index`, if present.
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&'a [u8]> {
        self.params.get(index).copied()
    }

    /// The last parameter, if any.
    #[must_use]
    pub fn trailing(&self) -> Option<&'a [u8]> {
        self.params.last().copied()
    }

    /// The origin split into nick, user and host.
    #[must_use]
    pub fn source(&self) -> Option<PrefixRef<'a>> {
        self.prefix.map(PrefixRef::parse)
    }

    /// Nickname (or server name) of the origin.
    #[must_use]
    pub fn source_nickname(&self) -> Option<&'a [u8]> {
        self.source().map(|p| p.nick)
    }

    /// Whether the command is a three-digit numeric reply.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit())
    }

    /// The numeric reply code, if the command is numeric.
    #[must_use]
    pub fn numeric(&self) -> Option<u16> {
        if self.is_numeric() {
            self.command.parse().ok()
        } else {
            None
        }
    }

    /// Case-insensitive command comparison.
    #[must_use]
    pub fn is_command(&self, name: &str) -> bool {
        self.command.eq_ignore_ascii_case(name)
    }

    /// Copy into an owned [`Message`].
    #[must_use]
    pub fn to_owned(&self) -> Message {
        Message {
            tags: self.tags.map(<[u8]>::to_vec),
            prefix: self.prefix.map(<[u8]>::to_vec),
            command: self.command.to_owned(),
            params: self.params.iter().map(|p| p.to_vec()).collect(),
        }
    }
}
