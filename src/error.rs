//! Error types for the IRC session library.
//!
//! This module defines error types for message parsing failures, outbound
//! line encoding, codec I/O, and session-level failures.

use thiserror::Error;

/// Convenience type alias for Results using [`SessionError`].
pub type Result<T, E = SessionError> = std::result::Result<T, E>;

/// Session-level errors.
///
/// Parse and routing failures ([`MalformedMessage`](Self::MalformedMessage),
/// [`UnknownChannel`](Self::UnknownChannel)) are recovered locally by the
/// session and only ever logged. The remaining variants are returned from
/// session operations or carried inside terminal events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    /// Connect was attempted before nickname, username and realname were set.
    #[error("nickname, username and realname must be set before connecting")]
    NotConfigured,

    /// The operation is only allowed while disconnected.
    #[error("session is already connected or connecting")]
    AlreadyConnected,

    /// The operation needs a registering or connected session.
    #[error("session is not connected")]
    NotConnected,

    /// An inbound line could not be parsed.
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] MessageParseError),

    /// An event referenced a channel the session is not joined to.
    #[error("unknown channel: {}", String::from_utf8_lossy(.0))]
    UnknownChannel(Vec<u8>),

    /// Socket-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server sent a structurally invalid registration response.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Every candidate nickname was rejected during registration.
    #[error("no acceptable nickname after {attempts} attempts")]
    NicknameUnavailable {
        /// Number of NICK attempts made.
        attempts: u32,
    },

    /// An outbound command could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Errors encountered when parsing IRC messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Message was empty.
    #[error("empty message")]
    EmptyMessage,

    /// A prefix was present but no command followed it.
    #[error("missing command")]
    MissingCommand,

    /// Command was neither a word nor a three-digit numeric.
    #[error("invalid command")]
    InvalidCommand,
}

/// Errors encountered when encoding outbound lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
    /// A non-final parameter cannot be represented on the wire.
    #[error("invalid parameter at position {index}")]
    InvalidParameter {
        /// Zero-based parameter index.
        index: usize,
    },

    /// Command and middle parameters alone exceed the line limit.
    #[error("line too long: {len} bytes before trailing parameter (limit {limit})")]
    LineTooLong {
        /// Length of the fixed part of the line.
        len: usize,
        /// The line limit, including CRLF.
        limit: usize,
    },
}

/// Codec-level errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> Self {
        Self::Transport(err.to_string())
    }
}
