//! Sans-IO session and channel state machines.
//!
//! This module tracks one IRC client session without performing any I/O.
//! It consumes parsed lines and transport notifications and produces
//! [`Action`]s: lines to write, events to emit, and requests to close the
//! transport. The [`client`](crate::client) module drives it over tokio, but
//! any runtime (or a test) can feed it directly.
//!
//! # Example
//!
//! ```
//! use slirc_session::state::{Action, ConnectionState, Session, SessionConfig};
//! use slirc_session::Event;
//!
//! let mut session = Session::new(SessionConfig::new("irc.example.net", "testbot", "bot", "Test Bot"));
//! session.begin_connect().unwrap();
//!
//! // NICK and USER are ready once the transport is up.
//! let actions = session.transport_connected();
//! assert!(matches!(&actions[0], Action::Send(line) if line == b"NICK testbot\r\n"));
//!
//! let actions = session.handle_line(b":irc.example.net 001 testbot :Welcome");
//! assert_eq!(session.state(), ConnectionState::Connected);
//! assert!(actions
//!     .iter()
//!     .any(|a| matches!(a, Action::Emit(Event::ConnectionSucceeded { .. }))));
//! ```

mod channel;
mod session;

pub use self::channel::Channel;
pub use self::session::Session;

use crate::error::SessionError;
use crate::event::Event;

/// Default IRC port.
pub const DEFAULT_PORT: u16 = 6667;

/// Default number of automatic nickname retries during registration.
pub const DEFAULT_MAX_NICK_RETRIES: u32 = 5;

/// Current state of the session's connection lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// No transport.
    #[default]
    Disconnected,
    /// Transport is being established.
    Connecting,
    /// Sent PASS/NICK/USER, awaiting welcome (001).
    Registering,
    /// Received 001, fully connected.
    Connected,
    /// QUIT sent or ERROR received, waiting for the transport to close.
    Disconnecting,
}

/// Configuration for a session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Server password, if required.
    pub password: Option<String>,
    /// Desired nickname.
    pub nickname: String,
    /// Username (ident).
    pub username: String,
    /// Real name / GECOS.
    pub realname: String,
    /// Text encoding label used for generated text and display.
    pub encoding: String,
    /// Reply to CTCP VERSION requests.
    pub version: String,
    /// Nicknames to try, in order, when the server rejects ours.
    pub alt_nicknames: Vec<String>,
    /// How many times to retry NICK during registration before giving up.
    pub max_nick_retries: u32,
    /// Answer CTCP VERSION, PING, TIME and CLIENTINFO automatically.
    pub auto_ctcp_replies: bool,
}

impl SessionConfig {
    /// Configuration with identity and server; everything else defaulted.
    pub fn new(
        host: impl Into<String>,
        nickname: impl Into<String>,
        username: impl Into<String>,
        realname: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            nickname: nickname.into(),
            username: username.into(),
            realname: realname.into(),
            ..Self::default()
        }
    }

    /// Whether nickname, username and realname are all set.
    #[must_use]
    pub fn has_identity(&self) -> bool {
        !self.nickname.is_empty() && !self.username.is_empty() && !self.realname.is_empty()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            password: None,
            nickname: String::new(),
            username: String::new(),
            realname: String::new(),
            encoding: "utf-8".to_owned(),
            version: concat!("slirc-session ", env!("CARGO_PKG_VERSION")).to_owned(),
            alt_nicknames: Vec::new(),
            max_nick_retries: DEFAULT_MAX_NICK_RETRIES,
            auto_ctcp_replies: true,
        }
    }
}

/// Actions produced by the session state machine.
///
/// The caller performs them in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Write this CRLF-terminated line to the server.
    Send(Vec<u8>),
    /// Deliver this event to the application.
    Emit(Event),
    /// Close the transport.
    Close,
}

/// Why a session ended up disconnected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The local side quit or disconnected.
    Requested,
    /// The server closed the stream.
    ClosedByPeer,
    /// The server sent `ERROR` with this text before closing.
    ServerError(Vec<u8>),
    /// Socket-level failure.
    Transport(String),
    /// The session gave up (registration failure or protocol violation).
    Failed(SessionError),
}

impl DisconnectReason {
    /// The error reported when the connection ends before registration.
    #[must_use]
    pub fn to_error(&self) -> SessionError {
        match self {
            Self::Requested => {
                SessionError::Transport("disconnected before registration completed".into())
            }
            Self::ClosedByPeer => SessionError::Transport("connection closed by peer".into()),
            Self::ServerError(text) => SessionError::Transport(format!(
                "server error: {}",
                String::from_utf8_lossy(text)
            )),
            Self::Transport(msg) => SessionError::Transport(msg.clone()),
            Self::Failed(err) => err.clone(),
        }
    }
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requested => write!(f, "disconnect requested"),
            Self::ClosedByPeer => write!(f, "connection closed by peer"),
            Self::ServerError(text) => {
                write!(f, "server error: {}", String::from_utf8_lossy(text))
            }
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::Failed(err) => write!(f, "{}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.port, 6667);
        assert_eq!(config.encoding, "utf-8");
        assert_eq!(config.max_nick_retries, 5);
        assert!(config.auto_ctcp_replies);
        assert!(!config.has_identity());
        assert!(SessionConfig::new("h", "n", "u", "r").has_identity());
    }

    #[test]
    fn test_reason_to_error() {
        assert_eq!(
            DisconnectReason::Transport("refused".into()).to_error(),
            SessionError::Transport("refused".into())
        );
        let failed = SessionError::NicknameUnavailable { attempts: 3 };
        assert_eq!(DisconnectReason::Failed(failed.clone()).to_error(), failed);
        assert_eq!(
            DisconnectReason::ServerError(b"Closing Link".to_vec()).to_string(),
            "server error: Closing Link"
        );
    }
}
