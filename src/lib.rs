//! # slirc-session
//!
//! IRC client session and channel state machines, built on a byte-exact
//! message parser and line encoder.
//!
//! ## Features
//!
//! - Zero-copy parsing of RFC 1459/2812 lines into [`MessageRef`]
//! - Line encoding with 512-byte truncation that never splits a command
//! - A sans-IO [`Session`](state::Session) that tracks registration,
//!   nicknames, ISUPPORT and joined channels, and answers PING and CTCP
//! - Events delivered through the [`EventHandler`] trait
//! - Optional Tokio runtime ([`client`]) over TCP or any async stream
//!
//! Wire data stays as bytes; [`TextEncoding`](text::TextEncoding) decodes
//! it for display.

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Parsing IRC Messages
//!
//! ```rust
//! use slirc_session::MessageRef;
//!
//! let msg = MessageRef::parse(b"@time=2023-01-01T12:00:00Z :nick!user@host PRIVMSG #channel :Hello!").unwrap();
//! assert_eq!(msg.source_nickname(), Some(&b"nick"[..]));
//! assert_eq!(msg.trailing(), Some(&b"Hello!"[..]));
//! ```
//!
//! ### Driving a session
//!
//! ```rust
//! use slirc_session::state::{Action, Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::new("irc.example.net", "me", "me", "Me"));
//! session.begin_connect().unwrap();
//! for action in session.transport_connected() {
//!     if let Action::Send(line) = action {
//!         // write `line` to the socket
//!         assert!(line.ends_with(b"\r\n"));
//!     }
//! }
//! session.handle_line(b":irc.example.net 001 me :Welcome");
//! let line = session.join(b"#rust", None).unwrap();
//! assert_eq!(line, b"JOIN #rust\r\n");
//! ```

pub mod casemap;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod client;
pub mod command;
pub mod ctcp;
pub mod encode;
pub mod error;
pub mod event;
pub mod isupport;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod line;
pub mod message;
pub mod prefix;
pub mod response;
pub mod state;
pub mod text;
#[cfg(feature = "tokio")]
mod transport;
mod util;

pub use self::casemap::{irc_eq, irc_to_lower, CaseMapping};
#[cfg(feature = "tokio")]
pub use self::client::{ChannelHandle, Client, ClientHandle};
pub use self::command::Command;
pub use self::ctcp::{Ctcp, CtcpKind};
pub use self::encode::{encode_line, encode_line_freeform, encode_raw, IrcEncode, MAX_LINE_LEN};
pub use self::error::{EncodeError, MessageParseError, ProtocolError, SessionError};
pub use self::event::{Event, EventHandler};
pub use self::isupport::Isupport;
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::message::{Message, MessageRef};
pub use self::prefix::PrefixRef;
pub use self::response::Response;
pub use self::state::{Action, Channel, ConnectionState, DisconnectReason, Session, SessionConfig};
pub use self::text::TextEncoding;
