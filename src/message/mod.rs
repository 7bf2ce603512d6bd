//! IRC message parsing.
//!
//! Lines are parsed into a borrowed [`MessageRef`] that points into the
//! input buffer; [`Message`] is the owned counterpart.
//!
//! # Example
//!
//! ```
//! use slirc_session::MessageRef;
//!
//! let msg = MessageRef::parse(b":nick!user@host PRIVMSG #chan :hello world").unwrap();
//! assert_eq!(msg.prefix, Some(&b"nick!user@host"[..]));
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.params, vec![&b"#chan"[..], &b"hello world"[..]]);
//! ```

mod borrowed;
mod nom_parser;
mod types;

pub use self::borrowed::MessageRef;
#[cfg_attr(not(feature = "tokio"), allow(unused_imports))]
pub(crate) use self::nom_parser::trim_line_ending;
pub use self::types::Message;
