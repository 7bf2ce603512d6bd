//! Outbound IRC commands.
//!
//! This module provides type-safe representations of the commands a client
//! session sends, as defined in RFC 2812. Parameters are raw bytes in the
//! session's text encoding; serialization lives in [`crate::encode`].
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol

use crate::ctcp;

/// IRC command with its parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command {
    // === Connection Registration (RFC 2812 Section 3.1) ===
    /// `PASS password`
    PASS(Vec<u8>),
    /// `NICK nickname`
    NICK(Vec<u8>),
    /// `USER username mode * :realname`
    USER(Vec<u8>, Vec<u8>, Vec<u8>),
    /// User MODE command: `MODE nickname [modes]`
    UserMODE(Vec<u8>, Option<Vec<u8>>),
    /// `QUIT [message]`
    QUIT(Option<Vec<u8>>),

    // === Channel Operations (RFC 2812 Section 3.2) ===
    /// `JOIN channel [key]`
    JOIN(Vec<u8>, Option<Vec<u8>>),
    /// `PART channel [message]`
    PART(Vec<u8>, Option<Vec<u8>>),
    /// Channel MODE command: `MODE channel [modes [params...]]`
    ChannelMODE(Vec<u8>, Vec<Vec<u8>>),
    /// `TOPIC channel [topic]`
    TOPIC(Vec<u8>, Option<Vec<u8>>),
    /// `NAMES [channel]`
    NAMES(Option<Vec<u8>>),
    /// `LIST [channel]`
    LIST(Option<Vec<u8>>),
    /// `INVITE nickname channel`
    INVITE(Vec<u8>, Vec<u8>),
    /// `KICK channel user [comment]`
    KICK(Vec<u8>, Vec<u8>, Option<Vec<u8>>),

    // === Messaging (RFC 2812 Section 3.3) ===
    /// `PRIVMSG target text`
    PRIVMSG(Vec<u8>, Vec<u8>),
    /// `NOTICE target text`
    NOTICE(Vec<u8>, Vec<u8>),

    // === User Queries (RFC 2812 Section 3.6) ===
    /// `WHO [mask]`
    WHO(Option<Vec<u8>>),
    /// `WHOIS nickname`
    WHOIS(Vec<u8>),

    // === Miscellaneous (RFC 2812 Section 3.7) ===
    /// `PONG params...`, echoing the parameters of a PING.
    PONG(Vec<Vec<u8>>),

    /// A pre-formatted line, sent as-is after CR/LF stripping and truncation.
    Raw(Vec<u8>),
}

impl Command {
    /// `PRIVMSG target :\x01ACTION text\x01`
    pub fn action(target: &[u8], text: &[u8]) -> Self {
        Command::PRIVMSG(target.to_vec(), ctcp::build(b"ACTION", text))
    }

    /// A CTCP request: `PRIVMSG target :\x01body\x01`
    pub fn ctcp_request(target: &[u8], body: &[u8]) -> Self {
        Command::PRIVMSG(target.to_vec(), ctcp::wrap(body))
    }

    /// A CTCP reply: `NOTICE target :\x01body\x01`
    pub fn ctcp_reply(target: &[u8], body: &[u8]) -> Self {
        Command::NOTICE(target.to_vec(), ctcp::wrap(body))
    }

    /// Channel MODE with the mode string split into its space-separated words.
    pub fn channel_mode(channel: &[u8], modes: &[u8]) -> Self {
        let args = modes
            .split(|&b| b == b' ')
            .filter(|w| !w.is_empty())
            .map(<[u8]>::to_vec)
            .collect();
        Command::ChannelMODE(channel.to_vec(), args)
    }

    /// The command word as sent on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Command::PASS(..) => "PASS",
            Command::NICK(..) => "NICK",
            Command::USER(..) => "USER",
            Command::UserMODE(..) | Command::ChannelMODE(..) => "MODE",
            Command::QUIT(..) => "QUIT",
            Command::JOIN(..) => "JOIN",
            Command::PART(..) => "PART",
            Command::TOPIC(..) => "TOPIC",
            Command::NAMES(..) => "NAMES",
            Command::LIST(..) => "LIST",
            Command::INVITE(..) => "INVITE",
            Command::KICK(..) => "KICK",
            Command::PRIVMSG(..) => "PRIVMSG",
            Command::NOTICE(..) => "NOTICE",
            Command::WHO(..) => "WHO",
            Command::WHOIS(..) => "WHOIS",
            Command::PONG(..) => "PONG",
            Command::Raw(..) => "",
        }
    }
}
