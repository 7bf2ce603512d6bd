//! Events emitted by a session, and the handler trait that receives them.
//!
//! All text fields are raw bytes as received; decode them for display with
//! the session's [`TextEncoding`](crate::text::TextEncoding). Channel names
//! are the channel's name as first seen by the session.

use crate::error::SessionError;
use crate::message::Message;
use crate::state::DisconnectReason;

/// Events that a session emits to the application.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Event {
    /// Registration complete. `nickname` is our confirmed nick.
    ConnectionSucceeded { nickname: Vec<u8> },

    /// The connection ended (or never started) before registration completed.
    ConnectionFailed { error: SessionError },

    /// The session is disconnected. Emitted exactly once per connection.
    Disconnected { reason: DisconnectReason },

    /// A user changed nick. `own` is set when it was us.
    NickChanged {
        old: Vec<u8>,
        new: Vec<u8>,
        own: bool,
    },

    /// Someone quit the server.
    UserQuit {
        nick: Vec<u8>,
        origin: Vec<u8>,
        reason: Option<Vec<u8>>,
    },

    /// We joined a channel.
    JoinedChannel { channel: Vec<u8> },

    /// Someone else joined a channel we are in.
    MemberJoined {
        channel: Vec<u8>,
        nick: Vec<u8>,
        origin: Vec<u8>,
    },

    /// Someone left a channel. `own` is set when it was us.
    MemberParted {
        channel: Vec<u8>,
        nick: Vec<u8>,
        origin: Vec<u8>,
        reason: Option<Vec<u8>>,
        own: bool,
    },

    /// Someone was kicked from a channel. `own` is set when it was us.
    MemberKicked {
        channel: Vec<u8>,
        nick: Vec<u8>,
        by: Vec<u8>,
        reason: Option<Vec<u8>>,
        own: bool,
    },

    /// Channel topic changed or was received on join. `None` means no topic.
    TopicChanged {
        channel: Vec<u8>,
        topic: Option<Vec<u8>>,
        set_by: Option<Vec<u8>>,
    },

    /// Channel modes changed. `modes` is the mode string verbatim.
    ChannelModeChanged {
        channel: Vec<u8>,
        modes: Vec<u8>,
        set_by: Option<Vec<u8>>,
    },

    /// A user mode changed.
    UserModeChanged {
        target: Vec<u8>,
        modes: Vec<u8>,
        set_by: Option<Vec<u8>>,
    },

    /// PRIVMSG to a channel.
    ChannelMessage {
        channel: Vec<u8>,
        origin: Vec<u8>,
        text: Vec<u8>,
    },

    /// NOTICE to a channel.
    ChannelNotice {
        channel: Vec<u8>,
        origin: Vec<u8>,
        text: Vec<u8>,
    },

    /// CTCP ACTION to a channel.
    ChannelAction {
        channel: Vec<u8>,
        origin: Vec<u8>,
        text: Vec<u8>,
    },

    /// PRIVMSG to us from a user.
    PrivateMessage { origin: Vec<u8>, text: Vec<u8> },

    /// NOTICE to us from a user.
    PrivateNotice { origin: Vec<u8>, text: Vec<u8> },

    /// CTCP ACTION to us.
    PrivateAction { origin: Vec<u8>, text: Vec<u8> },

    /// PRIVMSG to us from a server, with the raw parameters.
    ServerMessage {
        origin: Vec<u8>,
        params: Vec<Vec<u8>>,
    },

    /// NOTICE to us from a server, with the raw parameters.
    ServerNotice {
        origin: Vec<u8>,
        params: Vec<Vec<u8>>,
    },

    /// We were invited to a channel.
    Invited { channel: Vec<u8>, origin: Vec<u8> },

    /// A CTCP request other than ACTION.
    CtcpRequest {
        origin: Vec<u8>,
        target: Vec<u8>,
        command: String,
        args: Vec<u8>,
    },

    /// A CTCP reply (CTCP inside NOTICE).
    CtcpReply {
        origin: Vec<u8>,
        command: String,
        args: Vec<u8>,
    },

    /// A numeric reply not consumed by the session.
    Numeric {
        code: u16,
        origin: Option<Vec<u8>>,
        params: Vec<Vec<u8>>,
    },

    /// A command the session does not handle.
    Unknown { message: Message },

    /// The server pinged us. The PONG has already been sent.
    Ping { params: Vec<Vec<u8>> },

    /// The server sent ERROR; it will close the connection next.
    ServerError { text: Vec<u8> },
}

/// Receives session events.
///
/// Every method has a no-op default, so implementors override only what they
/// care about. [`on_event`](Self::on_event) dispatches to the specific
/// methods; override it instead to receive events as values.
///
/// Handlers run on the client's receive loop: a slow handler delays reading.
#[allow(unused_variables)]
pub trait EventHandler: Send {
    fn on_connection_succeeded(&mut self, nickname: &[u8]) {}
    fn on_connection_failed(&mut self, error: &SessionError) {}
    fn on_disconnected(&mut self, reason: &DisconnectReason) {}
    fn on_nick_changed(&mut self, old: &[u8], new: &[u8], own: bool) {}
    fn on_user_quit(&mut self, nick: &[u8], origin: &[u8], reason: Option<&[u8]>) {}
    fn on_joined_channel(&mut self, channel: &[u8]) {}
    fn on_member_joined(&mut self, channel: &[u8], nick: &[u8], origin: &[u8]) {}
    fn on_member_parted(
        &mut self,
        channel: &[u8],
        nick: &[u8],
        origin: &[u8],
        reason: Option<&[u8]>,
        own: bool,
    ) {
    }
    fn on_member_kicked(
        &mut self,
        channel: &[u8],
        nick: &[u8],
        by: &[u8],
        reason: Option<&[u8]>,
        own: bool,
    ) {
    }
    fn on_topic_changed(&mut self, channel: &[u8], topic: Option<&[u8]>, set_by: Option<&[u8]>) {}
    fn on_channel_mode_changed(&mut self, channel: &[u8], modes: &[u8], set_by: Option<&[u8]>) {}
    fn on_user_mode_changed(&mut self, target: &[u8], modes: &[u8], set_by: Option<&[u8]>) {}
    fn on_channel_message(&mut self, channel: &[u8], origin: &[u8], text: &[u8]) {}
    fn on_channel_notice(&mut self, channel: &[u8], origin: &[u8], text: &[u8]) {}
    fn on_channel_action(&mut self, channel: &[u8], origin: &[u8], text: &[u8]) {}
    fn on_private_message(&mut self, origin: &[u8], text: &[u8]) {}
    fn on_private_notice(&mut self, origin: &[u8], text: &[u8]) {}
    fn on_private_action(&mut self, origin: &[u8], text: &[u8]) {}
    fn on_server_message(&mut self, origin: &[u8], params: &[Vec<u8>]) {}
    fn on_server_notice(&mut self, origin: &[u8], params: &[Vec<u8>]) {}
    fn on_invited(&mut self, channel: &[u8], origin: &[u8]) {}
    fn on_ctcp_request(&mut self, origin: &[u8], target: &[u8], command: &str, args: &[u8]) {}
    fn on_ctcp_reply(&mut self, origin: &[u8], command: &str, args: &[u8]) {}
    fn on_numeric(&mut self, code: u16, origin: Option<&[u8]>, params: &[Vec<u8>]) {}
    fn on_unknown(&mut self, message: &Message) {}
    fn on_ping(&mut self, params: &[Vec<u8>]) {}
    fn on_server_error(&mut self, text: &[u8]) {}

    /// Dispatch an event to the matching method.
    fn on_event(&mut self, event: Event) {
        match event {
            Event::ConnectionSucceeded { nickname } => self.on_connection_succeeded(&nickname),
            Event::ConnectionFailed { error } => self.on_connection_failed(&error),
            Event::Disconnected { reason } => self.on_disconnected(&reason),
            Event::NickChanged { old, new, own } => self.on_nick_changed(&old, &new, own),
            Event::UserQuit {
                nick,
                origin,
                reason,
            } => self.on_user_quit(&nick, &origin, reason.as_deref()),
            Event::JoinedChannel { channel } => self.on_joined_channel(&channel),
            Event::MemberJoined {
                channel,
                nick,
                origin,
            } => self.on_member_joined(&channel, &nick, &origin),
            Event::MemberParted {
                channel,
                nick,
                origin,
                reason,
                own,
            } => self.on_member_parted(&channel, &nick, &origin, reason.as_deref(), own),
            Event::MemberKicked {
                channel,
                nick,
                by,
                reason,
                own,
            } => self.on_member_kicked(&channel, &nick, &by, reason.as_deref(), own),
            Event::TopicChanged {
                channel,
                topic,
                set_by,
            } => self.on_topic_changed(&channel, topic.as_deref(), set_by.as_deref()),
            Event::ChannelModeChanged {
                channel,
                modes,
                set_by,
            } => self.on_channel_mode_changed(&channel, &modes, set_by.as_deref()),
            Event::UserModeChanged {
                target,
                modes,
                set_by,
            } => self.on_user_mode_changed(&target, &modes, set_by.as_deref()),
            Event::ChannelMessage {
                channel,
                origin,
                text,
            } => self.on_channel_message(&channel, &origin, &text),
            Event::ChannelNotice {
                channel,
                origin,
                text,
            } => self.on_channel_notice(&channel, &origin, &text),
            Event::ChannelAction {
                channel,
                origin,
                text,
            } => self.on_channel_action(&channel, &origin, &text),
            Event::PrivateMessage { origin, text } => self.on_private_message(&origin, &text),
            Event::PrivateNotice { origin, text } => self.on_private_notice(&origin, &text),
            Event::PrivateAction { origin, text } => self.on_private_action(&origin, &text),
            Event::ServerMessage { origin, params } => self.on_server_message(&origin, &params),
            Event::ServerNotice { origin, params } => self.on_server_notice(&origin, &params),
            Event::Invited { channel, origin } => self.on_invited(&channel, &origin),
            Event::CtcpRequest {
                origin,
                target,
                command,
                args,
            } => self.on_ctcp_request(&origin, &target, &command, &args),
            Event::CtcpReply {
                origin,
                command,
                args,
            } => self.on_ctcp_reply(&origin, &command, &args),
            Event::Numeric {
                code,
                origin,
                params,
            } => self.on_numeric(code, origin.as_deref(), &params),
            Event::Unknown { message } => self.on_unknown(&message),
            Event::Ping { params } => self.on_ping(&params),
            Event::ServerError { text } => self.on_server_error(&text),
        }
    }
}

/// A handler that ignores every event.
impl EventHandler for () {}

/// Forward events into a channel for consumption elsewhere.
///
/// Events are dropped once the receiver is gone.
#[cfg(feature = "tokio")]
impl EventHandler for tokio::sync::mpsc::UnboundedSender<Event> {
    fn on_event(&mut self, event: Event) {
        if self.send(event).is_err() {
            tracing::debug!("event receiver dropped");
        }
    }
}

/// Collect events into a vector.
impl EventHandler for Vec<Event> {
    fn on_event(&mut self, event: Event) {
        self.push(event);
    }
}
