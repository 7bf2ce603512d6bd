//! Handles for issuing commands to a running client.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use tracing::debug;

use super::Shared;
use crate::error::SessionError;
use crate::text::TextEncoding;
use crate::state::{ConnectionState, Session};

/// Cloneable handle to a running [`Client`](super::Client).
///
/// Every method encodes through the session and queues the line for the
/// client task. Nothing waits for the server to confirm.
#[derive(Clone)]
pub struct ClientHandle {
    shared: Arc<Shared>,
}

impl ClientHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Run `f` with read access to the session.
    ///
    /// The client task is blocked while `f` runs; keep it short.
    pub fn with_session<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&*self.shared.session.lock())
    }

    /// Run `f` with write access to the session's user metadata.
    pub fn with_metadata_mut<R>(&self, f: impl FnOnce(&mut HashMap<String, Vec<u8>>) -> R) -> R {
        f(self.shared.session.lock().metadata_mut())
    }

    /// Change the text encoding used for outgoing text and new channels.
    pub fn set_text_encoding(&self, encoding: TextEncoding) {
        self.shared.session.lock().set_text_encoding(encoding);
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.session.lock().state()
    }

    #[must_use]
    pub fn nickname(&self) -> Vec<u8> {
        self.shared.session.lock().nickname().to_vec()
    }

    /// A handle to a joined channel, or `None` if we are not in it.
    #[must_use]
    pub fn channel(&self, name: impl AsRef<[u8]>) -> Option<ChannelHandle> {
        let session = self.shared.session.lock();
        let channel = session.channel(name.as_ref())?;
        Some(ChannelHandle {
            shared: Arc::downgrade(&self.shared),
            name: channel.name().to_vec(),
        })
    }

    fn queue(
        &self,
        op: impl FnOnce(&mut Session) -> Result<Vec<u8>, SessionError>,
    ) -> Result<(), SessionError> {
        queue(&self.shared, op)
    }

    pub fn send_raw(&self, line: impl AsRef<[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.send_raw(line.as_ref()))
    }

    /// Send `QUIT` and let the server close the connection.
    pub fn quit(&self, message: Option<&[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.quit(message))
    }

    /// Send `QUIT` if registered, then stop the client task without waiting
    /// for the server.
    pub fn disconnect(&self, message: Option<&[u8]>) {
        if let Err(e) = self.quit(message) {
            debug!(error = %e, "no QUIT sent on disconnect");
        }
        // No receiver means the task already stopped.
        let _ = self.shared.shutdown.send(());
    }

    pub fn join(&self, channel: impl AsRef<[u8]>, key: Option<&[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.join(channel.as_ref(), key))
    }

    pub fn part(&self, channel: impl AsRef<[u8]>, reason: Option<&[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.part(channel.as_ref(), reason))
    }

    pub fn names(&self, channel: Option<&[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.names(channel))
    }

    pub fn list(&self, channel: Option<&[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.list(channel))
    }

    pub fn user_mode(&self, modes: Option<&[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.user_mode(modes))
    }

    pub fn channel_mode(
        &self,
        channel: impl AsRef<[u8]>,
        modes: impl AsRef<[u8]>,
    ) -> Result<(), SessionError> {
        self.queue(|s| s.channel_mode(channel.as_ref(), modes.as_ref()))
    }

    pub fn nick(&self, nickname: impl AsRef<[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.nick(nickname.as_ref()))
    }

    pub fn who(&self, mask: Option<&[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.who(mask))
    }

    pub fn whois(&self, nickname: impl AsRef<[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.whois(nickname.as_ref()))
    }

    pub fn message(&self, target: impl AsRef<[u8]>, text: impl AsRef<[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.message(target.as_ref(), text.as_ref()))
    }

    pub fn action(&self, target: impl AsRef<[u8]>, text: impl AsRef<[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.action(target.as_ref(), text.as_ref()))
    }

    pub fn notice(&self, target: impl AsRef<[u8]>, text: impl AsRef<[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.notice(target.as_ref(), text.as_ref()))
    }

    pub fn ctcp_request(
        &self,
        target: impl AsRef<[u8]>,
        body: impl AsRef<[u8]>,
    ) -> Result<(), SessionError> {
        self.queue(|s| s.ctcp_request(target.as_ref(), body.as_ref()))
    }

    pub fn ctcp_reply(
        &self,
        target: impl AsRef<[u8]>,
        body: impl AsRef<[u8]>,
    ) -> Result<(), SessionError> {
        self.queue(|s| s.ctcp_reply(target.as_ref(), body.as_ref()))
    }

    pub fn kick(
        &self,
        channel: impl AsRef<[u8]>,
        nickname: impl AsRef<[u8]>,
        reason: Option<&[u8]>,
    ) -> Result<(), SessionError> {
        self.queue(|s| s.kick(channel.as_ref(), nickname.as_ref(), reason))
    }

    pub fn invite(
        &self,
        nickname: impl AsRef<[u8]>,
        channel: impl AsRef<[u8]>,
    ) -> Result<(), SessionError> {
        self.queue(|s| s.invite(nickname.as_ref(), channel.as_ref()))
    }

    pub fn topic(&self, channel: impl AsRef<[u8]>, topic: Option<&[u8]>) -> Result<(), SessionError> {
        self.queue(|s| s.topic(channel.as_ref(), topic))
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Handle to one joined channel.
///
/// Holds only a weak reference to the client; once the client is gone every
/// operation fails with [`SessionError::NotConnected`].
#[derive(Clone)]
pub struct ChannelHandle {
    shared: Weak<Shared>,
    name: Vec<u8>,
}

impl ChannelHandle {
    #[must_use]
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Whether we are still joined to this channel.
    #[must_use]
    pub fn is_joined(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.session.lock().channel(&self.name).is_some())
    }

    /// Run `f` with write access to this channel's user metadata.
    ///
    /// `None` once the client is gone or the channel has been left.
    pub fn with_metadata_mut<R>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Vec<u8>>) -> R,
    ) -> Option<R> {
        let shared = self.shared.upgrade()?;
        let mut session = shared.session.lock();
        session.channel_mut(&self.name).map(|c| f(c.metadata_mut()))
    }

    /// The channel's text encoding, if still joined.
    #[must_use]
    pub fn encoding(&self) -> Option<TextEncoding> {
        let shared = self.shared.upgrade()?;
        let session = shared.session.lock();
        session.channel(&self.name).map(|c| c.encoding())
    }

    fn queue(
        &self,
        op: impl FnOnce(&mut Session, &[u8]) -> Result<Vec<u8>, SessionError>,
    ) -> Result<(), SessionError> {
        let shared = self.shared.upgrade().ok_or(SessionError::NotConnected)?;
        queue(&shared, |s| op(s, &self.name))
    }

    pub fn part(&self, reason: Option<&[u8]>) -> Result<(), SessionError> {
        self.queue(|s, chan| s.part(chan, reason))
    }

    pub fn invite(&self, nickname: impl AsRef<[u8]>) -> Result<(), SessionError> {
        self.queue(|s, chan| s.invite(nickname.as_ref(), chan))
    }

    /// Set the topic. An empty topic clears it.
    pub fn set_topic(&self, topic: impl AsRef<[u8]>) -> Result<(), SessionError> {
        self.queue(|s, chan| s.topic(chan, Some(topic.as_ref())))
    }

    /// Change modes, e.g. `set_mode(b"+o", &[b"bob"])`.
    pub fn set_mode(&self, mode: impl AsRef<[u8]>, params: &[&[u8]]) -> Result<(), SessionError> {
        let mut modes = mode.as_ref().to_vec();
        for param in params {
            modes.push(b' ');
            modes.extend_from_slice(param);
        }
        self.queue(|s, chan| s.channel_mode(chan, &modes))
    }

    pub fn message(&self, text: impl AsRef<[u8]>) -> Result<(), SessionError> {
        self.queue(|s, chan| s.message(chan, text.as_ref()))
    }

    pub fn action(&self, text: impl AsRef<[u8]>) -> Result<(), SessionError> {
        self.queue(|s, chan| s.action(chan, text.as_ref()))
    }

    pub fn notice(&self, text: impl AsRef<[u8]>) -> Result<(), SessionError> {
        self.queue(|s, chan| s.notice(chan, text.as_ref()))
    }

    pub fn kick(&self, nickname: impl AsRef<[u8]>, reason: Option<&[u8]>) -> Result<(), SessionError> {
        self.queue(|s, chan| s.kick(chan, nickname.as_ref(), reason))
    }

    pub fn ctcp_request(&self, body: impl AsRef<[u8]>) -> Result<(), SessionError> {
        self.queue(|s, chan| s.ctcp_request(chan, body.as_ref()))
    }
}

impl fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("name", &String::from_utf8_lossy(&self.name))
            .finish_non_exhaustive()
    }
}

/// Encode under the lock, then queue the line for the client task.
fn queue(
    shared: &Shared,
    op: impl FnOnce(&mut Session) -> Result<Vec<u8>, SessionError>,
) -> Result<(), SessionError> {
    let line = op(&mut *shared.session.lock())?;
    shared
        .outbound
        .send(line)
        .map_err(|_| SessionError::NotConnected)
}
