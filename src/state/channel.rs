//! Per-channel state: membership, topic and modes.
//!
//! A [`Channel`] exists in its session's map exactly while we are joined to
//! it. Members are keyed by their casemapped nickname, so adding the same
//! nick twice (in any case) keeps one entry. Modes are stored as the last
//! mode string seen, without interpretation.

use std::collections::HashMap;

use crate::casemap::CaseMapping;
use crate::event::Event;
use crate::prefix::nick_from;
use crate::text::TextEncoding;

/// What the session knows while a channel handles a message.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Scope<'s> {
    pub casemap: CaseMapping,
    pub own_nick: &'s [u8],
    pub member_prefixes: &'s [u8],
}

impl Scope<'_> {
    fn is_own(&self, nick: &[u8]) -> bool {
        self.casemap.eq(nick, self.own_nick)
    }
}

/// The flavour of a channel message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MessageKind {
    Privmsg,
    Notice,
    Action,
}

/// State of one joined channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    name: Vec<u8>,
    topic: Option<Vec<u8>>,
    topic_setter: Option<Vec<u8>>,
    modes: Vec<u8>,
    members: HashMap<Vec<u8>, Vec<u8>>,
    metadata: HashMap<String, Vec<u8>>,
    encoding: TextEncoding,
}

impl Channel {
    /// Create an empty UTF-8 channel.
    pub fn new(name: impl Into<Vec<u8>>) -> Self {
        Self::with_encoding(name, TextEncoding::utf8())
    }

    /// Create an empty channel with the given text encoding.
    pub fn with_encoding(name: impl Into<Vec<u8>>, encoding: TextEncoding) -> Self {
        Self {
            name: name.into(),
            topic: None,
            topic_setter: None,
            modes: Vec::new(),
            members: HashMap::new(),
            metadata: HashMap::new(),
            encoding,
        }
    }

    /// Channel name as first seen.
    #[must_use]
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    #[must_use]
    pub fn topic(&self) -> Option<&[u8]> {
        self.topic.as_deref()
    }

    #[must_use]
    pub fn topic_setter(&self) -> Option<&[u8]> {
        self.topic_setter.as_deref()
    }

    /// The last mode string seen, verbatim (e.g. `+ntk key`).
    #[must_use]
    pub fn modes(&self) -> &[u8] {
        &self.modes
    }

    /// Member nicknames as last seen, in no particular order.
    pub fn members(&self) -> impl Iterator<Item = &[u8]> {
        self.members.values().map(Vec::as_slice)
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether `nick` is a member under `casemap`.
    #[must_use]
    pub fn has_member(&self, nick: &[u8], casemap: CaseMapping) -> bool {
        self.members.contains_key(&casemap.fold(nick))
    }

    /// Add a member. Returns `false` if it was already present.
    pub fn add_member(&mut self, nick: &[u8], casemap: CaseMapping) -> bool {
        let key = casemap.fold(nick);
        let added = !self.members.contains_key(&key);
        self.members.insert(key, nick.to_vec());
        added
    }

    /// Remove a member. Returns `false` if it was not present.
    pub fn remove_member(&mut self, nick: &[u8], casemap: CaseMapping) -> bool {
        self.members.remove(&casemap.fold(nick)).is_some()
    }

    /// Rename a member. Returns `false` if `old` was not present.
    pub fn rename_member(&mut self, old: &[u8], new: &[u8], casemap: CaseMapping) -> bool {
        if self.members.remove(&casemap.fold(old)).is_none() {
            return false;
        }
        self.members.insert(casemap.fold(new), new.to_vec());
        true
    }

    /// Application data attached to this channel.
    #[must_use]
    pub fn metadata(&self) -> &HashMap<String, Vec<u8>> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut HashMap<String, Vec<u8>> {
        &mut self.metadata
    }

    /// Text encoding for this channel's messages. Starts as the session's.
    #[must_use]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    /// Rebuild member keys after a casemapping change.
    pub(crate) fn rekey(&mut self, casemap: CaseMapping) {
        self.members = self
            .members
            .drain()
            .map(|(_, nick)| (casemap.fold(&nick), nick))
            .collect();
    }

    /// Fold another channel's members and metadata into this one. Existing
    /// entries win.
    pub(crate) fn absorb(&mut self, other: Channel) {
        for (key, nick) in other.members {
            self.members.entry(key).or_insert(nick);
        }
        for (key, value) in other.metadata {
            self.metadata.entry(key).or_insert(value);
        }
    }

    pub(crate) fn handle_join(&mut self, nick: &[u8], origin: &[u8], scope: Scope<'_>) -> Event {
        self.add_member(nick, scope.casemap);
        Event::MemberJoined {
            channel: self.name.clone(),
            nick: nick.to_vec(),
            origin: origin.to_vec(),
        }
    }

    pub(crate) fn handle_part(
        &mut self,
        nick: &[u8],
        origin: &[u8],
        reason: Option<&[u8]>,
        scope: Scope<'_>,
    ) -> Event {
        self.remove_member(nick, scope.casemap);
        Event::MemberParted {
            channel: self.name.clone(),
            nick: nick.to_vec(),
            origin: origin.to_vec(),
            reason: reason.map(<[u8]>::to_vec),
            own: scope.is_own(nick),
        }
    }

    pub(crate) fn handle_kick(
        &mut self,
        nick: &[u8],
        by: &[u8],
        reason: Option<&[u8]>,
        scope: Scope<'_>,
    ) -> Event {
        self.remove_member(nick, scope.casemap);
        Event::MemberKicked {
            channel: self.name.clone(),
            nick: nick.to_vec(),
            by: by.to_vec(),
            reason: reason.map(<[u8]>::to_vec),
            own: scope.is_own(nick),
        }
    }

    /// Apply a topic from TOPIC, 332 or 331. An empty topic clears it.
    pub(crate) fn handle_topic(&mut self, topic: Option<&[u8]>, set_by: Option<&[u8]>) -> Event {
        self.topic = topic.filter(|t| !t.is_empty()).map(<[u8]>::to_vec);
        self.topic_setter = set_by.map(<[u8]>::to_vec);
        Event::TopicChanged {
            channel: self.name.clone(),
            topic: self.topic.clone(),
            set_by: set_by.map(<[u8]>::to_vec),
        }
    }

    /// Record the topic setter from 333.
    pub(crate) fn handle_topic_who_time(&mut self, setter: &[u8]) {
        self.topic_setter = Some(setter.to_vec());
    }

    /// Apply a mode string from MODE or 324.
    pub(crate) fn handle_modes(&mut self, modes: Vec<u8>, set_by: Option<&[u8]>) -> Event {
        self.modes.clone_from(&modes);
        Event::ChannelModeChanged {
            channel: self.name.clone(),
            modes,
            set_by: set_by.map(<[u8]>::to_vec),
        }
    }

    /// Add the members listed in a 353 reply.
    ///
    /// Membership prefixes (`@`, `+`, ...) are stripped, and so is the
    /// `!user@host` suffix some servers append.
    pub(crate) fn handle_names(&mut self, names: &[u8], scope: Scope<'_>) {
        for entry in names.split(|&b| b == b' ').filter(|e| !e.is_empty()) {
            let start = entry
                .iter()
                .position(|b| !scope.member_prefixes.contains(b))
                .unwrap_or(entry.len());
            let nick = nick_from(&entry[start..]);
            if !nick.is_empty() {
                self.add_member(nick, scope.casemap);
            }
        }
    }

    pub(crate) fn handle_message(&self, kind: MessageKind, origin: &[u8], text: &[u8]) -> Event {
        let channel = self.name.clone();
        let origin = origin.to_vec();
        let text = text.to_vec();
        match kind {
            MessageKind::Privmsg => Event::ChannelMessage {
                channel,
                origin,
                text,
            },
            MessageKind::Notice => Event::ChannelNotice {
                channel,
                origin,
                text,
            },
            MessageKind::Action => Event::ChannelAction {
                channel,
                origin,
                text,
            },
        }
    }
}
