//! The session state machine.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::channel::{Channel, MessageKind, Scope};
use super::{Action, ConnectionState, DisconnectReason, SessionConfig};
use crate::casemap::CaseMapping;
use crate::command::Command;
use crate::ctcp::{self, Ctcp, CtcpKind, CLIENTINFO_REPLY};
use crate::encode::IrcEncode;
use crate::error::SessionError;
use crate::event::Event;
use crate::isupport::{Isupport, DEFAULT_CHANTYPES, DEFAULT_MEMBER_PREFIXES};
use crate::message::MessageRef;
use crate::prefix::{nick_from, PrefixRef};
use crate::response::Response;
use crate::text::TextEncoding;

/// One IRC client session, without I/O.
///
/// Feed it transport notifications and inbound lines; perform the returned
/// [`Action`]s in order. Outbound operations return the encoded line for the
/// caller to write.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    state: ConnectionState,
    nickname: Vec<u8>,
    pending_nickname: Option<Vec<u8>>,
    casemap: CaseMapping,
    chantypes: Vec<u8>,
    member_prefixes: Vec<u8>,
    network: Option<Vec<u8>>,
    channels: HashMap<Vec<u8>, Channel>,
    metadata: HashMap<String, Vec<u8>>,
    encoding: TextEncoding,
    nick_attempts: u32,
    registered: bool,
    failure_reported: bool,
    pending_reason: Option<DisconnectReason>,
    last_error: Option<Vec<u8>>,
}

impl Session {
    /// Create a disconnected session.
    pub fn new(config: SessionConfig) -> Self {
        let encoding = TextEncoding::for_label_or_utf8(&config.encoding);
        let nickname = config.nickname.as_bytes().to_vec();
        Self {
            config,
            state: ConnectionState::Disconnected,
            nickname,
            pending_nickname: None,
            casemap: CaseMapping::default(),
            chantypes: DEFAULT_CHANTYPES.to_vec(),
            member_prefixes: DEFAULT_MEMBER_PREFIXES.to_vec(),
            network: None,
            channels: HashMap::new(),
            metadata: HashMap::new(),
            encoding,
            nick_attempts: 0,
            registered: false,
            failure_reported: false,
            pending_reason: None,
            last_error: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mutable access to the configuration, only while disconnected.
    pub fn config_mut(&mut self) -> Result<&mut SessionConfig, SessionError> {
        self.require_disconnected()?;
        Ok(&mut self.config)
    }

    /// Set nickname, username and realname before connecting.
    pub fn set_identity(
        &mut self,
        nickname: impl Into<String>,
        username: impl Into<String>,
        realname: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.require_disconnected()?;
        self.config.nickname = nickname.into();
        self.config.username = username.into();
        self.config.realname = realname.into();
        self.nickname = self.config.nickname.as_bytes().to_vec();
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Our current nickname. Before registration this is the configured one.
    #[must_use]
    pub fn nickname(&self) -> &[u8] {
        &self.nickname
    }

    /// A nickname we asked for that the server has not confirmed yet.
    #[must_use]
    pub fn pending_nickname(&self) -> Option<&[u8]> {
        self.pending_nickname.as_deref()
    }

    #[must_use]
    pub fn casemapping(&self) -> CaseMapping {
        self.casemap
    }

    /// Network name from ISUPPORT, if the server announced one.
    #[must_use]
    pub fn network(&self) -> Option<&[u8]> {
        self.network.as_deref()
    }

    /// Channel type prefixes from ISUPPORT (default `#&+!`).
    #[must_use]
    pub fn channel_types(&self) -> &[u8] {
        &self.chantypes
    }

    #[must_use]
    pub fn text_encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Change the text encoding. Allowed in any state; channels joined
    /// from now on start with it, channels already joined keep theirs.
    pub fn set_text_encoding(&mut self, encoding: TextEncoding) {
        debug!(encoding = encoding.name(), "text encoding changed");
        self.encoding = encoding;
        self.config.encoding = encoding.name().to_owned();
    }

    /// Text of the last `ERROR` the server sent.
    #[must_use]
    pub fn last_error(&self) -> Option<&[u8]> {
        self.last_error.as_deref()
    }

    /// Channels we are joined to.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Look up a joined channel by name, using the active casemapping.
    #[must_use]
    pub fn channel(&self, name: &[u8]) -> Option<&Channel> {
        self.channels.get(&self.casemap.fold(name))
    }

    pub fn channel_mut(&mut self, name: &[u8]) -> Option<&mut Channel> {
        let key = self.casemap.fold(name);
        self.channels.get_mut(&key)
    }

    /// Whether `target` starts with one of the server's channel types.
    #[must_use]
    pub fn is_channel_name(&self, target: &[u8]) -> bool {
        target.first().is_some_and(|b| self.chantypes.contains(b))
    }

    /// Application data attached to the session. Survives reconnects.
    #[must_use]
    pub fn metadata(&self) -> &HashMap<String, Vec<u8>> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut HashMap<String, Vec<u8>> {
        &mut self.metadata
    }

    /// Clear channels, nicknames and ISUPPORT state.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.require_disconnected()?;
        self.clear_transient();
        Ok(())
    }

    /// Start a connection attempt: `Disconnected → Connecting`.
    pub fn begin_connect(&mut self) -> Result<(), SessionError> {
        self.require_disconnected()?;
        if !self.config.has_identity() {
            return Err(SessionError::NotConfigured);
        }
        self.clear_transient();
        self.encoding = TextEncoding::for_label_or_utf8(&self.config.encoding);
        self.state = ConnectionState::Connecting;
        info!(host = %self.config.host, port = self.config.port, "connecting");
        Ok(())
    }

    /// The transport is up: `Connecting → Registering`. Returns the
    /// registration lines.
    pub fn transport_connected(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.state != ConnectionState::Connecting {
            warn!(state = ?self.state, "transport connected outside of connecting state");
            return actions;
        }
        self.state = ConnectionState::Registering;
        debug!(nick = %self.config.nickname, "registering");

        let mut commands = Vec::with_capacity(3);
        if let Some(password) = self.config.password.as_deref().filter(|p| !p.is_empty()) {
            commands.push(Command::PASS(password.as_bytes().to_vec()));
        }
        commands.push(Command::NICK(self.nickname.clone()));
        commands.push(Command::USER(
            self.config.username.as_bytes().to_vec(),
            b"0".to_vec(),
            self.encoding.encode(&self.config.realname).into_owned(),
        ));

        for command in commands {
            match command.encode() {
                Ok(line) => actions.push(Action::Send(line)),
                Err(e) => {
                    self.fail(SessionError::Encode(e), &mut actions);
                    return actions;
                }
            }
        }
        self.pending_nickname = Some(self.nickname.clone());
        actions
    }

    /// Parse and handle one inbound line. Malformed lines are logged and
    /// dropped.
    pub fn handle_line(&mut self, line: &[u8]) -> Vec<Action> {
        match MessageRef::parse(line) {
            Ok(msg) => self.handle_message(&msg),
            Err(e) => {
                debug!(
                    error = %SessionError::MalformedMessage(e),
                    line = %String::from_utf8_lossy(line),
                    "dropping line"
                );
                Vec::new()
            }
        }
    }

    /// Handle one parsed inbound message.
    pub fn handle_message(&mut self, msg: &MessageRef<'_>) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.state == ConnectionState::Disconnected {
            debug!(command = msg.command, "ignoring message while disconnected");
            return actions;
        }

        if let Some(code) = msg.numeric() {
            self.handle_numeric(code, msg, &mut actions);
            return actions;
        }

        match msg.command.to_ascii_uppercase().as_str() {
            "PING" => self.handle_ping(msg, &mut actions),
            "ERROR" => self.handle_error(msg, &mut actions),
            "JOIN" => self.handle_join(msg, &mut actions),
            "PART" => self.handle_part(msg, &mut actions),
            "KICK" => self.handle_kick(msg, &mut actions),
            "TOPIC" => self.handle_topic(msg, &mut actions),
            "MODE" => self.handle_mode(msg, &mut actions),
            "PRIVMSG" => self.handle_privmsg(msg, false, &mut actions),
            "NOTICE" => self.handle_privmsg(msg, true, &mut actions),
            "NICK" => self.handle_nick(msg, &mut actions),
            "QUIT" => self.handle_quit(msg, &mut actions),
            "INVITE" => self.handle_invite(msg, &mut actions),
            _ => actions.push(Action::Emit(Event::Unknown {
                message: msg.to_owned(),
            })),
        }
        actions
    }

    /// The transport is gone. Clears channels and emits `Disconnected`
    /// exactly once per connection.
    pub fn transport_closed(&mut self, reason: DisconnectReason) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.state == ConnectionState::Disconnected {
            return actions;
        }
        let reason = self.pending_reason.take().unwrap_or(reason);

        self.channels.clear();
        self.pending_nickname = None;
        self.state = ConnectionState::Disconnected;

        if !self.registered && !self.failure_reported {
            self.failure_reported = true;
            actions.push(Action::Emit(Event::ConnectionFailed {
                error: reason.to_error(),
            }));
        }
        info!(%reason, "disconnected");
        actions.push(Action::Emit(Event::Disconnected { reason }));
        actions
    }

    /// Send a pre-formatted line.
    pub fn send_raw(&mut self, line: &[u8]) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::Raw(line.to_vec()))
    }

    /// Send `QUIT` and move to `Disconnecting`.
    pub fn quit(&mut self, message: Option<&[u8]>) -> Result<Vec<u8>, SessionError> {
        let line = self.outbound(Command::QUIT(message.map(<[u8]>::to_vec)))?;
        self.state = ConnectionState::Disconnecting;
        self.pending_reason.get_or_insert(DisconnectReason::Requested);
        info!("quitting");
        Ok(line)
    }

    pub fn join(&mut self, channel: &[u8], key: Option<&[u8]>) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::JOIN(channel.to_vec(), key.map(<[u8]>::to_vec)))
    }

    pub fn part(&mut self, channel: &[u8], reason: Option<&[u8]>) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::PART(channel.to_vec(), reason.map(<[u8]>::to_vec)))
    }

    pub fn names(&mut self, channel: Option<&[u8]>) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::NAMES(channel.map(<[u8]>::to_vec)))
    }

    pub fn list(&mut self, channel: Option<&[u8]>) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::LIST(channel.map(<[u8]>::to_vec)))
    }

    /// Query (`None`) or change our user modes.
    pub fn user_mode(&mut self, modes: Option<&[u8]>) -> Result<Vec<u8>, SessionError> {
        let nick = self.nickname.clone();
        self.outbound(Command::UserMODE(nick, modes.map(<[u8]>::to_vec)))
    }

    /// Query (empty `modes`) or change channel modes, e.g. `+o bob`.
    pub fn channel_mode(&mut self, channel: &[u8], modes: &[u8]) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::channel_mode(channel, modes))
    }

    /// Ask for a new nickname. The current nickname changes when the server
    /// confirms with `NICK`.
    pub fn nick(&mut self, nickname: &[u8]) -> Result<Vec<u8>, SessionError> {
        let line = self.outbound(Command::NICK(nickname.to_vec()))?;
        self.pending_nickname = Some(nickname.to_vec());
        Ok(line)
    }

    pub fn who(&mut self, mask: Option<&[u8]>) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::WHO(mask.map(<[u8]>::to_vec)))
    }

    pub fn whois(&mut self, nickname: &[u8]) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::WHOIS(nickname.to_vec()))
    }

    pub fn message(&mut self, target: &[u8], text: &[u8]) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::PRIVMSG(target.to_vec(), text.to_vec()))
    }

    pub fn action(&mut self, target: &[u8], text: &[u8]) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::action(target, text))
    }

    pub fn notice(&mut self, target: &[u8], text: &[u8]) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::NOTICE(target.to_vec(), text.to_vec()))
    }

    /// Send a CTCP request such as `VERSION` or `PING 12345`.
    pub fn ctcp_request(&mut self, target: &[u8], body: &[u8]) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::ctcp_request(target, body))
    }

    pub fn ctcp_reply(&mut self, target: &[u8], body: &[u8]) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::ctcp_reply(target, body))
    }

    pub fn kick(
        &mut self,
        channel: &[u8],
        nickname: &[u8],
        reason: Option<&[u8]>,
    ) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::KICK(
            channel.to_vec(),
            nickname.to_vec(),
            reason.map(<[u8]>::to_vec),
        ))
    }

    pub fn invite(&mut self, nickname: &[u8], channel: &[u8]) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::INVITE(nickname.to_vec(), channel.to_vec()))
    }

    /// Query (`None`) or set a channel topic. An empty topic clears it.
    pub fn topic(&mut self, channel: &[u8], topic: Option<&[u8]>) -> Result<Vec<u8>, SessionError> {
        self.outbound(Command::TOPIC(channel.to_vec(), topic.map(<[u8]>::to_vec)))
    }

    fn require_disconnected(&self) -> Result<(), SessionError> {
        match self.state {
            ConnectionState::Disconnected => Ok(()),
            _ => Err(SessionError::AlreadyConnected),
        }
    }

    fn outbound(&self, command: Command) -> Result<Vec<u8>, SessionError> {
        match self.state {
            ConnectionState::Registering | ConnectionState::Connected => Ok(command.encode()?),
            _ => Err(SessionError::NotConnected),
        }
    }

    fn clear_transient(&mut self) {
        self.channels.clear();
        self.nickname = self.config.nickname.as_bytes().to_vec();
        self.pending_nickname = None;
        self.casemap = CaseMapping::default();
        self.chantypes = DEFAULT_CHANTYPES.to_vec();
        self.member_prefixes = DEFAULT_MEMBER_PREFIXES.to_vec();
        self.network = None;
        self.nick_attempts = 0;
        self.registered = false;
        self.failure_reported = false;
        self.pending_reason = None;
        self.last_error = None;
    }

    /// Give up on this connection: report the failure once and ask the
    /// caller to close the transport.
    fn fail(&mut self, error: SessionError, actions: &mut Vec<Action>) {
        warn!(%error, "connection failed");
        if !self.failure_reported {
            self.failure_reported = true;
            actions.push(Action::Emit(Event::ConnectionFailed {
                error: error.clone(),
            }));
        }
        self.pending_reason = Some(DisconnectReason::Failed(error));
        self.state = ConnectionState::Disconnecting;
        actions.push(Action::Close);
    }

    fn send(&self, command: Command, actions: &mut Vec<Action>) {
        match command.encode() {
            Ok(line) => actions.push(Action::Send(line)),
            Err(e) => warn!(error = %e, command = command.name(), "failed to encode reply"),
        }
    }

    fn handle_numeric(&mut self, code: u16, msg: &MessageRef<'_>, actions: &mut Vec<Action>) {
        let response = Response::from_code(code);
        match response {
            Some(Response::RPL_WELCOME) if self.state == ConnectionState::Registering => {
                self.handle_welcome(msg, actions);
                return;
            }
            Some(Response::RPL_ISUPPORT) => self.apply_isupport(msg),
            Some(r) if r.is_nick_rejection() => {
                if self.state == ConnectionState::Registering {
                    self.retry_nick(actions);
                    return;
                }
                self.pending_nickname = None;
            }
            Some(r) if r.is_channel_state() => {
                if self.handle_channel_numeric(r, msg, actions) {
                    return;
                }
            }
            _ => {}
        }

        actions.push(Action::Emit(Event::Numeric {
            code,
            origin: msg.prefix.map(<[u8]>::to_vec),
            params: msg.params.iter().map(|p| p.to_vec()).collect(),
        }));
    }

    fn handle_welcome(&mut self, msg: &MessageRef<'_>, actions: &mut Vec<Action>) {
        let Some(nickname) = msg.param(0).filter(|n| !n.is_empty()) else {
            self.fail(
                SessionError::ProtocolViolation("welcome without a nickname".into()),
                actions,
            );
            return;
        };
        self.nickname = nickname.to_vec();
        self.pending_nickname = None;
        self.state = ConnectionState::Connected;
        self.registered = true;
        info!(nick = %String::from_utf8_lossy(nickname), "registered");
        actions.push(Action::Emit(Event::ConnectionSucceeded {
            nickname: nickname.to_vec(),
        }));
    }

    fn retry_nick(&mut self, actions: &mut Vec<Action>) {
        if self.nick_attempts >= self.config.max_nick_retries {
            self.fail(
                SessionError::NicknameUnavailable {
                    attempts: self.nick_attempts + 1,
                },
                actions,
            );
            return;
        }

        let rejected = self
            .pending_nickname
            .clone()
            .unwrap_or_else(|| self.nickname.clone());
        let candidate = match self.config.alt_nicknames.get(self.nick_attempts as usize) {
            Some(alt) => alt.as_bytes().to_vec(),
            None => {
                let mut nick = rejected.clone();
                nick.push(b'_');
                nick
            }
        };
        self.nick_attempts += 1;
        info!(
            rejected = %String::from_utf8_lossy(&rejected),
            next = %String::from_utf8_lossy(&candidate),
            attempt = self.nick_attempts,
            "nickname rejected, retrying"
        );
        self.send(Command::NICK(candidate.clone()), actions);
        self.pending_nickname = Some(candidate);
    }

    fn apply_isupport(&mut self, msg: &MessageRef<'_>) {
        let Some(isupport) = Isupport::from_message_ref(msg) else {
            return;
        };
        if let Some(token) = isupport.casemapping() {
            match CaseMapping::from_token(token) {
                Some(casemap) => self.set_casemapping(casemap),
                None => debug!(
                    casemapping = %String::from_utf8_lossy(token),
                    "unsupported casemapping, keeping current"
                ),
            }
        }
        if let Some(chantypes) = isupport.chantypes() {
            self.chantypes = chantypes.to_vec();
        }
        if let Some(prefix) = isupport.prefix() {
            self.member_prefixes = prefix.prefixes.to_vec();
        }
        if let Some(network) = isupport.network() {
            self.network = Some(network.to_vec());
        }
    }

    fn set_casemapping(&mut self, casemap: CaseMapping) {
        if casemap == self.casemap {
            return;
        }
        debug!(%casemap, "casemapping changed");
        self.casemap = casemap;
        let mut channels: HashMap<Vec<u8>, Channel> = HashMap::with_capacity(self.channels.len());
        for (_, mut channel) in self.channels.drain() {
            channel.rekey(casemap);
            let key = casemap.fold(channel.name());
            match channels.get_mut(&key) {
                Some(existing) => {
                    warn!(
                        channel = %String::from_utf8_lossy(channel.name()),
                        into = %String::from_utf8_lossy(existing.name()),
                        %casemap,
                        "channels collide under new casemapping, merging"
                    );
                    existing.absorb(channel);
                }
                None => {
                    channels.insert(key, channel);
                }
            }
        }
        self.channels = channels;
    }

    /// Apply 324/331/332/333/353 to a joined channel. Returns `false` when
    /// the channel is unknown so the reply surfaces as a plain numeric.
    fn handle_channel_numeric(
        &mut self,
        response: Response,
        msg: &MessageRef<'_>,
        actions: &mut Vec<Action>,
    ) -> bool {
        // 353 is `<me> <type> <channel> :<names>`; the type is missing on
        // some older servers.
        let name = match response {
            Response::RPL_NAMREPLY if msg.params.len() >= 2 => msg.params[msg.params.len() - 2],
            Response::RPL_NAMREPLY => return false,
            _ => match msg.param(1) {
                Some(name) => name,
                None => return false,
            },
        };
        let scope = Scope {
            casemap: self.casemap,
            own_nick: &self.nickname,
            member_prefixes: &self.member_prefixes,
        };
        let Some(channel) = self.channels.get_mut(&self.casemap.fold(name)) else {
            return false;
        };

        match response {
            Response::RPL_CHANNELMODEIS => {
                let modes = msg.params.get(2..).unwrap_or_default().join(&b' ');
                actions.push(Action::Emit(channel.handle_modes(modes, None)));
            }
            Response::RPL_NOTOPIC => actions.push(Action::Emit(channel.handle_topic(None, None))),
            Response::RPL_TOPIC => {
                let topic = msg.param(2).unwrap_or_default();
                actions.push(Action::Emit(channel.handle_topic(Some(topic), None)));
            }
            Response::RPL_TOPICWHOTIME => {
                if let Some(setter) = msg.param(2) {
                    channel.handle_topic_who_time(nick_from(setter));
                }
            }
            Response::RPL_NAMREPLY => {
                if let Some(names) = msg.params.last() {
                    channel.handle_names(names, scope);
                }
            }
            _ => return false,
        }
        true
    }

    fn handle_ping(&mut self, msg: &MessageRef<'_>, actions: &mut Vec<Action>) {
        let params: Vec<Vec<u8>> = msg.params.iter().map(|p| p.to_vec()).collect();
        let reply = if params.is_empty() {
            let token = msg.prefix.map_or_else(|| self.nickname.clone(), <[u8]>::to_vec);
            vec![token]
        } else {
            params.clone()
        };
        self.send(Command::PONG(reply), actions);
        actions.push(Action::Emit(Event::Ping { params }));
    }

    fn handle_error(&mut self, msg: &MessageRef<'_>, actions: &mut Vec<Action>) {
        let text = msg.param(0).unwrap_or_default().to_vec();
        warn!(error = %String::from_utf8_lossy(&text), "server error");
        self.last_error = Some(text.clone());
        self.pending_reason
            .get_or_insert_with(|| DisconnectReason::ServerError(text.clone()));
        self.state = ConnectionState::Disconnecting;
        actions.push(Action::Emit(Event::ServerError { text }));
    }

    fn handle_join(&mut self, msg: &MessageRef<'_>, actions: &mut Vec<Action>) {
        let Some(name) = msg.param(0) else {
            debug!("JOIN without a channel");
            return;
        };
        let origin = msg.prefix.unwrap_or_default();
        let nick = nick_from(origin);
        let key = self.casemap.fold(name);

        if self.casemap.eq(nick, &self.nickname) {
            let casemap = self.casemap;
            let encoding = self.encoding;
            let channel = self
                .channels
                .entry(key)
                .or_insert_with(|| Channel::with_encoding(name, encoding));
            channel.add_member(nick, casemap);
            info!(channel = %String::from_utf8_lossy(name), "joined");
            actions.push(Action::Emit(Event::JoinedChannel {
                channel: channel.name().to_vec(),
            }));
            return;
        }

        let scope = Scope {
            casemap: self.casemap,
            own_nick: &self.nickname,
            member_prefixes: &self.member_prefixes,
        };
        match self.channels.get_mut(&key) {
            Some(channel) => actions.push(Action::Emit(channel.handle_join(nick, origin, scope))),
            None => unknown_channel(name, msg),
        }
    }

    fn handle_part(&mut self, msg: &MessageRef<'_>, actions: &mut Vec<Action>) {
        let Some(name) = msg.param(0) else {
            return;
        };
        let origin = msg.prefix.unwrap_or_default();
        let key = self.casemap.fold(name);
        let scope = Scope {
            casemap: self.casemap,
            own_nick: &self.nickname,
            member_prefixes: &self.member_prefixes,
        };
        let Some(channel) = self.channels.get_mut(&key) else {
            unknown_channel(name, msg);
            return;
        };

        let event = channel.handle_part(nick_from(origin), origin, msg.param(1), scope);
        if matches!(event, Event::MemberParted { own: true, .. }) {
            self.channels.remove(&key);
            info!(channel = %String::from_utf8_lossy(name), "left channel");
        }
        actions.push(Action::Emit(event));
    }

    fn handle_kick(&mut self, msg: &MessageRef<'_>, actions: &mut Vec<Action>) {
        let (Some(name), Some(target)) = (msg.param(0), msg.param(1)) else {
            return;
        };
        let by = nick_from(msg.prefix.unwrap_or_default());
        let key = self.casemap.fold(name);
        let scope = Scope {
            casemap: self.casemap,
            own_nick: &self.nickname,
            member_prefixes: &self.member_prefixes,
        };
        let Some(channel) = self.channels.get_mut(&key) else {
            unknown_channel(name, msg);
            return;
        };

        let event = channel.handle_kick(target, by, msg.param(2), scope);
        if matches!(event, Event::MemberKicked { own: true, .. }) {
            self.channels.remove(&key);
            info!(
                channel = %String::from_utf8_lossy(name),
                by = %String::from_utf8_lossy(by),
                "kicked from channel"
            );
        }
        actions.push(Action::Emit(event));
    }

    fn handle_topic(&mut self, msg: &MessageRef<'_>, actions: &mut Vec<Action>) {
        let Some(name) = msg.param(0) else {
            return;
        };
        let setter = nick_from(msg.prefix.unwrap_or_default());
        let key = self.casemap.fold(name);
        match self.channels.get_mut(&key) {
            Some(channel) => {
                let topic = msg.param(1).unwrap_or_default();
                actions.push(Action::Emit(channel.handle_topic(Some(topic), Some(setter))));
            }
            None => unknown_channel(name, msg),
        }
    }

    fn handle_mode(&mut self, msg: &MessageRef<'_>, actions: &mut Vec<Action>) {
        let Some(target) = msg.param(0) else {
            return;
        };
        let set_by = msg.prefix.map(nick_from);
        let modes = msg.params.get(1..).unwrap_or_default().join(&b' ');

        if !self.is_channel_name(target) {
            actions.push(Action::Emit(Event::UserModeChanged {
                target: target.to_vec(),
                modes,
                set_by: set_by.map(<[u8]>::to_vec),
            }));
            return;
        }

        let key = self.casemap.fold(target);
        match self.channels.get_mut(&key) {
            Some(channel) => actions.push(Action::Emit(channel.handle_modes(modes, set_by))),
            None => unknown_channel(target, msg),
        }
    }

    fn handle_privmsg(&mut self, msg: &MessageRef<'_>, notice: bool, actions: &mut Vec<Action>) {
        let Some(target) = msg.param(0) else {
            return;
        };
        let text = msg.param(1).unwrap_or_default();
        let origin = msg.prefix.unwrap_or_default();
        let to_channel = self.is_channel_name(target);
        let key = self.casemap.fold(target);

        if to_channel && !self.channels.contains_key(&key) {
            unknown_channel(target, msg);
            return;
        }

        if let Some(ctcp) = Ctcp::parse(text) {
            self.handle_ctcp(ctcp, msg, notice, &key, to_channel, actions);
            return;
        }

        let kind = if notice {
            MessageKind::Notice
        } else {
            MessageKind::Privmsg
        };
        if let Some(channel) = to_channel.then(|| self.channels.get(&key)).flatten() {
            actions.push(Action::Emit(channel.handle_message(kind, origin, text)));
            return;
        }

        if PrefixRef::parse(origin).is_server() {
            let origin = origin.to_vec();
            let params = msg.params.iter().map(|p| p.to_vec()).collect();
            actions.push(Action::Emit(if notice {
                Event::ServerNotice { origin, params }
            } else {
                Event::ServerMessage { origin, params }
            }));
            return;
        }

        let origin = origin.to_vec();
        let text = text.to_vec();
        actions.push(Action::Emit(if notice {
            Event::PrivateNotice { origin, text }
        } else {
            Event::PrivateMessage { origin, text }
        }));
    }

    fn handle_ctcp(
        &mut self,
        ctcp: Ctcp<'_>,
        msg: &MessageRef<'_>,
        notice: bool,
        key: &[u8],
        to_channel: bool,
        actions: &mut Vec<Action>,
    ) {
        let origin = msg.prefix.unwrap_or_default();
        let args = ctcp.params.unwrap_or_default();

        if notice {
            actions.push(Action::Emit(Event::CtcpReply {
                origin: origin.to_vec(),
                command: ctcp.kind.as_str().to_owned(),
                args: args.to_vec(),
            }));
            return;
        }

        if ctcp.kind == CtcpKind::Action {
            let event = match to_channel.then(|| self.channels.get(key)).flatten() {
                Some(channel) => channel.handle_message(MessageKind::Action, origin, args),
                None => Event::PrivateAction {
                    origin: origin.to_vec(),
                    text: args.to_vec(),
                },
            };
            actions.push(Action::Emit(event));
            return;
        }

        let sender = nick_from(origin);
        if self.config.auto_ctcp_replies && !sender.is_empty() {
            if let Some(body) = self.ctcp_auto_reply(&ctcp.kind, args) {
                debug!(
                    command = ctcp.kind.as_str(),
                    to = %String::from_utf8_lossy(sender),
                    "answering CTCP request"
                );
                self.send(Command::NOTICE(sender.to_vec(), body), actions);
            }
        }

        actions.push(Action::Emit(Event::CtcpRequest {
            origin: origin.to_vec(),
            target: msg.param(0).unwrap_or_default().to_vec(),
            command: ctcp.kind.as_str().to_owned(),
            args: args.to_vec(),
        }));
    }

    fn ctcp_auto_reply(&self, kind: &CtcpKind, args: &[u8]) -> Option<Vec<u8>> {
        match kind {
            CtcpKind::Version => Some(ctcp::build(
                b"VERSION",
                &self.encoding.encode(&self.config.version),
            )),
            CtcpKind::Ping => Some(ctcp::build(b"PING", args)),
            CtcpKind::Time => {
                let now = chrono::Local::now().to_rfc2822();
                Some(ctcp::build(b"TIME", &self.encoding.encode(&now)))
            }
            CtcpKind::Clientinfo => Some(ctcp::build(b"CLIENTINFO", CLIENTINFO_REPLY.as_bytes())),
            _ => None,
        }
    }

    fn handle_nick(&mut self, msg: &MessageRef<'_>, actions: &mut Vec<Action>) {
        let Some(new) = msg.param(0) else {
            return;
        };
        let old = nick_from(msg.prefix.unwrap_or_default());
        let casemap = self.casemap;
        for channel in self.channels.values_mut() {
            channel.rename_member(old, new, casemap);
        }

        let own = casemap.eq(old, &self.nickname);
        if own {
            info!(
                old = %String::from_utf8_lossy(old),
                new = %String::from_utf8_lossy(new),
                "nickname changed"
            );
            self.nickname = new.to_vec();
            self.pending_nickname = None;
        }
        actions.push(Action::Emit(Event::NickChanged {
            old: old.to_vec(),
            new: new.to_vec(),
            own,
        }));
    }

    fn handle_quit(&mut self, msg: &MessageRef<'_>, actions: &mut Vec<Action>) {
        let origin = msg.prefix.unwrap_or_default();
        let nick = nick_from(origin);
        let casemap = self.casemap;
        for channel in self.channels.values_mut() {
            channel.remove_member(nick, casemap);
        }
        actions.push(Action::Emit(Event::UserQuit {
            nick: nick.to_vec(),
            origin: origin.to_vec(),
            reason: msg.param(0).map(<[u8]>::to_vec),
        }));
    }

    fn handle_invite(&mut self, msg: &MessageRef<'_>, actions: &mut Vec<Action>) {
        let Some(channel) = msg.param(1) else {
            return;
        };
        actions.push(Action::Emit(Event::Invited {
            channel: channel.to_vec(),
            origin: msg.prefix.unwrap_or_default().to_vec(),
        }));
    }
}

fn unknown_channel(name: &[u8], msg: &MessageRef<'_>) {
    debug!(
        error = %SessionError::UnknownChannel(name.to_vec()),
        command = msg.command,
        "dropping message"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> Session {
        let mut session = Session::new(SessionConfig::new("irc.test", "me", "user", "Real Name"));
        session.begin_connect().unwrap();
        session.transport_connected();
        session.handle_line(b":irc.test 001 me :Welcome");
        session
    }

    fn events(actions: Vec<Action>) -> Vec<Event> {
        actions
            .into_iter()
            .filter_map(|a| match a {
                Action::Emit(ev) => Some(ev),
                _ => None,
            })
            .collect()
    }

    fn sent(actions: &[Action]) -> Vec<Vec<u8>> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Send(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_begin_connect_requires_identity() {
        let mut session = Session::new(SessionConfig::default());
        assert_eq!(session.begin_connect(), Err(SessionError::NotConfigured));
        session.set_identity("me", "user", "Real").unwrap();
        session.begin_connect().unwrap();
        assert_eq!(session.state(), ConnectionState::Connecting);
        assert_eq!(session.begin_connect(), Err(SessionError::AlreadyConnected));
        assert_eq!(
            session.set_identity("x", "y", "z"),
            Err(SessionError::AlreadyConnected)
        );
    }

    #[test]
    fn test_registration_lines() {
        let mut config = SessionConfig::new("irc.test", "me", "user", "Real Name");
        config.password = Some("hunter2".into());
        let mut session = Session::new(config);
        session.begin_connect().unwrap();
        let actions = session.transport_connected();
        assert_eq!(
            sent(&actions),
            vec![
                b"PASS hunter2\r\n".to_vec(),
                b"NICK me\r\n".to_vec(),
                b"USER user 0 * :Real Name\r\n".to_vec(),
            ]
        );
        assert_eq!(session.state(), ConnectionState::Registering);
        assert_eq!(session.pending_nickname(), Some(&b"me"[..]));
    }

    #[test]
    fn test_welcome_sets_nickname() {
        let session = connected();
        assert!(session.is_connected());
        assert_eq!(session.nickname(), b"me");
        assert_eq!(session.pending_nickname(), None);
    }

    #[test]
    fn test_welcome_without_nick_fails() {
        let mut session = Session::new(SessionConfig::new("irc.test", "me", "user", "Real"));
        session.begin_connect().unwrap();
        session.transport_connected();
        let actions = session.handle_line(b":irc.test 001");
        assert!(actions.contains(&Action::Close));
        assert!(matches!(
            &actions[0],
            Action::Emit(Event::ConnectionFailed {
                error: SessionError::ProtocolViolation(_)
            })
        ));
        assert_eq!(session.state(), ConnectionState::Disconnecting);

        // The failure is not reported twice when the transport closes.
        let evs = events(session.transport_closed(DisconnectReason::ClosedByPeer));
        assert_eq!(evs.len(), 1);
        assert!(matches!(
            &evs[0],
            Event::Disconnected {
                reason: DisconnectReason::Failed(SessionError::ProtocolViolation(_))
            }
        ));
    }

    #[test]
    fn test_nick_retry_uses_alternates_then_underscore() {
        let mut config = SessionConfig::new("irc.test", "me", "user", "Real");
        config.alt_nicknames = vec!["me2".into()];
        config.max_nick_retries = 2;
        let mut session = Session::new(config);
        session.begin_connect().unwrap();
        session.transport_connected();

        let actions = session.handle_line(b":irc.test 433 * me :Nickname is already in use");
        assert_eq!(sent(&actions), vec![b"NICK me2\r\n".to_vec()]);
        assert!(events(actions).is_empty());
        assert_eq!(session.state(), ConnectionState::Registering);

        let actions = session.handle_line(b":irc.test 433 * me2 :Nickname is already in use");
        assert_eq!(sent(&actions), vec![b"NICK me2_\r\n".to_vec()]);

        let actions = session.handle_line(b":irc.test 433 * me2_ :Nickname is already in use");
        assert!(actions.contains(&Action::Close));
        assert_eq!(
            events(actions),
            vec![Event::ConnectionFailed {
                error: SessionError::NicknameUnavailable { attempts: 3 }
            }]
        );
    }

    #[test]
    fn test_nick_rejection_while_connected_is_numeric() {
        let mut session = connected();
        session.nick(b"taken").unwrap();
        assert_eq!(session.pending_nickname(), Some(&b"taken"[..]));
        let evs = events(session.handle_line(b":irc.test 433 me taken :in use"));
        assert!(matches!(&evs[0], Event::Numeric { code: 433, .. }));
        assert_eq!(session.pending_nickname(), None);
        assert_eq!(session.nickname(), b"me");
    }

    #[test]
    fn test_ping_pong() {
        let mut session = connected();
        let actions = session.handle_line(b"PING :irc.test");
        assert_eq!(sent(&actions), vec![b"PONG irc.test\r\n".to_vec()]);
        assert_eq!(
            events(actions),
            vec![Event::Ping {
                params: vec![b"irc.test".to_vec()]
            }]
        );
    }

    #[test]
    fn test_bare_ping_answers_with_origin() {
        let mut session = connected();
        let actions = session.handle_line(b":irc.test PING");
        assert_eq!(sent(&actions), vec![b"PONG irc.test\r\n".to_vec()]);
        assert_eq!(events(actions), vec![Event::Ping { params: vec![] }]);

        let actions = session.handle_line(b"PING");
        assert_eq!(sent(&actions), vec![b"PONG me\r\n".to_vec()]);
    }

    #[test]
    fn test_join_part_presence() {
        let mut session = connected();
        let evs = events(session.handle_line(b":me!u@h JOIN #Rust"));
        assert_eq!(
            evs,
            vec![Event::JoinedChannel {
                channel: b"#Rust".to_vec()
            }]
        );
        assert!(session.channel(b"#rust").is_some());

        session.handle_line(b":bob!b@h JOIN #rust");
        let chan = session.channel(b"#RUST").unwrap();
        assert_eq!(chan.member_count(), 2);

        session.handle_line(b":me!u@h PART #rust :bye");
        assert!(session.channel(b"#rust").is_none());
    }

    #[test]
    fn test_unknown_channel_dropped() {
        let mut session = connected();
        assert!(session.handle_line(b":bob!b@h PRIVMSG #nowhere :hi").is_empty());
        assert!(session.handle_line(b":bob!b@h JOIN #nowhere").is_empty());
        assert!(session.handle_line(b":op!o@h MODE #nowhere +m").is_empty());
    }

    #[test]
    fn test_message_routing() {
        let mut session = connected();
        session.handle_line(b":me!u@h JOIN #rust");

        let evs = events(session.handle_line(b":bob!b@h PRIVMSG #rust :hello world"));
        assert_eq!(
            evs,
            vec![Event::ChannelMessage {
                channel: b"#rust".to_vec(),
                origin: b"bob!b@h".to_vec(),
                text: b"hello world".to_vec(),
            }]
        );

        let evs = events(session.handle_line(b":bob!b@h PRIVMSG me :psst"));
        assert!(matches!(&evs[0], Event::PrivateMessage { .. }));

        let evs = events(session.handle_line(b":irc.test NOTICE me :*** Looking up your hostname"));
        assert!(matches!(&evs[0], Event::ServerNotice { .. }));

        let evs = events(session.handle_line(b":bob!b@h PRIVMSG #rust :\x01ACTION waves\x01"));
        assert!(matches!(&evs[0], Event::ChannelAction { text, .. } if text == b"waves"));
    }

    #[test]
    fn test_ctcp_auto_reply() {
        let mut session = connected();
        let actions = session.handle_line(b":bob!b@h PRIVMSG me :\x01PING 12345\x01");
        assert_eq!(sent(&actions), vec![b"NOTICE bob :\x01PING 12345\x01\r\n".to_vec()]);
        assert!(matches!(
            &events(actions)[0],
            Event::CtcpRequest { command, args, .. } if command == "PING" && args == b"12345"
        ));

        session.config.auto_ctcp_replies = false;
        let actions = session.handle_line(b":bob!b@h PRIVMSG me :\x01VERSION\x01");
        assert!(sent(&actions).is_empty());
        assert_eq!(events(actions).len(), 1);
    }

    #[test]
    fn test_ctcp_reply_in_notice() {
        let mut session = connected();
        let evs = events(session.handle_line(b":bob!b@h NOTICE me :\x01VERSION irssi\x01"));
        assert_eq!(
            evs,
            vec![Event::CtcpReply {
                origin: b"bob!b@h".to_vec(),
                command: "VERSION".into(),
                args: b"irssi".to_vec(),
            }]
        );
    }

    #[test]
    fn test_nick_change_renames() {
        let mut session = connected();
        session.handle_line(b":me!u@h JOIN #rust");
        session.handle_line(b":bob!b@h JOIN #rust");

        session.handle_line(b":bob!b@h NICK robert");
        let chan = session.channel(b"#rust").unwrap();
        assert!(chan.has_member(b"robert", CaseMapping::Rfc1459));
        assert!(!chan.has_member(b"bob", CaseMapping::Rfc1459));

        session.nick(b"newme").unwrap();
        let evs = events(session.handle_line(b":me!u@h NICK :newme"));
        assert!(matches!(&evs[0], Event::NickChanged { own: true, .. }));
        assert_eq!(session.nickname(), b"newme");
        assert_eq!(session.pending_nickname(), None);
    }

    #[test]
    fn test_numerics_for_joined_channel() {
        let mut session = connected();
        session.handle_line(b":me!u@h JOIN #rust");
        let evs = events(session.handle_line(b":irc.test 332 me #rust :Welcome to #rust"));
        assert!(matches!(&evs[0], Event::TopicChanged { .. }));
        assert!(events(session.handle_line(b":irc.test 333 me #rust alice 1700000000")).is_empty());
        assert!(events(session.handle_line(b":irc.test 353 me = #rust :@alice +bob me")).is_empty());

        let chan = session.channel(b"#rust").unwrap();
        assert_eq!(chan.topic(), Some(&b"Welcome to #rust"[..]));
        assert_eq!(chan.topic_setter(), Some(&b"alice"[..]));
        assert_eq!(chan.member_count(), 3);

        let evs = events(session.handle_line(b":irc.test 324 me #rust +nt"));
        assert!(matches!(&evs[0], Event::ChannelModeChanged { modes, .. } if modes == b"+nt"));

        let evs = events(session.handle_line(b":irc.test 332 me #other :topic"));
        assert!(matches!(&evs[0], Event::Numeric { code: 332, .. }));
    }

    #[test]
    fn test_isupport_rekeys_channels() {
        let mut session = connected();
        session.handle_line(b":me!u@h JOIN #a[b]");
        assert!(session.channel(b"#A{B}").is_some());

        let evs = events(session.handle_line(
            b":irc.test 005 me CASEMAPPING=ascii CHANTYPES=# NETWORK=TestNet :are supported by this server",
        ));
        assert!(matches!(&evs[0], Event::Numeric { code: 5, .. }));
        assert_eq!(session.casemapping(), CaseMapping::Ascii);
        assert_eq!(session.network(), Some(&b"TestNet"[..]));
        assert!(session.channel(b"#A[B]").is_some());
        assert!(session.channel(b"#a{b}").is_none());
        assert!(!session.is_channel_name(b"&local"));
    }

    #[test]
    fn test_casemapping_collision_merges_channels() {
        let mut session = connected();
        session.handle_line(b":irc.test 005 me CASEMAPPING=ascii :are supported by this server");
        session.handle_line(b":me!u@h JOIN #a[");
        session.handle_line(b":me!u@h JOIN #a{");
        session.handle_line(b":bob!b@h JOIN #a{");
        assert_eq!(session.channels().count(), 2);

        session.handle_line(b":irc.test 005 me CASEMAPPING=rfc1459 :are supported by this server");
        assert_eq!(session.channels().count(), 1);
        let channel = session.channel(b"#A[").unwrap();
        assert_eq!(channel.member_count(), 2);
        assert!(channel.has_member(b"Bob", CaseMapping::Rfc1459));
        assert!(channel.has_member(b"ME", CaseMapping::Rfc1459));
    }

    #[test]
    fn test_set_text_encoding_while_connected() {
        let mut session = connected();
        session.handle_line(b":me!u@h JOIN #old");
        assert_eq!(session.channel(b"#old").unwrap().encoding(), TextEncoding::utf8());

        let utf8 = TextEncoding::for_label("utf8").unwrap();
        session.set_text_encoding(utf8);
        assert_eq!(session.state(), ConnectionState::Connected);
        assert_eq!(session.text_encoding(), utf8);
        assert_eq!(session.config().encoding, "UTF-8");

        session.channel_mut(b"#old").unwrap().set_encoding(utf8);
        assert_eq!(session.channel(b"#old").unwrap().encoding(), utf8);
    }

    #[cfg(feature = "encoding")]
    #[test]
    fn test_new_channels_inherit_session_encoding() {
        let mut session = connected();
        session.handle_line(b":me!u@h JOIN #before");

        let latin1 = TextEncoding::for_label("iso-8859-1").unwrap();
        session.set_text_encoding(latin1);
        session.handle_line(b":me!u@h JOIN #after");

        assert_eq!(session.channel(b"#before").unwrap().encoding(), TextEncoding::utf8());
        assert_eq!(session.channel(b"#after").unwrap().encoding(), latin1);

        // Survives a reconnect.
        session.transport_closed(DisconnectReason::ClosedByPeer);
        session.begin_connect().unwrap();
        assert_eq!(session.text_encoding(), latin1);
    }

    #[test]
    fn test_outbound_requires_connection() {
        let mut session = Session::new(SessionConfig::new("irc.test", "me", "user", "Real"));
        assert_eq!(
            session.message(b"#rust", b"hi"),
            Err(SessionError::NotConnected)
        );
        let mut session = connected();
        assert_eq!(
            session.topic(b"#rust", Some(b"new topic")).unwrap(),
            b"TOPIC #rust :new topic\r\n"
        );
        assert_eq!(
            session.user_mode(Some(b"+i")).unwrap(),
            b"MODE me +i\r\n"
        );
        assert!(matches!(
            session.join(b"#bad chan", None),
            Err(SessionError::Encode(_))
        ));
    }

    #[test]
    fn test_quit_then_close() {
        let mut session = connected();
        session.handle_line(b":me!u@h JOIN #rust");
        assert_eq!(session.quit(Some(b"bye")).unwrap(), b"QUIT :bye\r\n");
        assert_eq!(session.state(), ConnectionState::Disconnecting);

        let evs = events(session.transport_closed(DisconnectReason::ClosedByPeer));
        assert_eq!(
            evs,
            vec![Event::Disconnected {
                reason: DisconnectReason::Requested
            }]
        );
        assert_eq!(session.channels().count(), 0);
        assert!(session.transport_closed(DisconnectReason::ClosedByPeer).is_empty());
    }

    #[test]
    fn test_error_then_close() {
        let mut session = connected();
        let evs = events(session.handle_line(b"ERROR :Closing Link: me (Killed)"));
        assert!(matches!(&evs[0], Event::ServerError { .. }));
        assert_eq!(session.state(), ConnectionState::Disconnecting);
        assert_eq!(session.last_error(), Some(&b"Closing Link: me (Killed)"[..]));

        let evs = events(session.transport_closed(DisconnectReason::ClosedByPeer));
        assert!(matches!(
            &evs[0],
            Event::Disconnected {
                reason: DisconnectReason::ServerError(_)
            }
        ));
    }

    #[test]
    fn test_close_before_registration_reports_failure() {
        let mut session = Session::new(SessionConfig::new("irc.test", "me", "user", "Real"));
        session.begin_connect().unwrap();
        let evs = events(session.transport_closed(DisconnectReason::Transport("refused".into())));
        assert_eq!(
            evs,
            vec![
                Event::ConnectionFailed {
                    error: SessionError::Transport("refused".into())
                },
                Event::Disconnected {
                    reason: DisconnectReason::Transport("refused".into())
                },
            ]
        );
    }

    #[test]
    fn test_metadata_survives_reset() {
        let mut session = connected();
        session.metadata_mut().insert("account".into(), b"me".to_vec());
        assert_eq!(session.reset(), Err(SessionError::AlreadyConnected));
        session.transport_closed(DisconnectReason::ClosedByPeer);
        session.reset().unwrap();
        assert_eq!(session.metadata().get("account"), Some(&b"me".to_vec()));
    }
}
