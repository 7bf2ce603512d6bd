//! End-to-end session scenarios driven through the public sans-IO API.
//!
//! Each test plays a short server transcript into a [`Session`] and checks
//! the lines it writes, the events it emits and the state it keeps.
//!
//! Run with: `cargo test --test session_scenarios`

use slirc_session::state::{Action, ConnectionState, DisconnectReason, Session, SessionConfig};
use slirc_session::{CaseMapping, Event, SessionError};

// =============================================================================
// HELPERS
// =============================================================================

/// Lines written and events emitted by one or more session calls.
#[derive(Default)]
struct Outcome {
    sent: Vec<Vec<u8>>,
    events: Vec<Event>,
    closed: bool,
}

impl Outcome {
    fn from_actions(actions: Vec<Action>) -> Self {
        let mut outcome = Self::default();
        for action in actions {
            match action {
                Action::Send(line) => outcome.sent.push(line),
                Action::Emit(event) => outcome.events.push(event),
                Action::Close => outcome.closed = true,
            }
        }
        outcome
    }
}

fn config() -> SessionConfig {
    SessionConfig::new("irc.example.net", "alice", "alice", "Alice Example")
}

fn feed(session: &mut Session, lines: &[&[u8]]) -> Outcome {
    let mut actions = Vec::new();
    for line in lines {
        actions.extend(session.handle_line(line));
    }
    Outcome::from_actions(actions)
}

fn registered(config: SessionConfig) -> Session {
    let mut session = Session::new(config);
    session.begin_connect().unwrap();
    session.transport_connected();
    feed(
        &mut session,
        &[
            b":irc.example.net 001 alice :Welcome to ExampleNet alice!alice@host",
            b":irc.example.net 005 alice CHANTYPES=#& PREFIX=(ov)@+ NETWORK=ExampleNet :are supported",
        ],
    );
    session
}

// =============================================================================
// REGISTRATION
// =============================================================================

mod registration {
    use super::*;

    #[test]
    fn test_full_registration() {
        let mut session = Session::new(config());
        session.begin_connect().unwrap();
        assert_eq!(session.state(), ConnectionState::Connecting);

        let out = Outcome::from_actions(session.transport_connected());
        assert_eq!(
            out.sent,
            vec![
                b"NICK alice\r\n".to_vec(),
                b"USER alice 0 * :Alice Example\r\n".to_vec()
            ]
        );
        assert_eq!(session.state(), ConnectionState::Registering);

        let out = feed(&mut session, &[b":irc.example.net 001 alice :Welcome"]);
        assert_eq!(
            out.events,
            vec![Event::ConnectionSucceeded {
                nickname: b"alice".to_vec()
            }]
        );
        assert_eq!(session.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_nick_in_use_sends_alternate() {
        let mut cfg = config();
        cfg.alt_nicknames = vec!["alice_away".into()];
        let mut session = Session::new(cfg);
        session.begin_connect().unwrap();
        session.transport_connected();

        let out = feed(
            &mut session,
            &[b":irc.example.net 433 * alice :Nickname is already in use"],
        );
        assert_eq!(session.state(), ConnectionState::Registering);
        assert_eq!(out.sent, vec![b"NICK alice_away\r\n".to_vec()]);
        assert!(out.events.is_empty());

        // The server may confirm a different nick than the one configured.
        feed(&mut session, &[b":irc.example.net 001 alice_away :Welcome"]);
        assert_eq!(session.nickname(), b"alice_away");
    }

    #[test]
    fn test_nick_retries_exhausted() {
        let mut cfg = config();
        cfg.max_nick_retries = 1;
        let mut session = Session::new(cfg);
        session.begin_connect().unwrap();
        session.transport_connected();

        let out = feed(&mut session, &[b":irc.example.net 432 * alice :Erroneous nickname"]);
        assert_eq!(out.sent, vec![b"NICK alice_\r\n".to_vec()]);

        let out = feed(&mut session, &[b":irc.example.net 433 * alice_ :in use"]);
        assert!(out.closed);
        assert_eq!(
            out.events,
            vec![Event::ConnectionFailed {
                error: SessionError::NicknameUnavailable { attempts: 2 }
            }]
        );

        let out = Outcome::from_actions(session.transport_closed(DisconnectReason::ClosedByPeer));
        assert_eq!(out.events.len(), 1);
        assert!(matches!(out.events[0], Event::Disconnected { .. }));
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_password_sent_first() {
        let mut cfg = config();
        cfg.password = Some("sekrit".into());
        let mut session = Session::new(cfg);
        session.begin_connect().unwrap();
        let out = Outcome::from_actions(session.transport_connected());
        assert_eq!(out.sent[0], b"PASS sekrit\r\n");
    }

    #[test]
    fn test_operations_before_connect() {
        let mut session = Session::new(config());
        assert_eq!(session.join(b"#rust", None), Err(SessionError::NotConnected));
        assert_eq!(session.quit(None), Err(SessionError::NotConnected));
        session.set_identity("bob", "bob", "Bob").unwrap();
        assert_eq!(session.nickname(), b"bob");
    }
}

// =============================================================================
// CHANNELS
// =============================================================================

mod channels {
    use super::*;

    #[test]
    fn test_join_names_topic() {
        let mut session = registered(config());
        let out = feed(
            &mut session,
            &[
                b":alice!alice@host JOIN :#rust",
                b":irc.example.net 332 alice #rust :Rust  discussion",
                b":irc.example.net 333 alice #rust ferris!f@host 1700000000",
                b":irc.example.net 353 alice = #rust :@ferris +bob alice",
                b":irc.example.net 366 alice #rust :End of /NAMES list.",
            ],
        );

        assert_eq!(
            out.events[0],
            Event::JoinedChannel {
                channel: b"#rust".to_vec()
            }
        );
        assert!(matches!(
            &out.events[1],
            Event::TopicChanged { topic: Some(t), .. } if t == b"Rust  discussion"
        ));
        assert!(matches!(&out.events[2], Event::Numeric { code: 366, .. }));

        let chan = session.channel(b"#RUST").unwrap();
        assert_eq!(chan.topic_setter(), Some(&b"ferris"[..]));
        let mut members: Vec<_> = chan.members().map(<[u8]>::to_vec).collect();
        members.sort();
        assert_eq!(members, vec![b"alice".to_vec(), b"bob".to_vec(), b"ferris".to_vec()]);
    }

    #[test]
    fn test_kick_self_removes_channel() {
        let mut session = registered(config());
        feed(&mut session, &[b":alice!alice@host JOIN #rust"]);

        let out = feed(&mut session, &[b":ferris!f@host KICK #rust alice :bye"]);
        assert_eq!(
            out.events,
            vec![Event::MemberKicked {
                channel: b"#rust".to_vec(),
                nick: b"alice".to_vec(),
                by: b"ferris".to_vec(),
                reason: Some(b"bye".to_vec()),
                own: true,
            }]
        );
        assert!(session.channel(b"#rust").is_none());
    }

    #[test]
    fn test_member_add_is_idempotent() {
        let mut session = registered(config());
        feed(
            &mut session,
            &[
                b":alice!alice@host JOIN #rust",
                b":bob!b@host JOIN #rust",
                b":irc.example.net 353 alice = #rust :+Bob alice",
            ],
        );
        assert_eq!(session.channel(b"#rust").unwrap().member_count(), 2);
    }

    #[test]
    fn test_quit_removes_everywhere() {
        let mut session = registered(config());
        feed(
            &mut session,
            &[
                b":alice!alice@host JOIN #a",
                b":alice!alice@host JOIN #b",
                b":bob!b@host JOIN #a",
                b":bob!b@host JOIN #b",
            ],
        );
        let out = feed(&mut session, &[b":bob!b@host QUIT :Ping timeout"]);
        assert_eq!(
            out.events,
            vec![Event::UserQuit {
                nick: b"bob".to_vec(),
                origin: b"bob!b@host".to_vec(),
                reason: Some(b"Ping timeout".to_vec()),
            }]
        );
        for chan in session.channels() {
            assert_eq!(chan.member_count(), 1);
        }
    }

    #[test]
    fn test_mode_stored_verbatim() {
        let mut session = registered(config());
        feed(&mut session, &[b":alice!alice@host JOIN #rust"]);
        let out = feed(&mut session, &[b":ferris!f@host MODE #rust +ok bob secret"]);
        assert_eq!(
            out.events,
            vec![Event::ChannelModeChanged {
                channel: b"#rust".to_vec(),
                modes: b"+ok bob secret".to_vec(),
                set_by: Some(b"ferris".to_vec()),
            }]
        );
        assert_eq!(session.channel(b"#rust").unwrap().modes(), b"+ok bob secret");
    }

    #[test]
    fn test_casemapping_rekey() {
        let mut session = registered(config());
        feed(&mut session, &[b":alice!alice@host JOIN #Dev[1]", b":Bob^!b@h JOIN #dev{1}"]);
        assert_eq!(session.casemapping(), CaseMapping::Rfc1459);
        assert!(session.channel(b"#DEV{1}").unwrap().has_member(b"bob~", CaseMapping::Rfc1459));

        feed(
            &mut session,
            &[b":irc.example.net 005 alice CASEMAPPING=ascii :are supported"],
        );
        assert_eq!(session.casemapping(), CaseMapping::Ascii);
        let chan = session.channel(b"#DEV[1]").unwrap();
        assert!(chan.has_member(b"BOB^", CaseMapping::Ascii));
        assert!(!chan.has_member(b"bob~", CaseMapping::Ascii));
    }

    #[test]
    fn test_message_to_unjoined_channel_dropped() {
        let mut session = registered(config());
        let out = feed(&mut session, &[b":bob!b@h PRIVMSG #elsewhere :hi"]);
        assert!(out.events.is_empty());
    }
}

// =============================================================================
// MESSAGES AND CTCP
// =============================================================================

mod messages {
    use super::*;

    #[test]
    fn test_private_and_server_messages() {
        let mut session = registered(config());
        let out = feed(
            &mut session,
            &[
                b":bob!b@h PRIVMSG alice :hi there",
                b":bob!b@h NOTICE alice :psst",
                b":irc.example.net NOTICE alice :*** You are connected",
                b":bob!b@h PRIVMSG alice :\x01ACTION waves\x01",
            ],
        );
        assert_eq!(
            out.events,
            vec![
                Event::PrivateMessage {
                    origin: b"bob!b@h".to_vec(),
                    text: b"hi there".to_vec()
                },
                Event::PrivateNotice {
                    origin: b"bob!b@h".to_vec(),
                    text: b"psst".to_vec()
                },
                Event::ServerNotice {
                    origin: b"irc.example.net".to_vec(),
                    params: vec![b"alice".to_vec(), b"*** You are connected".to_vec()]
                },
                Event::PrivateAction {
                    origin: b"bob!b@h".to_vec(),
                    text: b"waves".to_vec()
                },
            ]
        );
    }

    #[test]
    fn test_ctcp_version_reply() {
        let mut cfg = config();
        cfg.version = "slirc test 1.0".into();
        let mut session = registered(cfg);
        let out = feed(&mut session, &[b":bob!b@h PRIVMSG alice :\x01VERSION\x01"]);
        assert_eq!(
            out.sent,
            vec![b"NOTICE bob :\x01VERSION slirc test 1.0\x01\r\n".to_vec()]
        );
        assert!(matches!(
            &out.events[0],
            Event::CtcpRequest { command, target, .. } if command == "VERSION" && target == b"alice"
        ));
    }

    #[test]
    fn test_ctcp_time_and_clientinfo() {
        let mut session = registered(config());
        let out = feed(
            &mut session,
            &[
                b":bob!b@h PRIVMSG alice :\x01TIME\x01",
                b":bob!b@h PRIVMSG alice :\x01CLIENTINFO\x01",
                b":bob!b@h PRIVMSG alice :\x01FINGER\x01",
            ],
        );
        assert_eq!(out.sent.len(), 2);
        assert!(out.sent[0].starts_with(b"NOTICE bob :\x01TIME "));
        assert_eq!(
            out.sent[1],
            b"NOTICE bob :\x01CLIENTINFO ACTION CLIENTINFO PING TIME VERSION\x01\r\n"
        );
        assert_eq!(out.events.len(), 3);
    }

    #[test]
    fn test_outbound_encoding() {
        let mut session = registered(config());
        assert_eq!(
            session.action(b"#rust", b"waves").unwrap(),
            b"PRIVMSG #rust :\x01ACTION waves\x01\r\n"
        );
        assert_eq!(
            session.ctcp_request(b"bob", b"PING 123").unwrap(),
            b"PRIVMSG bob :\x01PING 123\x01\r\n"
        );
        assert_eq!(
            session.kick(b"#rust", b"bob", Some(b"spam")).unwrap(),
            b"KICK #rust bob :spam\r\n"
        );
        assert_eq!(
            session.channel_mode(b"#rust", b"+b *!*@bad").unwrap(),
            b"MODE #rust +b *!*@bad\r\n"
        );
        assert_eq!(session.who(Some(b"#rust")).unwrap(), b"WHO #rust\r\n");
        assert_eq!(session.whois(b"bob").unwrap(), b"WHOIS bob\r\n");
        assert_eq!(session.names(None).unwrap(), b"NAMES\r\n");
        assert_eq!(session.list(Some(b"#rust")).unwrap(), b"LIST #rust\r\n");
        assert_eq!(
            session.send_raw(b"PRIVMSG #a :x\r\nQUIT").unwrap(),
            b"PRIVMSG #a :x\r\n"
        );
    }

    #[test]
    fn test_invite_and_unknown() {
        let mut session = registered(config());
        let out = feed(
            &mut session,
            &[b":bob!b@h INVITE alice :#secret", b":bob!b@h WALLOPS :hello"],
        );
        assert_eq!(
            out.events[0],
            Event::Invited {
                channel: b"#secret".to_vec(),
                origin: b"bob!b@h".to_vec()
            }
        );
        assert!(matches!(&out.events[1], Event::Unknown { message } if message.command == "WALLOPS"));
    }
}

// =============================================================================
// DISCONNECTION
// =============================================================================

mod disconnection {
    use super::*;

    #[test]
    fn test_abrupt_close_while_connected() {
        let mut session = registered(config());
        feed(&mut session, &[b":alice!alice@host JOIN #rust"]);

        let out = Outcome::from_actions(
            session.transport_closed(DisconnectReason::Transport("connection reset".into())),
        );
        assert_eq!(
            out.events,
            vec![Event::Disconnected {
                reason: DisconnectReason::Transport("connection reset".into())
            }]
        );
        assert_eq!(session.channels().count(), 0);
        assert_eq!(session.state(), ConnectionState::Disconnected);

        assert!(session
            .transport_closed(DisconnectReason::ClosedByPeer)
            .is_empty());
    }

    #[test]
    fn test_reconnect_after_disconnect() {
        let mut session = registered(config());
        session.transport_closed(DisconnectReason::ClosedByPeer);
        session.begin_connect().unwrap();
        assert_eq!(session.network(), None);
        assert_eq!(session.casemapping(), CaseMapping::Rfc1459);

        let out = Outcome::from_actions(session.transport_connected());
        assert_eq!(out.sent[0], b"NICK alice\r\n");
    }

    #[test]
    fn test_lines_ignored_when_disconnected() {
        let mut session = Session::new(config());
        assert!(session.handle_line(b"PING :x").is_empty());
    }
}
