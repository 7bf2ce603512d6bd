//! Fuzz target for session dispatch
//!
//! Splits the input into lines and feeds them to a registered session.
//! Every outbound line the session produces must fit the protocol limit.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_session::state::{Action, Session, SessionConfig};
use slirc_session::MAX_LINE_LEN;

fuzz_target!(|data: &[u8]| {
    let mut session = Session::new(SessionConfig::new("irc.fuzz", "me", "me", "Me"));
    if session.begin_connect().is_err() {
        return;
    }
    session.transport_connected();
    session.handle_line(b":irc.fuzz 001 me :Welcome");

    for line in data.split(|&b| b == b'\n') {
        for action in session.handle_line(line) {
            if let Action::Send(out) = action {
                assert!(out.len() <= MAX_LINE_LEN);
                assert!(out.ends_with(b"\r\n"));
            }
        }
    }
});
