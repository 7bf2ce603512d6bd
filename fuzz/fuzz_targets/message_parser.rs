//! Fuzz target for IRC line parsing
//!
//! Feeds arbitrary bytes to the parser and checks that a successful parse
//! survives conversion to an owned message and back.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_session::{ctcp::Ctcp, MessageRef};

fuzz_target!(|data: &[u8]| {
    let Ok(msg) = MessageRef::parse(data) else {
        return;
    };

    let owned = msg.to_owned();
    assert_eq!(owned.borrow(), msg);

    let _ = msg.source();
    if let Some(text) = msg.param(1) {
        let _ = Ctcp::parse(text);
    }
});
