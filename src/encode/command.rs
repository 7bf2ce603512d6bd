//! Command encoding implementation.

use crate::command::Command;
use crate::error::EncodeError;

use super::{encode_line, encode_line_freeform, encode_raw, IrcEncode};

impl IrcEncode for Command {
    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let name = self.name();
        match self {
            Command::PASS(p) => encode_line(name, &[], Some(p)),
            Command::NICK(n) => encode_line(name, &[], Some(n)),
            Command::USER(u, m, r) => encode_line_freeform(name, &[u, m, b"*"], r),
            Command::UserMODE(n, Some(m)) => encode_line(name, &[n], Some(m)),
            Command::UserMODE(n, None) => encode_line(name, &[n], None),
            Command::QUIT(Some(m)) => encode_line_freeform(name, &[], m),
            Command::QUIT(None) => encode_line(name, &[], None),

            Command::JOIN(c, Some(k)) => encode_line(name, &[c], Some(k)),
            Command::JOIN(c, None) => encode_line(name, &[c], None),
            Command::PART(c, Some(m)) => encode_line_freeform(name, &[c], m),
            Command::PART(c, None) => encode_line(name, &[c], None),
            Command::ChannelMODE(c, args) => match args.split_last() {
                Some((last, rest)) => {
                    let mut middle: Vec<&[u8]> = Vec::with_capacity(args.len());
                    middle.push(c);
                    middle.extend(rest.iter().map(Vec::as_slice));
                    encode_line(name, &middle, Some(last))
                }
                None => encode_line(name, &[c], None),
            },
            Command::TOPIC(c, Some(t)) => encode_line_freeform(name, &[c], t),
            Command::TOPIC(c, None) => encode_line(name, &[c], None),
            Command::NAMES(Some(c)) => encode_line(name, &[c], None),
            Command::NAMES(None) => encode_line(name, &[], None),
            Command::LIST(Some(c)) => encode_line(name, &[c], None),
            Command::LIST(None) => encode_line(name, &[], None),
            Command::INVITE(n, c) => encode_line(name, &[n], Some(c)),
            Command::KICK(c, n, Some(r)) => encode_line_freeform(name, &[c, n], r),
            Command::KICK(c, n, None) => encode_line(name, &[c], Some(n)),

            Command::PRIVMSG(t, m) => encode_line_freeform(name, &[t], m),
            Command::NOTICE(t, m) => encode_line_freeform(name, &[t], m),

            Command::WHO(Some(m)) => encode_line(name, &[m], None),
            Command::WHO(None) => encode_line(name, &[], None),
            Command::WHOIS(n) => encode_line(name, &[n], None),

            Command::PONG(params) => match params.split_last() {
                Some((last, rest)) => {
                    let middle: Vec<&[u8]> = rest.iter().map(Vec::as_slice).collect();
                    encode_line(name, &middle, Some(last))
                }
                None => encode_line(name, &[], None),
            },

            Command::Raw(line) => Ok(encode_raw(line)),
        }
    }
}
