//! RPL_ISUPPORT (`005`) token parsing.
//!
//! The session only acts on `CASEMAPPING`, `CHANTYPES`, `PREFIX` and
//! `NETWORK`; every other token is kept and reachable through [`Isupport::get`].

/// Channel name prefixes assumed until the server says otherwise.
pub const DEFAULT_CHANTYPES: &[u8] = b"#&+!";

/// Membership prefixes assumed until the server says otherwise.
pub const DEFAULT_MEMBER_PREFIXES: &[u8] = b"@+";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IsupportEntry<'a> {
    pub key: &'a [u8],
    pub value: Option<&'a [u8]>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Isupport<'a> {
    entries: Vec<IsupportEntry<'a>>,
}

impl<'a> Isupport<'a> {
    pub fn parse_params(params: &[&'a [u8]]) -> Self {
        let mut entries = Vec::with_capacity(params.len());
        for &p in params {
            if p.is_empty() {
                continue;
            }
            let (k, v) = match p.iter().position(|&b| b == b'=') {
                Some(eq) => (&p[..eq], Some(&p[eq + 1..])),
                None => (p, None),
            };
            entries.push(IsupportEntry { key: k, value: v });
        }
        Isupport { entries }
    }

    /// Parse the parameters of a `005` reply.
    ///
    /// The first parameter (our nickname) is skipped, and so is a final
    /// human-readable parameter containing a space.
    pub fn from_response_args(args: &[&'a [u8]]) -> Option<Self> {
        if args.is_empty() {
            return None;
        }

        let mut tokens = &args[1..];
        if let Some(last) = tokens.last() {
            if last.contains(&b' ') {
                tokens = &tokens[..tokens.len() - 1];
            }
        }
        Some(Self::parse_params(tokens))
    }

    pub fn from_message_ref(msg: &crate::MessageRef<'a>) -> Option<Self> {
        if msg.numeric() == Some(crate::response::Response::RPL_ISUPPORT.code()) {
            Self::from_response_args(&msg.params)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &IsupportEntry<'a>> {
        self.entries.iter()
    }

    pub fn get(&self, key: &str) -> Option<Option<&'a [u8]>> {
        self.entries
            .iter()
            .rfind(|e| e.key.eq_ignore_ascii_case(key.as_bytes()))
            .map(|e| e.value)
    }

    pub fn casemapping(&self) -> Option<&'a [u8]> {
        self.get("CASEMAPPING").flatten()
    }

    pub fn chantypes(&self) -> Option<&'a [u8]> {
        self.get("CHANTYPES").flatten()
    }

    pub fn network(&self) -> Option<&'a [u8]> {
        self.get("NETWORK").flatten()
    }

    pub fn prefix(&self) -> Option<PrefixSpec<'a>> {
        self.get("PREFIX").flatten().and_then(PrefixSpec::parse)
    }
}

/// The `PREFIX=(modes)prefixes` token.
///
/// Each mode letter pairs with the prefix at the same position, so a token
/// whose lists differ in length is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrefixSpec<'a> {
    pub modes: &'a [u8],
    pub prefixes: &'a [u8],
}

impl<'a> PrefixSpec<'a> {
    pub fn parse(s: &'a [u8]) -> Option<Self> {
        if let Some(open) = s.iter().position(|&b| b == b'(') {
            let after = &s[open + 1..];
            let close = after.iter().position(|&b| b == b')')?;
            let modes = &after[..close];
            let prefixes = &after[close + 1..];
            if !modes.is_empty() && modes.len() == prefixes.len() {
                return Some(PrefixSpec { modes, prefixes });
            }
        } else if !s.is_empty() {
            return Some(PrefixSpec {
                modes: b"",
                prefixes: s,
            });
        }
        None
    }
}
