//! Nom-based IRC message parser.
//!
//! This module provides zero-copy parsing of IRC lines using the nom
//! parser combinator library. The input is treated as raw bytes: no text
//! encoding is assumed anywhere in the grammar.

use nom::{
    bytes::complete::{take_till, take_till1, take_while},
    character::complete::char,
    combinator::opt,
    error::{context, VerboseError},
    sequence::preceded,
    IResult,
};

use crate::error::MessageParseError;

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// Parse IRCv3 message tags (the part after `@` and before the first space).
fn parse_tags(input: &[u8]) -> ParseResult<&[u8], &[u8]> {
    context(
        "parsing IRCv3 message tags",
        preceded(char('@'), take_till(|b: u8| b == b' ')),
    )(input)
}

/// Parse message origin (the part after `:` and before the first space).
fn parse_prefix(input: &[u8]) -> ParseResult<&[u8], &[u8]> {
    context(
        "parsing message prefix",
        preceded(char(':'), take_till(|b: u8| b == b' ')),
    )(input)
}

/// Parse the command token (everything up to the next space).
fn parse_command(input: &[u8]) -> ParseResult<&[u8], &[u8]> {
    context("parsing IRC command", take_till1(|b: u8| b == b' '))(input)
}

fn middle_param(input: &[u8]) -> ParseResult<&[u8], &[u8]> {
    take_till1(|b: u8| b == b' ')(input)
}

fn spaces(input: &[u8]) -> ParseResult<&[u8], &[u8]> {
    take_while(|b: u8| b == b' ')(input)
}

/// A command is a run of ASCII letters or exactly three ASCII digits.
fn is_valid_command(cmd: &[u8]) -> bool {
    (cmd.len() == 3 && cmd.iter().all(u8::is_ascii_digit))
        || cmd.iter().all(u8::is_ascii_alphabetic)
}

/// Strip any trailing CR and LF bytes.
pub(crate) fn trim_line_ending(input: &[u8]) -> &[u8] {
    let end = input
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |i| i + 1);
    &input[..end]
}

/// Parse the parameter list following the command.
///
/// Runs of spaces separate parameters. A parameter starting with `:`
/// swallows the remainder of the line verbatim.
fn parse_params(mut input: &[u8]) -> ParseResult<&[u8], Vec<&[u8]>> {
    let mut params = Vec::new();
    loop {
        let (rest, _) = spaces(input)?;
        if rest.is_empty() {
            return Ok((rest, params));
        }
        if rest[0] == b':' {
            params.push(&rest[1..]);
            return Ok((&rest[rest.len()..], params));
        }
        let (rest, param) = middle_param(rest)?;
        params.push(param);
        input = rest;
    }
}

/// A parsed IRC message with borrowed byte slices.
///
/// This is the intermediate representation produced by the nom parser.
/// It holds references into the original input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage<'a> {
    /// Raw tags (without the leading `@`), if present.
    pub tags: Option<&'a [u8]>,
    /// Raw origin (without the leading `:`), if present.
    pub prefix: Option<&'a [u8]>,
    /// The command token, validated as ASCII.
    pub command: &'a str,
    /// Command parameters, including trailing.
    pub params: Vec<&'a [u8]>,
}

impl<'a> ParsedMessage<'a> {
    /// Parse one IRC line.
    ///
    /// IRC message format:
    /// ```text
    /// [@tags] [:prefix] <command> [params...] [:trailing]
    /// ```
    pub fn parse(input: &'a [u8]) -> Result<Self, MessageParseError> {
        let line = trim_line_ending(input);
        if line.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let (rest, tags) = opt(parse_tags)(line).map_err(|_| MessageParseError::InvalidCommand)?;
        let (rest, _) = spaces(rest).map_err(|_| MessageParseError::InvalidCommand)?;
        let (rest, prefix) =
            opt(parse_prefix)(rest).map_err(|_| MessageParseError::InvalidCommand)?;
        let (rest, _) = spaces(rest).map_err(|_| MessageParseError::InvalidCommand)?;

        let (rest, command) = match parse_command(rest) {
            Ok(parsed) => parsed,
            Err(_) if tags.is_some() || prefix.is_some() => {
                return Err(MessageParseError::MissingCommand)
            }
            Err(_) => return Err(MessageParseError::EmptyMessage),
        };
        if !is_valid_command(command) {
            return Err(MessageParseError::InvalidCommand);
        }
        let command =
            std::str::from_utf8(command).map_err(|_| MessageParseError::InvalidCommand)?;

        let (_, params) = parse_params(rest).map_err(|_| MessageParseError::InvalidCommand)?;

        Ok(ParsedMessage {
            tags,
            prefix,
            command,
            params,
        })
    }
}
