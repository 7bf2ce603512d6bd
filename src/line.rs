//! Line-based codec for tokio.
//!
//! Frames are raw bytes with the line ending removed. No text decoding
//! happens here; the session works on bytes and decodes only for display.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::ProtocolError;
use crate::message::trim_line_ending;

/// Longest inbound line accepted by default: 8191 bytes of tags plus a
/// 512-byte message.
pub const MAX_INBOUND_LINE_LEN: usize = 8191 + 512;

/// Codec that splits a byte stream on `\n`.
///
/// Lines longer than the limit are dropped with a warning, up to and
/// including their terminating newline; the stream stays usable.
#[derive(Debug)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    max_len: usize,
    /// Set while skipping the rest of an over-long line.
    discarding: bool,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::with_max_len(MAX_INBOUND_LINE_LEN)
    }

    /// Create a codec with a custom line limit (including the line ending).
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }

    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = Vec<u8>;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Vec<u8>>, ProtocolError> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                if self.discarding {
                    src.clear();
                    self.next_index = 0;
                } else if src.len() > self.max_len {
                    warn!(len = src.len(), limit = self.max_len, "discarding over-long line");
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                } else {
                    self.next_index = src.len();
                }
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if line.len() > self.max_len {
                warn!(len = line.len(), limit = self.max_len, "discarding over-long line");
                continue;
            }

            let line = trim_line_ending(&line);
            if !line.is_empty() {
                return Ok(Some(line.to_vec()));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Vec<u8>>, ProtocolError> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        // An unterminated final line is still a line.
        let rest = src.split();
        self.next_index = 0;
        if std::mem::take(&mut self.discarding) {
            return Ok(None);
        }
        let line = trim_line_ending(&rest);
        Ok((!line.is_empty()).then(|| line.to_vec()))
    }
}

impl Encoder<Vec<u8>> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: Vec<u8>, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        dst.extend_from_slice(&line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_splits_lines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PING :a\r\nPING :b\nPART"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(b"PING :a".to_vec()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(b"PING :b".to_vec()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b" #rust\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(b"PART #rust".to_vec()));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"\r\n\r\nQUIT\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(b"QUIT".to_vec()));
    }

    #[test]
    fn test_over_long_line_discarded() {
        let mut codec = LineCodec::with_max_len(16);
        let mut buf = BytesMut::from(&b"PRIVMSG #a :0123456789abcdef"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());

        buf.extend_from_slice(b"tail of the long line\r\nPING :ok\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(b"PING :ok".to_vec()));
    }

    #[test]
    fn test_over_long_complete_line_discarded() {
        let mut codec = LineCodec::with_max_len(8);
        let mut buf = BytesMut::from(&b"NOTICE x :long\r\nPING\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(b"PING".to_vec()));
    }

    #[test]
    fn test_non_utf8_passes_through() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PRIVMSG #a :caf\xe9\r\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(b"PRIVMSG #a :caf\xe9".to_vec())
        );
    }

    #[test]
    fn test_decode_eof_unterminated() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"ERROR :Closing Link"[..]);
        assert_eq!(
            codec.decode_eof(&mut buf).unwrap(),
            Some(b"ERROR :Closing Link".to_vec())
        );
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_encode_passes_bytes() {
        let mut codec = LineCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(b"NICK me\r\n".to_vec(), &mut dst).unwrap();
        assert_eq!(&dst[..], b"NICK me\r\n");
    }
}
