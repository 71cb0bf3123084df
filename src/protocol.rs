//! Line protocol spoken over the serial link.
//!
//! Host to device, one command per `\n`-terminated line:
//! - `GET_VERSION`
//! - `GET_PATTERN`
//! - a pattern JSON object (see [`PatternMessage`](crate::PatternMessage))
//!
//! Device replies are single lines. Only the `GET_VERSION` and
//! `GET_PATTERN` replies are meant to be machine-read; the rest are
//! informational acknowledgments.

use crate::config::FIRMWARE_VERSION;
use core::fmt::Write as _;
use embedded_io::Write;
use heapless::{String, Vec};
use serde::Serialize;

/// Outcome of feeding one byte to a [`LineBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Feed {
    /// Line not finished yet.
    Pending,
    /// A full line is available via [`LineBuffer::line`].
    Line,
    /// The line that just ended did not fit and was dropped.
    Overflow,
}

/// Accumulates serial bytes into newline-terminated lines.
///
/// A line longer than `N` is discarded up to its terminating newline.
pub struct LineBuffer<const N: usize> {
    buf: Vec<u8, N>,
    overflowed: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflowed: false,
        }
    }

    /// Appends one byte. After `Feed::Line`, read the line and call
    /// [`clear`](Self::clear) before feeding more.
    pub fn feed(&mut self, byte: u8) -> Feed {
        if byte == b'\n' {
            if self.overflowed {
                self.overflowed = false;
                self.buf.clear();
                return Feed::Overflow;
            }
            return Feed::Line;
        }

        if !self.overflowed && self.buf.push(byte).is_err() {
            self.overflowed = true;
            self.buf.clear();
        }
        Feed::Pending
    }

    /// Bytes of the current line, without the newline.
    pub fn line(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// A classified inbound line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Nothing but whitespace.
    Empty,
    GetVersion,
    GetPattern,
    /// Anything else: a candidate pattern payload (trimmed).
    Pattern(&'a [u8]),
}

impl<'a> Command<'a> {
    /// Trims surrounding whitespace (including `\r`) and classifies.
    pub fn classify(line: &'a [u8]) -> Self {
        match line.trim_ascii() {
            b"" => Command::Empty,
            b"GET_VERSION" => Command::GetVersion,
            b"GET_PATTERN" => Command::GetPattern,
            payload => Command::Pattern(payload),
        }
    }
}

/// Protocol-level errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// An inbound line exceeded the line buffer.
    LineOverflow,
}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProtocolError::LineOverflow => write!(f, "line exceeds receive buffer"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

#[derive(Serialize)]
struct VersionReply<'a> {
    version: &'a str,
}

/// A line sent back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    /// `{"version":"x.y.z"}`
    Version,
    /// The stored pattern JSON, verbatim.
    Pattern(&'a [u8]),
    NoPattern,
    PatternReceived,
    PatternSaved,
    TooLarge { len: usize, max: usize },
    StorageFailed,
    ParseError,
    LineTooLong,
}

impl Reply<'_> {
    /// Writes the reply followed by `\n`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), W::Error> {
        match self {
            Reply::Version => {
                let mut buf = [0u8; 64];
                let reply = VersionReply {
                    version: FIRMWARE_VERSION,
                };
                match serde_json_core::to_slice(&reply, &mut buf) {
                    Ok(n) => out.write_all(&buf[..n])?,
                    Err(_) => out.write_all(b"{}")?,
                }
            }
            Reply::Pattern(json) => out.write_all(json)?,
            Reply::NoPattern => out.write_all(b"No pattern stored")?,
            Reply::PatternReceived => out.write_all(b"Pattern received")?,
            Reply::PatternSaved => out.write_all(b"Pattern saved to storage")?,
            Reply::TooLarge { len, max } => {
                let mut msg: String<80> = String::new();
                let _ = write!(msg, "Pattern too large to save ({} > {} bytes)", len, max);
                out.write_all(msg.as_bytes())?;
            }
            Reply::StorageFailed => out.write_all(b"Storage write failed")?,
            Reply::ParseError => out.write_all(b"JSON parse error")?,
            Reply::LineTooLong => out.write_all(b"Line too long, discarded")?,
        }
        out.write_all(b"\n")?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use std::vec::Vec as StdVec;

    fn feed_str<const N: usize>(buf: &mut LineBuffer<N>, s: &[u8]) -> Feed {
        let mut last = Feed::Pending;
        for &b in s {
            last = buf.feed(b);
        }
        last
    }

    #[test]
    fn completes_line_on_newline() {
        let mut buf = LineBuffer::<32>::new();
        assert_eq!(feed_str(&mut buf, b"GET_VERSION"), Feed::Pending);
        assert_eq!(buf.feed(b'\n'), Feed::Line);
        assert_eq!(buf.line(), b"GET_VERSION");
        buf.clear();
        assert_eq!(buf.line(), b"");
    }

    #[test]
    fn overlong_line_is_dropped_until_newline() {
        let mut buf = LineBuffer::<4>::new();
        assert_eq!(feed_str(&mut buf, b"abcdefgh\n"), Feed::Overflow);
        assert_eq!(feed_str(&mut buf, b"ok\n"), Feed::Line);
        assert_eq!(buf.line(), b"ok");
    }

    #[test]
    fn classify_trims_whitespace_and_cr() {
        assert_eq!(Command::classify(b"  GET_VERSION\r"), Command::GetVersion);
        assert_eq!(Command::classify(b"GET_PATTERN"), Command::GetPattern);
        assert_eq!(Command::classify(b" \t\r"), Command::Empty);
        assert_eq!(Command::classify(b" {\"a\":1} "), Command::Pattern(b"{\"a\":1}"));
        assert_eq!(Command::classify(b"get_version"), Command::Pattern(b"get_version"));
    }

    struct Sink(StdVec<u8>);

    impl embedded_io::ErrorType for Sink {
        type Error = core::convert::Infallible;
    }

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn render(reply: Reply<'_>) -> StdVec<u8> {
        let mut sink = Sink(StdVec::new());
        reply.write_to(&mut sink).unwrap();
        sink.0
    }

    #[test]
    fn version_reply_is_json() {
        let out = render(Reply::Version);
        let expected = std::format!("{{\"version\":\"{}\"}}\n", FIRMWARE_VERSION);
        assert_eq!(out, expected.as_bytes());
    }

    #[test]
    fn pattern_reply_is_verbatim() {
        assert_eq!(render(Reply::Pattern(b"{\"count\":0}")), b"{\"count\":0}\n");
    }

    #[test]
    fn too_large_reply_names_sizes() {
        let out = render(Reply::TooLarge { len: 3000, max: 2044 });
        assert_eq!(out, b"Pattern too large to save (3000 > 2044 bytes)\n");
    }
}
