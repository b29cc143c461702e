//! Framed I/O for the IMAP wire format.
//!
//! A response is one CRLF-terminated line, extended by every `{n}` literal
//! the line announces. The framer hands complete responses to the parser so
//! the parser never has to suspend.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Error, Result};

const READ_BUFFER_SIZE: usize = 8192;

/// Longest line accepted before a literal or CRLF.
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Largest literal accepted, which bounds the size of one fetched message.
const MAX_LITERAL_SIZE: usize = 64 * 1024 * 1024;

/// Buffered reader/writer over an IMAP connection.
pub struct FramedStream<S> {
    stream: S,
    buffer: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
        }
    }

    /// Reads one complete response, literals included.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut response = Vec::new();

        loop {
            let line = self.read_line().await?;
            response.extend_from_slice(&line);

            let Some(len) = parse_literal_length(&line) else {
                return Ok(response);
            };
            if len > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal too large: {len} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }
            self.fill_to(len).await?;
            response.extend_from_slice(&self.buffer[..len]);
            self.buffer.advance(len);
        }
    }

    /// Reads responses until the tagged completion for `tag`, which is the
    /// last element of the returned list.
    pub async fn read_until_tagged(&mut self, tag: &str) -> Result<Vec<Vec<u8>>> {
        let mut responses = Vec::new();
        loop {
            let response = self.read_response().await?;
            let done = is_tagged_with(&response, tag);
            responses.push(response);
            if done {
                return Ok(responses);
            }
        }
    }

    /// Writes a serialized command and flushes it.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Shuts down the write half. Errors are ignored since the peer may
    /// already be gone.
    pub async fn shutdown(&mut self) {
        let _ = self.stream.shutdown().await;
    }

    async fn read_line(&mut self) -> Result<BytesMut> {
        let mut scanned: usize = 0;
        loop {
            if let Some(pos) = find_crlf(&self.buffer[scanned.saturating_sub(1)..]) {
                let end = scanned.saturating_sub(1) + pos + 2;
                return Ok(self.buffer.split_to(end));
            }
            scanned = self.buffer.len();
            if scanned > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
            self.read_more().await?;
        }
    }

    async fn fill_to(&mut self, len: usize) -> Result<()> {
        while self.buffer.len() < len {
            self.buffer.reserve(len - self.buffer.len());
            self.read_more().await?;
        }
        Ok(())
    }

    async fn read_more(&mut self) -> Result<()> {
        if self.stream.read_buf(&mut self.buffer).await? == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed",
            )));
        }
        Ok(())
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn is_tagged_with(response: &[u8], tag: &str) -> bool {
    response
        .strip_prefix(tag.as_bytes())
        .is_some_and(|rest| rest.first() == Some(&b' '))
}

/// Parses a trailing `{n}` or `{n+}` literal announcement.
fn parse_literal_length(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\r\n")?.strip_suffix(b"}")?;
    let line = line.strip_suffix(b"+").unwrap_or(line);
    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;

    #[test]
    fn test_parse_literal_length() {
        assert_eq!(parse_literal_length(b"BODY[] {342}\r\n"), Some(342));
        assert_eq!(parse_literal_length(b"BODY[] {7+}\r\n"), Some(7));
        assert_eq!(parse_literal_length(b"{0}\r\n"), Some(0));
        assert_eq!(parse_literal_length(b"* OK done\r\n"), None);
        assert_eq!(parse_literal_length(b"{12}"), None);
        assert_eq!(parse_literal_length(b"x {} \r\n"), None);
        assert_eq!(parse_literal_length(b"x {1a}\r\n"), None);
    }

    #[test]
    fn test_is_tagged_with() {
        assert!(is_tagged_with(b"A0003 OK done\r\n", "A0003"));
        assert!(!is_tagged_with(b"A00031 OK done\r\n", "A0003"));
        assert!(!is_tagged_with(b"* OK A0003\r\n", "A0003"));
    }

    #[tokio::test]
    async fn test_read_line_split_across_reads() {
        let mock = Builder::new().read(b"* OK rea").read(b"dy\r").read(b"\n").build();
        let mut framed = FramedStream::new(mock);
        assert_eq!(framed.read_response().await.unwrap(), b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn test_two_responses_in_one_read() {
        let mock = Builder::new().read(b"* 4 EXISTS\r\nA0002 OK done\r\n").build();
        let mut framed = FramedStream::new(mock);
        let responses = framed.read_until_tagged("A0002").await.unwrap();
        assert_eq!(
            responses,
            vec![b"* 4 EXISTS\r\n".to_vec(), b"A0002 OK done\r\n".to_vec()]
        );
    }

    #[tokio::test]
    async fn test_literal_is_read_verbatim() {
        // The literal itself contains CRLF and a brace that must not be
        // mistaken for framing.
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY[] {9}\r\n")
            .read(b"a\r\n{3}\r\nb")
            .read(b")\r\n")
            .build();
        let mut framed = FramedStream::new(mock);
        let response = framed.read_response().await.unwrap();
        assert_eq!(response, b"* 1 FETCH (BODY[] {9}\r\na\r\n{3}\r\nb)\r\n");
    }

    #[tokio::test]
    async fn test_oversized_literal_is_rejected() {
        let header = format!("* 1 FETCH (BODY[] {{{}}}\r\n", MAX_LITERAL_SIZE + 1);
        let mock = Builder::new().read(header.as_bytes()).build();
        let mut framed = FramedStream::new(mock);
        let err = framed.read_response().await.unwrap_err();
        assert!(err.to_string().contains("literal too large"));
    }

    #[tokio::test]
    async fn test_eof_mid_line() {
        let mock = Builder::new().read(b"* OK no end").build();
        let mut framed = FramedStream::new(mock);
        let err = framed.read_response().await.unwrap_err();
        assert!(matches!(err, Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[tokio::test]
    async fn test_write_command() {
        let mock = Builder::new().write(b"A0001 LOGOUT\r\n").build();
        let mut framed = FramedStream::new(mock);
        framed.write_command(b"A0001 LOGOUT\r\n").await.unwrap();
    }
}
