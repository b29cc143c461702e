//! RFC 822 message parsing into headers plus a [`MimePart`] tree.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::part::MimePart;
use std::fmt;

/// Multipart nesting deeper than this is rejected.
const MAX_DEPTH: usize = 16;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from a header value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }

    /// Decodes a raw body.
    ///
    /// # Errors
    ///
    /// Returns an error if Base64 or Quoted-Printable data is malformed.
    pub fn decode(self, body: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Base64 => decode_base64(&String::from_utf8_lossy(body)),
            Self::QuotedPrintable => decode_quoted_printable(body),
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(body.to_vec()),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// A parsed message: top-level headers and the body tree.
#[derive(Debug, Clone)]
pub struct Message {
    /// Top-level headers.
    pub headers: Headers,
    /// Body structure, rooted at the top-level entity.
    pub root: MimePart,
}

impl Message {
    /// Parses a complete RFC 822 message.
    ///
    /// Text parts are converted from their declared charset. Header blocks
    /// that are not UTF-8 are read as windows-1252.
    ///
    /// # Errors
    ///
    /// Fails when the input has no header block, a multipart entity has no
    /// boundary or no parts, nesting is too deep, or a text part's transfer
    /// encoding cannot be decoded.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.trim_ascii().is_empty() {
            return Err(Error::Parse("Empty message".to_string()));
        }

        let (header_block, body) = split_headers_body(raw);
        let headers = Headers::parse(&header_text(header_block));
        if headers.is_empty() {
            return Err(Error::Parse("Message has no headers".to_string()));
        }

        let root = parse_entity(&headers, body, 0)?;
        Ok(Self { headers, root })
    }

    /// Subject with encoded words decoded.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.headers.get_decoded("subject")
    }

    /// Raw `From` value with encoded words decoded.
    #[must_use]
    pub fn from(&self) -> Option<String> {
        self.headers.get_decoded("from")
    }

    /// Raw `To` value with encoded words decoded.
    #[must_use]
    pub fn to(&self) -> Option<String> {
        self.headers.get_decoded("to")
    }

    /// Raw `Date` value.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.headers.get("date")
    }

    /// First `text/plain` part in document order.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.first_of("text/plain")
    }

    /// First `text/html` part in document order.
    #[must_use]
    pub fn html(&self) -> Option<&str> {
        self.first_of("text/html")
    }

    fn first_of(&self, mime_type: &str) -> Option<&str> {
        self.root
            .walk()
            .filter(|part| part.is(mime_type))
            .find_map(MimePart::data)
    }
}

fn parse_entity(headers: &Headers, body: &[u8], depth: usize) -> Result<MimePart> {
    if depth > MAX_DEPTH {
        return Err(Error::InvalidMultipart("Nesting too deep".to_string()));
    }

    let content_type = headers
        .get("content-type")
        .and_then(|v| ContentType::parse(v).ok())
        .unwrap_or_else(ContentType::text_plain);

    if content_type.is_multipart() {
        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
        let sections = split_multipart(body, boundary);
        if sections.is_empty() {
            return Err(Error::InvalidMultipart(format!(
                "No parts found for boundary {boundary:?}"
            )));
        }

        let children = sections
            .into_iter()
            .map(|section| {
                let (part_headers, part_body) = split_headers_body(section);
                parse_entity(&Headers::parse(&header_text(part_headers)), part_body, depth + 1)
            })
            .collect::<Result<Vec<_>>>()?;

        return Ok(MimePart::container(content_type.mime_type(), children));
    }

    if content_type.main_type == "message" && content_type.sub_type == "rfc822" {
        let (inner_headers, inner_body) = split_headers_body(body);
        let inner = parse_entity(
            &Headers::parse(&header_text(inner_headers)),
            inner_body,
            depth + 1,
        )?;
        return Ok(MimePart::container(content_type.mime_type(), vec![inner]));
    }

    // Attachments and other binary parts carry no displayable text.
    if content_type.main_type != "text" {
        return Ok(MimePart::leaf(content_type.mime_type(), None));
    }

    let encoding = headers
        .get("content-transfer-encoding")
        .map_or(TransferEncoding::SevenBit, TransferEncoding::parse);
    let decoded = encoding.decode(body)?;
    let data = decode_charset(&decoded, content_type.charset());

    Ok(MimePart::leaf(content_type.mime_type(), Some(data)))
}

/// Header blocks should be ASCII. Raw 8-bit bytes are usually windows-1252.
fn header_text(block: &[u8]) -> String {
    std::str::from_utf8(block).map_or_else(
        |_| decode_charset(block, Some("windows-1252")),
        str::to_string,
    )
}

/// Splits an entity at the first blank line.
fn split_headers_body(entity: &[u8]) -> (&[u8], &[u8]) {
    if let Some(idx) = find(entity, b"\r\n\r\n") {
        (&entity[..idx], &entity[idx + 4..])
    } else if let Some(idx) = find(entity, b"\n\n") {
        (&entity[..idx], &entity[idx + 2..])
    } else {
        (entity, &entity[entity.len()..])
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits a multipart body on its delimiter lines.
///
/// The preamble before the first delimiter and the epilogue after the close
/// delimiter are dropped. The line break that precedes a delimiter belongs to
/// the delimiter, not to the part.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let open = format!("--{boundary}");
    let close = format!("--{boundary}--");
    let (open, close) = (open.as_bytes(), close.as_bytes());

    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut offset = 0;

    for line in body.split_inclusive(|&b| b == b'\n') {
        let trimmed = line.trim_ascii_end();
        let is_close = trimmed == close;
        if is_close || trimmed == open {
            if let Some(begin) = start {
                let section = strip_trailing_newline(&body[begin..offset]);
                parts.push(section);
            }
            if is_close {
                return parts;
            }
            start = Some(offset + line.len());
        }
        offset += line.len();
    }

    // Missing close delimiter: keep what was opened.
    if let Some(begin) = start.filter(|&b| b < body.len()) {
        parts.push(&body[begin..]);
    }
    parts
}

fn strip_trailing_newline(s: &[u8]) -> &[u8] {
    s.strip_suffix(b"\r\n")
        .or_else(|| s.strip_suffix(b"\n"))
        .unwrap_or(s)
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
    use super::*;
    use crate::select::{BodyKind, select_body};

    const ALTERNATIVE: &str = concat!(
        "From: \"Alice Example\" <alice@example.com>\r\n",
        "To: bob@example.com\r\n",
        "Subject: =?utf-8?Q?Caf=C3=A9?= plans\r\n",
        "Date: Tue, 2 Jan 2024 10:00:00 +0000\r\n",
        "Content-Type: multipart/alternative; boundary=\"b1\"\r\n",
        "\r\n",
        "This is a preamble.\r\n",
        "--b1\r\n",
        "Content-Type: text/html; charset=utf-8\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "<p>Caf=C3=A9 at <b>noon</b></p>\r\n",
        "--b1\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "Q2Fmw6kgYXQgbm9vbg==\r\n",
        "--b1--\r\n",
        "epilogue\r\n",
    );

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse(" BASE64 "), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("x-unknown"), TransferEncoding::SevenBit);
    }

    #[test]
    fn test_single_part_message() {
        let raw = b"From: a@b.com\r\nSubject: Hi\r\n\r\nHello, World!\r\n";
        let message = Message::parse(raw).unwrap();

        assert_eq!(message.subject().as_deref(), Some("Hi"));
        assert_eq!(message.from().as_deref(), Some("a@b.com"));
        assert_eq!(message.root.mime_type, "text/plain");
        assert_eq!(message.text(), Some("Hello, World!\r\n"));
        assert!(message.html().is_none());
    }

    #[test]
    fn test_multipart_alternative_tree() {
        let message = Message::parse(ALTERNATIVE.as_bytes()).unwrap();

        assert_eq!(message.subject().as_deref(), Some("Café plans"));
        assert_eq!(message.root.mime_type, "multipart/alternative");
        assert_eq!(message.root.children.len(), 2);
        assert_eq!(message.html(), Some("<p>Café at <b>noon</b></p>"));
        assert_eq!(message.text(), Some("Café at noon"));

        let body = select_body(&message.root).unwrap();
        assert_eq!(body.kind, BodyKind::Plain);
        assert_eq!(body.content, "Café at noon");
    }

    #[test]
    fn test_nested_multipart_with_attachment() {
        let raw = concat!(
            "From: a@b.com\n",
            "Content-Type: multipart/mixed; boundary=outer\n",
            "\n",
            "--outer\n",
            "Content-Type: multipart/alternative; boundary=inner\n",
            "\n",
            "--inner\n",
            "Content-Type: text/html\n",
            "\n",
            "<i>only html</i>\n",
            "--inner--\n",
            "--outer\n",
            "Content-Type: application/pdf\n",
            "Content-Transfer-Encoding: base64\n",
            "\n",
            "JVBERi0=\n",
            "--outer--\n",
        );
        let message = Message::parse(raw.as_bytes()).unwrap();

        let types: Vec<&str> = message.root.walk().map(|p| p.mime_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "multipart/mixed",
                "multipart/alternative",
                "text/html",
                "application/pdf"
            ]
        );
        assert!(message.text().is_none());
        assert_eq!(message.html(), Some("<i>only html</i>"));
    }

    #[test]
    fn test_missing_boundary_is_an_error() {
        let raw = b"From: a@b.com\r\nContent-Type: multipart/mixed\r\n\r\nbody";
        assert!(matches!(
            Message::parse(raw),
            Err(Error::MissingBoundary)
        ));
    }

    #[test]
    fn test_boundary_never_present_is_an_error() {
        let raw = b"From: a@b.com\r\nContent-Type: multipart/mixed; boundary=zz\r\n\r\nno parts here";
        assert!(matches!(
            Message::parse(raw),
            Err(Error::InvalidMultipart(_))
        ));
    }

    #[test]
    fn test_bad_base64_text_is_an_error() {
        let raw = b"From: a@b.com\r\nContent-Transfer-Encoding: base64\r\n\r\n!!!not base64!!!";
        assert!(matches!(Message::parse(raw), Err(Error::Base64Decode(_))));
    }

    #[test]
    fn test_empty_and_headerless_input() {
        assert!(Message::parse(b"").is_err());
        assert!(Message::parse(b"   \r\n").is_err());
        assert!(Message::parse(b"just some text without headers").is_err());
    }

    #[test]
    fn test_unterminated_multipart_keeps_last_part() {
        let raw = "Content-Type: multipart/mixed; boundary=x\n\n--x\nContent-Type: text/plain\n\nhello";
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.text(), Some("hello"));
    }

    #[test]
    fn test_latin1_subject_and_quoted_printable_body() {
        let raw = concat!(
            "From: a@b.com\r\n",
            "Subject: =?ISO-8859-1?Q?caf=E9?=\r\n",
            "Content-Type: text/plain; charset=iso-8859-1\r\n",
            "Content-Transfer-Encoding: quoted-printable\r\n",
            "\r\n",
            "caf=E9 cr=E8me",
        );
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.subject().as_deref(), Some("café"));
        assert_eq!(message.text(), Some("café crème"));
    }

    #[test]
    fn test_8bit_windows_1252_parts() {
        let mut raw = b"From: a@b.com\r\nContent-Type: multipart/alternative; boundary=b\r\n\r\n\
--b\r\nContent-Type: text/plain; charset=windows-1252\r\nContent-Transfer-Encoding: 8bit\r\n\r\n"
            .to_vec();
        raw.extend_from_slice(b"\x93na\xefve\x94 \x80 5\r\n--b--\r\n");
        let message = Message::parse(&raw).unwrap();
        assert_eq!(message.text(), Some("\u{201c}na\u{ef}ve\u{201d} \u{20ac} 5"));
    }

    #[test]
    fn test_raw_8bit_header_reads_as_windows_1252() {
        let raw = b"From: a@b.com\r\nSubject: Gr\xfc\xdfe\r\n\r\nbody";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.subject().as_deref(), Some("Grüße"));
    }

    #[test]
    fn test_embedded_rfc822() {
        let raw = concat!(
            "From: a@b.com\n",
            "Content-Type: message/rfc822\n",
            "\n",
            "From: inner@b.com\n",
            "Subject: inner\n",
            "\n",
            "forwarded text",
        );
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.root.mime_type, "message/rfc822");
        assert_eq!(message.text(), Some("forwarded text"));
    }
}
