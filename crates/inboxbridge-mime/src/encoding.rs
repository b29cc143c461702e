//! Transfer and header decoding.
//!
//! Supports Base64 (standard and URL-safe alphabets), Quoted-Printable,
//! RFC 2047 encoded words and charset conversion to UTF-8.

use crate::error::{Error, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use encoding_rs::{Encoding, UTF_8};

/// URL-safe engine that accepts input with or without `=` padding.
///
/// REST payloads are inconsistent about padding, so neither form is rejected.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes standard Base64 data, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes URL-safe Base64 (`-` and `_` alphabet) as used by REST mail APIs.
///
/// # Errors
///
/// Returns an error if the input is not valid URL-safe Base64.
pub fn decode_base64url(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    URL_SAFE_LENIENT.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable bytes (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains an invalid escape sequence.
pub fn decode_quoted_printable(input: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break
        match input.get(i + 1..) {
            Some([b'\r', b'\n', ..]) => {
                i += 3;
                continue;
            }
            Some([b'\n', ..]) => {
                i += 2;
                continue;
            }
            _ => {}
        }

        let hex = input
            .get(i + 1..i + 3)
            .ok_or_else(|| Error::InvalidEncoding("Incomplete escape sequence".to_string()))?;
        let hex = std::str::from_utf8(hex)
            .map_err(|_| Error::InvalidEncoding("Non-ASCII escape sequence".to_string()))?;
        let value = u8::from_str_radix(hex, 16)
            .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
        result.push(value);
        i += 3;
    }

    Ok(result)
}

/// Decodes a single RFC 2047 encoded word.
///
/// Format: `=?charset?encoding?encoded-text?=`. Input that is not an encoded
/// word is returned unchanged.
///
/// # Errors
///
/// Returns an error if the word is malformed or uses an unknown encoding.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let Some(inner) = text.strip_prefix("=?").and_then(|t| t.strip_suffix("?=")) else {
        return Ok(text.to_string());
    };

    let parts: Vec<&str> = inner.splitn(3, '?').collect();
    let [charset, encoding, encoded_text] = parts.as_slice() else {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    };

    let bytes = match encoding.to_ascii_uppercase().as_str() {
        "B" => decode_base64(encoded_text)?,
        // Q encoding uses underscore for space
        "Q" => decode_quoted_printable(encoded_text.replace('_', " ").as_bytes())?,
        other => {
            return Err(Error::InvalidEncoding(format!("Unknown encoding: {other}")));
        }
    };

    // RFC 2231 language suffix: `charset*lang`
    let charset = charset.split('*').next().unwrap_or(charset);
    Ok(decode_charset(&bytes, Some(charset)))
}

/// Converts text in `charset` to UTF-8.
///
/// Labels follow the WHATWG Encoding Standard, so `iso-8859-1` reads as
/// windows-1252. A missing or unknown label falls back to UTF-8, and invalid
/// sequences become U+FFFD. Text labelled `us-ascii` that is valid UTF-8 is
/// read as UTF-8, since that label is only the RFC 2045 default.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: Option<&str>) -> String {
    let label = charset.map(str::trim);
    if label.is_some_and(|l| l.eq_ignore_ascii_case("us-ascii")) {
        if let Ok(text) = std::str::from_utf8(bytes) {
            return text.to_string();
        }
    }
    let encoding = label
        .and_then(|l| Encoding::for_label(l.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Decodes every encoded word inside a header value.
///
/// Whitespace between two adjacent encoded words is dropped, as RFC 2047
/// requires. Words that fail to decode are left as they are.
#[must_use]
pub fn decode_header_value(value: &str) -> String {
    if !value.contains("=?") {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut pending_space = String::new();
    let mut last_was_word = false;

    for token in split_keeping_whitespace(value) {
        if token.chars().all(char::is_whitespace) {
            pending_space.push_str(token);
            continue;
        }

        let is_word = token.starts_with("=?") && token.ends_with("?=") && token.len() > 4;
        let decoded = if is_word {
            decode_rfc2047(token).ok()
        } else {
            None
        };

        if !(is_word && last_was_word && decoded.is_some()) {
            out.push_str(&pending_space);
        }
        pending_space.clear();

        match decoded {
            Some(text) => {
                out.push_str(&text);
                last_was_word = true;
            }
            None => {
                out.push_str(token);
                last_was_word = false;
            }
        }
    }

    out.push_str(&pending_space);
    out
}

/// Splits text into alternating runs of whitespace and non-whitespace.
fn split_keeping_whitespace(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space = None;

    for (idx, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        match in_space {
            Some(prev) if prev != space => {
                tokens.push(&text[start..idx]);
                start = idx;
            }
            _ => {}
        }
        in_space = Some(space);
    }

    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
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

    #[test]
    fn test_base64_decode_with_line_breaks() {
        let decoded = decode_base64("SGVsbG8s\r\nIFdvcmxkIQ==").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_base64url_decode_unpadded() {
        // Contains both URL-safe substitutions
        let decoded = decode_base64url("PGI-Pz88L2I-").unwrap();
        assert_eq!(decoded, b"<b>??</b>");

        let decoded = decode_base64url("SGk").unwrap();
        assert_eq!(decoded, b"Hi");
        let decoded = decode_base64url("SGk=").unwrap();
        assert_eq!(decoded, b"Hi");
    }

    #[test]
    fn test_base64url_rejects_garbage() {
        assert!(decode_base64url("***").is_err());
    }

    #[test]
    fn test_quoted_printable_decode() {
        let decoded = decode_quoted_printable(b"H=C3=A9llo").unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "Héllo");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        let decoded = decode_quoted_printable(b"Hello=\r\nWorld=\nAgain").unwrap();
        assert_eq!(decoded, b"HelloWorldAgain");
    }

    #[test]
    fn test_quoted_printable_keeps_raw_utf8() {
        let decoded = decode_quoted_printable("naïve =3D ok".as_bytes()).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "naïve = ok");
    }

    #[test]
    fn test_quoted_printable_incomplete_escape() {
        assert!(decode_quoted_printable(b"broken=4").is_err());
    }

    #[test]
    fn test_rfc2047_decode() {
        assert_eq!(decode_rfc2047("Hello").unwrap(), "Hello");
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?=").unwrap(), "Héllo");
        assert_eq!(
            decode_rfc2047("=?utf-8?Q?H=C3=A9llo_there?=").unwrap(),
            "Héllo there"
        );
        assert!(decode_rfc2047("=?utf-8?X?abc?=").is_err());
    }

    #[test]
    fn test_rfc2047_latin1() {
        assert_eq!(decode_rfc2047("=?ISO-8859-1?Q?caf=E9?=").unwrap(), "café");
        assert_eq!(decode_rfc2047("=?iso-8859-1?B?Y2Fm6Q==?=").unwrap(), "café");
        assert_eq!(decode_rfc2047("=?ISO-8859-1*fr?Q?caf=E9?=").unwrap(), "café");
    }

    #[test]
    fn test_decode_charset() {
        assert_eq!(decode_charset(b"cr\xe8me", Some("ISO-8859-1")), "crème");
        assert_eq!(
            decode_charset(b"\x93quoted\x94", Some("windows-1252")),
            "\u{201c}quoted\u{201d}"
        );
        assert_eq!(decode_charset("crème".as_bytes(), None), "crème");
        assert_eq!(decode_charset("crème".as_bytes(), Some("x-unknown")), "crème");
        assert_eq!(decode_charset(b"us \xff", Some("us-ascii")), "us \u{ff}");
        assert_eq!(decode_charset("crème".as_bytes(), Some("US-ASCII")), "crème");
    }

    #[test]
    fn test_decode_header_value_mixed() {
        assert_eq!(
            decode_header_value("Re: =?utf-8?B?SMOpbGxv?= world"),
            "Re: Héllo world"
        );
    }

    #[test]
    fn test_decode_header_value_adjacent_words() {
        assert_eq!(
            decode_header_value("=?utf-8?Q?ab?= =?utf-8?Q?cd?="),
            "abcd"
        );
    }

    #[test]
    fn test_decode_header_value_leaves_bad_words() {
        assert_eq!(
            decode_header_value("=?utf-8?Z?zz?= tail"),
            "=?utf-8?Z?zz?= tail"
        );
    }
}
