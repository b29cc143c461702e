//! Header blocks and folded-header unfolding.

use crate::encoding::decode_header_value;
use std::collections::HashMap;

/// Collection of message headers keyed case-insensitively.
///
/// A header that appears more than once keeps every value in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: HashMap<String, Vec<String>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        self.headers.entry(name).or_default().push(value.into());
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Gets the first value for a header with RFC 2047 words decoded.
    #[must_use]
    pub fn get_decoded(&self, name: &str) -> Option<String> {
        self.get(name).map(decode_header_value)
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get(&name.to_lowercase())
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns true if no headers were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Parses a header block, stopping at the first empty line.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut acc = HeaderAccumulator::new();
        for line in text.lines() {
            if line.is_empty() {
                break;
            }
            acc.push_line(line);
        }
        acc.finish()
    }
}

/// Line-at-a-time state machine for folded header blocks.
///
/// - A line starting with whitespace continues the current header: its
///   trimmed text is appended to that header's last value after one space.
/// - A `Name: value` line starts a new value under the lowercased name.
/// - Anything else (including a continuation with no open header) is
///   skipped.
#[derive(Debug, Default)]
pub struct HeaderAccumulator {
    headers: Headers,
    current: Option<String>,
}

impl HeaderAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line with its terminator already removed.
    pub fn push_line(&mut self, line: &str) {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.starts_with(char::is_whitespace) {
            if let Some(value) = self
                .current
                .as_ref()
                .and_then(|name| self.headers.headers.get_mut(name))
                .and_then(|values| values.last_mut())
            {
                value.push(' ');
                value.push_str(line.trim());
            }
            return;
        }

        match line.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                let name = name.trim().to_lowercase();
                self.headers.add(name.clone(), value.trim());
                self.current = Some(name);
            }
            _ => self.current = None,
        }
    }

    /// Feeds a raw blob, splitting on `\n` or `\r\n`.
    pub fn push_blob(&mut self, blob: &str) {
        for line in blob.split('\n') {
            self.push_line(line);
        }
    }

    /// Returns the collected headers.
    #[must_use]
    pub fn finish(self) -> Headers {
        self.headers
    }
}

/// Unfolds a raw header blob into a [`Headers`] map.
#[must_use]
pub fn parse_header_blob(blob: &str) -> Headers {
    let mut acc = HeaderAccumulator::new();
    acc.push_blob(blob);
    acc.finish()
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
    use proptest::prelude::*;

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("missing"), None);
    }

    #[test]
    fn test_headers_parse_stops_at_blank_line() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n",
            "X-Body: not a header\r\n"
        );

        let headers = Headers::parse(text);
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert!(headers.get("x-body").is_none());
    }

    #[test]
    fn test_blob_folding_with_tabs() {
        let blob = "Subject: a very\r\n\tlong\r\n   subject line\r\nDate: Mon, 1 Jan 2024\r\n\r\n";
        let headers = parse_header_blob(blob);
        assert_eq!(headers.get("subject"), Some("a very long subject line"));
        assert_eq!(headers.get("date"), Some("Mon, 1 Jan 2024"));
    }

    #[test]
    fn test_repeated_header_keeps_values() {
        let headers = parse_header_blob("To: a@x.com\nTo: b@x.com\n continued\n");
        assert_eq!(headers.get_all("to"), vec!["a@x.com", "b@x.com continued"]);
    }

    #[test]
    fn test_orphan_continuation_is_ignored() {
        let headers = parse_header_blob("  stray\r\nFrom: x@y.z\r\n");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("from"), Some("x@y.z"));
    }

    #[test]
    fn test_line_without_colon_closes_header() {
        let headers = parse_header_blob("Subject: one\r\ngarbage\r\n two\r\n");
        assert_eq!(headers.get("subject"), Some("one"));
    }

    #[test]
    fn test_get_decoded() {
        let headers = parse_header_blob("Subject: =?utf-8?B?SMOpbGxv?=\r\n");
        assert_eq!(headers.get_decoded("subject").as_deref(), Some("Héllo"));
    }

    proptest! {
        #[test]
        fn folded_value_is_space_joined_lines(
            name in "[A-Za-z][A-Za-z-]{0,12}",
            segments in proptest::collection::vec("[!-9;-~]([ -~]{0,20}[!-~])?", 1..6),
            indents in proptest::collection::vec(prop_oneof![Just(" "), Just("\t"), Just("  ")], 6),
        ) {
            let mut blob = format!("{name}: {}\r\n", segments[0]);
            for (segment, indent) in segments.iter().skip(1).zip(indents.iter()) {
                blob.push_str(indent);
                blob.push_str(segment);
                blob.push_str("\r\n");
            }

            let headers = parse_header_blob(&blob);
            let expected = segments.join(" ");
            prop_assert_eq!(headers.get(&name), Some(expected.as_str()));
        }
    }
}
