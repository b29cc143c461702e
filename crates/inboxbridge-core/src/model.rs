//! The normalized message model every provider produces.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

/// The three supported mailbox backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Gmail REST API.
    Gmail,
    /// Microsoft Graph mail API.
    Microsoft,
    /// Any IMAP4rev1 server.
    Imap,
}

impl ProviderKind {
    /// Every provider, in display order.
    pub const ALL: [Self; 3] = [Self::Gmail, Self::Microsoft, Self::Imap];

    /// Stable lowercase name, as stored and accepted on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Microsoft => "microsoft",
            Self::Imap => "imap",
        }
    }

    /// Whether the provider authenticates with OAuth tokens.
    #[must_use]
    pub const fn uses_oauth(self) -> bool {
        matches!(self, Self::Gmail | Self::Microsoft)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gmail" | "google" => Ok(Self::Gmail),
            "microsoft" | "outlook" | "graph" => Ok(Self::Microsoft),
            "imap" => Ok(Self::Imap),
            other => Err(Error::InvalidConfig(format!("unknown provider: {other}"))),
        }
    }
}

/// Subject used when the provider has none.
pub const NO_SUBJECT: &str = "(no subject)";

/// Sender used when the provider has none.
pub const UNKNOWN_SENDER: &str = "Unknown sender";

/// One entry of an inbox listing.
///
/// `subject` and `from` are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    /// Provider-native id. Opaque and only unique within one provider.
    pub id: String,
    /// Provider thread id, empty when the provider has no threads.
    pub thread_id: String,
    /// Subject line.
    pub subject: String,
    /// Sender display string.
    pub from: String,
    /// Date exactly as the provider reported it.
    pub date: String,
    /// Short preview of the body.
    pub snippet: String,
    /// Read state, for providers that report it in the listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
}

impl MessageSummary {
    /// Builds a summary, substituting the sentinels for missing or blank
    /// subject and sender.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        subject: Option<String>,
        from: Option<String>,
        date: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            subject: or_sentinel(subject, NO_SUBJECT),
            from: or_sentinel(from, UNKNOWN_SENDER),
            date: date.into(),
            snippet: snippet.into(),
            is_read: None,
        }
    }

    /// Sets the read state.
    #[must_use]
    pub const fn with_read_state(mut self, is_read: Option<bool>) -> Self {
        self.is_read = is_read;
        self
    }

    /// True when subject, sender or snippet contains `needle`, ignoring case.
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        [&self.subject, &self.from, &self.snippet]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

fn or_sentinel(value: Option<String>, sentinel: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| sentinel.to_string())
}

/// A single message with its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    /// Listing fields.
    #[serde(flatten)]
    pub summary: MessageSummary,
    /// Plain-text body. Falls back to the snippet when nothing was extracted.
    pub body: String,
    /// Recipient display string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Original HTML body, when the message had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl MessageDetail {
    /// Builds a detail, falling back to the snippet when `body` is blank.
    #[must_use]
    pub fn new(summary: MessageSummary, body: String) -> Self {
        let body = if body.trim().is_empty() {
            summary.snippet.clone()
        } else {
            body
        };
        Self {
            summary,
            body,
            to: None,
            html: None,
        }
    }

    /// Sets the recipient display string. Blank values are dropped.
    #[must_use]
    pub fn with_to(mut self, to: Option<String>) -> Self {
        self.to = to.filter(|t| !t.trim().is_empty());
        self
    }

    /// Keeps the original HTML body.
    #[must_use]
    pub fn with_html(mut self, html: Option<String>) -> Self {
        self.html = html;
        self
    }
}

/// Outcome of a connection test. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionTest {
    /// Whether the provider accepted the credentials.
    pub success: bool,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl ConnectionTest {
    /// A passed test.
    #[must_use]
    pub const fn passed() -> Self {
        Self {
            success: true,
            error: None,
            kind: None,
        }
    }

    /// A failed test described by `error`.
    #[must_use]
    pub fn failed(error: &Error) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            kind: Some(error.kind()),
        }
    }
}

impl From<crate::Result<()>> for ConnectionTest {
    fn from(result: crate::Result<()>) -> Self {
        match result {
            Ok(()) => Self::passed(),
            Err(e) => Self::failed(&e),
        }
    }
}

/// Recent-activity overview of an inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxSummary {
    /// Number of messages looked at.
    pub total_recent: usize,
    /// The newest few of them.
    pub latest: Vec<MessageSummary>,
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

    fn summary(subject: Option<&str>, from: Option<&str>) -> MessageSummary {
        MessageSummary::new(
            "18c2",
            "18c2",
            subject.map(String::from),
            from.map(String::from),
            "Tue, 7 Oct 2025 10:00:00 +0000",
            "Lunch on Friday?",
        )
    }

    #[test]
    fn test_provider_kind_names() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
        assert_eq!("Google".parse::<ProviderKind>().unwrap(), ProviderKind::Gmail);
        assert!("pop3".parse::<ProviderKind>().is_err());
        assert!(ProviderKind::Microsoft.uses_oauth());
        assert!(!ProviderKind::Imap.uses_oauth());
    }

    #[test]
    fn test_sentinels_replace_missing_and_blank() {
        let s = summary(None, Some("  "));
        assert_eq!(s.subject, NO_SUBJECT);
        assert_eq!(s.from, UNKNOWN_SENDER);

        let s = summary(Some("Hi"), Some("Ada <ada@example.org>"));
        assert_eq!(s.subject, "Hi");
        assert_eq!(s.from, "Ada <ada@example.org>");
    }

    #[test]
    fn test_detail_falls_back_to_snippet() {
        let detail = MessageDetail::new(summary(Some("Hi"), None), " \n".to_string());
        assert_eq!(detail.body, "Lunch on Friday?");

        let detail = MessageDetail::new(summary(Some("Hi"), None), "Full text".to_string());
        assert_eq!(detail.body, "Full text");
    }

    #[test]
    fn test_summary_json_shape() {
        let json = serde_json::to_value(summary(Some("Hi"), None)).unwrap();
        assert_eq!(json["threadId"], "18c2");
        assert!(json.get("isRead").is_none());

        let json = serde_json::to_value(summary(None, None).with_read_state(Some(false))).unwrap();
        assert_eq!(json["isRead"], false);
    }

    #[test]
    fn test_detail_json_is_flat() {
        let detail = MessageDetail::new(summary(Some("Hi"), None), "Body".to_string())
            .with_to(Some("Bob <bob@example.org>".to_string()));
        let json = serde_json::to_value(detail).unwrap();
        assert_eq!(json["subject"], "Hi");
        assert_eq!(json["body"], "Body");
        assert_eq!(json["to"], "Bob <bob@example.org>");
        assert!(json.get("html").is_none());
    }

    #[test]
    fn test_mentions_ignores_case() {
        let s = summary(Some("Quarterly REPORT"), Some("Ada"));
        assert!(s.mentions("report"));
        assert!(s.mentions("friday"));
        assert!(!s.mentions("invoice"));
    }

    #[test]
    fn test_connection_test_from_result() {
        assert_eq!(ConnectionTest::from(Ok(())), ConnectionTest::passed());

        let failed = ConnectionTest::from(Err(Error::NotFound("x".into())));
        assert!(!failed.success);
        assert_eq!(failed.kind, Some(ErrorKind::NotFound));
        assert_eq!(failed.error.as_deref(), Some("Message not found: x"));
    }
}
