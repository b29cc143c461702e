//! Gmail REST adapter.

use async_trait::async_trait;
use futures::future::try_join_all;
use inboxbridge_mime::{
    BodyKind, ContentType, MimePart, encoding, html_to_text, parse_address, parse_address_list,
    select_body,
};
use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::{debug, info};
use url::Url;

use super::MailProvider;
use super::rest::RestClient;
use crate::Result;
use crate::credentials::{Credentials, OAuthApp};
use crate::model::{MessageDetail, MessageSummary, ProviderKind};

/// Headers requested for listing entries.
const METADATA_HEADERS: [&str; 3] = ["Subject", "From", "Date"];

/// Reads a Gmail inbox through the REST API.
#[derive(Debug, Clone)]
pub struct GmailAdapter {
    rest: RestClient,
}

impl GmailAdapter {
    /// Adapter against `base_url`, refreshing tokens through `oauth`.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: Url, oauth: inboxbridge_oauth::Provider) -> Self {
        Self {
            rest: RestClient::new("Gmail", http, base_url, oauth),
        }
    }

    /// Sets the OAuth application used to exchange refresh tokens.
    #[must_use]
    pub fn with_app(mut self, app: Option<OAuthApp>) -> Self {
        self.rest = self.rest.with_app(app);
        self
    }

    async fn metadata(&self, token: &str, id: &str) -> Result<GmailMessage> {
        let mut url = self.rest.endpoint(&["users", "me", "messages", id])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("format", "metadata");
            for name in METADATA_HEADERS {
                query.append_pair("metadataHeaders", name);
            }
        }
        let mut message: GmailMessage = self.rest.get_json(url, token).await?;
        if message.id.is_empty() {
            message.id = id.to_string();
        }
        Ok(message)
    }
}

#[async_trait]
impl MailProvider for GmailAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gmail
    }

    async fn list(&self, credentials: &Credentials, max: u32) -> Result<Vec<MessageSummary>> {
        let token = self.rest.access_token(credentials).await?;

        let mut url = self.rest.endpoint(&["users", "me", "messages"])?;
        url.query_pairs_mut()
            .append_pair("labelIds", "INBOX")
            .append_pair("maxResults", &max.to_string());
        let listing: MessageList = self.rest.get_json(url, &token).await?;

        let ids: Vec<String> = listing
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.id)
            .filter(|id| !id.is_empty())
            .collect();
        debug!(count = ids.len(), "fetching Gmail metadata");

        let messages = try_join_all(ids.iter().map(|id| self.metadata(&token, id))).await?;
        info!(count = messages.len(), "listed Gmail inbox");
        Ok(messages.iter().map(GmailMessage::summary).collect())
    }

    async fn detail(&self, credentials: &Credentials, id: &str) -> Result<MessageDetail> {
        let token = self.rest.access_token(credentials).await?;

        let mut url = self.rest.endpoint(&["users", "me", "messages", id])?;
        url.query_pairs_mut().append_pair("format", "full");
        let mut message: GmailMessage = self.rest.get_json(url, &token).await?;
        if message.id.is_empty() {
            message.id = id.to_string();
        }

        let tree = message.payload.as_ref().map(GmailPart::to_mime).unwrap_or_default();
        let (body, html) = match select_body(&tree) {
            Some(selected) if selected.kind == BodyKind::Html => {
                (html_to_text(&selected.content), Some(selected.content))
            }
            Some(selected) => (selected.content, None),
            None => (String::new(), None),
        };

        let to = message.header("To").map(parse_address_list);
        Ok(MessageDetail::new(message.summary(), body)
            .with_to(to)
            .with_html(html))
    }

    async fn verify(&self, credentials: &Credentials) -> Result<()> {
        let token = self.rest.access_token(credentials).await?;
        let url = self.rest.endpoint(&["users", "me", "profile"])?;
        self.rest.get_json::<IgnoredAny>(url, &token).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct MessageList {
    messages: Option<Vec<MessageRef>>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    #[serde(default)]
    id: String,
    thread_id: Option<String>,
    snippet: Option<String>,
    label_ids: Option<Vec<String>>,
    payload: Option<GmailPart>,
}

impl GmailMessage {
    fn header(&self, name: &str) -> Option<&str> {
        self.payload.as_ref()?.header(name)
    }

    /// `UNREAD` is a label; without labels the read state is unknown.
    fn is_read(&self) -> Option<bool> {
        self.label_ids
            .as_ref()
            .map(|labels| !labels.iter().any(|l| l == "UNREAD"))
    }

    fn summary(&self) -> MessageSummary {
        MessageSummary::new(
            self.id.clone(),
            self.thread_id.clone().unwrap_or_default(),
            self.header("Subject").map(str::to_string),
            self.header("From").map(|from| parse_address(Some(from))),
            self.header("Date").unwrap_or_default(),
            self.snippet.clone().unwrap_or_default(),
        )
        .with_read_state(self.is_read())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailPart {
    #[serde(default)]
    mime_type: String,
    headers: Option<Vec<GmailHeader>>,
    body: Option<GmailBody>,
    parts: Option<Vec<GmailPart>>,
}

impl GmailPart {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .flatten()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Body data arrives in the part's own charset.
    fn charset(&self) -> Option<String> {
        let content_type = ContentType::parse(self.header("Content-Type")?).ok()?;
        content_type.charset().map(str::to_string)
    }

    fn to_mime(&self) -> MimePart {
        let data = self
            .body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .and_then(|raw| match encoding::decode_base64url(raw) {
                Ok(bytes) => Some(encoding::decode_charset(&bytes, self.charset().as_deref())),
                Err(e) => {
                    debug!(mime_type = %self.mime_type, error = %e, "undecodable Gmail part");
                    None
                }
            });
        let mut part = MimePart::leaf(&self.mime_type, data);
        part.children = self.parts.iter().flatten().map(Self::to_mime).collect();
        part
    }
}

#[derive(Debug, Deserialize)]
struct GmailBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GmailHeader {
    name: String,
    value: String,
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

    fn b64(text: &str) -> String {
        use base64::Engine as _;
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(text)
    }

    #[test]
    fn test_payload_tree_decodes_data() {
        let json = serde_json::json!({
            "mimeType": "multipart/alternative",
            "parts": [
                {"mimeType": "text/html", "body": {"data": b64("<p>Hi</p>")}},
                {"mimeType": "text/plain", "body": {"data": b64("Hi ÿ")}}
            ]
        });
        let part: GmailPart = serde_json::from_value(json).unwrap();
        let tree = part.to_mime();
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[1].data(), Some("Hi ÿ"));

        let selected = select_body(&tree).unwrap();
        assert_eq!(selected.kind, BodyKind::Plain);
    }

    #[test]
    fn test_part_charset_is_honored() {
        use base64::Engine as _;
        let latin1 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(b"caf\xe9 cr\xe8me");
        let json = serde_json::json!({
            "mimeType": "text/plain",
            "headers": [{"name": "Content-Type", "value": "text/plain; charset=\"ISO-8859-1\""}],
            "body": {"data": latin1}
        });
        let part: GmailPart = serde_json::from_value(json).unwrap();
        assert_eq!(part.to_mime().data(), Some("café crème"));
    }

    #[test]
    fn test_bad_base64_leaves_part_empty() {
        let json = serde_json::json!({"mimeType": "text/plain", "body": {"data": "!!!"}});
        let part: GmailPart = serde_json::from_value(json).unwrap();
        assert_eq!(part.to_mime().data(), None);
    }

    #[test]
    fn test_summary_sentinels() {
        let message: GmailMessage = serde_json::from_value(serde_json::json!({
            "id": "18c",
            "payload": {"headers": []}
        }))
        .unwrap();
        let summary = message.summary();
        assert_eq!(summary.subject, "(no subject)");
        assert_eq!(summary.from, "Unknown sender");
        assert_eq!(summary.date, "");
        assert_eq!(summary.thread_id, "");
        assert_eq!(summary.is_read, None);
    }

    #[test]
    fn test_summary_headers_case_insensitive() {
        let message: GmailMessage = serde_json::from_value(serde_json::json!({
            "id": "18c",
            "threadId": "18b",
            "snippet": "See you",
            "labelIds": ["INBOX", "UNREAD"],
            "payload": {"headers": [
                {"name": "subject", "value": "Lunch"},
                {"name": "FROM", "value": "\"Ada L\" <ada@example.org>"},
                {"name": "Date", "value": "Tue, 7 Oct 2025 12:00:00 +0000"}
            ]}
        }))
        .unwrap();
        let summary = message.summary();
        assert_eq!(summary.subject, "Lunch");
        assert_eq!(summary.from, "Ada L <ada@example.org>");
        assert_eq!(summary.thread_id, "18b");
        assert_eq!(summary.is_read, Some(false));
    }
}
