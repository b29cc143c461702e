//! Microsoft Graph adapter.

use async_trait::async_trait;
use inboxbridge_mime::{format_mailbox, html_to_text};
use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::info;
use url::Url;

use super::MailProvider;
use super::rest::RestClient;
use crate::Result;
use crate::credentials::{Credentials, OAuthApp};
use crate::model::{MessageDetail, MessageSummary, ProviderKind};

const LIST_FIELDS: &str = "id,subject,from,receivedDateTime,bodyPreview,isRead";
const DETAIL_FIELDS: &str = "id,subject,from,toRecipients,receivedDateTime,bodyPreview,body,isRead";

/// Reads an Outlook inbox through Microsoft Graph.
#[derive(Debug, Clone)]
pub struct GraphAdapter {
    rest: RestClient,
}

impl GraphAdapter {
    /// Adapter against `base_url`, refreshing tokens through `oauth`.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: Url, oauth: inboxbridge_oauth::Provider) -> Self {
        Self {
            rest: RestClient::new("Microsoft Graph", http, base_url, oauth),
        }
    }

    /// Sets the OAuth application used to exchange refresh tokens.
    #[must_use]
    pub fn with_app(mut self, app: Option<OAuthApp>) -> Self {
        self.rest = self.rest.with_app(app);
        self
    }
}

#[async_trait]
impl MailProvider for GraphAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Microsoft
    }

    async fn list(&self, credentials: &Credentials, max: u32) -> Result<Vec<MessageSummary>> {
        let token = self.rest.access_token(credentials).await?;

        // OData options keep their literal `$`; only the space is escaped.
        let mut url = self.rest.endpoint(&["me", "mailFolders", "Inbox", "messages"])?;
        url.set_query(Some(&format!(
            "$top={max}&$orderby=receivedDateTime%20desc&$select={LIST_FIELDS}"
        )));

        let page: MessagePage = self.rest.get_json(url, &token).await?;
        let messages = page.value.unwrap_or_default();
        info!(provider = self.rest.name(), count = messages.len(), "listed inbox");
        Ok(messages.iter().map(GraphMessage::summary).collect())
    }

    async fn detail(&self, credentials: &Credentials, id: &str) -> Result<MessageDetail> {
        let token = self.rest.access_token(credentials).await?;

        let mut url = self.rest.endpoint(&["me", "messages", id])?;
        url.set_query(Some(&format!("$select={DETAIL_FIELDS}")));
        let mut message: GraphMessage = self.rest.get_json(url, &token).await?;
        if message.id.is_empty() {
            message.id = id.to_string();
        }

        let (body, html) = match &message.body {
            Some(ItemBody {
                content_type: Some(kind),
                content: Some(content),
            }) if kind.eq_ignore_ascii_case("html") => (html_to_text(content), Some(content.clone())),
            Some(ItemBody {
                content_type: Some(kind),
                content: Some(content),
            }) if kind.eq_ignore_ascii_case("text") => (content.clone(), None),
            _ => (String::new(), None),
        };

        Ok(MessageDetail::new(message.summary(), body)
            .with_to(message.recipients())
            .with_html(html))
    }

    async fn verify(&self, credentials: &Credentials) -> Result<()> {
        let token = self.rest.access_token(credentials).await?;
        let url = self.rest.endpoint(&["me"])?;
        self.rest.get_json::<IgnoredAny>(url, &token).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct MessagePage {
    value: Option<Vec<GraphMessage>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphMessage {
    #[serde(default)]
    id: String,
    subject: Option<String>,
    from: Option<Recipient>,
    to_recipients: Option<Vec<Recipient>>,
    received_date_time: Option<String>,
    body_preview: Option<String>,
    body: Option<ItemBody>,
    is_read: Option<bool>,
}

impl GraphMessage {
    fn summary(&self) -> MessageSummary {
        let from = self
            .from
            .as_ref()
            .and_then(|r| r.email_address.as_ref())
            .and_then(|a| format_mailbox(a.name.as_deref(), a.address.as_deref()));
        MessageSummary::new(
            self.id.clone(),
            "",
            self.subject.clone(),
            from,
            self.received_date_time.clone().unwrap_or_default(),
            self.body_preview.clone().unwrap_or_default(),
        )
        .with_read_state(self.is_read)
    }

    /// Recipients rendered the same way as `from`.
    fn recipients(&self) -> Option<String> {
        let mailboxes: Vec<String> = self
            .to_recipients
            .iter()
            .flatten()
            .filter_map(|r| r.email_address.as_ref())
            .filter_map(|a| format_mailbox(a.name.as_deref(), a.address.as_deref()))
            .collect();
        (!mailboxes.is_empty()).then(|| mailboxes.join(", "))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Recipient {
    email_address: Option<EmailAddress>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    name: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody {
    content_type: Option<String>,
    content: Option<String>,
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

    fn message(json: serde_json::Value) -> GraphMessage {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_summary_fields() {
        let m = message(serde_json::json!({
            "id": "AAMk1",
            "subject": "Standup",
            "from": {"emailAddress": {"name": "Grace", "address": "grace@example.com"}},
            "receivedDateTime": "2025-10-07T08:00:00Z",
            "bodyPreview": "Notes attached",
            "isRead": true
        }));
        let s = m.summary();
        assert_eq!(s.from, "Grace <grace@example.com>");
        assert_eq!(s.date, "2025-10-07T08:00:00Z");
        assert_eq!(s.thread_id, "");
        assert_eq!(s.is_read, Some(true));
    }

    #[test]
    fn test_summary_nulls() {
        let m = message(serde_json::json!({
            "id": "AAMk2",
            "subject": null,
            "from": null,
            "bodyPreview": null
        }));
        let s = m.summary();
        assert_eq!(s.subject, "(no subject)");
        assert_eq!(s.from, "Unknown sender");
        assert_eq!(s.snippet, "");
    }

    #[test]
    fn test_recipients_render_like_sender() {
        let m = message(serde_json::json!({
            "id": "x",
            "toRecipients": [
                {"emailAddress": {"name": "Ada", "address": "ada@example.com"}},
                {"emailAddress": {"name": "", "address": "bob@example.com"}},
                {"emailAddress": null}
            ]
        }));
        assert_eq!(
            m.recipients().as_deref(),
            Some("Ada <ada@example.com>, bob@example.com")
        );

        let m = message(serde_json::json!({"id": "x", "toRecipients": []}));
        assert_eq!(m.recipients(), None);
    }
}
