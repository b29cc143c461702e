//! IMAP adapter over `inboxbridge-imap`.

use std::time::Duration;

use async_trait::async_trait;
use inboxbridge_imap::mailbox::{self, Account, HeaderSummary};
use inboxbridge_imap::{Config, ConfigBuilder, Security, TlsTrust, Uid};
use inboxbridge_mime::{
    BodyKind, Message, html_to_text, parse_address, parse_address_list, select_body, snippet,
};
use tracing::info;

use super::MailProvider;
use crate::credentials::{Credentials, ImapCredential};
use crate::model::{MessageDetail, MessageSummary, ProviderKind};
use crate::{Error, Result};

/// Longest preview built from a fetched body.
const SNIPPET_CHARS: usize = 150;

/// Reads an INBOX over IMAP, one connection per call.
#[derive(Debug, Clone, Copy)]
pub struct ImapAdapter {
    connect_timeout: Duration,
    operation_timeout: Duration,
}

impl Default for ImapAdapter {
    fn default() -> Self {
        Self::new(
            ConfigBuilder::DEFAULT_CONNECT_TIMEOUT,
            ConfigBuilder::DEFAULT_OPERATION_TIMEOUT,
        )
    }
}

impl ImapAdapter {
    /// Adapter with the given connect and whole-operation bounds.
    #[must_use]
    pub const fn new(connect_timeout: Duration, operation_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            operation_timeout,
        }
    }

    fn account(&self, credentials: &Credentials) -> Result<Account> {
        let Credentials::Imap(login) = credentials else {
            return Err(Error::CredentialMismatch {
                provider: "IMAP",
                given: credentials.kind_name(),
            });
        };
        Ok(Account {
            config: self.config(login),
            username: login.user.clone(),
            password: login.password.clone(),
        })
    }

    fn config(&self, login: &ImapCredential) -> Config {
        let trust = if login.accept_invalid_certs {
            TlsTrust::AcceptInvalidCerts
        } else {
            TlsTrust::Verified
        };
        Config::builder(&login.host)
            .port(login.port)
            .security(Security::from_tls_flag(login.use_tls))
            .trust(trust)
            .connect_timeout(self.connect_timeout)
            .operation_timeout(self.operation_timeout)
            .build()
    }
}

#[async_trait]
impl MailProvider for ImapAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Imap
    }

    async fn list(&self, credentials: &Credentials, max: u32) -> Result<Vec<MessageSummary>> {
        let account = self.account(credentials)?;
        let entries = mailbox::list_recent(&account, max).await?;
        info!(host = %account.config.host, count = entries.len(), "listed IMAP inbox");
        Ok(entries.iter().map(summarize).collect())
    }

    async fn detail(&self, credentials: &Credentials, id: &str) -> Result<MessageDetail> {
        let uid: Uid = id
            .parse()
            .map_err(|_| Error::NotFound(format!("UID {id}")))?;
        let account = self.account(credentials)?;
        let raw = mailbox::fetch_raw(&account, uid).await?;
        let message = Message::parse(&raw)?;
        Ok(detail_from(uid, &message))
    }

    async fn verify(&self, credentials: &Credentials) -> Result<()> {
        let account = self.account(credentials)?;
        mailbox::test_login(&account).await?;
        Ok(())
    }
}

fn summarize(entry: &HeaderSummary) -> MessageSummary {
    let headers = &entry.headers;
    MessageSummary::new(
        entry.uid.to_string(),
        "",
        headers.get_decoded("subject"),
        headers.get_decoded("from").map(|from| parse_address(Some(&from))),
        headers.get("date").unwrap_or_default(),
        "",
    )
}

fn detail_from(uid: Uid, message: &Message) -> MessageDetail {
    let (text, html) = match select_body(&message.root) {
        Some(selected) if selected.kind == BodyKind::Html => {
            (html_to_text(&selected.content), Some(selected.content))
        }
        Some(selected) => (selected.content, message.html().map(str::to_string)),
        None => (String::new(), None),
    };

    let summary = MessageSummary::new(
        uid.to_string(),
        "",
        message.subject(),
        message.from().map(|from| parse_address(Some(&from))),
        message.date().unwrap_or_default(),
        snippet(&text, SNIPPET_CHARS),
    );
    MessageDetail::new(summary, text)
        .with_to(message.to().map(|to| parse_address_list(&to)))
        .with_html(html)
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
    use inboxbridge_mime::parse_header_blob;

    use super::*;
    use crate::credentials::OAuthCredential;
    use crate::error::ErrorKind;

    fn login(host: &str, port: u16) -> Credentials {
        Credentials::Imap(ImapCredential {
            host: host.to_string(),
            port,
            user: "ada".to_string(),
            password: "pw".to_string(),
            use_tls: false,
            accept_invalid_certs: false,
        })
    }

    #[test]
    fn test_config_from_credentials() {
        let adapter = ImapAdapter::new(Duration::from_secs(3), Duration::from_secs(9));
        let account = adapter.account(&login("imap.example.org", 143)).unwrap();
        assert_eq!(account.config.port, 143);
        assert_eq!(account.config.security, Security::None);
        assert_eq!(account.config.trust, TlsTrust::Verified);
        assert_eq!(account.config.connect_timeout, Duration::from_secs(3));
        assert_eq!(account.config.operation_timeout, Duration::from_secs(9));
    }

    #[test]
    fn test_oauth_credentials_rejected() {
        let creds = Credentials::OAuth(OAuthCredential::AccessToken("t".into()));
        let err = ImapAdapter::default().account(&creds).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationMissing);
    }

    #[test]
    fn test_summarize_headers() {
        let entry = HeaderSummary {
            uid: Uid::new(42).unwrap(),
            headers: parse_header_blob(
                "Subject: =?UTF-8?Q?Caf=C3=A9?=\r\nFrom: \"Lee\" <lee@example.net>\r\nDate: Mon, 6 Oct 2025 09:00:00 +0000\r\n",
            ),
        };
        let s = summarize(&entry);
        assert_eq!(s.id, "42");
        assert_eq!(s.subject, "Café");
        assert_eq!(s.from, "Lee <lee@example.net>");
        assert_eq!(s.date, "Mon, 6 Oct 2025 09:00:00 +0000");
        assert_eq!(s.snippet, "");
    }

    #[test]
    fn test_summarize_missing_headers() {
        let entry = HeaderSummary {
            uid: Uid::new(7).unwrap(),
            headers: parse_header_blob(""),
        };
        let s = summarize(&entry);
        assert_eq!(s.subject, "(no subject)");
        assert_eq!(s.from, "Unknown sender");
        assert_eq!(s.date, "");
    }

    #[test]
    fn test_detail_prefers_plain_and_keeps_html() {
        let raw = b"From: Ada <ada@example.org>\r\n\
To: bob@example.org\r\n\
Subject: Plans\r\n\
Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain\r\n\
\r\n\
Meet   at\r\n  noon.\r\n\
--b1\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>Meet at <b>noon</b>.</p>\r\n\
--b1--\r\n";
        let message = Message::parse(raw).unwrap();
        let detail = detail_from(Uid::new(9).unwrap(), &message);
        assert!(detail.body.contains("Meet"));
        assert_eq!(detail.summary.snippet, "Meet at noon.");
        assert_eq!(detail.to.as_deref(), Some("bob@example.org"));
        assert!(detail.html.unwrap().contains("<b>noon</b>"));
    }

    #[test]
    fn test_detail_normalizes_to_like_from() {
        let raw = b"From: \"Ada L\" <ada@example.org>\r\n\
To: \"Bob B\" <bob@example.org>, carol@example.org\r\n\
Subject: Hi\r\n\r\nbody\r\n";
        let message = Message::parse(raw).unwrap();
        let detail = detail_from(Uid::new(3).unwrap(), &message);
        assert_eq!(detail.summary.from, "Ada L <ada@example.org>");
        assert_eq!(
            detail.to.as_deref(),
            Some("Bob B <bob@example.org>, carol@example.org")
        );
    }

    #[test]
    fn test_detail_html_only_is_reduced() {
        let raw = b"Subject: News\r\nContent-Type: text/html\r\n\r\n<style>p{}</style><p>Hello <i>there</i></p>\r\n";
        let message = Message::parse(raw).unwrap();
        let detail = detail_from(Uid::new(1).unwrap(), &message);
        assert_eq!(detail.body, "Hello there");
        assert_eq!(detail.summary.from, "Unknown sender");
    }

    #[test]
    fn test_snippet_is_capped() {
        let long = "word ".repeat(100);
        let raw = format!("Subject: Long\r\n\r\n{long}\r\n");
        let message = Message::parse(raw.as_bytes()).unwrap();
        let detail = detail_from(Uid::new(1).unwrap(), &message);
        assert!(detail.summary.snippet.ends_with("..."));
        assert_eq!(detail.summary.snippet.chars().count(), 150 + 3 - 1);
    }

    #[tokio::test]
    async fn test_bad_uid_is_not_found() {
        let err = ImapAdapter::default()
            .detail(&login("127.0.0.1", 1), "not-a-uid")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_test() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let adapter = ImapAdapter::new(Duration::from_millis(500), Duration::from_secs(1));
        let result = adapter.test_connection(&login("127.0.0.1", port)).await;
        assert!(!result.success);
        assert!(matches!(
            result.kind,
            Some(ErrorKind::Timeout | ErrorKind::TransportError)
        ));
    }
}
