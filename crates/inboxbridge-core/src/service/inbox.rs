//! Inbox operations over any [`MailProvider`].

use tracing::{debug, info};

use crate::credentials::{CredentialResolver, Credentials};
use crate::model::{ConnectionTest, InboxSummary, MessageDetail, MessageSummary, ProviderKind};
use crate::provider::MailProvider;
use crate::{Error, Result};

/// Listing size when the caller does not pick one.
pub const DEFAULT_LIST_MAX: u32 = 25;

/// Largest listing a caller may request.
pub const MAX_LIST: u32 = 50;

/// How many recent messages a search looks through.
const SEARCH_WINDOW: u32 = 50;

/// How many recent messages [`inbox_summary`] counts, and how many it keeps.
const SUMMARY_WINDOW: u32 = 10;
const SUMMARY_LATEST: usize = 5;

/// Resolves credentials for `kind` or fails with
/// [`Error::ConfigurationMissing`].
pub async fn credentials_for(resolver: &CredentialResolver, kind: ProviderKind) -> Result<Credentials> {
    resolver
        .resolve(kind)
        .await
        .ok_or_else(|| Error::ConfigurationMissing(kind.to_string()))
}

/// Lists up to `max` INBOX messages, newest first. `max` is clamped to
/// `1..=50`.
pub async fn list_messages<P>(
    provider: &P,
    credentials: &Credentials,
    max: u32,
) -> Result<Vec<MessageSummary>>
where
    P: MailProvider + ?Sized,
{
    let max = max.clamp(1, MAX_LIST);
    debug!(provider = %provider.kind(), max, "listing messages");
    provider.list(credentials, max).await
}

/// Fetches one message by its provider id.
pub async fn get_message_detail<P>(
    provider: &P,
    credentials: &Credentials,
    id: &str,
) -> Result<MessageDetail>
where
    P: MailProvider + ?Sized,
{
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::NotFound("empty message id".to_string()));
    }
    debug!(provider = %provider.kind(), id, "fetching message");
    provider.detail(credentials, id).await
}

/// Checks that the credentials work. Failures are reported in the result.
pub async fn test_connection<P>(provider: &P, credentials: &Credentials) -> ConnectionTest
where
    P: MailProvider + ?Sized,
{
    let result = provider.test_connection(credentials).await;
    if result.success {
        info!(provider = %provider.kind(), "connection test passed");
    }
    result
}

/// Recent messages whose subject, sender or snippet contains `query`,
/// ignoring case. At most `max` are returned.
pub async fn search_messages<P>(
    provider: &P,
    credentials: &Credentials,
    query: &str,
    max: u32,
) -> Result<Vec<MessageSummary>>
where
    P: MailProvider + ?Sized,
{
    let needle = query.trim().to_lowercase();
    let mut found: Vec<MessageSummary> = provider
        .list(credentials, SEARCH_WINDOW)
        .await?
        .into_iter()
        .filter(|m| m.mentions(&needle))
        .collect();
    found.truncate(max.clamp(1, MAX_LIST) as usize);
    debug!(provider = %provider.kind(), matches = found.len(), "searched recent messages");
    Ok(found)
}

/// Count of recent messages plus the newest few.
pub async fn inbox_summary<P>(provider: &P, credentials: &Credentials) -> Result<InboxSummary>
where
    P: MailProvider + ?Sized,
{
    let mut recent = provider.list(credentials, SUMMARY_WINDOW).await?;
    let total_recent = recent.len();
    recent.truncate(SUMMARY_LATEST);
    Ok(InboxSummary {
        total_recent,
        latest: recent,
    })
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
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::credentials::{Defaults, OAuthCredential};
    use crate::error::ErrorKind;

    /// Serves a fixed inbox and records the sizes it was asked for.
    struct FakeInbox {
        messages: Vec<MessageSummary>,
        requested: Mutex<Vec<u32>>,
    }

    impl FakeInbox {
        fn with(count: usize) -> Self {
            let messages = (0..count)
                .map(|i| {
                    MessageSummary::new(
                        format!("m{i}"),
                        "",
                        Some(format!("Subject {i}")),
                        Some(if i % 2 == 0 { "Ada <ada@example.org>" } else { "Bob <bob@example.org>" }.to_string()),
                        "",
                        format!("preview {i}"),
                    )
                })
                .collect();
            Self {
                messages,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MailProvider for FakeInbox {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Imap
        }

        async fn list(&self, _: &Credentials, max: u32) -> Result<Vec<MessageSummary>> {
            self.requested.lock().unwrap().push(max);
            Ok(self.messages.iter().take(max as usize).cloned().collect())
        }

        async fn detail(&self, _: &Credentials, id: &str) -> Result<MessageDetail> {
            self.messages
                .iter()
                .find(|m| m.id == id)
                .map(|m| MessageDetail::new(m.clone(), String::new()))
                .ok_or_else(|| Error::NotFound(id.to_string()))
        }

        async fn verify(&self, credentials: &Credentials) -> Result<()> {
            match credentials {
                Credentials::OAuth(OAuthCredential::AccessToken(t)) if t == "good" => Ok(()),
                _ => Err(Error::Api {
                    provider: "Fake",
                    status: 401,
                    message: "Invalid Credentials".to_string(),
                }),
            }
        }
    }

    fn creds(token: &str) -> Credentials {
        Credentials::OAuth(OAuthCredential::AccessToken(token.to_string()))
    }

    #[tokio::test]
    async fn test_list_clamps_max() {
        let inbox = FakeInbox::with(60);
        list_messages(&inbox, &creds("good"), 0).await.unwrap();
        list_messages(&inbox, &creds("good"), 500).await.unwrap();
        list_messages(&inbox, &creds("good"), 7).await.unwrap();
        assert_eq!(*inbox.requested.lock().unwrap(), vec![1, 50, 7]);
    }

    #[tokio::test]
    async fn test_detail_falls_back_to_snippet() {
        let inbox = FakeInbox::with(3);
        let detail = get_message_detail(&inbox, &creds("good"), "m1").await.unwrap();
        assert_eq!(detail.body, "preview 1");
    }

    #[tokio::test]
    async fn test_detail_rejects_blank_id() {
        let inbox = FakeInbox::with(3);
        let err = get_message_detail(&inbox, &creds("good"), "  ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(inbox.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connection_never_errors() {
        let inbox = FakeInbox::with(0);
        assert!(test_connection(&inbox, &creds("good")).await.success);

        let failed = test_connection(&inbox, &creds("bad")).await;
        assert!(!failed.success);
        assert_eq!(failed.kind, Some(ErrorKind::AuthenticationFailed));
        assert!(failed.error.unwrap().contains("Invalid Credentials"));
    }

    #[tokio::test]
    async fn test_search_filters_window() {
        let inbox = FakeInbox::with(60);
        let found = search_messages(&inbox, &creds("good"), "  BOB@", 3).await.unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|m| m.from.contains("bob")));
        assert_eq!(*inbox.requested.lock().unwrap(), vec![50]);

        let found = search_messages(&inbox, &creds("good"), "preview 49", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        let found = search_messages(&inbox, &creds("good"), "preview 55", 10).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_inbox_summary() {
        let inbox = FakeInbox::with(60);
        let summary = inbox_summary(&inbox, &creds("good")).await.unwrap();
        assert_eq!(summary.total_recent, 10);
        assert_eq!(summary.latest.len(), 5);
        assert_eq!(summary.latest[0].id, "m0");

        let small = FakeInbox::with(2);
        let summary = inbox_summary(&small, &creds("good")).await.unwrap();
        assert_eq!(summary.total_recent, 2);
        assert_eq!(summary.latest.len(), 2);
    }

    #[tokio::test]
    async fn test_credentials_for_missing() {
        let resolver = CredentialResolver::defaults_only(Defaults::new());
        let err = credentials_for(&resolver, ProviderKind::Gmail).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationMissing);
        assert!(err.to_string().contains("gmail"));
    }

    #[tokio::test]
    async fn test_works_through_dyn() {
        let inbox: Box<dyn MailProvider> = Box::new(FakeInbox::with(4));
        let listed = list_messages(inbox.as_ref(), &creds("good"), 25).await.unwrap();
        assert_eq!(listed.len(), 4);
    }
}
