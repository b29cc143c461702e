//! One-shot mailbox operations.
//!
//! Each function opens its own connection, logs in, opens INBOX read-only,
//! does one thing and logs out. Nothing is pooled or cached between calls.

#![allow(clippy::missing_errors_doc)]

use std::fmt;
use std::future::Future;
use std::time::Duration;

use inboxbridge_mime::{HeaderAccumulator, Headers};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::command::FetchAttribute;
use crate::connection::{Authenticated, Client, Config, Fetched, connect};
use crate::types::{SequenceSet, Uid};
use crate::{Error, Result};

/// The only mailbox the operations read.
pub const INBOX: &str = "INBOX";

/// Bound on [`test_login`], from connect to logout.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Server plus login for one account.
#[derive(Clone)]
pub struct Account {
    /// Where and how to connect.
    pub config: Config,
    /// LOGIN username.
    pub username: String,
    /// LOGIN password.
    pub password: String,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("config", &self.config)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Listing entry: the message UID and its unfolded header fields.
#[derive(Debug, Clone)]
pub struct HeaderSummary {
    /// Message UID.
    pub uid: Uid,
    /// FROM, TO, SUBJECT and DATE as sent by the server.
    pub headers: Headers,
}

/// Lists the newest `n` INBOX messages, newest first.
///
/// An empty mailbox returns an empty list without sending FETCH.
pub async fn list_recent(account: &Account, n: u32) -> Result<Vec<HeaderSummary>> {
    bounded(account.config.operation_timeout, async {
        list_inbox(open(account).await?, n).await
    })
    .await
}

/// Fetches the complete raw message with the given UID.
///
/// Returns [`Error::NotFound`] when the mailbox has no such UID.
pub async fn fetch_raw(account: &Account, uid: Uid) -> Result<Vec<u8>> {
    bounded(account.config.operation_timeout, async {
        fetch_inbox_message(open(account).await?, uid).await
    })
    .await
}

/// [`list_recent`] on an already authenticated client. Consumes the client
/// and logs out.
pub async fn list_inbox<S>(
    client: Client<S, Authenticated>,
    n: u32,
) -> Result<Vec<HeaderSummary>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut client = client.examine(INBOX).await?;
    let total = client.selected().status().exists;

    let Some(set) = SequenceSet::most_recent(total, n) else {
        debug!("mailbox empty");
        let _ = client.logout().await;
        return Ok(Vec::new());
    };

    debug!(%set, total, "fetching headers");
    let items = vec![FetchAttribute::Uid, FetchAttribute::listing_headers()];
    let fetched = client.fetch(&set, items).await;
    let _ = client.logout().await;

    Ok(summarize(fetched?))
}

/// [`fetch_raw`] on an already authenticated client. Consumes the client
/// and logs out.
pub async fn fetch_inbox_message<S>(
    client: Client<S, Authenticated>,
    uid: Uid,
) -> Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut client = client.examine(INBOX).await?;

    let items = vec![FetchAttribute::Uid, FetchAttribute::FullBody];
    let fetched = client.uid_fetch(&SequenceSet::uid(uid), items).await;
    let _ = client.logout().await;

    fetched?
        .into_iter()
        .find(|message| message.uid() == Some(uid))
        .and_then(|message| message.body().map(<[u8]>::to_vec))
        .ok_or_else(|| Error::NotFound(format!("UID {uid}")))
}

/// Connects and logs in, then logs out. Bounded by [`TEST_TIMEOUT`].
pub async fn test_login(account: &Account) -> Result<()> {
    bounded(TEST_TIMEOUT, async {
        let client = open(account).await?;
        client.logout().await
    })
    .await
}

/// Connects, reads the greeting and logs in within `connect_timeout`.
async fn open(account: &Account) -> Result<Client<crate::ImapStream, Authenticated>> {
    let config = &account.config;
    bounded(config.connect_timeout, async {
        let stream = connect(config).await?;
        login(stream, &account.username, &account.password).await
    })
    .await
    .inspect(|_| info!(host = %config.host, user = %account.username, "logged in"))
}

/// Greets and logs in on an already connected stream.
pub async fn login<S>(
    stream: S,
    username: &str,
    password: &str,
) -> Result<Client<S, Authenticated>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    Client::from_stream(stream)
        .await?
        .login(username, password)
        .await
}

/// Runs `operation` under `limit`. Dropping the future on expiry drops any
/// client it owns, which closes the socket.
async fn bounded<T>(limit: Duration, operation: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, operation).await.unwrap_or_else(|_| {
        warn!(?limit, "IMAP operation timed out");
        Err(Error::Timeout(limit))
    })
}

/// Turns FETCH results into listing entries, newest first.
///
/// Entries without a UID cannot be opened later and are dropped.
fn summarize(mut fetched: Vec<Fetched>) -> Vec<HeaderSummary> {
    fetched.sort_by(|a, b| b.seq.cmp(&a.seq));
    fetched
        .into_iter()
        .filter_map(|message| {
            let Some(uid) = message.uid() else {
                debug!(seq = %message.seq, "FETCH without UID");
                return None;
            };
            let mut headers = HeaderAccumulator::new();
            if let Some(raw) = message.body() {
                headers.push_blob(&String::from_utf8_lossy(raw));
            }
            Some(HeaderSummary {
                uid,
                headers: headers.finish(),
            })
        })
        .collect()
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
    use crate::parser::FetchItem;
    use crate::types::SeqNum;

    fn header_fetch(seq: u32, uid: u32, blob: &str) -> Fetched {
        Fetched {
            seq: SeqNum::new(seq).unwrap(),
            items: vec![
                FetchItem::Uid(Uid::new(uid).unwrap()),
                FetchItem::Body {
                    section: Some("HEADER.FIELDS (FROM TO SUBJECT DATE)".to_string()),
                    origin: None,
                    data: Some(blob.as_bytes().to_vec()),
                },
            ],
        }
    }

    #[test]
    fn test_summarize_orders_newest_first() {
        let fetched = vec![
            header_fetch(1, 10, "Subject: old\r\n\r\n"),
            header_fetch(3, 30, "Subject: new\r\n\r\n"),
            header_fetch(2, 20, "Subject: mid\r\n\r\n"),
        ];
        let uids: Vec<u32> = summarize(fetched).iter().map(|s| s.uid.get()).collect();
        assert_eq!(uids, vec![30, 20, 10]);
    }

    #[test]
    fn test_summarize_unfolds_headers() {
        let blob = "Subject: Quarterly\r\n report\r\nFrom: \"Lee\" <lee@example.net>\r\n\r\n";
        let summary = summarize(vec![header_fetch(1, 5, blob)]);
        assert_eq!(summary[0].headers.get("subject"), Some("Quarterly report"));
        assert_eq!(
            summary[0].headers.get("from"),
            Some("\"Lee\" <lee@example.net>")
        );
    }

    #[test]
    fn test_summarize_drops_entries_without_uid() {
        let fetched = vec![Fetched {
            seq: SeqNum::new(1).unwrap(),
            items: vec![FetchItem::Flags(Vec::new())],
        }];
        assert!(summarize(fetched).is_empty());
    }

    #[test]
    fn test_account_debug_redacts_password() {
        let account = Account {
            config: Config::new("imap.example.com"),
            username: "ada".to_string(),
            password: "hunter2".to_string(),
        };
        let shown = format!("{account:?}");
        assert!(shown.contains("ada"));
        assert!(!shown.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<()> = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::Timeout(d)) if d == Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_login_rejected_is_auth_error() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0001 LOGIN ada wrong\r\n")
            .read(b"A0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
            .write(b"A0002 LOGOUT\r\n")
            .read(b"* BYE\r\nA0002 OK bye\r\n")
            .build();
        let err = login(mock, "ada", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::Auth(text) if text == "Invalid credentials"));
    }

    #[tokio::test]
    async fn test_bye_greeting() {
        let mock = Builder::new().read(b"* BYE too many connections\r\n").build();
        let err = login(mock, "ada", "pw").await.unwrap_err();
        assert!(matches!(err, Error::Bye(text) if text == "too many connections"));
    }
}
