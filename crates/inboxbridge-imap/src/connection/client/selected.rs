//! Fetching from the open mailbox.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::Selected;
use crate::Result;
use crate::command::{Command, FetchAttribute};
use crate::parser::{FetchItem, UntaggedResponse};
use crate::types::{SeqNum, SequenceSet, Uid};

/// FETCH data for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// Sequence number in the open mailbox.
    pub seq: SeqNum,
    /// Data items as returned by the server.
    pub items: Vec<FetchItem>,
}

impl Fetched {
    /// The UID item, if the server sent one.
    #[must_use]
    pub fn uid(&self) -> Option<Uid> {
        self.items.iter().find_map(|item| match item {
            FetchItem::Uid(uid) => Some(*uid),
            _ => None,
        })
    }

    /// Payload of the first body section, if any.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.items.iter().find_map(|item| match item {
            FetchItem::Body { data, .. } => data.as_deref(),
            _ => None,
        })
    }
}

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// State data of the open mailbox.
    #[must_use]
    pub const fn selected(&self) -> &Selected {
        &self.state
    }

    /// FETCH by sequence number. Results keep server order.
    pub async fn fetch(
        &mut self,
        set: &SequenceSet,
        items: Vec<FetchAttribute>,
    ) -> Result<Vec<Fetched>> {
        let command = Command::Fetch {
            set: set.clone(),
            items,
        };
        self.collect_fetch(&command).await
    }

    /// UID FETCH. An unknown UID yields an empty list, not an error.
    pub async fn uid_fetch(
        &mut self,
        set: &SequenceSet,
        items: Vec<FetchAttribute>,
    ) -> Result<Vec<Fetched>> {
        let command = Command::UidFetch {
            set: set.clone(),
            items,
        };
        self.collect_fetch(&command).await
    }

    async fn collect_fetch(&mut self, command: &Command) -> Result<Vec<Fetched>> {
        let completion = self.run(command).await?;
        Ok(completion
            .untagged
            .into_iter()
            .filter_map(|untagged| match untagged {
                UntaggedResponse::Fetch { seq, items } => Some(Fetched { seq, items }),
                _ => None,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetched_accessors() {
        let fetched = Fetched {
            seq: SeqNum::new(4).unwrap(),
            items: vec![
                FetchItem::Flags(Vec::new()),
                FetchItem::Body {
                    section: None,
                    origin: None,
                    data: Some(b"raw".to_vec()),
                },
                FetchItem::Uid(Uid::new(99).unwrap()),
            ],
        };
        assert_eq!(fetched.uid().map(Uid::get), Some(99));
        assert_eq!(fetched.body(), Some(&b"raw"[..]));
    }

    #[test]
    fn test_fetched_without_body() {
        let fetched = Fetched {
            seq: SeqNum::new(1).unwrap(),
            items: vec![FetchItem::Body {
                section: Some("HEADER".to_string()),
                origin: None,
                data: None,
            }],
        };
        assert!(fetched.uid().is_none());
        assert!(fetched.body().is_none());
    }
}
