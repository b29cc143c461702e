//! Opening a mailbox.

use tokio::io::{AsyncRead, AsyncWrite};

use super::states::{Authenticated, Selected};
use super::{Client, Completion};
use crate::command::Command;
use crate::parser::UntaggedResponse;
use crate::types::MailboxStatus;
use crate::{Error, Result};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Opens `mailbox` read-only with EXAMINE.
    ///
    /// On a tagged `NO` the connection is logged out and the error is
    /// returned.
    pub async fn examine(mut self, mailbox: &str) -> Result<Client<S, Selected>> {
        let command = Command::Examine {
            mailbox: mailbox.to_string(),
        };
        match self.run(&command).await {
            Ok(completion) => {
                let status = mailbox_status(&completion);
                Ok(self.into_state(Selected {
                    mailbox: mailbox.to_string(),
                    status,
                }))
            }
            Err(Error::No(text)) => {
                let _ = self.logout().await;
                Err(Error::No(text))
            }
            Err(err) => Err(err),
        }
    }
}

fn mailbox_status(completion: &Completion) -> MailboxStatus {
    let mut status = MailboxStatus {
        read_only: true,
        ..MailboxStatus::default()
    };
    for untagged in &completion.untagged {
        match untagged {
            UntaggedResponse::Exists(n) => status.exists = *n,
            UntaggedResponse::Recent(n) => status.recent = *n,
            UntaggedResponse::Condition {
                code: Some(code), ..
            } => status.apply_code(code),
            _ => {}
        }
    }
    if let Some(code) = &completion.code {
        status.apply_code(code);
    }
    status
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ResponseCode;

    #[test]
    fn test_mailbox_status_from_untagged_data() {
        let completion = Completion {
            untagged: vec![
                UntaggedResponse::Flags(vec!["\\Seen".to_string()]),
                UntaggedResponse::Exists(30),
                UntaggedResponse::Recent(2),
                UntaggedResponse::Condition {
                    status: crate::types::Status::Ok,
                    code: Some(ResponseCode::UidValidity(1)),
                    text: String::new(),
                },
            ],
            code: Some(ResponseCode::ReadOnly),
        };
        let status = mailbox_status(&completion);
        assert_eq!(status.exists, 30);
        assert_eq!(status.recent, 2);
        assert_eq!(status.uid_validity, Some(1));
        assert!(status.read_only);
    }
}
