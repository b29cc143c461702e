//! Type-state IMAP client.
//!
//! The connection moves through `NotAuthenticated`, `Authenticated` and
//! `Selected`. Each transition consumes the client, so commands that are not
//! valid in the current state do not exist on its type.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

pub use self::selected::Fetched;
pub use self::states::{Authenticated, NotAuthenticated, Selected};
use super::framed::FramedStream;
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{ResponseCode, Status};
use crate::{Error, Result};

/// IMAP client connection in state `State`.
pub struct Client<S, State> {
    stream: FramedStream<S>,
    tags: TagGenerator,
    state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tags", &self.tags)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Untagged data plus the tagged completion of one command.
#[derive(Debug, Default)]
pub(crate) struct Completion {
    pub untagged: Vec<UntaggedResponse>,
    pub code: Option<ResponseCode>,
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn into_state<Next>(self, state: Next) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tags: self.tags,
            state,
        }
    }

    /// Sends LOGOUT and closes the connection.
    ///
    /// The server's reply is read but not checked: the session is over
    /// either way. Consuming `self` drops the stream exactly once.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tags.next_tag();
        debug!(%tag, "LOGOUT");
        self.stream
            .write_command(&Command::Logout.serialize(&tag))
            .await?;
        let _ = self.stream.read_until_tagged(&tag).await;
        self.stream.shutdown().await;
        Ok(())
    }

    /// Runs one command to completion.
    ///
    /// Untagged lines the parser rejects are skipped; the tagged line must
    /// parse. A non-OK completion becomes [`Error::No`], [`Error::Bad`] or
    /// [`Error::Bye`].
    pub(crate) async fn run(&mut self, command: &Command) -> Result<Completion> {
        let tag = self.tags.next_tag();
        debug!(%tag, command = command.name(), "sending");
        self.stream.write_command(&command.serialize(&tag)).await?;

        let mut responses = self.stream.read_until_tagged(&tag).await?;
        let tagged = responses
            .pop()
            .ok_or_else(|| Error::Protocol("missing tagged response".to_string()))?;

        let mut completion = Completion::default();
        for raw in &responses {
            match ResponseParser::parse(raw) {
                Ok(Response::Untagged(untagged)) => completion.untagged.push(untagged),
                Ok(_) => {}
                Err(err) => debug!(%tag, error = %err, "skipping unparsable response"),
            }
        }

        match ResponseParser::parse(&tagged)? {
            Response::Tagged {
                status, code, text, ..
            } => match status {
                Status::Ok | Status::PreAuth => {
                    completion.code = code;
                    Ok(completion)
                }
                Status::No => Err(Error::No(text)),
                Status::Bad => Err(Error::Bad(text)),
                Status::Bye => Err(Error::Bye(text)),
            },
            _ => Err(Error::Protocol("missing tagged response".to_string())),
        }
    }
}
