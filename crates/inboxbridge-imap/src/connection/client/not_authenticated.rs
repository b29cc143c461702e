//! Greeting and login.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::{Command, TagGenerator, has_line_break};
use crate::connection::framed::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::Status;
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream and reads the server greeting.
    ///
    /// A `BYE` greeting is returned as [`Error::Bye`].
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);
        let greeting = framed.read_response().await?;

        match ResponseParser::parse(&greeting)? {
            Response::Untagged(UntaggedResponse::Condition {
                status: Status::Bye,
                text,
                ..
            }) => Err(Error::Bye(text)),
            Response::Untagged(UntaggedResponse::Condition {
                status: Status::Ok | Status::PreAuth,
                text,
                ..
            }) => {
                debug!(greeting = %text, "server ready");
                Ok(Self {
                    stream: framed,
                    tags: TagGenerator::default(),
                    state: NotAuthenticated,
                })
            }
            other => Err(Error::Protocol(format!("unexpected greeting: {other:?}"))),
        }
    }

    /// Logs in with a username and password.
    ///
    /// A tagged `NO` is returned as [`Error::Auth`]; the connection is
    /// logged out before the error is returned.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        if has_line_break(username) || has_line_break(password) {
            return Err(Error::Auth("credentials contain line breaks".to_string()));
        }

        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.run(&command).await {
            Ok(_) => Ok(self.into_state(Authenticated)),
            Err(Error::No(text)) => {
                let _ = self.logout().await;
                Err(Error::Auth(text))
            }
            Err(err) => Err(err),
        }
    }
}
