//! Implementation for the not-authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::connection::stream::ImapStream;
use crate::response::{Response, Status, Untagged};
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new client from a connected stream and reads the greeting.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        let greeting = framed.read_response().await?;
        match Response::parse(&greeting)? {
            Response::Untagged(Untagged::Status {
                status: Status::Bye,
                text,
            }) => return Err(Error::Closed(text)),
            Response::Untagged(Untagged::Status { .. }) => {}
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            state: NotAuthenticated,
        })
    }

    /// Authenticates with LOGIN, consuming the unauthenticated client.
    pub async fn login(mut self, username: &str, password: &str) -> Result<Client<S, Authenticated>> {
        self.execute(&Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;

        tracing::debug!(username, "IMAP login succeeded");
        Ok(self.transition(Authenticated))
    }
}

impl Client<ImapStream, NotAuthenticated> {
    /// Negotiates STARTTLS and returns a client over the encrypted stream.
    pub async fn starttls(mut self, host: &str) -> Result<Self> {
        self.execute(&Command::StartTls).await?;

        let tls = self.stream.into_inner().upgrade_to_tls(host).await?;
        Ok(Self {
            stream: FramedStream::new(tls),
            tag_gen: self.tag_gen,
            state: NotAuthenticated,
        })
    }
}
