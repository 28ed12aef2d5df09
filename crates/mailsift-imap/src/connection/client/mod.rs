//! Type-state IMAP client connection.
//!
//! The connection moves through `NotAuthenticated` → `Authenticated` →
//! `Selected`, and each state only exposes the commands valid in it.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use tokio::io::{AsyncRead, AsyncWrite};

pub use self::states::{Authenticated, NotAuthenticated, Selected};

use super::framed::{FramedStream, ResponseAccumulator};
use crate::command::{Command, TagGenerator};
use crate::response::{Response, Status};
use crate::{Error, Result};

/// IMAP client connection with type-state.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Sends a command and collects every response up to its completion.
    ///
    /// Fails with NO/BAD/BYE if the tagged completion is not OK.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<Vec<Response>> {
        let tag = self.tag_gen.next_tag();
        tracing::trace!(%tag, "sending IMAP command");
        self.stream.write_command(&command.serialize(&tag)).await?;

        let raw = ResponseAccumulator::new(tag.as_str())
            .read_until_tagged(&mut self.stream)
            .await?;

        let mut responses = Vec::with_capacity(raw.len());
        for bytes in &raw {
            match Response::parse(bytes) {
                Ok(response) => responses.push(response),
                Err(e) => tracing::debug!(error = %e, "skipping unparsable response"),
            }
        }

        check_tagged_ok(&responses, &tag)?;
        Ok(responses)
    }

    /// Moves the connection into another state.
    pub(crate) fn transition<Next>(self, state: Next) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            state,
        }
    }
}

/// Checks that the completion for `tag` is OK.
pub(crate) fn check_tagged_ok(responses: &[Response], tag: &str) -> Result<()> {
    for response in responses.iter().rev() {
        if let Response::Tagged {
            tag: resp_tag,
            status,
            text,
        } = response
            && resp_tag == tag
        {
            return match status {
                Status::Ok | Status::PreAuth => Ok(()),
                Status::No | Status::Bad => Err(Error::Rejected {
                    status: *status,
                    text: text.clone(),
                }),
                Status::Bye => Err(Error::Closed(text.clone())),
            };
        }
    }

    Err(Error::Protocol(format!("no completion for tag {tag}")))
}
