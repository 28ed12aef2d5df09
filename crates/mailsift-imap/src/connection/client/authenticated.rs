//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::Result;
use crate::command::Command;
use crate::response::{Response, Untagged};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Selects a mailbox read-write.
    pub async fn select(mut self, mailbox: &str) -> Result<Client<S, Selected>> {
        let responses = self
            .execute(&Command::Select {
                mailbox: mailbox.to_string(),
            })
            .await?;

        let exists = responses
            .iter()
            .find_map(|r| match r {
                Response::Untagged(Untagged::Exists(n)) => Some(*n),
                _ => None,
            })
            .unwrap_or_default();

        tracing::debug!(mailbox, exists, "mailbox selected");
        Ok(self.transition(Selected {
            mailbox: mailbox.to_string(),
            exists,
        }))
    }

    /// Ends the session.
    pub async fn logout(mut self) -> Result<()> {
        logout_inner(&mut self).await
    }
}

/// Sends LOGOUT; the server's BYE before the tagged OK is expected.
pub(super) async fn logout_inner<S, State>(client: &mut Client<S, State>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    client.execute(&Command::Logout).await.map(|_| ())
}
