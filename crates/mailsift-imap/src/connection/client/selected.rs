//! Implementation for the selected state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::authenticated::logout_inner;
use super::states::Selected;
use crate::Result;
use crate::command::Command;
use crate::response::{Response, Untagged};

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Name of the selected mailbox.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        &self.state.mailbox
    }

    /// Message count reported when the mailbox was selected.
    #[must_use]
    pub const fn exists(&self) -> u32 {
        self.state.exists
    }

    /// Returns the UIDs of messages whose `field` header contains `value`.
    pub async fn uid_search_header(&mut self, field: &str, value: &str) -> Result<Vec<u32>> {
        let responses = self
            .execute(&Command::UidSearchHeader {
                field: field.to_string(),
                value: value.to_string(),
            })
            .await?;

        Ok(responses
            .into_iter()
            .filter_map(|r| match r {
                Response::Untagged(Untagged::Search(ids)) => Some(ids),
                _ => None,
            })
            .flatten()
            .collect())
    }

    /// Adds the `\Deleted` flag to the given UIDs.
    pub async fn uid_store_deleted(&mut self, uids: &[u32]) -> Result<()> {
        if uids.is_empty() {
            return Ok(());
        }
        self.execute(&Command::UidStoreDeleted {
            uids: uids.to_vec(),
        })
        .await
        .map(|_| ())
    }

    /// Capabilities the server advertises now, upper-cased.
    pub async fn capabilities(&mut self) -> Result<Vec<String>> {
        let responses = self.execute(&Command::Capability).await?;
        Ok(responses
            .into_iter()
            .filter_map(|r| match r {
                Response::Untagged(Untagged::Capability(atoms)) => Some(atoms),
                _ => None,
            })
            .flatten()
            .collect())
    }

    /// Permanently removes every flagged message in the mailbox; returns the
    /// expunged sequence numbers.
    pub async fn expunge(&mut self) -> Result<Vec<u32>> {
        let responses = self.execute(&Command::Expunge).await?;
        Ok(expunged(responses))
    }

    /// Expunges only `uids` when the server supports UIDPLUS, otherwise
    /// falls back to a plain EXPUNGE.
    pub async fn expunge_uids(&mut self, uids: &[u32]) -> Result<Vec<u32>> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }
        if !self.capabilities().await?.iter().any(|c| c == "UIDPLUS") {
            tracing::debug!("server lacks UIDPLUS, expunging every flagged message");
            return self.expunge().await;
        }
        let responses = self
            .execute(&Command::UidExpunge {
                uids: uids.to_vec(),
            })
            .await?;
        Ok(expunged(responses))
    }

    /// Ends the session.
    pub async fn logout(mut self) -> Result<()> {
        logout_inner(&mut self).await
    }
}

fn expunged(responses: Vec<Response>) -> Vec<u32> {
    responses
        .into_iter()
        .filter_map(|r| match r {
            Response::Untagged(Untagged::Expunge(n)) => Some(n),
            _ => None,
        })
        .collect()
}
