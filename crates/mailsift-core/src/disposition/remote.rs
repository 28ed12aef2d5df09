//! Remote-protocol deletion by Message-ID.

use std::future::Future;
use std::time::Duration;

use mailsift_imap::{Client, NotAuthenticated};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::config::ImapSettings;

/// Result of a remote delete that reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDeleteOutcome {
    /// At least one message was marked and expunged.
    Deleted,
    /// Nothing on the server carries that identifier. Deleting an already
    /// deleted message lands here too.
    NotFound,
}

/// Remote deletion failures.
#[derive(Debug, Error)]
pub enum RemoteDeleteError {
    /// No remote mailbox is configured.
    #[error("no remote mailbox configured")]
    NotConfigured,

    /// No password was supplied.
    #[error("no password for {0}")]
    MissingPassword(String),

    /// The IMAP exchange failed.
    #[error("IMAP error: {0}")]
    Imap(#[from] mailsift_imap::Error),

    /// The server stopped answering mid-session.
    #[error("IMAP session did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Deletes a message from a remote mailbox.
///
/// Implementations must be idempotent: repeating a delete is safe and
/// reports [`RemoteDeleteOutcome::NotFound`] once the message is gone.
pub trait RemoteDeleter {
    /// Locates the message by identifier, marks it deleted and expunges.
    fn delete(
        &self,
        message_id: &str,
    ) -> impl Future<Output = Result<RemoteDeleteOutcome, RemoteDeleteError>> + Send;
}

/// [`RemoteDeleter`] over a fresh IMAP session per call.
#[derive(Debug, Clone)]
pub struct ImapRemoteDeleter {
    settings: Option<ImapSettings>,
}

impl ImapRemoteDeleter {
    /// Creates a deleter. With `None` every delete fails as not configured.
    #[must_use]
    pub const fn new(settings: Option<ImapSettings>) -> Self {
        Self { settings }
    }

    async fn delete_inner(
        settings: &ImapSettings,
        message_id: &str,
    ) -> Result<RemoteDeleteOutcome, RemoteDeleteError> {
        let password = settings
            .password
            .as_deref()
            .ok_or_else(|| RemoteDeleteError::MissingPassword(settings.username.clone()))?;

        let client = mailsift_imap::connect(&settings.connection_config()).await?;
        Self::bounded_session(client, settings, password, message_id).await
    }

    /// Runs [`Self::session`] under the configured timeout.
    async fn bounded_session<S>(
        client: Client<S, NotAuthenticated>,
        settings: &ImapSettings,
        password: &str,
        message_id: &str,
    ) -> Result<RemoteDeleteOutcome, RemoteDeleteError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let limit = settings.session_timeout();
        tokio::time::timeout(limit, Self::session(client, settings, password, message_id))
            .await
            .unwrap_or_else(|_| {
                warn!(message_id, seconds = limit.as_secs(), "IMAP session timed out");
                Err(RemoteDeleteError::TimedOut(limit))
            })
    }

    async fn session<S>(
        client: Client<S, NotAuthenticated>,
        settings: &ImapSettings,
        password: &str,
        message_id: &str,
    ) -> Result<RemoteDeleteOutcome, RemoteDeleteError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let client = client.login(&settings.username, password).await?;
        let mut mailbox = client.select(&settings.mailbox).await?;

        let uids = mailbox.uid_search_header("Message-ID", message_id).await?;
        debug!(message_id, matches = uids.len(), mailbox = %settings.mailbox, "remote lookup");

        let outcome = if uids.is_empty() {
            RemoteDeleteOutcome::NotFound
        } else {
            mailbox.uid_store_deleted(&uids).await?;
            let expunged = mailbox.expunge_uids(&uids).await?;
            info!(message_id, expunged = expunged.len(), "remote message deleted");
            RemoteDeleteOutcome::Deleted
        };

        mailbox.logout().await?;
        Ok(outcome)
    }
}

impl RemoteDeleter for ImapRemoteDeleter {
    async fn delete(&self, message_id: &str) -> Result<RemoteDeleteOutcome, RemoteDeleteError> {
        let settings = self
            .settings
            .as_ref()
            .ok_or(RemoteDeleteError::NotConfigured)?;
        Self::delete_inner(settings, message_id).await
    }
}
