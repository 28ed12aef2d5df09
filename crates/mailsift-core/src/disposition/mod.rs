//! Executes a resolved disposition against the message store.
//!
//! ARCHIVE, REVIEW and IMPORTANT are folder moves. DELETE is two-tier: the
//! message is deleted on the remote mailbox first, and only a confirmed
//! remote delete moves the local file into Trash. A failed or missing remote
//! step leaves the local file where it is and reports
//! [`Outcome::DeleteFailed`]. REPLY never moves the source file.

mod remote;
mod reply;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use remote::{ImapRemoteDeleter, RemoteDeleteError, RemoteDeleteOutcome, RemoteDeleter};
pub use reply::{LlmReplyDrafter, ReplyDrafter, ReplyError};

use crate::reader::Message;
use crate::store::{Folder, MailStore, MoveOutcome};

/// Terminal classification outcome for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Disposition {
    /// Move to Archive.
    Archive,
    /// Two-tier delete.
    Delete,
    /// Move to FollowUp.
    Review,
    /// Draft or send a reply; the message stays put.
    Reply,
    /// Move to Important.
    Important,
    /// Leave the message where it is.
    None,
}

impl Disposition {
    /// Parses a token case-insensitively. `SKIP` is an alias of `NONE`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ARCHIVE" => Some(Self::Archive),
            "DELETE" => Some(Self::Delete),
            "REVIEW" => Some(Self::Review),
            "REPLY" => Some(Self::Reply),
            "IMPORTANT" => Some(Self::Important),
            "NONE" | "SKIP" => Some(Self::None),
            _ => None,
        }
    }

    /// Canonical token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Archive => "ARCHIVE",
            Self::Delete => "DELETE",
            Self::Review => "REVIEW",
            Self::Reply => "REPLY",
            Self::Important => "IMPORTANT",
            Self::None => "NONE",
        }
    }

    /// Folder a move disposition targets.
    #[must_use]
    pub const fn target_folder(&self) -> Option<Folder> {
        match self {
            Self::Archive => Some(Folder::Archive),
            Self::Review => Some(Folder::FollowUp),
            Self::Important => Some(Folder::Important),
            Self::Delete => Some(Folder::Trash),
            Self::Reply | Self::None => None,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What applying a disposition did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file now lives at this path.
    Moved(PathBuf),
    /// The source vanished before the move. Counts as done.
    AlreadyGone,
    /// A reply was sent.
    ReplySent,
    /// A reply draft was saved here.
    ReplyDrafted(PathBuf),
    /// Nothing was done.
    Skipped,
    /// The remote delete did not succeed; the local file is untouched.
    DeleteFailed(String),
    /// Any other per-message failure.
    Failed(String),
}

impl Outcome {
    /// True for outcomes that count as disposed.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(
            self,
            Self::Moved(_) | Self::AlreadyGone | Self::ReplySent | Self::ReplyDrafted(_)
        )
    }

    /// True for outcomes reported as failures.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::DeleteFailed(_) | Self::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moved(path) => write!(f, "moved to {}", path.display()),
            Self::AlreadyGone => f.write_str("already gone"),
            Self::ReplySent => f.write_str("reply sent"),
            Self::ReplyDrafted(path) => write!(f, "draft saved to {}", path.display()),
            Self::Skipped => f.write_str("skipped"),
            Self::DeleteFailed(reason) => write!(f, "delete failed: {reason}"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Applies dispositions through the store and the remote/reply collaborators.
#[derive(Debug, Clone)]
pub struct DispositionEngine<R, D> {
    store: MailStore,
    remote: R,
    replier: D,
}

impl<R, D> DispositionEngine<R, D>
where
    R: RemoteDeleter,
    D: ReplyDrafter,
{
    /// Creates an engine.
    pub const fn new(store: MailStore, remote: R, replier: D) -> Self {
        Self {
            store,
            remote,
            replier,
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &MailStore {
        &self.store
    }

    /// Applies `disposition` to `message`.
    ///
    /// `category` places ARCHIVE and REVIEW moves in a subfolder. REPLY
    /// drafts a reply and saves it without sending; use
    /// [`draft_reply`](Self::draft_reply) and
    /// [`finish_reply`](Self::finish_reply) to send.
    pub async fn apply(
        &self,
        message: &Message,
        disposition: Disposition,
        category: Option<&str>,
    ) -> Outcome {
        let outcome = match disposition {
            Disposition::Archive | Disposition::Review => {
                self.move_to(message, disposition, category).await
            }
            Disposition::Important => self.move_to(message, disposition, None).await,
            Disposition::Delete => self.delete(message).await,
            Disposition::Reply => match self.draft_reply(message).await {
                Ok(reply) => self.finish_reply(message, &reply, false).await,
                Err(e) => Outcome::Failed(e.to_string()),
            },
            Disposition::None => Outcome::Skipped,
        };

        if outcome.is_failure() {
            warn!(file = %message.file, action = %disposition, outcome = %outcome, "disposition failed");
        } else {
            info!(file = %message.file, action = %disposition, outcome = %outcome, "disposition applied");
        }
        outcome
    }

    /// Drafts a reply without persisting it.
    ///
    /// # Errors
    ///
    /// Returns the reply collaborator's error.
    pub async fn draft_reply(&self, message: &Message) -> Result<String, ReplyError> {
        self.replier.draft(message).await
    }

    /// Sends `reply` when `send` is set, otherwise saves it as a draft.
    pub async fn finish_reply(&self, message: &Message, reply: &str, send: bool) -> Outcome {
        if send {
            match self.replier.send(message, reply).await {
                Ok(()) => Outcome::ReplySent,
                Err(e) => Outcome::Failed(e.to_string()),
            }
        } else {
            match self.replier.save_draft(message, reply).await {
                Ok(path) => Outcome::ReplyDrafted(path),
                Err(e) => Outcome::Failed(e.to_string()),
            }
        }
    }

    async fn move_to(
        &self,
        message: &Message,
        disposition: Disposition,
        category: Option<&str>,
    ) -> Outcome {
        let Some(target) = disposition.target_folder() else {
            return Outcome::Skipped;
        };
        if target == message.folder && category.is_none() {
            return Outcome::Skipped;
        }
        match self
            .store
            .move_message(&message.file, message.folder, target, category)
            .await
        {
            Ok(MoveOutcome::Moved(path)) => Outcome::Moved(path),
            Ok(MoveOutcome::AlreadyGone) => Outcome::AlreadyGone,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }

    async fn delete(&self, message: &Message) -> Outcome {
        let Some(message_id) = message.message_id.as_deref() else {
            return Outcome::DeleteFailed("message has no Message-ID".to_string());
        };

        match self.remote.delete(message_id).await {
            Ok(RemoteDeleteOutcome::Deleted) => {
                if !self.store.contains(message.folder, &message.file).await {
                    return Outcome::AlreadyGone;
                }
                self.move_to(message, Disposition::Delete, None).await
            }
            Ok(RemoteDeleteOutcome::NotFound) => {
                Outcome::DeleteFailed(format!("{message_id} not found on remote mailbox"))
            }
            Err(e) => Outcome::DeleteFailed(e.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::tests::{put, temp_store};
    use crate::testing::{MockRemote, MockReplier};

    const RAW: &str = "From: a@example.com\nSubject: Hello\nMessage-ID: <m1@example.com>\n\nbody";

    async fn setup(
        remote: MockRemote,
    ) -> (tempfile::TempDir, DispositionEngine<MockRemote, MockReplier>, Message) {
        let (dir, store) = temp_store().await;
        put(&store, Folder::Inbox, "m1", RAW).await;
        let message = Message::load(&store, Folder::Inbox, "m1").await.unwrap();
        (dir, DispositionEngine::new(store, remote, MockReplier::default()), message)
    }

    #[test]
    fn test_disposition_tokens() {
        assert_eq!(Disposition::parse("skip"), Some(Disposition::None));
        assert_eq!(Disposition::parse(" Archive "), Some(Disposition::Archive));
        assert_eq!(Disposition::parse("KEEP"), None);
        assert_eq!(Disposition::Review.to_string(), "REVIEW");
        assert_eq!(Disposition::Review.target_folder(), Some(Folder::FollowUp));
    }

    #[tokio::test]
    async fn test_archive_moves_into_category() {
        let (_dir, engine, message) = setup(MockRemote::deleting()).await;
        let outcome = engine.apply(&message, Disposition::Archive, Some("Receipts")).await;

        let expected = engine.store().folder_path(Folder::Archive).join("Receipts").join("m1");
        assert_eq!(outcome, Outcome::Moved(expected.clone()));
        assert!(expected.exists());
        assert!(!engine.store().contains(Folder::Inbox, "m1").await);
    }

    #[tokio::test]
    async fn test_important_ignores_category() {
        let (_dir, engine, message) = setup(MockRemote::deleting()).await;
        let outcome = engine.apply(&message, Disposition::Important, Some("x")).await;
        assert_eq!(
            outcome,
            Outcome::Moved(engine.store().folder_path(Folder::Important).join("m1"))
        );
    }

    #[tokio::test]
    async fn test_none_never_touches_store() {
        let (_dir, engine, message) = setup(MockRemote::deleting()).await;
        assert_eq!(engine.apply(&message, Disposition::None, None).await, Outcome::Skipped);
        assert!(engine.store().contains(Folder::Inbox, "m1").await);
        assert_eq!(engine.remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_move_into_own_folder_is_skipped() {
        let (_dir, store) = temp_store().await;
        put(&store, Folder::FollowUp, "m1", RAW).await;
        let message = Message::load(&store, Folder::FollowUp, "m1").await.unwrap();
        let engine = DispositionEngine::new(store, MockRemote::deleting(), MockReplier::default());

        assert_eq!(engine.apply(&message, Disposition::Review, None).await, Outcome::Skipped);
        assert!(engine.store().contains(Folder::FollowUp, "m1").await);

        let outcome = engine.apply(&message, Disposition::Review, Some("Work")).await;
        let expected = engine.store().folder_path(Folder::FollowUp).join("Work").join("m1");
        assert_eq!(outcome, Outcome::Moved(expected));
    }

    #[tokio::test]
    async fn test_vanished_source_is_already_gone() {
        let (_dir, engine, message) = setup(MockRemote::deleting()).await;
        tokio::fs::remove_file(engine.store().folder_path(Folder::Inbox).join("m1"))
            .await
            .unwrap();
        assert_eq!(
            engine.apply(&message, Disposition::Review, None).await,
            Outcome::AlreadyGone
        );
    }

    #[tokio::test]
    async fn test_delete_after_remote_success_moves_to_trash() {
        let (_dir, engine, message) = setup(MockRemote::deleting()).await;
        let outcome = engine.apply(&message, Disposition::Delete, None).await;

        assert_eq!(outcome, Outcome::Moved(engine.store().folder_path(Folder::Trash).join("m1")));
        assert_eq!(engine.remote.requested(), vec!["<m1@example.com>".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_not_found_leaves_file() {
        let (_dir, engine, message) = setup(MockRemote::not_found()).await;
        let outcome = engine.apply(&message, Disposition::Delete, None).await;

        assert!(matches!(outcome, Outcome::DeleteFailed(_)));
        assert!(engine.store().contains(Folder::Inbox, "m1").await);
        assert!(!engine.store().contains(Folder::Trash, "m1").await);
    }

    #[tokio::test]
    async fn test_delete_remote_error_leaves_file() {
        let (_dir, engine, message) = setup(MockRemote::failing()).await;
        let outcome = engine.apply(&message, Disposition::Delete, None).await;

        assert!(outcome.is_failure());
        assert!(engine.store().contains(Folder::Inbox, "m1").await);
    }

    #[tokio::test]
    async fn test_delete_without_message_id() {
        let (_dir, engine, mut message) = setup(MockRemote::deleting()).await;
        message.message_id = None;
        let outcome = engine.apply(&message, Disposition::Delete, None).await;

        assert!(matches!(outcome, Outcome::DeleteFailed(_)));
        assert_eq!(engine.remote.calls(), 0);
        assert!(engine.store().contains(Folder::Inbox, "m1").await);
    }

    #[tokio::test]
    async fn test_delete_when_local_file_vanished() {
        let (_dir, engine, message) = setup(MockRemote::deleting()).await;
        tokio::fs::remove_file(engine.store().folder_path(Folder::Inbox).join("m1"))
            .await
            .unwrap();
        assert_eq!(
            engine.apply(&message, Disposition::Delete, None).await,
            Outcome::AlreadyGone
        );
        assert!(!engine.store().contains(Folder::Trash, "m1").await);
    }

    #[tokio::test]
    async fn test_reply_saves_draft_and_keeps_source() {
        let (_dir, engine, message) = setup(MockRemote::deleting()).await;
        let outcome = engine.apply(&message, Disposition::Reply, None).await;

        assert!(matches!(outcome, Outcome::ReplyDrafted(_)));
        assert!(engine.store().contains(Folder::Inbox, "m1").await);
        assert_eq!(engine.replier.drafted(), 1);
        assert_eq!(engine.replier.sent(), 0);
    }

    #[tokio::test]
    async fn test_finish_reply_sends_when_requested() {
        let (_dir, engine, message) = setup(MockRemote::deleting()).await;
        let reply = engine.draft_reply(&message).await.unwrap();
        assert_eq!(engine.finish_reply(&message, &reply, true).await, Outcome::ReplySent);
        assert_eq!(engine.replier.sent(), 1);
        assert!(engine.store().contains(Folder::Inbox, "m1").await);
    }
}
