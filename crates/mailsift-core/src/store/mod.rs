//! Maildir-style message store.
//!
//! Each folder is a plain directory and every file in it is one message.
//! Filenames are opaque and preserved across moves, so a message lives in
//! exactly one folder at a time.

mod search;
mod snapshot;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

pub use search::SearchCriteria;
pub use snapshot::{Snapshot, SnapshotEntry, write_snapshot};

use crate::config::StoreConfig;
use crate::reader::Message;
use crate::{Error, Result};

/// A mailbox state, backed by one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Folder {
    /// New mail waiting for triage.
    Inbox,
    /// Kept for attention.
    Important,
    /// Done, kept for reference.
    Archive,
    /// Needs review but no reply.
    FollowUp,
    /// Deleted (remote copy already expunged).
    Trash,
    /// Junk.
    Spam,
    /// Outgoing mail.
    Sent,
}

impl Folder {
    /// Every folder, in display order.
    pub const ALL: [Self; 7] = [
        Self::Inbox,
        Self::Important,
        Self::Archive,
        Self::FollowUp,
        Self::Trash,
        Self::Spam,
        Self::Sent,
    ];

    /// Parse a folder name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "inbox" => Some(Self::Inbox),
            "important" => Some(Self::Important),
            "archive" => Some(Self::Archive),
            "followup" | "follow_up" | "follow-up" | "review" => Some(Self::FollowUp),
            "trash" => Some(Self::Trash),
            "spam" | "junk" => Some(Self::Spam),
            "sent" => Some(Self::Sent),
            _ => None,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::Important => "Important",
            Self::Archive => "Archive",
            Self::FollowUp => "FollowUp",
            Self::Trash => "Trash",
            Self::Spam => "Spam",
            Self::Sent => "Sent",
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a move whose source may have disappeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The file now lives at this path.
    Moved(PathBuf),
    /// The source was gone at move time.
    AlreadyGone,
}

/// Message count of one folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderStatus {
    /// The folder.
    pub folder: Folder,
    /// Number of message files.
    pub count: usize,
}

/// Directory-backed message store.
#[derive(Debug, Clone)]
pub struct MailStore {
    config: StoreConfig,
}

impl MailStore {
    /// Creates a store over the configured layout. Nothing is touched on disk.
    #[must_use]
    pub const fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Directory of a folder.
    #[must_use]
    pub fn folder_path(&self, folder: Folder) -> PathBuf {
        let name = match folder {
            Folder::Inbox => &self.config.inbox,
            Folder::Important => &self.config.important,
            Folder::Archive => &self.config.archive,
            Folder::FollowUp => &self.config.follow_up,
            Folder::Trash => &self.config.trash,
            Folder::Spam => &self.config.spam,
            Folder::Sent => &self.config.sent,
        };
        self.config.root.join(name)
    }

    /// Checks that the root is a writable directory and creates any missing
    /// folder directories.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreUnavailable`, which aborts a run.
    pub async fn ensure_ready(&self) -> Result<()> {
        let root = &self.config.root;
        let metadata = tokio::fs::metadata(root)
            .await
            .map_err(|e| unavailable(root, &e.to_string()))?;
        if !metadata.is_dir() {
            return Err(unavailable(root, "not a directory"));
        }
        if metadata.permissions().readonly() {
            return Err(unavailable(root, "read-only"));
        }

        for folder in Folder::ALL {
            let path = self.folder_path(folder);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|e| unavailable(&path, &e.to_string()))?;
        }
        Ok(())
    }

    /// Point-in-time listing of the message files in a folder, sorted by name.
    ///
    /// Maildir names lead with the delivery time, so name order is oldest
    /// first. Dot-files and subdirectories are skipped. A missing folder is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub async fn list(&self, folder: Folder) -> Result<Vec<String>> {
        let path = self.folder_path(folder);
        let mut entries = match tokio::fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 filename");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            // The entry may vanish between listing and stat.
            match entry.file_type().await {
                Ok(kind) if kind.is_file() => files.push(name),
                _ => {}
            }
        }

        files.sort();
        Ok(files)
    }

    /// Whether a message file is present in a folder.
    pub async fn contains(&self, folder: Folder, file: &str) -> bool {
        tokio::fs::try_exists(self.folder_path(folder).join(file))
            .await
            .unwrap_or(false)
    }

    /// Reads the raw bytes of a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn read_raw(&self, folder: Folder, file: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.folder_path(folder).join(file)).await?)
    }

    /// Moves a message file into another folder, optionally under a
    /// category subfolder.
    ///
    /// The move is a rename. When source and destination are on different
    /// filesystems the file is copied, the copy's length is verified, and
    /// only then is the source removed. A vanished source yields
    /// [`MoveOutcome::AlreadyGone`].
    ///
    /// # Errors
    ///
    /// Returns an error if the destination already holds a file of the same
    /// name or on any other I/O failure.
    pub async fn move_message(
        &self,
        file: &str,
        from: Folder,
        to: Folder,
        category: Option<&str>,
    ) -> Result<MoveOutcome> {
        let source = self.folder_path(from).join(file);
        let mut dest_dir = self.folder_path(to);
        if let Some(sub) = category.and_then(sanitize_category) {
            dest_dir.push(sub);
        }
        tokio::fs::create_dir_all(&dest_dir).await?;
        let dest = dest_dir.join(file);

        if tokio::fs::try_exists(&dest).await? {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", dest.display()),
            )));
        }

        match tokio::fs::rename(&source, &dest).await {
            Ok(()) => Ok(MoveOutcome::Moved(dest)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(file, folder = %from, "message already gone");
                Ok(MoveOutcome::AlreadyGone)
            }
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                copy_then_remove(&source, &dest).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Message count of every folder. Missing folders count as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a folder exists but cannot be read.
    pub async fn status(&self) -> Result<Vec<FolderStatus>> {
        let mut status = Vec::with_capacity(Folder::ALL.len());
        for folder in Folder::ALL {
            let count = self.list(folder).await?.len();
            status.push(FolderStatus { folder, count });
        }
        Ok(status)
    }

    /// Reads every message in a folder that satisfies `criteria`.
    ///
    /// Files that fail to parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be listed.
    pub async fn search(&self, folder: Folder, criteria: &SearchCriteria) -> Result<Vec<Message>> {
        let mut found = Vec::new();
        for file in self.list(folder).await? {
            match Message::load(self, folder, &file).await {
                Ok(message) if criteria.matches(&message) => found.push(message),
                Ok(_) => {}
                Err(e) => tracing::warn!(file, error = %e, "skipping unreadable message"),
            }
        }
        Ok(found)
    }
}

/// Cross-device fallback. A crash between copy and remove leaves a duplicate,
/// never a loss.
async fn copy_then_remove(source: &Path, dest: &Path) -> Result<MoveOutcome> {
    let copied = match tokio::fs::copy(source, dest).await {
        Ok(n) => n,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(MoveOutcome::AlreadyGone),
        Err(e) => return Err(e.into()),
    };

    let expected = tokio::fs::metadata(source).await?.len();
    let written = tokio::fs::metadata(dest).await?.len();
    if copied != expected || written != expected {
        let _ = tokio::fs::remove_file(dest).await;
        return Err(Error::Io(io::Error::other(format!(
            "copy verification failed for {}",
            source.display()
        ))));
    }

    tokio::fs::remove_file(source).await?;
    Ok(MoveOutcome::Moved(dest.to_path_buf()))
}

/// Reduces a free-form category label to a single safe path component.
fn sanitize_category(category: &str) -> Option<String> {
    let cleaned: String = category
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| c == '_' || c.is_whitespace());
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn unavailable(path: &Path, reason: &str) -> Error {
    Error::StoreUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Store rooted in a fresh temporary directory with all folders created.
    pub(crate) async fn temp_store() -> (tempfile::TempDir, MailStore) {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            root: dir.path().to_path_buf(),
            ..StoreConfig::default()
        };
        let store = MailStore::new(config);
        store.ensure_ready().await.unwrap();
        (dir, store)
    }

    pub(crate) async fn put(store: &MailStore, folder: Folder, file: &str, raw: &str) {
        tokio::fs::write(store.folder_path(folder).join(file), raw)
            .await
            .unwrap();
    }

    #[test]
    fn test_folder_parse() {
        assert_eq!(Folder::parse("FollowUp"), Some(Folder::FollowUp));
        assert_eq!(Folder::parse("review"), Some(Folder::FollowUp));
        assert_eq!(Folder::parse("junk"), Some(Folder::Spam));
        assert_eq!(Folder::parse("drafts"), None);
    }

    #[test]
    fn test_sanitize_category() {
        assert_eq!(sanitize_category("Receipts"), Some("Receipts".to_string()));
        assert_eq!(sanitize_category("../../etc"), Some("etc".to_string()));
        assert_eq!(sanitize_category("a/b"), Some("a_b".to_string()));
        assert_eq!(sanitize_category("  /  "), None);
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_skips_dotfiles() {
        let (_dir, store) = temp_store().await;
        put(&store, Folder::Inbox, "b", "x").await;
        put(&store, Folder::Inbox, "a", "x").await;
        put(&store, Folder::Inbox, ".hidden", "x").await;
        tokio::fs::create_dir(store.folder_path(Folder::Inbox).join("sub"))
            .await
            .unwrap();

        assert_eq!(store.list(Folder::Inbox).await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_list_orders_maildir_names_oldest_first() {
        let (_dir, store) = temp_store().await;
        put(&store, Folder::Inbox, "1712000000.M2P9Q1.host:2,S", "x").await;
        put(&store, Folder::Inbox, "1700000000.M1P7Q3.host:2,", "x").await;
        put(&store, Folder::Inbox, "1711000000.M5P1Q2.host:2,RS", "x").await;

        assert_eq!(
            store.list(Folder::Inbox).await.unwrap(),
            vec![
                "1700000000.M1P7Q3.host:2,",
                "1711000000.M5P1Q2.host:2,RS",
                "1712000000.M2P9Q1.host:2,S",
            ]
        );
    }

    #[tokio::test]
    async fn test_move_is_exclusive() {
        let (_dir, store) = temp_store().await;
        put(&store, Folder::Inbox, "m1", "body").await;

        let outcome = store
            .move_message("m1", Folder::Inbox, Folder::Archive, None)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            MoveOutcome::Moved(store.folder_path(Folder::Archive).join("m1"))
        );
        assert!(!store.contains(Folder::Inbox, "m1").await);
        assert!(store.contains(Folder::Archive, "m1").await);
    }

    #[tokio::test]
    async fn test_move_into_category_subfolder() {
        let (_dir, store) = temp_store().await;
        put(&store, Folder::Inbox, "m1", "body").await;

        store
            .move_message("m1", Folder::Inbox, Folder::Archive, Some("Receipts"))
            .await
            .unwrap();

        let path = store.folder_path(Folder::Archive).join("Receipts").join("m1");
        assert!(tokio::fs::try_exists(path).await.unwrap());
    }

    #[tokio::test]
    async fn test_move_vanished_source() {
        let (_dir, store) = temp_store().await;
        let outcome = store
            .move_message("ghost", Folder::Inbox, Folder::Archive, None)
            .await
            .unwrap();
        assert_eq!(outcome, MoveOutcome::AlreadyGone);
    }

    #[tokio::test]
    async fn test_move_refuses_to_overwrite() {
        let (_dir, store) = temp_store().await;
        put(&store, Folder::Inbox, "m1", "new").await;
        put(&store, Folder::Archive, "m1", "old").await;

        assert!(
            store
                .move_message("m1", Folder::Inbox, Folder::Archive, None)
                .await
                .is_err()
        );
        assert!(store.contains(Folder::Inbox, "m1").await);
    }

    #[tokio::test]
    async fn test_copy_then_remove() {
        let (_dir, store) = temp_store().await;
        put(&store, Folder::Inbox, "m1", "payload").await;
        let source = store.folder_path(Folder::Inbox).join("m1");
        let dest = store.folder_path(Folder::Trash).join("m1");

        let outcome = copy_then_remove(&source, &dest).await.unwrap();

        assert_eq!(outcome, MoveOutcome::Moved(dest.clone()));
        assert!(!tokio::fs::try_exists(&source).await.unwrap());
        assert_eq!(tokio::fs::read_to_string(&dest).await.unwrap(), "payload");
    }

    #[tokio::test]
    async fn test_status_counts() {
        let (_dir, store) = temp_store().await;
        put(&store, Folder::Inbox, "a", "x").await;
        put(&store, Folder::Inbox, "b", "x").await;
        put(&store, Folder::Spam, "c", "x").await;

        let status = store.status().await.unwrap();
        let count = |folder: Folder| status.iter().find(|s| s.folder == folder).unwrap().count;
        assert_eq!(count(Folder::Inbox), 2);
        assert_eq!(count(Folder::Spam), 1);
        assert_eq!(count(Folder::Trash), 0);
        assert_eq!(status.len(), 7);
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = MailStore::new(StoreConfig {
            root: dir.path().join("not-mounted"),
            ..StoreConfig::default()
        });
        let err = store.ensure_ready().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
