//! JSON snapshot of what is left in the inbox after a run.

use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::reader::Message;

/// One remaining message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Filename in the inbox.
    pub file: String,
    /// Subject.
    pub subject: String,
    /// Sender.
    pub sender: String,
    /// Display date.
    pub date: String,
}

/// Snapshot file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was taken.
    pub timestamp: DateTime<Local>,
    /// Messages still in the inbox.
    pub remaining_inbox: Vec<SnapshotEntry>,
}

/// Writes the snapshot to `path`, creating parent directories, and returns
/// the number of remaining messages.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub async fn write_snapshot(path: &Path, remaining: &[Message]) -> Result<usize> {
    let snapshot = Snapshot {
        timestamp: Local::now(),
        remaining_inbox: remaining
            .iter()
            .map(|m| SnapshotEntry {
                file: m.file.clone(),
                subject: m.subject.clone(),
                sender: m.sender.clone(),
                date: m.date_display.clone(),
            })
            .collect(),
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_string_pretty(&snapshot)?).await?;

    tracing::debug!(path = %path.display(), remaining = remaining.len(), "inbox snapshot written");
    Ok(snapshot.remaining_inbox.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::Folder;

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("snapshot.json");
        let remaining = vec![Message {
            file: "1700000000.M1.host".to_string(),
            folder: Folder::Inbox,
            sender: "alice@example.com".to_string(),
            subject: "Lunch?".to_string(),
            body: "Are you free".to_string(),
            date: None,
            date_display: "Unknown Date".to_string(),
            message_id: None,
        }];

        let count = write_snapshot(&path, &remaining).await.unwrap();
        assert_eq!(count, 1);

        let written: Snapshot =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(written.remaining_inbox[0].subject, "Lunch?");
        assert_eq!(written.remaining_inbox[0].date, "Unknown Date");
    }
}
