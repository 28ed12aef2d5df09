//! Manual pass over a folder, usually FollowUp, one message at a time.

use std::future::Future;
use std::io;

use tracing::{info, warn};

use super::{CancelToken, ConfirmationGate, ReportEntry, RunReport};
use crate::disposition::{Disposition, DispositionEngine, Outcome, RemoteDeleter, ReplyDrafter};
use crate::reader::Message;
use crate::store::Folder;
use crate::{Error, Result};

/// What to do with a reviewed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewChoice {
    /// Draft a reply, then send or save it.
    Reply,
    /// Two-tier delete.
    Delete,
    /// Move to Archive.
    Archive,
    /// Leave it where it is.
    Skip,
}

impl ReviewChoice {
    const fn disposition(self) -> Disposition {
        match self {
            Self::Reply => Disposition::Reply,
            Self::Delete => Disposition::Delete,
            Self::Archive => Disposition::Archive,
            Self::Skip => Disposition::None,
        }
    }
}

/// A gate that also picks the action for each reviewed message.
pub trait ReviewGate: ConfirmationGate {
    /// Chooses what happens to `message`.
    fn choose(&self, message: &Message) -> impl Future<Output = ReviewChoice> + Send;
}

/// Walks `folder` and applies the gate's choice to each message.
///
/// Deletes go through the remote-first path of `engine`. A reply is drafted
/// and only sent once the gate confirms it. Cancellation stops before the
/// next message.
///
/// # Errors
///
/// Returns [`Error::StoreUnavailable`] when the store is unusable, or an
/// error if the folder cannot be listed.
pub async fn review_folder<R, D, G>(
    engine: &DispositionEngine<R, D>,
    folder: Folder,
    gate: &G,
    cancel: &CancelToken,
) -> Result<RunReport>
where
    R: RemoteDeleter,
    D: ReplyDrafter,
    G: ReviewGate,
{
    let store = engine.store();
    store.ensure_ready().await?;
    let files = store.list(folder).await?;
    info!(%folder, messages = files.len(), "reviewing folder");

    let mut report = RunReport::default();
    for file in &files {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let message = match Message::load(store, folder, file).await {
            Ok(message) => message,
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                warn!(file = %file, "message already gone");
                continue;
            }
            Err(e) => {
                warn!(file = %file, error = %e, "unreadable message");
                report.record(ReportEntry {
                    file: file.clone(),
                    subject: String::new(),
                    disposition: None,
                    rule_id: None,
                    outcome: Outcome::Failed(e.to_string()),
                });
                continue;
            }
        };

        let choice = gate.choose(&message).await;
        let outcome = match choice {
            ReviewChoice::Reply => match engine.draft_reply(&message).await {
                Ok(draft) => {
                    let send = gate.confirm_reply(&message, &draft).await;
                    engine.finish_reply(&message, &draft, send).await
                }
                Err(e) => Outcome::Failed(e.to_string()),
            },
            ReviewChoice::Delete | ReviewChoice::Archive => {
                engine.apply(&message, choice.disposition(), None).await
            }
            ReviewChoice::Skip => Outcome::Skipped,
        };
        report.record(ReportEntry {
            file: message.file,
            subject: message.subject,
            disposition: Some(choice.disposition()),
            rule_id: None,
            outcome,
        });
    }
    report.batches = 1;

    info!(
        disposed = report.disposed.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "review finished"
    );
    Ok(report)
}
