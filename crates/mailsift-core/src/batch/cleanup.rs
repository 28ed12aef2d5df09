//! Cleanup analysis over the busiest senders of a folder.
//!
//! The LLM sees every message of the top senders and names the files it
//! would delete. Nothing is applied by the analysis itself; recommendations
//! only reach the disposition engine through [`apply_cleanup`] and a
//! [`ConfirmationGate`].

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use super::{ConfirmationGate, RunReport};
use crate::classifier::{ClassificationResult, LlmClient};
use crate::disposition::{Disposition, DispositionEngine, Outcome, RemoteDeleter, ReplyDrafter};
use crate::reader::Message;
use crate::store::{Folder, MailStore};
use crate::{Error, Result};

/// Senders looked at when no other count is given.
pub const DEFAULT_TOP_SENDERS: usize = 3;

#[allow(clippy::expect_used)]
static DELETE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:[-*]\s*)?DELETE:\s*(\S+)\s*$").expect("delete line regex must compile")
});

/// All messages of one sender, in folder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderGroup {
    /// From header as read.
    pub sender: String,
    /// The sender's messages.
    pub messages: Vec<Message>,
}

/// Groups the messages of `folder` by sender and keeps the `n` largest
/// groups. Ties go to the alphabetically first sender.
///
/// # Errors
///
/// Returns an error if the folder cannot be listed. Unreadable messages are
/// skipped.
pub async fn top_senders(store: &MailStore, folder: Folder, n: usize) -> Result<Vec<SenderGroup>> {
    let mut by_sender: HashMap<String, Vec<Message>> = HashMap::new();
    for file in store.list(folder).await? {
        match Message::load(store, folder, &file).await {
            Ok(message) => by_sender.entry(message.sender.clone()).or_default().push(message),
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(file = %file, error = %e, "skipping unreadable message"),
        }
    }

    let mut groups: Vec<SenderGroup> = by_sender
        .into_iter()
        .map(|(sender, messages)| SenderGroup { sender, messages })
        .collect();
    groups.sort_by(|a, b| {
        b.messages
            .len()
            .cmp(&a.messages.len())
            .then_with(|| a.sender.cmp(&b.sender))
    });
    groups.truncate(n);
    Ok(groups)
}

/// What the LLM recommended for the top senders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// The groups shown to the LLM.
    pub groups: Vec<SenderGroup>,
    /// Messages recommended for deletion, restricted to files in `groups`.
    pub recommended: Vec<Message>,
    /// The response with the `DELETE:` lines removed.
    pub explanation: String,
}

impl CleanupReport {
    /// Recommendations as DELETE results for a confirmation gate.
    #[must_use]
    pub fn proposals(&self) -> Vec<ClassificationResult> {
        self.recommended
            .iter()
            .map(|message| ClassificationResult {
                message: message.clone(),
                summary: String::new(),
                disposition: Disposition::Delete,
                raw_response: self.explanation.clone(),
                category: None,
            })
            .collect()
    }
}

/// Asks an LLM which messages of the busiest senders can go.
pub struct CleanupAnalysis<L> {
    llm: L,
    top: usize,
}

impl<L: LlmClient> CleanupAnalysis<L> {
    /// Creates an analysis over the [`DEFAULT_TOP_SENDERS`] busiest senders.
    pub const fn new(llm: L) -> Self {
        Self {
            llm,
            top: DEFAULT_TOP_SENDERS,
        }
    }

    /// Looks at the `top` busiest senders instead.
    #[must_use]
    pub const fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    /// Runs the analysis over `folder`.
    ///
    /// Returns `Ok(None)` when the LLM request fails. An empty folder yields
    /// an empty report without contacting the LLM.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be listed.
    pub async fn analyze(&self, store: &MailStore, folder: Folder) -> Result<Option<CleanupReport>> {
        let groups = top_senders(store, folder, self.top).await?;
        if groups.is_empty() {
            info!(%folder, "no messages to analyze");
            return Ok(Some(CleanupReport {
                groups,
                recommended: Vec::new(),
                explanation: String::new(),
            }));
        }

        let response = match self.llm.complete(&cleanup_prompt(&groups)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "cleanup analysis request failed");
                return Ok(None);
            }
        };

        let named: Vec<&str> = DELETE_LINE
            .captures_iter(&response)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .collect();
        let recommended: Vec<Message> = groups
            .iter()
            .flat_map(|group| &group.messages)
            .filter(|message| named.contains(&message.file.as_str()))
            .cloned()
            .collect();
        if recommended.len() < named.len() {
            warn!(
                named = named.len(),
                known = recommended.len(),
                "ignoring recommendations for files outside the analyzed senders"
            );
        }

        let explanation = DELETE_LINE.replace_all(&response, "").trim().to_string();
        info!(senders = groups.len(), recommended = recommended.len(), "cleanup analysis finished");
        Ok(Some(CleanupReport {
            groups,
            recommended,
            explanation,
        }))
    }
}

fn cleanup_prompt(groups: &[SenderGroup]) -> String {
    let mut details = format!(
        "Top {} most frequent email senders and their emails:\n\n",
        groups.len()
    );
    for group in groups {
        let _ = writeln!(details, "Sender: {} (Total Emails: {})", group.sender, group.messages.len());
        for message in &group.messages {
            let _ = writeln!(
                details,
                "  - Filename: {}, Date: {}, Subject: {}",
                message.file, message.date_display, message.subject
            );
        }
        details.push('\n');
    }

    format!(
        "I have a batch of emails from my most frequent senders:\n\n\
         {details}\
         Decide which of these emails can be deleted. List each one on its own line as\n\
         DELETE: <filename>\n\
         using the filenames exactly as given, then briefly explain your reasoning per sender."
    )
}

/// Deletes the recommendations the gate selects, through the two-tier
/// DELETE of `engine`.
pub async fn apply_cleanup<R, D, G>(
    engine: &DispositionEngine<R, D>,
    report: &CleanupReport,
    gate: &G,
) -> RunReport
where
    R: RemoteDeleter,
    D: ReplyDrafter,
    G: ConfirmationGate,
{
    let mut run = RunReport::default();
    let proposals = report.proposals();
    if proposals.is_empty() {
        return run;
    }

    let selection = gate.confirm_batch(&proposals).await;
    for (index, result) in proposals.iter().enumerate() {
        let outcome = if selection.includes(index) {
            engine.apply(&result.message, Disposition::Delete, None).await
        } else {
            Outcome::Skipped
        };
        run.record_result(result, outcome);
    }
    run.batches = 1;
    run
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::batch::{AutoApprove, Selection};
    use crate::store::tests::{put, temp_store};
    use crate::testing::{MockRemote, MockReplier, ScriptedGate, ScriptedLlm};

    fn raw(sender: &str, file: &str) -> String {
        format!("From: {sender}\nSubject: About {file}\nMessage-ID: <{file}@example.com>\n\nbody")
    }

    async fn inbox() -> (tempfile::TempDir, MailStore) {
        let (dir, store) = temp_store().await;
        for (file, sender) in [
            ("a1", "promo@shop.io"),
            ("a2", "promo@shop.io"),
            ("a3", "promo@shop.io"),
            ("b1", "news@paper.com"),
            ("b2", "news@paper.com"),
            ("c1", "alice@example.com"),
            ("d1", "bob@example.com"),
        ] {
            put(&store, Folder::Inbox, file, &raw(sender, file)).await;
        }
        (dir, store)
    }

    #[tokio::test]
    async fn test_top_senders_by_count_then_name() {
        let (_dir, store) = inbox().await;
        let groups = top_senders(&store, Folder::Inbox, 3).await.unwrap();

        let summary: Vec<(&str, usize)> = groups
            .iter()
            .map(|g| (g.sender.as_str(), g.messages.len()))
            .collect();
        assert_eq!(
            summary,
            vec![("promo@shop.io", 3), ("news@paper.com", 2), ("alice@example.com", 1)]
        );
        assert_eq!(groups[0].messages[0].file, "a1");
    }

    #[tokio::test]
    async fn test_analysis_only_recommends() {
        let (_dir, store) = inbox().await;
        let llm = ScriptedLlm::new([
            "DELETE: a1\n- DELETE: b2\nDELETE: c1\nThe promotions are stale.",
        ]);
        let analysis = CleanupAnalysis::new(llm).with_top(2);

        let report = analysis.analyze(&store, Folder::Inbox).await.unwrap().unwrap();

        let files: Vec<&str> = report.recommended.iter().map(|m| m.file.as_str()).collect();
        assert_eq!(files, vec!["a1", "b2"]);
        assert_eq!(report.explanation, "The promotions are stale.");
        let prompts = analysis.llm.prompts();
        let prompt = &prompts[0];
        assert!(prompt.contains("Sender: promo@shop.io (Total Emails: 3)"));
        assert!(prompt.contains("  - Filename: b1, Date: Unknown Date, Subject: About b1"));
        assert!(!prompt.contains("alice@example.com"));
        assert_eq!(store.list(Folder::Inbox).await.unwrap().len(), 7);
        assert!(store.list(Folder::Trash).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_request_gives_no_report() {
        let (_dir, store) = inbox().await;
        let analysis = CleanupAnalysis::new(ScriptedLlm::default());
        assert!(analysis.analyze(&store, Folder::Inbox).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_folder_skips_llm() {
        let (_dir, store) = temp_store().await;
        let analysis = CleanupAnalysis::new(ScriptedLlm::default());
        let report = analysis.analyze(&store, Folder::Inbox).await.unwrap().unwrap();
        assert!(report.groups.is_empty());
        assert!(analysis.llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_apply_deletes_only_confirmed() {
        let (_dir, store) = inbox().await;
        let analysis = CleanupAnalysis::new(ScriptedLlm::new(["DELETE: a1\nDELETE: a2"]));
        let report = analysis.analyze(&store, Folder::Inbox).await.unwrap().unwrap();
        let engine = DispositionEngine::new(store, MockRemote::deleting(), MockReplier::default());

        let gate = ScriptedGate::new(Selection::Some(vec![1]));
        let run = apply_cleanup(&engine, &report, &gate).await;

        assert_eq!(run.disposed.len(), 1);
        assert_eq!(run.disposed[0].file, "a2");
        assert_eq!(run.skipped[0].file, "a1");
        assert!(engine.store().contains(Folder::Trash, "a2").await);
        assert!(engine.store().contains(Folder::Inbox, "a1").await);
    }

    #[tokio::test]
    async fn test_apply_goes_through_remote_delete() {
        let (_dir, store) = inbox().await;
        let analysis = CleanupAnalysis::new(ScriptedLlm::new(["DELETE: b1"]));
        let report = analysis.analyze(&store, Folder::Inbox).await.unwrap().unwrap();
        let engine = DispositionEngine::new(store, MockRemote::not_found(), MockReplier::default());

        let run = apply_cleanup(&engine, &report, &AutoApprove).await;

        assert!(matches!(run.failed[0].outcome, Outcome::DeleteFailed(_)));
        assert!(engine.store().contains(Folder::Inbox, "b1").await);
    }
}
