//! Drives the rule filter, classifier and disposition engine over a run.
//!
//! Per message: `CANDIDATE -> RULE-DISPOSED | CLASSIFIED ->
//! MOVED | REPLY-PENDING | SKIPPED | DELETE-FAILED`. Every per-message error
//! becomes an entry in the [`RunReport`]; only an unusable store aborts.
//!
//! [`review_folder`] walks a folder by hand and [`CleanupAnalysis`] proposes
//! deletes among the busiest senders; both report through the same types.

mod cleanup;
mod gate;
mod review;

use std::io;

use tracing::{info, warn};

pub use cleanup::{
    CleanupAnalysis, CleanupReport, DEFAULT_TOP_SENDERS, SenderGroup, apply_cleanup, top_senders,
};
pub use gate::{AutoApprove, CancelToken, ConfirmationGate, CooldownPause, Pause, Selection};
pub use review::{ReviewChoice, ReviewGate, review_folder};

use crate::classifier::{ClassificationResult, Classifier, LlmClient};
use crate::disposition::{Disposition, DispositionEngine, Outcome, RemoteDeleter, ReplyDrafter};
use crate::reader::Message;
use crate::rules::{RuleFilter, RuleRepository};
use crate::store::Folder;
use crate::{Error, Result};

/// How a run confirms and paces its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Classify and apply one message at a time; replies need confirmation.
    Interactive,
    /// Classify everything, then confirm once.
    Silent,
    /// Like [`Mode::Silent`] in fixed-size batches with a cooldown between.
    SilentBatched {
        /// Messages per batch.
        size: usize,
        /// Stop after this many batches.
        max_batches: Option<usize>,
    },
}

/// One message's fate in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// Filename.
    pub file: String,
    /// Subject, when the message could be read.
    pub subject: String,
    /// Resolved disposition; `None` when no decision was available.
    pub disposition: Option<Disposition>,
    /// Id of the rule that decided, if any.
    pub rule_id: Option<i64>,
    /// What happened.
    pub outcome: Outcome,
}

/// Summary of a run, split into disposed, skipped and failed messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Messages moved, deleted or replied to.
    pub disposed: Vec<ReportEntry>,
    /// Messages left in place on purpose or for lack of a decision.
    pub skipped: Vec<ReportEntry>,
    /// Messages whose disposition failed; they stay candidates.
    pub failed: Vec<ReportEntry>,
    /// Batches processed.
    pub batches: usize,
    /// Whether the run stopped early on request.
    pub cancelled: bool,
}

impl RunReport {
    fn record(&mut self, entry: ReportEntry) {
        if entry.outcome.is_failure() {
            self.failed.push(entry);
        } else if entry.outcome.is_done() {
            self.disposed.push(entry);
        } else {
            self.skipped.push(entry);
        }
    }

    fn record_result(&mut self, result: &ClassificationResult, outcome: Outcome) {
        self.record(ReportEntry {
            file: result.message.file.clone(),
            subject: result.message.subject.clone(),
            disposition: Some(result.disposition),
            rule_id: None,
            outcome,
        });
    }

    fn record_undecided(&mut self, message: &Message) {
        self.record(ReportEntry {
            file: message.file.clone(),
            subject: message.subject.clone(),
            disposition: None,
            rule_id: None,
            outcome: Outcome::Skipped,
        });
    }

    /// Messages looked at.
    #[must_use]
    pub fn total(&self) -> usize {
        self.disposed.len() + self.skipped.len() + self.failed.len()
    }
}

/// Runs triage over candidates from one source folder, the inbox by default.
pub struct BatchCoordinator<L, R, D, G, P> {
    classifier: Classifier<L>,
    engine: DispositionEngine<R, D>,
    rules: RuleRepository,
    gate: G,
    pause: P,
    cancel: CancelToken,
    body_limit: usize,
    source: Folder,
}

impl<L, R, D, G, P> BatchCoordinator<L, R, D, G, P>
where
    L: LlmClient,
    R: RemoteDeleter,
    D: ReplyDrafter,
    G: ConfirmationGate,
    P: Pause,
{
    /// Creates a coordinator.
    pub fn new(
        classifier: Classifier<L>,
        engine: DispositionEngine<R, D>,
        rules: RuleRepository,
        gate: G,
        pause: P,
    ) -> Self {
        Self {
            classifier,
            engine,
            rules,
            gate,
            pause,
            cancel: CancelToken::new(),
            body_limit: crate::reader::DEFAULT_BODY_LIMIT,
            source: Folder::Inbox,
        }
    }

    /// Uses `cancel` for cooperative stopping.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Sets the cleaned-body length handed to the classifier.
    #[must_use]
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// Reads candidates from `source` instead of the inbox.
    #[must_use]
    pub const fn with_source(mut self, source: Folder) -> Self {
        self.source = source;
        self
    }

    /// The disposition engine.
    pub const fn engine(&self) -> &DispositionEngine<R, D> {
        &self.engine
    }

    /// Point-in-time listing of the source folder, at most `limit` entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be listed.
    pub async fn candidates(&self, limit: Option<usize>) -> Result<Vec<String>> {
        let mut files = self.engine.store().list(self.source).await?;
        if let Some(limit) = limit {
            files.truncate(limit);
        }
        Ok(files)
    }

    /// Processes `candidates` from the source folder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] when the store is unusable. No
    /// other error ends a run.
    pub async fn run(&self, candidates: &[String], mode: Mode) -> Result<RunReport> {
        self.engine.store().ensure_ready().await?;

        let batches: Vec<&[String]> = match mode {
            Mode::Interactive | Mode::Silent => vec![candidates],
            Mode::SilentBatched { size, max_batches } => {
                let chunks = candidates.chunks(size.max(1));
                chunks.take(max_batches.unwrap_or(usize::MAX)).collect()
            }
        };

        let mut report = RunReport::default();
        for (index, batch) in batches.iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            info!(batch = index + 1, of = batches.len(), messages = batch.len(), "processing batch");

            self.run_batch(batch, mode, &mut report).await;
            report.batches += 1;

            let more = index + 1 < batches.len();
            if more && matches!(mode, Mode::SilentBatched { .. }) && !self.cancel.is_cancelled() {
                self.pause.pause().await;
            }
        }
        if self.cancel.is_cancelled() {
            report.cancelled = true;
        }

        info!(
            disposed = report.disposed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            batches = report.batches,
            "run finished"
        );
        Ok(report)
    }

    async fn run_batch(&self, files: &[String], mode: Mode, report: &mut RunReport) {
        let messages = self.read_batch(files, report).await;

        // Rules are re-read every batch so earlier batches only influence
        // later ones through persisted rules.
        let filter = match RuleFilter::load(&self.rules).await {
            Ok(filter) => filter,
            Err(e) => {
                warn!(error = %e, "could not load rules, classifying everything");
                RuleFilter::default()
            }
        };
        let (matched, remaining) = filter.apply(messages, &self.engine).await;
        for hit in matched {
            report.record(ReportEntry {
                file: hit.message.file,
                subject: hit.message.subject,
                disposition: Some(hit.disposition),
                rule_id: Some(hit.rule_id),
                outcome: hit.outcome,
            });
        }

        match mode {
            Mode::Interactive => self.run_interactive(&remaining, report).await,
            Mode::Silent | Mode::SilentBatched { .. } => self.run_silent(&remaining, report).await,
        }
    }

    async fn read_batch(&self, files: &[String], report: &mut RunReport) -> Vec<Message> {
        let mut messages = Vec::with_capacity(files.len());
        for file in files {
            match Message::load_with_limit(self.engine.store(), self.source, file, self.body_limit)
                .await
            {
                Ok(message) => messages.push(message),
                Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(file = %file, "message already gone");
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
                }
            }
        }
        messages
    }

    async fn run_interactive(&self, messages: &[Message], report: &mut RunReport) {
        for message in messages {
            if self.cancel.is_cancelled() {
                report.record_undecided(message);
                continue;
            }
            let Some(result) = self.classifier.classify(message).await else {
                report.record_undecided(message);
                continue;
            };

            let outcome = if result.disposition == Disposition::Reply {
                match self.engine.draft_reply(&result.message).await {
                    Ok(draft) => {
                        let send = self.gate.confirm_reply(&result.message, &draft).await;
                        self.engine.finish_reply(&result.message, &draft, send).await
                    }
                    Err(e) => Outcome::Failed(e.to_string()),
                }
            } else {
                self.engine
                    .apply(&result.message, result.disposition, result.category.as_deref())
                    .await
            };
            report.record_result(&result, outcome);
        }
    }

    async fn run_silent(&self, messages: &[Message], report: &mut RunReport) {
        let mut results = Vec::with_capacity(messages.len());
        for message in messages {
            if self.cancel.is_cancelled() {
                report.record_undecided(message);
                continue;
            }
            match self.classifier.classify(message).await {
                Some(result) => results.push(result),
                None => report.record_undecided(message),
            }
        }
        if results.is_empty() {
            return;
        }

        // A stopped run never reaches the gate; decisions so far are reported
        // but left unapplied.
        if self.cancel.is_cancelled() {
            info!(classified = results.len(), "run stopped before confirmation");
            for result in &results {
                report.record_result(result, Outcome::Skipped);
            }
            return;
        }

        let selection = self.gate.confirm_batch(&results).await;
        for (index, result) in results.iter().enumerate() {
            let outcome = if selection.includes(index) {
                self.engine
                    .apply(&result.message, result.disposition, result.category.as_deref())
                    .await
            } else {
                Outcome::Skipped
            };
            report.record_result(result, outcome);
        }
    }
}
