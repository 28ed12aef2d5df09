//! # mailsift-core
//!
//! Triage and disposition engine for maildir-style mail stores.
//!
//! This crate provides:
//! - **Message Store** - per-folder directories with exclusive, rename-based moves
//! - **Message Reader** - structured records from raw message files
//! - **Rule Filter** - persisted pattern rules evaluated before classification
//! - **Classifier** - summarize/decide exchanges with an LLM and a tagged-line parser
//! - **Disposition Engine** - folder moves, two-tier DELETE and reply hand-off
//! - **Batch Coordinator** - interactive, silent and throttled batch runs,
//!   folder review and top-sender cleanup analysis

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod batch;
pub mod classifier;
pub mod config;
pub mod disposition;
mod error;
pub mod reader;
pub mod rules;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{
    AutoApprove, BatchCoordinator, CancelToken, CleanupAnalysis, CleanupReport, ConfirmationGate,
    CooldownPause, Mode, Pause, ReportEntry, ReviewChoice, ReviewGate, RunReport, Selection,
    SenderGroup, apply_cleanup, review_folder, top_senders,
};
pub use classifier::{
    ClassificationResult, Classifier, HttpLlmClient, LlmClient, LlmError, TaggedResponse,
    parse_tagged,
};
pub use config::Config;
pub use disposition::{
    Disposition, DispositionEngine, ImapRemoteDeleter, LlmReplyDrafter, Outcome,
    RemoteDeleteError, RemoteDeleteOutcome, RemoteDeleter, ReplyDrafter, ReplyError,
};
pub use error::{Error, Result};
pub use reader::Message;
pub use rules::{FilterRule, RuleAction, RuleField, RuleFilter, RuleRepository, StoredRule};
pub use store::{Folder, FolderStatus, MailStore, MoveOutcome, SearchCriteria};
