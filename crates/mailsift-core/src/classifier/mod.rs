//! LLM-mediated classification: summarize, decide, parse.

mod llm;
mod prompt;
mod protocol;

use tracing::{debug, info, warn};

pub use llm::{HttpLlmClient, LlmClient, LlmError, normalize_response};
pub use prompt::{decide_prompt, reply_prompt, summary_prompt};
pub use protocol::{TaggedResponse, parse_tagged};

use crate::disposition::Disposition;
use crate::reader::Message;
use crate::rules::{RuleRepository, parse_suggestion};

/// Classifier output for one message in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    /// The classified message.
    pub message: Message,
    /// Summary from the first exchange.
    pub summary: String,
    /// Action resolved from the decide response.
    pub disposition: Disposition,
    /// Decide response as received.
    pub raw_response: String,
    /// `CATEGORY:` label, used for subfolder placement.
    pub category: Option<String>,
}

/// Two-step classifier that also records suggested rules.
pub struct Classifier<L> {
    llm: L,
    rules: RuleRepository,
}

impl<L: LlmClient> Classifier<L> {
    /// Creates a classifier that appends suggested rules to `rules`.
    pub const fn new(llm: L, rules: RuleRepository) -> Self {
        Self { llm, rules }
    }

    /// The LLM collaborator.
    pub const fn llm(&self) -> &L {
        &self.llm
    }

    /// Classifies a message.
    ///
    /// Returns `None` when either exchange fails; the caller must leave the
    /// message untouched.
    pub async fn classify(&self, message: &Message) -> Option<ClassificationResult> {
        let summary = match self.llm.complete(&summary_prompt(message)).await {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => {
                warn!(file = %message.file, "empty summary, no decision");
                return None;
            }
            Err(e) => {
                warn!(file = %message.file, error = %e, "summary request failed");
                return None;
            }
        };
        debug!(file = %message.file, chars = summary.len(), "summary received");

        let raw_response = match self.llm.complete(&decide_prompt(&summary)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(file = %message.file, error = %e, "decide request failed");
                return None;
            }
        };
        debug!(file = %message.file, chars = raw_response.len(), "decision received");

        let tagged = parse_tagged(&raw_response);
        self.record_rules(&tagged.rules).await;

        info!(
            file = %message.file,
            action = %tagged.action,
            category = tagged.category.as_deref().unwrap_or("-"),
            "message classified"
        );
        Some(ClassificationResult {
            message: message.clone(),
            summary,
            disposition: tagged.action,
            raw_response,
            category: tagged.category,
        })
    }

    async fn record_rules(&self, suggestions: &[String]) {
        for suggestion in suggestions {
            let rules = match parse_suggestion(suggestion) {
                Ok(rules) => rules,
                Err(e) => {
                    warn!(suggestion = %suggestion, error = %e, "ignoring rule suggestion");
                    continue;
                }
            };
            for rule in rules {
                match self.rules.append(&rule).await {
                    Ok(id) => info!(rule_id = id, rule = %rule, "learned filter rule"),
                    Err(e) => warn!(rule = %rule, error = %e, "could not store rule"),
                }
            }
        }
    }
}
