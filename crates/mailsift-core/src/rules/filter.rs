//! Rule evaluation ahead of classification.

use tracing::{info, warn};

use super::model::{CompiledRule, StoredRule};
use super::repository::RuleRepository;
use crate::Result;
use crate::disposition::{Disposition, DispositionEngine, Outcome, RemoteDeleter, ReplyDrafter};
use crate::reader::Message;

/// A message disposed of by a rule.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    /// The matched message as it was read.
    pub message: Message,
    /// Id of the winning rule.
    pub rule_id: i64,
    /// Disposition the rule applied.
    pub disposition: Disposition,
    /// What the disposition engine did.
    pub outcome: Outcome,
}

/// Compiled rules in evaluation order.
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    rules: Vec<CompiledRule>,
}

impl RuleFilter {
    /// Reads every stored rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository query fails. Malformed rules are
    /// skipped, not reported as errors.
    pub async fn load(repo: &RuleRepository) -> Result<Self> {
        Ok(Self::from_stored(&repo.load_all().await?))
    }

    /// Compiles stored rows, skipping malformed ones with a warning.
    #[must_use]
    pub fn from_stored(stored: &[StoredRule]) -> Self {
        let rules = stored
            .iter()
            .filter_map(|row| match CompiledRule::compile(row) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!(rule_id = row.id, pattern = %row.pattern, error = %e, "skipping malformed rule");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Number of usable rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no usable rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule in stored order that matches.
    #[must_use]
    pub fn matches(&self, message: &Message) -> Option<&CompiledRule> {
        self.rules.iter().find(|rule| rule.matches(message))
    }

    /// Disposes of every matching message and returns the rest untouched.
    pub async fn apply<R, D>(
        &self,
        messages: Vec<Message>,
        engine: &DispositionEngine<R, D>,
    ) -> (Vec<RuleMatch>, Vec<Message>)
    where
        R: RemoteDeleter,
        D: ReplyDrafter,
    {
        if self.rules.is_empty() {
            return (Vec::new(), messages);
        }

        let mut matched = Vec::new();
        let mut remaining = Vec::with_capacity(messages.len());
        for message in messages {
            let Some(rule) = self.matches(&message) else {
                remaining.push(message);
                continue;
            };

            let disposition = Disposition::from(rule.action);
            info!(file = %message.file, rule_id = rule.id, action = %disposition, "rule matched");
            let outcome = engine.apply(&message, disposition, None).await;
            matched.push(RuleMatch {
                rule_id: rule.id,
                disposition,
                outcome,
                message,
            });
        }
        (matched, remaining)
    }
}
