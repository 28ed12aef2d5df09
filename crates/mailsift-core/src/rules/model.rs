//! Filter rule data models.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::disposition::Disposition;
use crate::reader::Message;

/// Which part of a message a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    /// The From header.
    Sender,
    /// The Subject header.
    Subject,
    /// The cleaned body.
    Body,
    /// Sender, subject, date and body together.
    FullText,
}

impl RuleField {
    /// Parse from its stored or suggested name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sender" | "from" => Some(Self::Sender),
            "subject" => Some(Self::Subject),
            "body" | "content" => Some(Self::Body),
            "full_text" | "full-text" | "fulltext" | "text" | "email" | "any" => {
                Some(Self::FullText)
            }
            _ => None,
        }
    }

    /// Stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sender => "sender",
            Self::Subject => "subject",
            Self::Body => "body",
            Self::FullText => "full_text",
        }
    }
}

impl fmt::Display for RuleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a matching rule does with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleAction {
    /// Two-tier delete.
    Delete,
    /// Move to Archive.
    Archive,
    /// Move to FollowUp.
    Review,
}

impl RuleAction {
    /// Parse from its stored name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DELETE" => Some(Self::Delete),
            "ARCHIVE" => Some(Self::Archive),
            "REVIEW" => Some(Self::Review),
            _ => None,
        }
    }

    /// Stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Archive => "ARCHIVE",
            Self::Review => "REVIEW",
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RuleAction> for Disposition {
    fn from(action: RuleAction) -> Self {
        match action {
            RuleAction::Delete => Self::Delete,
            RuleAction::Archive => Self::Archive,
            RuleAction::Review => Self::Review,
        }
    }
}

/// A rule ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    /// Inspected field.
    pub field: RuleField,
    /// Regular expression, searched case-insensitively.
    pub pattern: String,
    /// Action on match.
    pub action: RuleAction,
}

impl FilterRule {
    /// Creates a rule.
    #[must_use]
    pub fn new(field: RuleField, pattern: impl Into<String>, action: RuleAction) -> Self {
        Self {
            field,
            pattern: pattern.into(),
            action,
        }
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.field, self.pattern, self.action)
    }
}

impl FromStr for FilterRule {
    type Err = RuleError;

    /// Parses `field:pattern:action`. The pattern may itself contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, rest) = s
            .split_once(':')
            .ok_or_else(|| RuleError::Format(s.to_string()))?;
        let (pattern, action) = rest
            .rsplit_once(':')
            .ok_or_else(|| RuleError::Format(s.to_string()))?;

        let field = RuleField::parse(field).ok_or_else(|| RuleError::Field(field.to_string()))?;
        let action =
            RuleAction::parse(action).ok_or_else(|| RuleError::Action(action.to_string()))?;
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(RuleError::Format(s.to_string()));
        }

        Ok(Self::new(field, pattern, action))
    }
}

/// A persisted rule row, kept as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRule {
    /// Insertion id; evaluation follows ascending id.
    pub id: i64,
    /// Field name as stored.
    pub field: String,
    /// Pattern as stored.
    pub pattern: String,
    /// Action name as stored.
    pub action: String,
}

/// Why a stored or suggested rule cannot be used.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Unknown field name.
    #[error("unknown rule field: {0}")]
    Field(String),

    /// Unknown action name.
    #[error("unknown rule action: {0}")]
    Action(String),

    /// Pattern does not compile.
    #[error("invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Text is not in any accepted rule format.
    #[error("unrecognised rule: {0}")]
    Format(String),
}

/// A validated rule with its compiled pattern.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Insertion id.
    pub id: i64,
    /// Inspected field.
    pub field: RuleField,
    /// Action on match.
    pub action: RuleAction,
    regex: Regex,
}

impl CompiledRule {
    /// Validates a stored row.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field or action or a bad pattern.
    pub fn compile(stored: &StoredRule) -> Result<Self, RuleError> {
        let field =
            RuleField::parse(&stored.field).ok_or_else(|| RuleError::Field(stored.field.clone()))?;
        let action = RuleAction::parse(&stored.action)
            .ok_or_else(|| RuleError::Action(stored.action.clone()))?;
        let regex = RegexBuilder::new(&stored.pattern)
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            id: stored.id,
            field,
            action,
            regex,
        })
    }

    /// Pattern source.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the pattern occurs anywhere in the inspected field.
    #[must_use]
    pub fn matches(&self, message: &Message) -> bool {
        match self.field {
            RuleField::Sender => self.regex.is_match(&message.sender),
            RuleField::Subject => self.regex.is_match(&message.subject),
            RuleField::Body => self.regex.is_match(&message.body),
            RuleField::FullText => self.regex.is_match(&message.full_text()),
        }
    }
}
