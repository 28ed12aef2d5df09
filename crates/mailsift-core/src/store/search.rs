//! Criteria search over a folder.

use chrono::NaiveDate;

use crate::reader::Message;
use crate::{Error, Result};

/// Filter applied by [`MailStore::search`](super::MailStore::search).
///
/// Every set field must match. Text fields are case-insensitive substring
/// matches; the date range is inclusive on both ends and never matches an
/// undated message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Substring of the sender.
    pub sender: Option<String>,
    /// Substring of the subject.
    pub subject: Option<String>,
    /// Earliest date, inclusive.
    pub since: Option<NaiveDate>,
    /// Latest date, inclusive.
    pub until: Option<NaiveDate>,
}

impl SearchCriteria {
    /// Parses a `YYYY-MM-DD` date.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for any other format.
    pub fn parse_date(s: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| Error::Config(format!("invalid date {s:?}: {e}")))
    }

    /// Whether the message satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, message: &Message) -> bool {
        if let Some(sender) = &self.sender
            && !contains_ignore_case(&message.sender, sender)
        {
            return false;
        }
        if let Some(subject) = &self.subject
            && !contains_ignore_case(&message.subject, subject)
        {
            return false;
        }

        if self.since.is_none() && self.until.is_none() {
            return true;
        }
        let Some(date) = message.date.map(|d| d.date_naive()) else {
            return false;
        };
        self.since.is_none_or(|since| date >= since) && self.until.is_none_or(|until| date <= until)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
