//! Parser for the tagged lines in a decide response.
//!
//! The action comes from the first `ACTION: <TOKEN>` naming a known
//! disposition. Without one, the text is scanned for the bare words
//! ARCHIVE, DELETE, REPLY and REVIEW: exactly one distinct word resolves to
//! it, anything else resolves to [`Disposition::None`]. Lines starting with
//! `RULE:` are collected verbatim; the first `CATEGORY:` line sets the
//! category.

use std::sync::LazyLock;

use regex::Regex;

use crate::disposition::Disposition;

#[allow(clippy::expect_used)]
static ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bACTION\s*:[\s*"'`\[]*([A-Z]+)"#).expect("action regex must compile")
});

#[allow(clippy::expect_used)]
static KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(ARCHIVE|DELETE|REPLY|REVIEW)\b").expect("keyword regex must compile")
});

/// Structured contents of a decide response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedResponse {
    /// Resolved action.
    pub action: Disposition,
    /// `RULE:` remainders in order of appearance.
    pub rules: Vec<String>,
    /// `CATEGORY:` label, if any.
    pub category: Option<String>,
}

/// Parses a decide response. Never fails.
#[must_use]
pub fn parse_tagged(text: &str) -> TaggedResponse {
    let mut rules = Vec::new();
    let mut category = None;

    for line in text.lines() {
        let line = line.trim();
        if let Some(rule) = strip_tag(line, "RULE:") {
            if !rule.is_empty() {
                rules.push(rule.to_string());
            }
        } else if category.is_none()
            && let Some(label) = strip_tag(line, "CATEGORY:")
        {
            let label = label.trim_matches(|c: char| c == '*' || c == '"' || c == '\'' || c.is_whitespace());
            if !label.is_empty() {
                category = Some(label.to_string());
            }
        }
    }

    TaggedResponse {
        action: resolve_action(text),
        rules,
        category,
    }
}

fn resolve_action(text: &str) -> Disposition {
    let explicit = ACTION
        .captures_iter(text)
        .find_map(|caps| Disposition::parse(&caps[1]));
    if let Some(action) = explicit {
        return action;
    }

    let mut found: Option<Disposition> = None;
    for caps in KEYWORD.captures_iter(text) {
        let Some(keyword) = Disposition::parse(&caps[1]) else {
            continue;
        };
        match found {
            None => found = Some(keyword),
            Some(previous) if previous != keyword => return Disposition::None,
            Some(_) => {}
        }
    }
    found.unwrap_or(Disposition::None)
}

/// Remainder after a case-insensitive `tag` prefix.
fn strip_tag<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let head = line.get(..tag.len())?;
    head.eq_ignore_ascii_case(tag)
        .then(|| line[tag.len()..].trim())
}
