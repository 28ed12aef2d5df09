//! Turns the remainder of a `RULE:` line into storable rules.
//!
//! Three shapes are accepted:
//!
//! - JSON: `{"field": "sender", "pattern": "x", "action": "DELETE"}` or an
//!   array of such objects
//! - `field:pattern:action`
//! - the wording the prompts elicit:
//!   `If sender contains "x" or subject contains "y", then flag as spam.`

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::model::{FilterRule, RuleAction, RuleError, RuleField};

#[allow(clippy::expect_used)]
static CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(sender|from|subject|body|content|text|email|full[- ]?text|any)\b\s+(?:contains|includes|matches|has)\s+["“']([^"”']+)["”']"#,
    )
    .expect("clause regex must compile")
});

#[allow(clippy::expect_used)]
static THEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bthen\b").expect("then regex must compile"));

#[allow(clippy::expect_used)]
static ACTION_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(spam|delete|trash|junk|archive|review|follow[- ]?up|keep)\b")
        .expect("action word regex must compile")
});

#[allow(clippy::expect_used)]
static NEGATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(not|don't|dont|never|no|without)\b").expect("negation regex must compile")
});

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonSuggestion {
    One(JsonRule),
    Many(Vec<JsonRule>),
}

#[derive(Deserialize)]
struct JsonRule {
    field: String,
    pattern: String,
    action: String,
}

/// Parses a suggestion into one or more rules.
///
/// # Errors
///
/// Returns [`RuleError`] when the text matches none of the accepted shapes,
/// names an unknown field or action, or carries an invalid pattern.
pub fn parse_suggestion(text: &str) -> Result<Vec<FilterRule>, RuleError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(RuleError::Format(String::new()));
    }

    if (text.starts_with('{') || text.starts_with('['))
        && let Ok(json) = serde_json::from_str::<JsonSuggestion>(text)
    {
        let raw = match json {
            JsonSuggestion::One(rule) => vec![rule],
            JsonSuggestion::Many(rules) => rules,
        };
        return raw.into_iter().map(from_json).collect();
    }

    if CLAUSE.is_match(text) {
        return parse_natural(text);
    }

    let rule: FilterRule = text.parse()?;
    Regex::new(&rule.pattern)?;
    Ok(vec![rule])
}

fn from_json(rule: JsonRule) -> Result<FilterRule, RuleError> {
    let field = RuleField::parse(&rule.field).ok_or(RuleError::Field(rule.field))?;
    let action = parse_action_words(&rule.action).ok_or(RuleError::Action(rule.action))?;
    if rule.pattern.trim().is_empty() {
        return Err(RuleError::Format("empty pattern".to_string()));
    }
    Regex::new(&rule.pattern)?;
    Ok(FilterRule::new(field, rule.pattern, action))
}

fn parse_natural(text: &str) -> Result<Vec<FilterRule>, RuleError> {
    let consequence = match THEN.find_iter(text).last() {
        Some(then) => text[then.end()..].to_string(),
        None => CLAUSE.replace_all(text, "").into_owned(),
    };
    let action = parse_action_words(&consequence)
        .ok_or_else(|| RuleError::Action(consequence.trim().to_string()))?;

    CLAUSE
        .captures_iter(text)
        .map(|caps| {
            let field_word = &caps[1];
            let field = RuleField::parse(&field_word.replace(' ', "-"))
                .ok_or_else(|| RuleError::Field(field_word.to_string()))?;
            Ok(FilterRule::new(field, regex::escape(caps[2].trim()), action))
        })
        .collect()
}

/// Maps action wording to a rule action. Spam wording means delete.
///
/// Negated mentions ("do not delete") are ignored. Wording that names two
/// different actions is ambiguous and yields `None`.
fn parse_action_words(text: &str) -> Option<RuleAction> {
    if let Some(action) = RuleAction::parse(text) {
        return Some(action);
    }

    let mut resolved = None;
    for word in ACTION_WORD.find_iter(text) {
        let clause_start = text[..word.start()]
            .rfind([',', ';', '.'])
            .map_or(0, |i| i + 1);
        if NEGATION.is_match(&text[clause_start..word.start()]) {
            continue;
        }

        let action = match word.as_str().to_lowercase().as_str() {
            "spam" | "delete" | "trash" | "junk" => RuleAction::Delete,
            "archive" => RuleAction::Archive,
            _ => RuleAction::Review,
        };
        match resolved {
            None => resolved = Some(action),
            Some(previous) if previous == action => {}
            Some(_) => return None,
        }
    }
    resolved
}
