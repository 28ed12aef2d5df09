//! Persisted pattern rules that bypass classification.
//!
//! Rules live in a [`RuleRepository`] and are evaluated in insertion order
//! by a [`RuleFilter`]; the first match wins. New rules arrive from the
//! classifier as `RULE:` suggestions, parsed by [`parse_suggestion`].

mod filter;
mod model;
mod repository;
mod suggestion;

pub use filter::{RuleFilter, RuleMatch};
pub use model::{CompiledRule, FilterRule, RuleAction, RuleError, RuleField, StoredRule};
pub use repository::RuleRepository;
pub use suggestion::parse_suggestion;
