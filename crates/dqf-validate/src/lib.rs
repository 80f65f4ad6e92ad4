//! Column validators.
//!
//! Each canonical key is bound to one [`Rule`]. [`validate_cell`] runs the
//! rule, then looks for a replacement in order: the rule's own suggestion,
//! helper columns of the same row, learned value transforms, and finally the
//! oracle. A replacement is only offered when it passes the rule itself.

pub mod checks;
pub mod rules;

pub use checks::contact::is_helper_header;
pub use checks::identifier::IdentifierKind;
pub use rules::{Rule, rule_for};

use tracing::trace;

use dqf_model::{IssueReason, SuggestionSource};
use dqf_oracle::Oracle;
use dqf_schema::SchemaTruth;

use crate::checks::contact::{email_from_helpers, phone_from_helpers};

/// Result of validating one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellOutcome {
    /// Normalized value when valid, trimmed raw value otherwise.
    pub value: String,
    pub valid: bool,
    pub reason: Option<IssueReason>,
    pub suggestion: Option<String>,
    pub source: Option<SuggestionSource>,
}

impl CellOutcome {
    pub fn valid(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            valid: true,
            reason: None,
            suggestion: None,
            source: None,
        }
    }

    pub fn invalid(raw: &str, reason: IssueReason) -> Self {
        Self {
            value: raw.trim().to_string(),
            valid: false,
            reason: Some(reason),
            suggestion: None,
            source: None,
        }
    }

    /// Sets a suggestion produced by the check itself.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.source = suggestion.as_ref().map(|_| SuggestionSource::Rule);
        self.suggestion = suggestion;
        self
    }

    #[must_use]
    fn with_found(mut self, found: Option<(String, SuggestionSource)>) -> Self {
        (self.suggestion, self.source) = found.unzip();
        self
    }
}

/// Row and schema context for a cell.
#[derive(Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    pub schema: Option<&'a SchemaTruth>,
    /// Raw values of the row's helper columns.
    pub helpers: &'a [String],
    pub oracle: Option<&'a dyn Oracle>,
}

impl<'a> ValidationContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_schema(mut self, schema: &'a SchemaTruth) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_helpers(mut self, helpers: &'a [String]) -> Self {
        self.helpers = helpers;
        self
    }

    #[must_use]
    pub fn with_oracle(mut self, oracle: &'a dyn Oracle) -> Self {
        self.oracle = Some(oracle);
        self
    }
}

pub fn validate_cell(key: &str, raw: &str, ctx: &ValidationContext<'_>) -> CellOutcome {
    let rule = rule_for(key);
    let accept = |candidate: Option<String>, source: SuggestionSource| {
        candidate
            .and_then(|value| rule.confirm(&value))
            .map(|value| (value, source))
    };

    if raw.trim().is_empty() {
        if !rule.requires_value() {
            return CellOutcome::valid("");
        }
        let found = accept(helper_suggestion(rule, ctx), SuggestionSource::Helper);
        return CellOutcome::invalid(raw, IssueReason::Empty).with_found(found);
    }

    let mut outcome = rule.check(raw);
    if outcome.valid {
        return outcome;
    }

    let found = accept(outcome.suggestion.take(), SuggestionSource::Rule)
        .or_else(|| accept(helper_suggestion(rule, ctx), SuggestionSource::Helper))
        .or_else(|| accept(transform_suggestion(key, raw, ctx), SuggestionSource::Transform))
        .or_else(|| accept(oracle_suggestion(key, raw, ctx), SuggestionSource::Oracle));
    trace!(key, raw, reason = ?outcome.reason, found = ?found, "invalid cell");
    outcome.with_found(found)
}

fn helper_suggestion(rule: Rule, ctx: &ValidationContext<'_>) -> Option<String> {
    match rule {
        Rule::Email => email_from_helpers(ctx.helpers),
        Rule::Phone => phone_from_helpers(ctx.helpers),
        _ => None,
    }
}

fn transform_suggestion(key: &str, raw: &str, ctx: &ValidationContext<'_>) -> Option<String> {
    ctx.schema?.apply_transform(key, raw).map(str::to_string)
}

fn oracle_suggestion(key: &str, raw: &str, ctx: &ValidationContext<'_>) -> Option<String> {
    let oracle = ctx.oracle.filter(|oracle| oracle.is_available())?;
    let description = ctx.schema.and_then(|schema| schema.description(key)).unwrap_or("");
    oracle.suggest_value(key, raw.trim(), description)
}
