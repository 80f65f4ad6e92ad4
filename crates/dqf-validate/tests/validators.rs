use std::cell::Cell;

use dqf_model::{HeaderProposal, IssueReason, SuggestionSource};
use dqf_oracle::Oracle;
use dqf_schema::{CanonicalColumn, SchemaTruth};
use dqf_validate::{Rule, ValidationContext, rule_for, validate_cell};

struct ValueOracle {
    answer: &'static str,
    calls: Cell<usize>,
}

impl ValueOracle {
    fn new(answer: &'static str) -> Self {
        Self {
            answer,
            calls: Cell::new(0),
        }
    }
}

impl Oracle for ValueOracle {
    fn is_available(&self) -> bool {
        true
    }

    fn resolve_header(&self, _header: &str, _keys: &[&str]) -> Option<String> {
        None
    }

    fn propose_new_header(&self, _header: &str, _samples: &[String]) -> Option<HeaderProposal> {
        None
    }

    fn suggest_value(&self, _column: &str, _raw: &str, _description: &str) -> Option<String> {
        self.calls.set(self.calls.get() + 1);
        Some(self.answer.to_string())
    }
}

fn plain() -> ValidationContext<'static> {
    ValidationContext::new()
}

#[test]
fn rule_table() {
    assert_eq!(rule_for("quantity"), Rule::Numeric { whole: true });
    assert_eq!(rule_for("tax_pct"), Rule::Fraction);
    assert_eq!(rule_for("customer_name"), Rule::FreeText);
    assert_eq!(rule_for("gift_note"), Rule::FreeText);
}

#[test]
fn percentages_become_fractions() {
    let outcome = validate_cell("discount_pct", "15%", &plain());
    assert!(outcome.valid);
    assert_eq!(outcome.value, "0.15");

    let outcome = validate_cell("tax_pct", "18", &plain());
    assert_eq!(outcome.reason, Some(IssueReason::OutOfRange));
    assert_eq!(outcome.suggestion.as_deref(), Some("0.18"));
}

#[test]
fn short_postal_code_has_no_suggestion() {
    let outcome = validate_cell("postal_code", "1234", &plain());
    assert!(!outcome.valid);
    assert_eq!(outcome.reason, Some(IssueReason::WrongLength));
    assert_eq!(outcome.value, "1234");
    assert_eq!(outcome.suggestion, None);

    let outcome = validate_cell("postal_code", "560 001", &plain());
    assert!(outcome.valid);
    assert_eq!(outcome.value, "560001");
}

#[test]
fn free_text_accepts_empty() {
    let outcome = validate_cell("customer_name", "   ", &plain());
    assert!(outcome.valid);
    assert_eq!(outcome.value, "");
}

#[test]
fn empty_required_value() {
    let outcome = validate_cell("quantity", "", &plain());
    assert_eq!(outcome.reason, Some(IssueReason::Empty));
    assert_eq!(outcome.suggestion, None);
}

#[test]
fn empty_email_filled_from_helper() {
    let helpers = vec!["call 98450 12345 or mail asha@example.com".to_string()];
    let ctx = ValidationContext::new().with_helpers(&helpers);
    let outcome = validate_cell("email", "", &ctx);
    assert_eq!(outcome.reason, Some(IssueReason::Empty));
    assert_eq!(outcome.suggestion.as_deref(), Some("asha@example.com"));
    assert_eq!(outcome.source, Some(SuggestionSource::Helper));
}

#[test]
fn phone_recovered_from_helper() {
    let helpers = vec!["asha@example.com".to_string(), "+91 98450 12345".to_string()];
    let ctx = ValidationContext::new().with_helpers(&helpers);
    let outcome = validate_cell("phone", "call me", &ctx);
    assert_eq!(outcome.reason, Some(IssueReason::InvalidPhone));
    assert_eq!(outcome.suggestion.as_deref(), Some("+919845012345"));
}

#[test]
fn email_holding_phone_number() {
    let outcome = validate_cell("email", "9845012345", &plain());
    assert_eq!(outcome.reason, Some(IssueReason::PhoneInEmail));
    assert_eq!(outcome.suggestion, None);
}

#[test]
fn learned_transform_is_suggested() {
    let mut schema = SchemaTruth::from_columns([CanonicalColumn::new("currency")]).expect("schema");
    schema.record_transform("currency", "indian rupee", "INR");
    let ctx = ValidationContext::new().with_schema(&schema);

    let outcome = validate_cell("currency", " Indian Rupee ", &ctx);
    assert_eq!(outcome.reason, Some(IssueReason::UnknownCurrency));
    assert_eq!(outcome.suggestion.as_deref(), Some("INR"));
    assert_eq!(outcome.source, Some(SuggestionSource::Transform));
}

#[test]
fn learned_transform_must_pass_the_rule() {
    let mut schema = SchemaTruth::from_columns([CanonicalColumn::new("currency")]).expect("schema");
    schema.record_transform("currency", "bitcoin", "BTC");
    let ctx = ValidationContext::new().with_schema(&schema);

    let outcome = validate_cell("currency", "bitcoin", &ctx);
    assert_eq!(outcome.suggestion, None);
    assert_eq!(outcome.source, None);
}

#[test]
fn oracle_answer_is_normalized() {
    let oracle = ValueOracle::new("inr");
    let ctx = ValidationContext::new().with_oracle(&oracle);
    let outcome = validate_cell("currency", "indian money", &ctx);
    assert_eq!(outcome.suggestion.as_deref(), Some("INR"));
    assert_eq!(outcome.source, Some(SuggestionSource::Oracle));
    assert_eq!(oracle.calls.get(), 1);
}

#[test]
fn invalid_oracle_answer_is_dropped() {
    let oracle = ValueOracle::new("not a date");
    let ctx = ValidationContext::new().with_oracle(&oracle);
    let outcome = validate_cell("order_date", "someday", &ctx);
    assert_eq!(outcome.reason, Some(IssueReason::InvalidDate));
    assert_eq!(outcome.suggestion, None);
}

#[test]
fn oracle_not_asked_when_rule_suggests() {
    let oracle = ValueOracle::new("ORD-9999");
    let ctx = ValidationContext::new().with_oracle(&oracle);
    let outcome = validate_cell("order_id", "ord 0012", &ctx);
    assert_eq!(outcome.suggestion.as_deref(), Some("ORD-0012"));
    assert_eq!(outcome.source, Some(SuggestionSource::Rule));
    assert_eq!(oracle.calls.get(), 0);
}

#[test]
fn oracle_not_asked_for_empty_cells() {
    let oracle = ValueOracle::new("5");
    let ctx = ValidationContext::new().with_oracle(&oracle);
    let outcome = validate_cell("quantity", " ", &ctx);
    assert_eq!(outcome.reason, Some(IssueReason::Empty));
    assert_eq!(outcome.suggestion, None);
    assert_eq!(oracle.calls.get(), 0);
}
