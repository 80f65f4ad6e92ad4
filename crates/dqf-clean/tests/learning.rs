use std::collections::BTreeMap;

use dqf_clean::{LearningSession, PromotionConflict};
use dqf_map::{HeaderMapper, apply_overrides};
use dqf_model::{
    HeaderMapping, HeaderProposal, IssueReason, MappingMethod, SchemaChange, ValidationIssue,
};
use dqf_schema::{CanonicalColumn, SchemaStore, SchemaTruth};
use dqf_validate::{ValidationContext, validate_cell};
use tempfile::TempDir;

fn schema() -> SchemaTruth {
    SchemaTruth::from_columns([
        CanonicalColumn::new("order_id"),
        CanonicalColumn::new("customer_id").with_synonyms(["order#"]),
        CanonicalColumn::new("quantity").with_synonyms(["qnty"]),
        CanonicalColumn::new("currency"),
    ])
    .expect("schema")
}

fn overridden(header: &str, key: &str) -> HeaderMapping {
    HeaderMapping::unmapped(header).overridden(Some(key.to_string()))
}

fn currency_fix(raw: &str, suggestion: &str) -> ValidationIssue {
    ValidationIssue::cell(
        0,
        "currency",
        raw,
        IssueReason::UnknownCurrency,
        Some(suggestion.to_string()),
    )
}

fn gift_note() -> HeaderProposal {
    HeaderProposal {
        key: "gift_note".to_string(),
        description: Some("Message printed on the gift card".to_string()),
        example: Some("Happy birthday".to_string()),
        synonyms: vec!["gift message".to_string()],
        header_regex: None,
    }
}

#[test]
fn only_meaningful_overrides_are_recorded() {
    let mut session = LearningSession::new();
    assert!(session.record_override(&overridden("Qty Ordered", "quantity")));
    assert!(!session.record_override(&overridden("Quantity", "quantity")));
    assert!(!session.record_override(&HeaderMapping::new(
        "qty",
        Some("quantity".to_string()),
        0.7,
        MappingMethod::Fuzzy,
    )));
    assert!(!session.record_override(&HeaderMapping::unmapped("x").overridden(None)));
    assert_eq!(session.pending_synonyms().collect::<Vec<_>>(), [("quantity", "qty ordered")]);
}

#[test]
fn nothing_changes_before_promotion() {
    let mut schema = schema();
    let before = schema.clone();
    let mut session = LearningSession::new();
    session.record_override(&overridden("Qty Ordered", "quantity"));
    session.record_fix(&currency_fix("Indian Rupee", "INR"));
    assert_eq!(schema, before);
    assert_eq!(session.len(), 2);

    let report = session.promote(&mut schema, None).expect("promote");
    assert_eq!(report.changes.len(), 2);
    assert!(!report.flushed);
    assert!(session.is_empty());
    assert_eq!(schema.lookup_synonym("qty ordered"), Some("quantity"));
}

#[test]
fn conflicting_synonym_keeps_existing_owner() {
    let mut schema = schema();
    let mut session = LearningSession::new();
    session.record_override(&overridden("order#", "order_id"));

    let report = session.promote(&mut schema, None).expect("promote");
    assert!(report.changes.is_empty());
    assert_eq!(
        report.conflicts,
        vec![PromotionConflict {
            canonical: "order_id".to_string(),
            synonym: "order#".to_string(),
            existing: "customer_id".to_string(),
        }]
    );
    assert_eq!(schema.lookup_synonym("order#"), Some("customer_id"));
    assert!(schema.column("order_id").expect("column").synonyms.is_empty());
}

#[test]
fn repeated_promotion_is_already_known() {
    let mut schema = schema();
    for expected_changes in [1, 0] {
        let mut session = LearningSession::new();
        session.record_override(&overridden("Qty Ordered", "quantity"));
        let report = session.promote(&mut schema, None).expect("promote");
        assert_eq!(report.changes.len(), expected_changes);
        assert_eq!(report.already_known, 1 - expected_changes);
    }
}

#[test]
fn promotion_order_does_not_matter() {
    let mut first = schema();
    let mut second = schema();

    let mut a = LearningSession::new();
    a.record_override(&overridden("Qty Ordered", "quantity"));
    a.record_override(&overridden("Order Ref", "order_id"));
    a.record_fix(&currency_fix("Rupaye", "INR"));

    let mut b = LearningSession::new();
    b.record_fix(&currency_fix("Rupaye", "INR"));
    b.record_override(&overridden("Order Ref", "order_id"));
    b.record_override(&overridden("Qty Ordered", "quantity"));

    let report_a = a.promote(&mut first, None).expect("promote");
    let report_b = b.promote(&mut second, None).expect("promote");
    assert_eq!(report_a, report_b);
    assert_eq!(first, second);
}

#[test]
fn recorded_fix_becomes_a_transform() {
    let mut schema = schema();
    let mut session = LearningSession::new();
    assert!(session.record_fix(&currency_fix(" Indian Rupee (Rs.) ", "INR")));
    assert!(!session.record_fix(&ValidationIssue::column("currency", IssueReason::MissingColumn)));
    session.promote(&mut schema, None).expect("promote");

    let ctx = ValidationContext::new().with_schema(&schema);
    let outcome = validate_cell("currency", "indian rupee (rs.)", &ctx);
    assert_eq!(outcome.reason, Some(IssueReason::UnknownCurrency));
    assert_eq!(outcome.suggestion.as_deref(), Some("INR"));
}

#[test]
fn discarded_candidates_are_not_promoted() {
    let mut schema = schema();
    let before = schema.clone();
    let mut session = LearningSession::new();
    session.record_override(&overridden("Qty Ordered", "quantity"));
    session.record_fix(&currency_fix("Rupaye", "INR"));
    session.record_proposal("Gift Note", gift_note());

    assert!(session.discard_synonym("quantity", "QTY  ordered"));
    assert!(session.discard_transform("currency", "Rupaye"));
    assert!(session.discard_proposal("Gift Note"));
    assert!(session.is_empty());

    let report = session.promote(&mut schema, None).expect("promote");
    assert!(!report.has_changes());
    assert_eq!(schema, before);
}

#[test]
fn accepted_proposal_adds_column_and_source_synonym() {
    let mut schema = schema();
    let mut session = LearningSession::new();
    session.record_proposal("Gift Note", gift_note());
    session.record_proposal(
        "Order Identifier",
        HeaderProposal {
            key: "order_id".to_string(),
            description: None,
            example: None,
            synonyms: Vec::new(),
            header_regex: None,
        },
    );

    let report = session.promote(&mut schema, None).expect("promote");
    assert_eq!(
        report.changes,
        vec![
            SchemaChange::AddHeader {
                canonical: "gift_note".to_string(),
                source: "Gift Note".to_string(),
            },
            SchemaChange::PromoteSynonym {
                canonical: "gift_note".to_string(),
                synonym: "gift note".to_string(),
            },
        ]
    );
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].subject, "Order Identifier");
    assert_eq!(schema.keys().last(), Some("gift_note"));
    assert_eq!(schema.lookup_synonym("Gift Message"), Some("gift_note"));
}

#[test]
fn promotion_round_trips_through_the_store() {
    let dir = TempDir::new().expect("tempdir");
    let store = SchemaStore::new(dir.path().join("schema.json"));
    store.save(&schema()).expect("save");

    let mut truth = store.load().expect("load");
    let headers = ["Qty Ordered", "currency"];
    let mappings = HeaderMapper::new(&truth).map(&headers);
    assert_eq!(mappings[0].method, MappingMethod::Unmapped);

    let overrides = BTreeMap::from([("Qty Ordered".to_string(), Some("quantity".to_string()))]);
    let mappings = apply_overrides(&mappings, &overrides, &truth).expect("overrides");
    let mut session = LearningSession::new();
    for mapping in &mappings {
        session.record_override(mapping);
    }
    let report = session.promote(&mut truth, Some(&store)).expect("promote");
    assert!(report.flushed);

    let reloaded = store.load().expect("reload");
    assert_eq!(reloaded, truth);
    let remapped = HeaderMapper::new(&reloaded).map(&headers);
    assert_eq!(remapped[0].canonical.as_deref(), Some("quantity"));
    assert_eq!(remapped[0].method, MappingMethod::Synonym);
}

#[test]
fn failed_flush_leaves_candidates_for_a_retry() {
    let dir = TempDir::new().expect("tempdir");
    let broken = SchemaStore::new(dir.path());
    let store = SchemaStore::new(dir.path().join("schema.json"));
    store.save(&schema()).expect("save");

    let mut truth = store.load().expect("load");
    let mut session = LearningSession::new();
    session.record_override(&overridden("Order Ref", "order_id"));

    session
        .promote(&mut truth, Some(&broken))
        .expect_err("store path is a directory");
    assert_eq!(truth.lookup_synonym("order ref"), None);
    assert_eq!(session.len(), 1);

    let report = session.promote(&mut truth, Some(&store)).expect("retry");
    assert!(report.flushed);
    assert_eq!(report.already_known, 0);
    assert_eq!(
        report.changes,
        [SchemaChange::PromoteSynonym {
            canonical: "order_id".to_string(),
            synonym: "order ref".to_string(),
        }]
    );
    let reloaded = store.load().expect("reload");
    assert_eq!(reloaded.lookup_synonym("Order Ref"), Some("order_id"));
}

#[test]
fn claim_taken_by_another_writer_is_reported_as_conflict() {
    let dir = TempDir::new().expect("tempdir");
    let store = SchemaStore::new(dir.path().join("schema.json"));
    store.save(&schema()).expect("save");
    let mut truth = store.load().expect("load");

    let mut other = store.load().expect("other load");
    other.promote("customer_id", "ref no");
    store.flush(&mut other).expect("other flush");

    let mut session = LearningSession::new();
    session.record_override(&overridden("Ref No", "order_id"));
    session.record_override(&overridden("Qty Ordered", "quantity"));
    let report = session.promote(&mut truth, Some(&store)).expect("promote");

    assert!(report.flushed);
    assert_eq!(
        report.changes,
        [SchemaChange::PromoteSynonym {
            canonical: "quantity".to_string(),
            synonym: "qty ordered".to_string(),
        }]
    );
    assert_eq!(
        report.conflicts,
        [PromotionConflict {
            canonical: "order_id".to_string(),
            synonym: "ref no".to_string(),
            existing: "customer_id".to_string(),
        }]
    );
    assert_eq!(truth.lookup_synonym("Ref No"), Some("customer_id"));
    assert_eq!(store.load().expect("reload"), truth);
}
