use dqf_model::HeaderProposal;
use dqf_schema::{CanonicalColumn, PromoteOutcome, SchemaError, SchemaTruth, TransformOutcome};
use proptest::prelude::*;

fn fixture() -> SchemaTruth {
    let columns = vec![
        CanonicalColumn::new("order_id")
            .with_description("Order identifier")
            .with_synonyms(["Order Number", "order no"])
            .with_header_pattern("ord(er)?[ _-]?id")
            .expect("order_id pattern"),
        CanonicalColumn::new("customer_id")
            .with_synonyms(["cust no", "order#"])
            .with_header_pattern("cust(omer)?[ _-]?id")
            .expect("customer_id pattern"),
        CanonicalColumn::new("email").with_synonyms(["e-mail", "email address"]),
        CanonicalColumn::new("quantity").with_synonyms(["qnty", "units"]),
        CanonicalColumn::new("currency"),
    ];
    SchemaTruth::from_columns(columns).expect("fixture schema")
}

#[test]
fn keys_keep_document_order() {
    let truth = fixture();
    let keys: Vec<&str> = truth.keys().collect();
    assert_eq!(keys, ["order_id", "customer_id", "email", "quantity", "currency"]);
}

#[test]
fn synonym_lookup_uses_normalized_then_compact_form() {
    let truth = fixture();
    assert_eq!(truth.lookup_synonym("  ORDER   number "), Some("order_id"));
    assert_eq!(truth.lookup_synonym("Order-Number"), Some("order_id"));
    assert_eq!(truth.lookup_synonym("E Mail"), Some("email"));
    assert_eq!(truth.lookup_synonym("shipping"), None);
    assert_eq!(truth.lookup_synonym("   "), None);
}

#[test]
fn header_pattern_matches_whole_header_case_insensitively() {
    let truth = fixture();
    assert_eq!(truth.match_pattern("Order_ID"), Some("order_id"));
    assert_eq!(truth.match_pattern(" cust-id "), Some("customer_id"));
    assert_eq!(truth.match_pattern("order id extra"), None);
}

#[test]
fn known_terms_are_compact_and_owned() {
    let truth = fixture();
    let terms: Vec<(String, &str)> = truth
        .known_terms()
        .into_iter()
        .map(|term| (term.compact, term.key))
        .collect();
    assert!(terms.contains(&("qnty".to_string(), "quantity")));
    assert!(terms.contains(&("orderid".to_string(), "order_id")));
    assert!(terms.contains(&("ordernumber".to_string(), "order_id")));
}

#[test]
fn promote_conflict_keeps_existing_owner() {
    let mut truth = fixture();
    let outcome = truth.promote("order_id", "order#");
    assert_eq!(
        outcome,
        PromoteOutcome::Conflict {
            existing: "customer_id".to_string()
        }
    );
    let order = truth.column("order_id").expect("order_id");
    assert!(!order.synonyms.contains("order#"));
    assert_eq!(truth.lookup_synonym("Order#"), Some("customer_id"));
}

#[test]
fn promote_outcomes() {
    let mut truth = fixture();
    assert_eq!(truth.promote("order_id", "Order Ref"), PromoteOutcome::Added);
    assert_eq!(truth.promote("order_id", "order  ref"), PromoteOutcome::AlreadyPresent);
    assert_eq!(truth.promote("gift_note", "gift msg"), PromoteOutcome::UnknownColumn);
    assert_eq!(truth.promote("order_id", " \u{200b} "), PromoteOutcome::Rejected);
    assert_eq!(truth.lookup_synonym("ORDER REF"), Some("order_id"));
    let order = truth.column("order_id").expect("order_id");
    assert!(order.synonyms.contains("order ref"));
    assert!(order.synonyms.contains("Order Number"));
}

#[test]
fn promote_rejects_compact_collision_with_other_column() {
    let mut truth = fixture();
    assert_eq!(
        truth.promote("quantity", "cust-no"),
        PromoteOutcome::Conflict {
            existing: "customer_id".to_string()
        }
    );
}

#[test]
fn record_transform_deduplicates_and_applies() {
    let mut truth = fixture();
    assert_eq!(truth.record_transform("currency", "rs\\.?", "INR"), TransformOutcome::Added);
    assert_eq!(truth.record_transform("currency", "rs\\.?", "INR"), TransformOutcome::Duplicate);
    assert_eq!(truth.record_transform("gift_note", "x", "y"), TransformOutcome::UnknownColumn);
    assert!(matches!(
        truth.record_transform("currency", "[", "INR"),
        TransformOutcome::InvalidPattern { .. }
    ));
    assert_eq!(truth.apply_transform("currency", "  RS. "), Some("INR"));
    assert_eq!(truth.apply_transform("currency", "rupees only"), None);
    assert_eq!(truth.value_transforms("currency").count(), 1);
}

#[test]
fn add_canonical_rejects_existing_and_blank_keys() {
    let mut truth = fixture();
    let err = truth
        .add_canonical(CanonicalColumn::new("email"))
        .expect_err("duplicate key");
    assert!(matches!(err, SchemaError::DuplicateKey { key } if key == "email"));
    let err = truth
        .add_canonical(CanonicalColumn::new("  "))
        .expect_err("blank key");
    assert!(matches!(err, SchemaError::InvalidKey { .. }));
    assert_eq!(truth.len(), 5);

    truth
        .add_canonical(CanonicalColumn::new("Gift Note"))
        .expect("keys are taken as written");
    assert_eq!(truth.lookup_synonym("gift note"), Some("Gift Note"));
}

#[test]
fn proposals_need_snake_case_keys() {
    let proposal = HeaderProposal {
        key: "Gift Note".to_string(),
        description: None,
        example: None,
        synonyms: vec!["gift msg".to_string()],
        header_regex: None,
    };
    let err = CanonicalColumn::from_proposal(&proposal).expect_err("invalid key");
    assert!(matches!(err, SchemaError::InvalidKey { key } if key == "Gift Note"));
}

#[test]
fn add_canonical_reports_claimed_synonyms() {
    let mut truth = fixture();
    let conflicts = truth
        .add_canonical(CanonicalColumn::new("gift_note").with_synonyms(["gift msg", "units"]))
        .expect("add gift_note");
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].synonym, "units");
    assert_eq!(conflicts[0].owner, "quantity");
    assert_eq!(truth.lookup_synonym("units"), Some("quantity"));
    assert_eq!(truth.lookup_synonym("Gift Msg"), Some("gift_note"));
    assert_eq!(truth.keys().last(), Some("gift_note"));
}

#[test]
fn add_canonical_drops_synonyms_it_could_not_claim() {
    let mut truth = fixture();
    let conflicts = truth
        .add_canonical(CanonicalColumn::new("gift_note").with_synonyms(["order no", "gift msg"]))
        .expect("add gift_note");
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].owner, "order_id");
    let synonyms: Vec<&str> = truth
        .column("gift_note")
        .map(|column| column.synonyms.iter().map(String::as_str).collect())
        .unwrap_or_default();
    assert_eq!(synonyms, ["gift msg"]);
    assert_eq!(truth.lookup_synonym("order no"), Some("order_id"));
}

#[test]
fn merge_from_is_additive() {
    let mut base = fixture();
    let mut other = fixture();
    other.promote("quantity", "pieces");
    other.promote("customer_id", "order no");
    other.record_transform("currency", "rupees?", "INR");
    other
        .add_canonical(CanonicalColumn::new("gift_note"))
        .expect("add gift_note");

    let report = base.merge_from(&other);
    assert!(report.conflicts.is_empty());
    let actions: Vec<&str> = report.changes.iter().map(|change| change.action()).collect();
    assert_eq!(actions, ["promote_synonym", "add_header", "record_transform"]);
    assert_eq!(base.lookup_synonym("pieces"), Some("quantity"));
    assert_eq!(base.lookup_synonym("order no"), Some("order_id"));
    assert!(base.contains("gift_note"));
    assert!(base.merge_from(&other).is_empty());
}

const POOL: &[(&str, &str)] = &[
    ("order_id", "order ref"),
    ("order_id", "po number"),
    ("customer_id", "client code"),
    ("email", "mail id"),
    ("quantity", "pieces"),
    ("quantity", "no of units"),
    ("currency", "ccy"),
];

proptest! {
    #[test]
    fn promotion_is_commutative(
        shuffled in Just(POOL.to_vec()).prop_shuffle(),
    ) {
        let mut forward = fixture();
        for (key, synonym) in POOL {
            prop_assert_eq!(forward.promote(key, synonym), PromoteOutcome::Added);
        }
        let mut reordered = fixture();
        for (key, synonym) in &shuffled {
            prop_assert_eq!(reordered.promote(key, synonym), PromoteOutcome::Added);
        }
        prop_assert_eq!(forward, reordered);
    }

    #[test]
    fn promotion_is_idempotent(index in 0..POOL.len()) {
        let (key, synonym) = POOL[index];
        let mut once = fixture();
        once.promote(key, synonym);
        let mut twice = once.clone();
        prop_assert_eq!(twice.promote(key, synonym), PromoteOutcome::AlreadyPresent);
        prop_assert_eq!(once, twice);
    }
}
