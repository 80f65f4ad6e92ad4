use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use insta::assert_snapshot;

use dqf_cli::workflow::{RunOptions, describe_change, override_map, run_clean};
use dqf_map::HeaderMapper;
use dqf_model::{IssueReason, MappingMethod, Table};
use dqf_oracle::DisabledOracle;
use dqf_schema::{SchemaStore, SchemaTruth, parse_document};

const BUNDLED_SCHEMA: &str = include_str!("../../../docs/schema_truth_source.json");

fn bundled() -> SchemaTruth {
    parse_document(BUNDLED_SCHEMA, Path::new("schema_truth_source.json"))
        .expect("bundled schema parses")
}

fn raw() -> Table {
    Table::from_rows(
        vec![
            "Order Number".to_string(),
            "Pieces".to_string(),
            "Currency".to_string(),
            "Notes".to_string(),
        ],
        vec![
            vec![
                "ord 0012".to_string(),
                "2".to_string(),
                "INR".to_string(),
                "gift wrap".to_string(),
            ],
            vec![
                "ORD-0013".to_string(),
                "x".to_string(),
                "usd".to_string(),
                String::new(),
            ],
        ],
    )
}

fn overrides() -> BTreeMap<String, Option<String>> {
    override_map(
        &[("Pieces".to_string(), "quantity".to_string())],
        &["Notes".to_string()],
    )
}

fn options(apply_fixes: bool) -> RunOptions {
    RunOptions {
        use_oracle: false,
        apply_fixes,
        accept_proposals: false,
    }
}

#[test]
fn bundled_schema_loads() {
    let schema = bundled();
    assert_eq!(schema.len(), 24);
    assert_eq!(schema.keys().next(), Some("order_id"));
    assert_eq!(schema.lookup_synonym("Order Number"), Some("order_id"));
}

#[test]
fn clean_run_reports_cells_then_columns() {
    let schema = bundled();
    let run = run_clean(&schema, DisabledOracle, &raw(), &overrides(), options(false))
        .expect("overrides apply");

    let methods: Vec<_> = run.mappings.iter().map(|m| m.method).collect();
    assert_eq!(methods[0], MappingMethod::Synonym);
    assert_eq!(methods[1], MappingMethod::Override);
    assert_eq!(methods[2], MappingMethod::Canonical);
    assert_eq!(run.mappings[3].canonical, None);

    let cells: Vec<String> = run
        .outcome
        .cell_issues()
        .map(ToString::to_string)
        .collect();
    assert_snapshot!(cells.join("\n"), @r#"
    row 0, order_id: invalid format ("ord 0012") -> ORD-0012
    row 1, quantity: not numeric ("x")
    "#);

    let counts = run.outcome.counts_by_reason();
    assert_eq!(counts.get(&IssueReason::MissingColumn), Some(&21));
    assert_eq!(counts.get(&IssueReason::ExtraColumn), Some(&1));
    let last = run.outcome.issues.last().expect("column issues");
    assert_eq!(last.column, "Notes");

    // Without --apply-fixes the output is the proposed table as built.
    assert_eq!(run.output.cell(0, "order_id"), Some("ord 0012"));
    assert_eq!(run.output.cell(1, "currency"), Some("USD"));
    assert_eq!(run.remaining.len(), 2);
}

#[test]
fn applied_fixes_leave_only_unfixable_cells() {
    let schema = bundled();
    let run = run_clean(&schema, DisabledOracle, &raw(), &overrides(), options(true))
        .expect("overrides apply");

    assert_eq!(run.output.cell(0, "order_id"), Some("ORD-0012"));
    let remaining: Vec<String> = run.remaining.iter().map(ToString::to_string).collect();
    assert_snapshot!(remaining.join("\n"), @r#"row 1, quantity: not numeric ("x")"#);
    // Rule suggestions are not learned as transforms.
    assert_eq!(run.session.pending_transforms().count(), 0);
}

#[test]
fn unknown_override_key_fails_the_run() {
    let schema = bundled();
    let overrides = override_map(&[("Pieces".to_string(), "pieces".to_string())], &[]);
    let err = run_clean(&schema, DisabledOracle, &raw(), &overrides, options(false))
        .expect_err("unknown key");
    assert_eq!(
        err.to_string(),
        "Override for 'Pieces' names unknown canonical key 'pieces'"
    );
}

#[test]
fn promoted_override_is_used_on_the_next_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("schema_truth_source.json");
    fs::write(&path, BUNDLED_SCHEMA).expect("write schema");
    let store = SchemaStore::new(&path);
    let mut schema = store.load().expect("load");

    let mut run = run_clean(&schema, DisabledOracle, &raw(), &overrides(), options(false))
        .expect("overrides apply");
    assert_eq!(run.session.len(), 1);
    let report = run
        .session
        .promote(&mut schema, Some(&store))
        .expect("promote");
    assert!(report.flushed);
    let changes: Vec<String> = report.changes.iter().map(describe_change).collect();
    assert_snapshot!(changes.join("\n"), @r#"promote_synonym "pieces" -> quantity"#);

    let reloaded = store.load().expect("reload");
    let mapping = HeaderMapper::new(&reloaded).map_header("Pieces");
    assert_eq!(mapping.canonical.as_deref(), Some("quantity"));
    assert_eq!(mapping.method, MappingMethod::Synonym);
}
