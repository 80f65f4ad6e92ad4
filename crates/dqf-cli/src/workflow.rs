//! One cleaning run: map headers, apply user overrides, build the issue
//! ledger, optionally apply fixes, and collect learning candidates.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use dqf_clean::{CleanOptions, CleanOutcome, CleaningEngine, LearningSession};
use dqf_map::{HeaderMapper, MapperOptions, MappingError, apply_overrides};
use dqf_model::{HeaderMapping, SchemaChange, Table, ValidationIssue};
use dqf_oracle::Oracle;
use dqf_schema::SchemaTruth;

/// Parses a `SOURCE=KEY` override. The last `=` separates the two parts.
pub fn parse_override(value: &str) -> Result<(String, String), String> {
    let Some((source, key)) = value.rsplit_once('=') else {
        return Err(format!("expected SOURCE=KEY, got '{value}'"));
    };
    let (source, key) = (source.trim(), key.trim());
    if source.is_empty() || key.is_empty() {
        return Err(format!("expected SOURCE=KEY, got '{value}'"));
    }
    Ok((source.to_string(), key.to_string()))
}

/// Combines `--override` and `--ignore` choices. An ignore beats an override
/// for the same header.
pub fn override_map(
    overrides: &[(String, String)],
    ignored: &[String],
) -> BTreeMap<String, Option<String>> {
    let mut map: BTreeMap<String, Option<String>> = overrides
        .iter()
        .map(|(source, key)| (source.clone(), Some(key.clone())))
        .collect();
    for source in ignored {
        map.insert(source.clone(), None);
    }
    map
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub use_oracle: bool,
    pub apply_fixes: bool,
    pub accept_proposals: bool,
}

#[derive(Debug, Clone)]
pub struct CleanRun {
    pub mappings: Vec<HeaderMapping>,
    pub outcome: CleanOutcome,
    /// Proposed table, with fixes applied when requested.
    pub output: Table,
    /// Cell issues left in `output`.
    pub remaining: Vec<ValidationIssue>,
    pub session: LearningSession,
}

pub fn run_clean<O: Oracle>(
    schema: &SchemaTruth,
    oracle: O,
    raw: &Table,
    overrides: &BTreeMap<String, Option<String>>,
    options: RunOptions,
) -> Result<CleanRun, MappingError> {
    let mapper = HeaderMapper::new(schema)
        .with_oracle(&oracle)
        .with_options(MapperOptions::default().with_oracle(options.use_oracle));
    let mappings = apply_overrides(&mapper.map(&raw.columns), overrides, schema)?;

    let engine = CleaningEngine::new(schema)
        .with_oracle(&oracle)
        .with_options(CleanOptions::default().with_oracle(options.use_oracle));
    let outcome = engine.build(raw, &mappings);

    let mut session = LearningSession::new();
    for mapping in &mappings {
        session.record_override(mapping);
    }
    if options.accept_proposals {
        for issue in &outcome.issues {
            if let Some(proposal) = &issue.proposal {
                session.record_proposal(issue.column.as_str(), proposal.clone());
            }
        }
    }

    let (output, remaining) = if options.apply_fixes {
        for issue in outcome.fixable() {
            if issue.source.is_some_and(|source| source.is_learnable()) {
                session.record_fix(issue);
            }
        }
        let fixed = outcome.fixed();
        // Canonical columns without a source stay empty and are already
        // reported as missing.
        let sourced: BTreeSet<&str> = mappings
            .iter()
            .filter_map(|mapping| mapping.canonical.as_deref())
            .collect();
        let remaining: Vec<ValidationIssue> = engine
            .revalidate(&fixed)
            .into_iter()
            .filter(|issue| sourced.contains(issue.column.as_str()))
            .collect();
        (fixed, remaining)
    } else {
        let remaining: Vec<ValidationIssue> = outcome.cell_issues().cloned().collect();
        (outcome.proposed.clone(), remaining)
    };
    debug!(candidates = session.len(), "collected learning candidates");
    info!(
        headers = mappings.len(),
        issues = outcome.issues.len(),
        remaining = remaining.len(),
        "clean run finished"
    );

    Ok(CleanRun {
        mappings,
        outcome,
        output,
        remaining,
        session,
    })
}

/// One-line description of a change log entry.
pub fn describe_change(change: &SchemaChange) -> String {
    match change {
        SchemaChange::AddHeader { canonical, source } => {
            format!("add_header {canonical} (from \"{source}\")")
        }
        SchemaChange::PromoteSynonym { canonical, synonym } => {
            format!("promote_synonym \"{synonym}\" -> {canonical}")
        }
        SchemaChange::RecordTransform {
            column,
            pattern,
            suggest,
        } => format!("record_transform {column}: /{pattern}/ -> {suggest}"),
    }
}
