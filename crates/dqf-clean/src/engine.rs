//! Projection of raw rows onto the canonical schema.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use dqf_model::{HeaderMapping, IssueReason, MappingMethod, Table, ValidationIssue};
use dqf_oracle::{DisabledOracle, Oracle};
use dqf_schema::{CanonicalColumn, SchemaTruth};
use dqf_validate::{ValidationContext, is_helper_header, validate_cell};

/// Sample values sent with a header proposal request.
pub const DEFAULT_PROPOSAL_SAMPLES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    /// Ask the oracle for value suggestions and header proposals.
    pub use_oracle: bool,
    pub proposal_samples: usize,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            use_oracle: true,
            proposal_samples: DEFAULT_PROPOSAL_SAMPLES,
        }
    }
}

impl CleanOptions {
    #[must_use]
    pub fn with_oracle(mut self, use_oracle: bool) -> Self {
        self.use_oracle = use_oracle;
        self
    }
}

/// Proposed dataset plus its issue ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanOutcome {
    /// Canonical columns in schema order.
    pub proposed: Table,
    /// Cell issues row-major in canonical order, then column-level issues.
    pub issues: Vec<ValidationIssue>,
}

impl CleanOutcome {
    pub fn cell_issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.row_index.is_some())
    }

    pub fn summary_issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.row_index.is_none())
    }

    pub fn fixable(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.is_fixable())
    }

    pub fn counts_by_reason(&self) -> BTreeMap<IssueReason, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.reason).or_insert(0) += 1;
        }
        counts
    }

    /// Proposed table with every suggestion applied.
    pub fn fixed(&self) -> Table {
        apply_fixes(&self.proposed, &self.issues)
    }
}

/// Where each canonical column takes its values from.
struct Projection<'m> {
    /// Canonical key to raw column index; first source column wins.
    sources: BTreeMap<&'m str, usize>,
    /// Later source columns mapped to an already taken key.
    duplicates: Vec<(usize, &'m str)>,
    /// Raw columns that may carry contact details.
    helpers: Vec<usize>,
}

impl<'m> Projection<'m> {
    fn new(raw: &Table, mappings: &'m [HeaderMapping]) -> Self {
        if mappings.len() != raw.width() {
            warn!(
                mappings = mappings.len(),
                columns = raw.width(),
                "mapping count differs from column count"
            );
        }
        let mut sources = BTreeMap::new();
        let mut duplicates = Vec::new();
        for (index, mapping) in mappings.iter().enumerate().take(raw.width()) {
            let Some(key) = mapping.canonical.as_deref() else {
                continue;
            };
            if sources.contains_key(key) {
                debug!(header = %mapping.source_header, key, "duplicate mapping");
                duplicates.push((index, key));
            } else {
                sources.insert(key, index);
            }
        }
        let helpers = raw
            .columns
            .iter()
            .enumerate()
            .filter(|(_, header)| is_helper_header(header))
            .map(|(index, _)| index)
            .collect();
        Self {
            sources,
            duplicates,
            helpers,
        }
    }

    fn helper_values(&self, row: &[String]) -> Vec<String> {
        self.helpers
            .iter()
            .filter_map(|&index| row.get(index))
            .filter(|value| !value.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// Builds the proposed dataset and issue ledger for a mapped raw table.
pub struct CleaningEngine<'a, O = DisabledOracle> {
    schema: &'a SchemaTruth,
    oracle: O,
    options: CleanOptions,
}

impl<'a> CleaningEngine<'a, DisabledOracle> {
    pub fn new(schema: &'a SchemaTruth) -> Self {
        Self {
            schema,
            oracle: DisabledOracle,
            options: CleanOptions::default(),
        }
    }
}

impl<'a, O: Oracle> CleaningEngine<'a, O> {
    #[must_use]
    pub fn with_oracle<P: Oracle>(self, oracle: P) -> CleaningEngine<'a, P> {
        CleaningEngine {
            schema: self.schema,
            oracle,
            options: self.options,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: CleanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> CleanOptions {
        self.options
    }

    fn oracle_enabled(&self) -> bool {
        self.options.use_oracle && self.oracle.is_available()
    }

    /// Projects `raw` onto the canonical columns and validates every cell.
    ///
    /// `mappings` are positional: `mappings[i]` describes `raw.columns[i]`.
    pub fn build(&self, raw: &Table, mappings: &[HeaderMapping]) -> CleanOutcome {
        let projection = Projection::new(raw, mappings);
        let keys: Vec<&str> = self.schema.keys().collect();
        let mut proposed = Table::new(keys.iter().map(|key| (*key).to_string()).collect());
        let mut issues = Vec::new();

        for (row_index, row) in raw.rows.iter().enumerate() {
            let helpers = projection.helper_values(row);
            let mut ctx = ValidationContext::new()
                .with_schema(self.schema)
                .with_helpers(&helpers);
            if self.oracle_enabled() {
                ctx = ctx.with_oracle(&self.oracle);
            }

            let mut cells = Vec::with_capacity(keys.len());
            for key in &keys {
                let Some(&source) = projection.sources.get(key) else {
                    cells.push(String::new());
                    continue;
                };
                let raw_value = row.get(source).map(String::as_str).unwrap_or_default();
                let outcome = validate_cell(key, raw_value, &ctx);
                if !outcome.valid
                    && let Some(reason) = outcome.reason
                {
                    issues.push(
                        ValidationIssue::cell(
                            row_index,
                            *key,
                            raw_value,
                            reason,
                            outcome.suggestion,
                        )
                        .with_source(outcome.source),
                    );
                }
                cells.push(outcome.value);
            }
            proposed.push_row(cells);
        }

        let cell_issues = issues.len();
        self.column_issues(raw, mappings, &projection, &mut issues);
        info!(
            rows = proposed.height(),
            columns = proposed.width(),
            cell_issues,
            column_issues = issues.len() - cell_issues,
            "built proposed dataset"
        );
        CleanOutcome { proposed, issues }
    }

    fn column_issues(
        &self,
        raw: &Table,
        mappings: &[HeaderMapping],
        projection: &Projection<'_>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        for key in self.schema.keys() {
            if !projection.sources.contains_key(key) {
                issues.push(ValidationIssue::column(key, IssueReason::MissingColumn));
            }
        }

        let mut unmapped = Vec::new();
        for (index, header) in raw.columns.iter().enumerate() {
            let mapping = mappings.get(index);
            if let Some(&(_, key)) = projection.duplicates.iter().find(|(i, _)| *i == index) {
                issues.push(ValidationIssue {
                    value: Some(key.to_string()),
                    ..ValidationIssue::column(header.as_str(), IssueReason::DuplicateMapping)
                });
            } else if mapping.is_none_or(|mapping| !mapping.is_mapped()) {
                issues.push(ValidationIssue::column(header.as_str(), IssueReason::ExtraColumn));
                // Explicitly ignored columns are not sent for proposals.
                if mapping.is_none_or(|mapping| mapping.method == MappingMethod::Unmapped) {
                    unmapped.push(index);
                }
            }
        }

        if !self.oracle_enabled() {
            return;
        }
        for index in unmapped {
            let header = &raw.columns[index];
            let samples = self.samples(raw, index);
            if let Some(proposal) = self.oracle.propose_new_header(header, &samples) {
                if let Err(err) = CanonicalColumn::from_proposal(&proposal) {
                    debug!(header = %header, error = %err, "discarded header proposal");
                    continue;
                }
                if self.schema.contains(proposal.key.trim()) {
                    warn!(header = %header, key = %proposal.key, "proposal names an existing column");
                    continue;
                }
                issues.push(ValidationIssue::proposal(header.as_str(), proposal));
            }
        }
    }

    fn samples(&self, raw: &Table, index: usize) -> Vec<String> {
        let mut samples: Vec<String> = Vec::new();
        for row in &raw.rows {
            if samples.len() >= self.options.proposal_samples {
                break;
            }
            let value = row.get(index).map(|value| value.trim()).unwrap_or_default();
            if !value.is_empty() && !samples.iter().any(|seen| seen == value) {
                samples.push(value.to_string());
            }
        }
        samples
    }

    /// Re-runs the column validators over a canonical table.
    ///
    /// The oracle is not consulted; suggestions come from the rules and the
    /// learned transforms only.
    pub fn revalidate(&self, table: &Table) -> Vec<ValidationIssue> {
        let ctx = ValidationContext::new().with_schema(self.schema);
        let mut issues = Vec::new();
        for (row_index, row) in table.rows.iter().enumerate() {
            for (column, value) in table.columns.iter().zip(row) {
                let outcome = validate_cell(column, value, &ctx);
                if !outcome.valid
                    && let Some(reason) = outcome.reason
                {
                    issues.push(
                        ValidationIssue::cell(
                            row_index,
                            column.as_str(),
                            value.as_str(),
                            reason,
                            outcome.suggestion,
                        )
                        .with_source(outcome.source),
                    );
                }
            }
        }
        debug!(rows = table.height(), issues = issues.len(), "revalidated table");
        issues
    }
}

/// Applies every issue that carries a row index and a suggestion.
pub fn apply_fixes(proposed: &Table, issues: &[ValidationIssue]) -> Table {
    apply_where(proposed, issues.iter())
}

/// Applies the issues at the given ledger positions. Unknown positions and
/// issues without a suggestion are skipped.
pub fn apply_selected(proposed: &Table, issues: &[ValidationIssue], selected: &[usize]) -> Table {
    apply_where(proposed, selected.iter().filter_map(|&index| issues.get(index)))
}

fn apply_where<'i>(proposed: &Table, issues: impl Iterator<Item = &'i ValidationIssue>) -> Table {
    let mut table = proposed.clone();
    let mut applied = 0usize;
    for issue in issues {
        let (Some(row), Some(suggestion)) = (issue.row_index, issue.suggestion.as_deref()) else {
            continue;
        };
        if table.set_cell(row, &issue.column, suggestion) {
            applied += 1;
        } else {
            debug!(row, column = %issue.column, "fix target does not exist");
        }
    }
    debug!(applied, "applied fixes");
    table
}
