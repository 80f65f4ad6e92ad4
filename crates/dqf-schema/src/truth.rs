//! In-memory schema truth and its merge rules.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use dqf_common::{compact, normalize};
use dqf_model::{HeaderProposal, SchemaChange, ValueTransform};

use crate::error::SchemaError;

/// Compiles a whole-value, case-insensitive pattern.
pub(crate) fn compile_anchored(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!("^(?:{pattern})$"))
        .case_insensitive(true)
        .build()
}

/// Keys proposed by the oracle must be snake_case identifiers starting with
/// a letter. Keys of a loaded document are taken as written.
pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: compile_anchored(source)?,
        })
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// A column of the canonical schema.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalColumn {
    pub key: String,
    pub description: String,
    pub example: String,
    /// Alternative headers. Entries from the schema document are kept as
    /// written; promoted entries are stored normalized.
    pub synonyms: BTreeSet<String>,
    header_pattern: Option<CompiledPattern>,
    extra: Map<String, Value>,
}

impl CanonicalColumn {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: String::new(),
            example: String::new(),
            synonyms: BTreeSet::new(),
            header_pattern: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    #[must_use]
    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for synonym in synonyms {
            let synonym = synonym.into();
            let trimmed = synonym.trim();
            if !trimmed.is_empty() {
                self.synonyms.insert(trimmed.to_string());
            }
        }
        self
    }

    pub fn with_header_pattern(mut self, pattern: &str) -> Result<Self, SchemaError> {
        let compiled =
            CompiledPattern::new(pattern).map_err(|source| SchemaError::InvalidHeaderPattern {
                key: self.key.clone(),
                source,
            })?;
        self.header_pattern = Some(compiled);
        Ok(self)
    }

    #[must_use]
    pub(crate) fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    /// Builds a column definition from an oracle proposal.
    pub fn from_proposal(proposal: &HeaderProposal) -> Result<Self, SchemaError> {
        let key = proposal.key.trim();
        if !is_valid_key(key) {
            return Err(SchemaError::InvalidKey {
                key: proposal.key.clone(),
            });
        }
        let column = Self::new(key)
            .with_description(proposal.description.clone().unwrap_or_default())
            .with_example(proposal.example.clone().unwrap_or_default())
            .with_synonyms(proposal.synonyms.iter().map(String::as_str));
        match proposal.header_regex.as_deref().map(str::trim) {
            Some(pattern) if !pattern.is_empty() => column.with_header_pattern(pattern),
            _ => Ok(column),
        }
    }

    pub fn header_pattern(&self) -> Option<&str> {
        self.header_pattern.as_ref().map(|p| p.source.as_str())
    }

    pub fn matches_header(&self, header: &str) -> bool {
        self.header_pattern
            .as_ref()
            .is_some_and(|p| p.regex.is_match(header.trim()))
    }

    /// Fields of the stored entry this crate does not interpret.
    pub fn extra_fields(&self) -> &Map<String, Value> {
        &self.extra
    }
}

#[derive(Debug, Clone, PartialEq)]
struct LearnedTransform {
    transform: ValueTransform,
    pattern: CompiledPattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoteOutcome {
    Added,
    AlreadyPresent,
    /// The synonym already belongs to another column, which keeps it.
    Conflict { existing: String },
    UnknownColumn,
    /// The synonym normalizes to nothing.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    Added,
    Duplicate,
    UnknownColumn,
    InvalidPattern { message: String },
}

/// Synonym of a newly added column that another column already owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymConflict {
    pub synonym: String,
    pub owner: String,
}

/// Synonym claim that lost to an existing owner during a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    pub canonical: String,
    /// Normalized synonym.
    pub synonym: String,
    pub existing: String,
}

/// What a merge added and which claims it had to refuse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub changes: Vec<SchemaChange>,
    pub conflicts: Vec<MergeConflict>,
}

impl MergeReport {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.conflicts.is_empty()
    }
}

/// Compact form of a key or synonym together with the column owning it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownTerm<'a> {
    pub compact: String,
    pub key: &'a str,
}

/// Canonical columns in document order plus the merged synonym index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaTruth {
    columns: IndexMap<String, CanonicalColumn>,
    by_normalized: BTreeMap<String, String>,
    by_compact: BTreeMap<String, String>,
    transforms: IndexMap<String, Vec<LearnedTransform>>,
}

impl SchemaTruth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(
        columns: impl IntoIterator<Item = CanonicalColumn>,
    ) -> Result<Self, SchemaError> {
        let mut truth = Self::new();
        for column in columns {
            truth.add_canonical(column)?;
        }
        Ok(truth)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Canonical keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &CanonicalColumn> {
        self.columns.values()
    }

    pub fn column(&self, key: &str) -> Option<&CanonicalColumn> {
        self.columns.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.columns.contains_key(key)
    }

    pub fn description(&self, key: &str) -> Option<&str> {
        self.column(key).map(|c| c.description.as_str())
    }

    /// First column, in document order, whose header pattern matches.
    pub fn match_pattern(&self, header: &str) -> Option<&str> {
        self.columns
            .values()
            .find(|column| column.matches_header(header))
            .map(|column| column.key.as_str())
    }

    /// Resolves a header through the merged synonym index.
    pub fn lookup_synonym(&self, header: &str) -> Option<&str> {
        let normalized = normalize(header);
        if normalized.is_empty() {
            return None;
        }
        self.by_normalized
            .get(&normalized)
            .or_else(|| self.by_compact.get(&compact(&normalized)))
            .map(String::as_str)
    }

    /// Every key and owned synonym in compact form, in document order.
    pub fn known_terms(&self) -> Vec<KnownTerm<'_>> {
        let mut terms = Vec::new();
        for column in self.columns.values() {
            let key = column.key.as_str();
            terms.push(KnownTerm {
                compact: compact(key),
                key,
            });
            for synonym in &column.synonyms {
                let owned = self
                    .by_normalized
                    .get(&normalize(synonym))
                    .is_some_and(|owner| owner == key);
                let compacted = compact(synonym);
                if owned && !compacted.is_empty() {
                    terms.push(KnownTerm {
                        compact: compacted,
                        key,
                    });
                }
            }
        }
        terms
    }

    /// Adds a new canonical column.
    ///
    /// Synonyms already owned by another column stay with their owner, are
    /// dropped from the new column and are returned as conflicts.
    pub fn add_canonical(
        &mut self,
        mut column: CanonicalColumn,
    ) -> Result<Vec<SynonymConflict>, SchemaError> {
        if column.key.trim().is_empty() {
            return Err(SchemaError::InvalidKey { key: column.key });
        }
        if self.columns.contains_key(&column.key) {
            return Err(SchemaError::DuplicateKey { key: column.key });
        }

        let key = column.key.clone();
        self.claim(&normalize(&key), &key);
        let mut conflicts = Vec::new();
        column.synonyms.retain(|synonym| {
            let normalized = normalize(synonym);
            if normalized.is_empty() {
                return true;
            }
            match self.by_normalized.get(&normalized).cloned() {
                Some(owner) if owner != key => {
                    warn!(synonym = %synonym, owner = %owner, column = %key, "synonym already claimed");
                    conflicts.push(SynonymConflict {
                        synonym: synonym.clone(),
                        owner,
                    });
                    false
                }
                _ => {
                    self.claim(&normalized, &key);
                    true
                }
            }
        });
        debug!(column = %key, synonyms = column.synonyms.len(), "added canonical column");
        self.columns.insert(key, column);
        Ok(conflicts)
    }

    fn claim(&mut self, normalized: &str, key: &str) {
        self.by_normalized
            .entry(normalized.to_string())
            .or_insert_with(|| key.to_string());
        let compacted = compact(normalized);
        if !compacted.is_empty() {
            self.by_compact
                .entry(compacted)
                .or_insert_with(|| key.to_string());
        }
    }

    /// Adds a synonym to a column; existing claims always win.
    pub fn promote(&mut self, key: &str, synonym: &str) -> PromoteOutcome {
        let normalized = normalize(synonym);
        if normalized.is_empty() {
            return PromoteOutcome::Rejected;
        }
        if !self.columns.contains_key(key) {
            return PromoteOutcome::UnknownColumn;
        }
        let owner = self
            .by_normalized
            .get(&normalized)
            .or_else(|| self.by_compact.get(&compact(&normalized)));
        match owner {
            Some(owner) if owner == key && self.by_normalized.contains_key(&normalized) => {
                return PromoteOutcome::AlreadyPresent;
            }
            Some(owner) if owner != key => {
                warn!(synonym = %normalized, column = key, owner = %owner, "synonym promotion conflict");
                return PromoteOutcome::Conflict {
                    existing: owner.clone(),
                };
            }
            _ => {}
        }

        self.claim(&normalized, key);
        if let Some(column) = self.columns.get_mut(key) {
            column.synonyms.insert(normalized.clone());
        }
        debug!(synonym = %normalized, column = key, "promoted synonym");
        PromoteOutcome::Added
    }

    /// Appends a learned value transform unless the pair is already known.
    pub fn record_transform(&mut self, key: &str, pattern: &str, suggest: &str) -> TransformOutcome {
        if !self.columns.contains_key(key) {
            return TransformOutcome::UnknownColumn;
        }
        if pattern.trim().is_empty() {
            return TransformOutcome::InvalidPattern {
                message: "empty pattern".to_string(),
            };
        }
        let transform = ValueTransform::new(pattern, suggest);
        let known = self
            .transforms
            .get(key)
            .is_some_and(|list| list.iter().any(|learned| learned.transform == transform));
        if known {
            return TransformOutcome::Duplicate;
        }
        let compiled = match CompiledPattern::new(pattern) {
            Ok(compiled) => compiled,
            Err(err) => {
                return TransformOutcome::InvalidPattern {
                    message: err.to_string(),
                };
            }
        };
        debug!(column = key, pattern, suggest, "recorded value transform");
        self.transforms
            .entry(key.to_string())
            .or_default()
            .push(LearnedTransform {
                transform,
                pattern: compiled,
            });
        TransformOutcome::Added
    }

    /// Learned transforms of a column, in recording order.
    pub fn value_transforms(&self, key: &str) -> impl Iterator<Item = &ValueTransform> {
        self.transforms
            .get(key)
            .into_iter()
            .flatten()
            .map(|learned| &learned.transform)
    }

    /// Columns that have at least one learned transform.
    pub fn transform_keys(&self) -> impl Iterator<Item = &str> {
        self.transforms
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(key, _)| key.as_str())
    }

    /// Suggestion of the first transform whose pattern matches the whole value.
    pub fn apply_transform(&self, key: &str, raw: &str) -> Option<&str> {
        let value = raw.trim();
        self.transforms
            .get(key)?
            .iter()
            .find(|learned| learned.pattern.regex.is_match(value))
            .map(|learned| learned.transform.suggest.as_str())
    }

    /// Additive union with another truth. Claims already held here win and
    /// the losing claims of `other` come back as conflicts.
    pub fn merge_from(&mut self, other: &SchemaTruth) -> MergeReport {
        let mut report = MergeReport::default();
        for column in other.columns.values() {
            if !self.columns.contains_key(&column.key) {
                match self.add_canonical(column.clone()) {
                    Ok(conflicts) => {
                        report.changes.push(SchemaChange::AddHeader {
                            canonical: column.key.clone(),
                            source: column.key.clone(),
                        });
                        report
                            .conflicts
                            .extend(conflicts.into_iter().map(|conflict| MergeConflict {
                                canonical: column.key.clone(),
                                synonym: normalize(&conflict.synonym),
                                existing: conflict.owner,
                            }));
                    }
                    Err(err) => warn!(column = %column.key, error = %err, "skipped column during merge"),
                }
                continue;
            }
            for synonym in &column.synonyms {
                match self.promote(&column.key, synonym) {
                    PromoteOutcome::Added => report.changes.push(SchemaChange::PromoteSynonym {
                        canonical: column.key.clone(),
                        synonym: normalize(synonym),
                    }),
                    PromoteOutcome::Conflict { existing } => {
                        report.conflicts.push(MergeConflict {
                            canonical: column.key.clone(),
                            synonym: normalize(synonym),
                            existing,
                        });
                    }
                    _ => {}
                }
            }
        }
        for (key, list) in &other.transforms {
            for learned in list {
                let ValueTransform { pattern, suggest } = &learned.transform;
                if self.record_transform(key, pattern, suggest) == TransformOutcome::Added {
                    report.changes.push(SchemaChange::RecordTransform {
                        column: key.clone(),
                        pattern: pattern.clone(),
                        suggest: suggest.clone(),
                    });
                }
            }
        }
        report
    }
}
