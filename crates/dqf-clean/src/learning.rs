//! Two-phase learning: collect candidates during a session, promote them into
//! the schema truth on request.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use dqf_common::normalize;
use dqf_model::{HeaderMapping, HeaderProposal, MappingMethod, SchemaChange, ValidationIssue};
use dqf_schema::{
    CanonicalColumn, MergeReport, PromoteOutcome, SchemaError, SchemaStore, SchemaTruth,
    TransformOutcome,
};

/// Synonym promotion refused because another column owns the synonym.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionConflict {
    pub canonical: String,
    pub synonym: String,
    /// Column that keeps the synonym.
    pub existing: String,
}

/// Candidate that could not be applied at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub subject: String,
    pub reason: String,
}

impl Rejection {
    fn new(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromotionReport {
    /// Change log of this promotion, in replay order.
    pub changes: Vec<SchemaChange>,
    /// Candidates the schema already knew.
    pub already_known: usize,
    pub conflicts: Vec<PromotionConflict>,
    pub rejected: Vec<Rejection>,
    /// Whether the store was written.
    pub flushed: bool,
}

impl PromotionReport {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Learning candidates accumulated during a session.
///
/// Nothing reaches the schema until [`LearningSession::promote`] runs.
/// Candidates are kept in ordered sets so promotion replays them in the same
/// order regardless of the order they were recorded in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearningSession {
    /// (canonical key, normalized synonym)
    synonyms: BTreeSet<(String, String)>,
    /// (canonical key, pattern) to suggestion
    transforms: BTreeMap<(String, String), String>,
    /// Source header to proposal
    proposals: BTreeMap<String, HeaderProposal>,
}

impl LearningSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty() && self.transforms.is_empty() && self.proposals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.synonyms.len() + self.transforms.len() + self.proposals.len()
    }

    /// Records an override as a synonym candidate.
    ///
    /// Only overrides to a canonical key whose header differs from the key
    /// itself are worth learning.
    pub fn record_override(&mut self, mapping: &HeaderMapping) -> bool {
        if mapping.method != MappingMethod::Override {
            return false;
        }
        let Some(key) = mapping.canonical.as_deref() else {
            return false;
        };
        let synonym = normalize(&mapping.source_header);
        if synonym.is_empty() || synonym == normalize(key) {
            return false;
        }
        debug!(synonym = %synonym, key, "recorded synonym candidate");
        self.synonyms.insert((key.to_string(), synonym))
    }

    /// Records an accepted fix as a value transform for the raw value.
    pub fn record_fix(&mut self, issue: &ValidationIssue) -> bool {
        if issue.row_index.is_none() {
            return false;
        }
        let (Some(raw), Some(suggestion)) = (issue.value.as_deref(), issue.suggestion.as_deref())
        else {
            return false;
        };
        let raw = raw.trim();
        if raw.is_empty() || raw == suggestion {
            return false;
        }
        let pattern = regex::escape(raw);
        debug!(column = %issue.column, pattern = %pattern, suggestion, "recorded transform candidate");
        self.transforms
            .insert((issue.column.clone(), pattern), suggestion.to_string());
        true
    }

    /// Records an accepted header proposal for `source`.
    pub fn record_proposal(&mut self, source: impl Into<String>, proposal: HeaderProposal) {
        self.proposals.insert(source.into(), proposal);
    }

    pub fn discard_synonym(&mut self, key: &str, synonym: &str) -> bool {
        self.synonyms
            .remove(&(key.to_string(), normalize(synonym)))
    }

    pub fn discard_transform(&mut self, key: &str, pattern: &str) -> bool {
        self.transforms
            .remove(&(key.to_string(), pattern.to_string()))
            .is_some()
    }

    pub fn discard_proposal(&mut self, source: &str) -> bool {
        self.proposals.remove(source).is_some()
    }

    pub fn clear(&mut self) {
        self.synonyms.clear();
        self.transforms.clear();
        self.proposals.clear();
    }

    pub fn pending_synonyms(&self) -> impl Iterator<Item = (&str, &str)> {
        self.synonyms
            .iter()
            .map(|(key, synonym)| (key.as_str(), synonym.as_str()))
    }

    pub fn pending_transforms(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.transforms
            .iter()
            .map(|((key, pattern), suggest)| (key.as_str(), pattern.as_str(), suggest.as_str()))
    }

    pub fn pending_proposals(&self) -> impl Iterator<Item = (&str, &HeaderProposal)> {
        self.proposals
            .iter()
            .map(|(source, proposal)| (source.as_str(), proposal))
    }

    /// Applies every candidate to `schema` and flushes `store` once if
    /// anything changed.
    ///
    /// Proposals are replayed first so synonyms and transforms may target the
    /// columns they add. The session is cleared after a successful promotion.
    /// On error neither `schema` nor the session is touched, so the call can
    /// be repeated.
    pub fn promote(
        &mut self,
        schema: &mut SchemaTruth,
        store: Option<&SchemaStore>,
    ) -> Result<PromotionReport, SchemaError> {
        let mut staged = schema.clone();
        let mut report = PromotionReport::default();

        for (source, proposal) in &self.proposals {
            promote_proposal(&mut staged, source, proposal, &mut report);
        }
        for (key, synonym) in &self.synonyms {
            promote_synonym(&mut staged, key, synonym, &mut report);
        }
        for ((key, pattern), suggest) in &self.transforms {
            match staged.record_transform(key, pattern, suggest) {
                TransformOutcome::Added => report.changes.push(SchemaChange::RecordTransform {
                    column: key.clone(),
                    pattern: pattern.clone(),
                    suggest: suggest.clone(),
                }),
                TransformOutcome::Duplicate => report.already_known += 1,
                TransformOutcome::UnknownColumn => {
                    report.rejected.push(Rejection::new(key.as_str(), "unknown column"));
                }
                TransformOutcome::InvalidPattern { message } => {
                    report.rejected.push(Rejection::new(pattern.as_str(), message));
                }
            }
        }

        if let Some(store) = store
            && report.has_changes()
        {
            let merge = store.flush(&mut staged)?;
            reconcile(&mut report, merge);
            report.flushed = true;
        }
        *schema = staged;
        info!(
            changes = report.changes.len(),
            already_known = report.already_known,
            conflicts = report.conflicts.len(),
            rejected = report.rejected.len(),
            flushed = report.flushed,
            "promoted learning session"
        );
        self.clear();
        Ok(report)
    }
}

/// Narrows the change log to what reached the store. Claims another writer
/// made first turn into conflicts.
fn reconcile(report: &mut PromotionReport, merge: MergeReport) {
    let MergeReport {
        changes: written,
        conflicts,
    } = merge;
    let lost: Vec<PromotionConflict> = conflicts
        .into_iter()
        .map(|conflict| PromotionConflict {
            canonical: conflict.canonical,
            synonym: conflict.synonym,
            existing: conflict.existing,
        })
        .collect();
    let added = |key: &str| {
        written.iter().any(|change| {
            matches!(change, SchemaChange::AddHeader { canonical, .. } if canonical == key)
        })
    };

    let mut already_known = 0;
    report.changes.retain(|change| {
        let (kept, refused) = match change {
            SchemaChange::AddHeader { canonical, .. } => (added(canonical.as_str()), false),
            SchemaChange::PromoteSynonym { canonical, synonym } => {
                let refused = lost
                    .iter()
                    .any(|c| &c.canonical == canonical && &c.synonym == synonym);
                let kept = !refused && (written.contains(change) || added(canonical.as_str()));
                (kept, refused)
            }
            SchemaChange::RecordTransform { .. } => (written.contains(change), false),
        };
        if !kept && !refused {
            debug!(action = change.action(), column = change.canonical(), "already on disk");
            already_known += 1;
        }
        kept
    });
    report.already_known += already_known;
    report.conflicts.extend(lost);
}

fn promote_proposal(
    schema: &mut SchemaTruth,
    source: &str,
    proposal: &HeaderProposal,
    report: &mut PromotionReport,
) {
    let column = match CanonicalColumn::from_proposal(proposal) {
        Ok(column) => column,
        Err(err) => {
            report.rejected.push(Rejection::new(source, err.to_string()));
            return;
        }
    };
    let key = column.key.clone();
    match schema.add_canonical(column) {
        Ok(conflicts) => {
            report.changes.push(SchemaChange::AddHeader {
                canonical: key.clone(),
                source: source.to_string(),
            });
            report
                .conflicts
                .extend(conflicts.into_iter().map(|conflict| PromotionConflict {
                    canonical: key.clone(),
                    synonym: conflict.synonym,
                    existing: conflict.owner,
                }));
        }
        Err(SchemaError::DuplicateKey { key }) => {
            warn!(source, key = %key, "proposal names an existing column");
            report
                .rejected
                .push(Rejection::new(source, format!("column '{key}' already exists")));
            return;
        }
        Err(err) => {
            report.rejected.push(Rejection::new(source, err.to_string()));
            return;
        }
    }
    // The source header itself becomes a synonym of the new column.
    let synonym = normalize(source);
    if synonym != normalize(&key) {
        promote_synonym(schema, &key, &synonym, report);
    }
}

fn promote_synonym(schema: &mut SchemaTruth, key: &str, synonym: &str, report: &mut PromotionReport) {
    match schema.promote(key, synonym) {
        PromoteOutcome::Added => report.changes.push(SchemaChange::PromoteSynonym {
            canonical: key.to_string(),
            synonym: normalize(synonym),
        }),
        PromoteOutcome::AlreadyPresent => report.already_known += 1,
        PromoteOutcome::Conflict { existing } => report.conflicts.push(PromotionConflict {
            canonical: key.to_string(),
            synonym: synonym.to_string(),
            existing,
        }),
        PromoteOutcome::UnknownColumn => {
            report.rejected.push(Rejection::new(key, "unknown column"));
        }
        PromoteOutcome::Rejected => {
            report.rejected.push(Rejection::new(synonym, "empty synonym"));
        }
    }
}
