//! Mapping engine implementation.

use std::collections::BTreeMap;

use tracing::{debug, info};

use dqf_common::{compact, normalize};
use dqf_model::{HeaderMapping, MappingMethod};
use dqf_oracle::{DisabledOracle, Oracle};
use dqf_schema::{KnownTerm, SchemaTruth};

use crate::score::best_fuzzy_match;

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;

/// Fuzzy confidences stay strictly between the oracle and synonym scores.
///
/// A fuzzy confidence is the similarity scaled by the active threshold, not
/// the raw similarity: a raw score of 0.95 would outrank a synonym hit. The
/// scaling keeps closer matches ahead of looser ones inside this band.
const FUZZY_CONFIDENCE_FLOOR: f64 = 0.61;
const FUZZY_CONFIDENCE_CEILING: f64 = 0.89;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapperOptions {
    /// Minimum Jaro-Winkler similarity for a fuzzy match.
    pub fuzzy_threshold: f64,
    /// Consult the oracle for headers no deterministic strategy resolves.
    pub use_oracle: bool,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            use_oracle: true,
        }
    }
}

impl MapperOptions {
    #[must_use]
    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold.clamp(f64::EPSILON, 1.0);
        self
    }

    #[must_use]
    pub fn with_oracle(mut self, use_oracle: bool) -> Self {
        self.use_oracle = use_oracle;
        self
    }
}

struct KeyForms<'a> {
    key: &'a str,
    normalized: String,
    compact: String,
}

/// Resolves source headers to canonical keys.
///
/// Strategies run in a fixed order and the first match wins:
/// canonical, regex, synonym, fuzzy, oracle, unmapped.
pub struct HeaderMapper<'a, O = DisabledOracle> {
    schema: &'a SchemaTruth,
    oracle: O,
    options: MapperOptions,
    keys: Vec<KeyForms<'a>>,
    terms: Vec<KnownTerm<'a>>,
}

impl<'a> HeaderMapper<'a, DisabledOracle> {
    pub fn new(schema: &'a SchemaTruth) -> Self {
        let keys = schema
            .keys()
            .map(|key| KeyForms {
                key,
                normalized: normalize(key),
                compact: compact(key),
            })
            .collect();
        Self {
            schema,
            oracle: DisabledOracle,
            options: MapperOptions::default(),
            keys,
            terms: schema.known_terms(),
        }
    }
}

impl<'a, O: Oracle> HeaderMapper<'a, O> {
    #[must_use]
    pub fn with_oracle<P: Oracle>(self, oracle: P) -> HeaderMapper<'a, P> {
        HeaderMapper {
            schema: self.schema,
            oracle,
            options: self.options,
            keys: self.keys,
            terms: self.terms,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: MapperOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> MapperOptions {
        self.options
    }

    /// Maps every header, preserving input order.
    pub fn map<S: AsRef<str>>(&self, headers: &[S]) -> Vec<HeaderMapping> {
        let mappings: Vec<HeaderMapping> = headers
            .iter()
            .map(|header| self.map_header(header.as_ref()))
            .collect();

        let mut counts: BTreeMap<MappingMethod, usize> = BTreeMap::new();
        for mapping in &mappings {
            *counts.entry(mapping.method).or_insert(0) += 1;
        }
        info!(headers = mappings.len(), methods = ?counts, "mapped headers");
        mappings
    }

    pub fn map_header(&self, header: &str) -> HeaderMapping {
        let mapping = self.resolve(header);
        debug!(
            header,
            canonical = mapping.canonical.as_deref().unwrap_or("-"),
            method = %mapping.method,
            confidence = mapping.confidence,
            "resolved header"
        );
        mapping
    }

    fn resolve(&self, header: &str) -> HeaderMapping {
        let normalized = normalize(header);
        if normalized.is_empty() {
            return HeaderMapping::unmapped(header);
        }
        let compacted = compact(header);

        if let Some(forms) = self.keys.iter().find(|forms| {
            forms.normalized == normalized || (!compacted.is_empty() && forms.compact == compacted)
        }) {
            return fixed(header, forms.key, MappingMethod::Canonical);
        }

        if let Some(key) = self.schema.match_pattern(header) {
            return fixed(header, key, MappingMethod::Regex);
        }

        if let Some(key) = self.schema.lookup_synonym(header) {
            return fixed(header, key, MappingMethod::Synonym);
        }

        let threshold = self.options.fuzzy_threshold;
        if let Some(found) = best_fuzzy_match(header, &self.terms, threshold) {
            let confidence = (found.similarity * threshold)
                .clamp(FUZZY_CONFIDENCE_FLOOR, FUZZY_CONFIDENCE_CEILING);
            debug!(header, term = %found.term, similarity = found.similarity, "fuzzy candidate");
            return HeaderMapping::new(
                header,
                Some(found.key.to_string()),
                confidence,
                MappingMethod::Fuzzy,
            );
        }

        if let Some(key) = self.ask_oracle(header) {
            return fixed(header, &key, MappingMethod::Llm);
        }

        HeaderMapping::unmapped(header)
    }

    fn ask_oracle(&self, header: &str) -> Option<String> {
        if !self.options.use_oracle || !self.oracle.is_available() {
            return None;
        }
        let keys: Vec<&str> = self.keys.iter().map(|forms| forms.key).collect();
        let answer = self.oracle.resolve_header(header, &keys)?;
        let answer = answer.trim();
        if self.schema.contains(answer) {
            Some(answer.to_string())
        } else {
            debug!(header, answer, "oracle answered with an unknown key");
            None
        }
    }
}

fn fixed(header: &str, key: &str, method: MappingMethod) -> HeaderMapping {
    let confidence = method.fixed_confidence().unwrap_or_default();
    HeaderMapping::new(header, Some(key.to_string()), confidence, method)
}
