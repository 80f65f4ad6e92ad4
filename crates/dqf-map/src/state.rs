//! User overrides and mapping summaries.

use std::collections::BTreeMap;

use tracing::debug;

use dqf_model::{HeaderMapping, MappingMethod};
use dqf_schema::SchemaTruth;

use crate::error::MappingError;

/// Applies explicit user choices to engine mappings.
///
/// `overrides` maps a source header to a canonical key, or to `None` to
/// ignore the column. Every override is checked before any is applied.
pub fn apply_overrides(
    mappings: &[HeaderMapping],
    overrides: &BTreeMap<String, Option<String>>,
    schema: &SchemaTruth,
) -> Result<Vec<HeaderMapping>, MappingError> {
    for (header, key) in overrides {
        if !mappings.iter().any(|m| &m.source_header == header) {
            return Err(MappingError::UnknownHeader(header.clone()));
        }
        if let Some(key) = key
            && !schema.contains(key)
        {
            return Err(MappingError::UnknownCanonical {
                header: header.clone(),
                key: key.clone(),
            });
        }
    }

    Ok(mappings
        .iter()
        .map(|mapping| match overrides.get(&mapping.source_header) {
            Some(choice) => {
                let updated = mapping.overridden(choice.clone());
                if updated.method != mapping.method {
                    debug!(
                        header = %mapping.source_header,
                        canonical = updated.canonical.as_deref().unwrap_or("-"),
                        "applied override"
                    );
                }
                updated
            }
            None => mapping.clone(),
        })
        .collect())
}

/// Counts per method plus the headers left unmapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingSummary {
    pub total: usize,
    pub by_method: BTreeMap<MappingMethod, usize>,
    /// Headers without a canonical key, in source order.
    pub unmapped: Vec<String>,
}

impl MappingSummary {
    pub fn from_mappings(mappings: &[HeaderMapping]) -> Self {
        let mut summary = Self {
            total: mappings.len(),
            ..Self::default()
        };
        for mapping in mappings {
            *summary.by_method.entry(mapping.method).or_insert(0) += 1;
            if !mapping.is_mapped() {
                summary.unmapped.push(mapping.source_header.clone());
            }
        }
        summary
    }

    pub fn mapped(&self) -> usize {
        self.total - self.unmapped.len()
    }

    pub fn count(&self, method: MappingMethod) -> usize {
        self.by_method.get(&method).copied().unwrap_or(0)
    }
}
