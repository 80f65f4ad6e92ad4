//! Header-to-canonical mapping types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Strategy that produced a header mapping.
///
/// Variants are declared from most to least trustworthy; `Override` marks an
/// explicit user decision and sits outside that ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingMethod {
    /// Normalized header equals a canonical key.
    Canonical,
    /// Header matched a canonical column's header pattern.
    Regex,
    /// Header found in the merged synonym index.
    Synonym,
    /// Header is similar enough to a known key or synonym.
    Fuzzy,
    /// Header resolved by the optional oracle.
    Llm,
    /// No strategy matched.
    Unmapped,
    /// Explicit user choice.
    Override,
}

impl MappingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::Regex => "regex",
            Self::Synonym => "synonym",
            Self::Fuzzy => "fuzzy",
            Self::Llm => "llm",
            Self::Unmapped => "unmapped",
            Self::Override => "override",
        }
    }

    /// Fixed confidence for the method, `None` when it is score-based.
    pub fn fixed_confidence(&self) -> Option<f64> {
        match self {
            Self::Canonical | Self::Override => Some(1.0),
            Self::Regex => Some(0.95),
            Self::Synonym => Some(0.9),
            Self::Fuzzy => None,
            Self::Llm => Some(0.6),
            Self::Unmapped => Some(0.0),
        }
    }

    /// True for methods whose result can be reproduced without the oracle.
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, Self::Llm)
    }
}

impl fmt::Display for MappingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping decision for one source header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderMapping {
    /// Header as it appears in the source file.
    pub source_header: String,
    /// Canonical key, `None` when unmapped or ignored.
    pub canonical: Option<String>,
    /// Confidence score (0.0 to 1.0).
    pub confidence: f64,
    /// Strategy that produced the mapping.
    pub method: MappingMethod,
}

impl HeaderMapping {
    pub fn new(
        source_header: impl Into<String>,
        canonical: Option<String>,
        confidence: f64,
        method: MappingMethod,
    ) -> Self {
        Self {
            source_header: source_header.into(),
            canonical,
            confidence: confidence.clamp(0.0, 1.0),
            method,
        }
    }

    pub fn unmapped(source_header: impl Into<String>) -> Self {
        Self::new(source_header, None, 0.0, MappingMethod::Unmapped)
    }

    pub fn is_mapped(&self) -> bool {
        self.canonical.is_some()
    }

    /// Replaces the decision with an explicit user choice.
    ///
    /// Choosing the mapping that is already in place keeps the original
    /// method and confidence.
    pub fn overridden(&self, canonical: Option<String>) -> Self {
        if canonical == self.canonical {
            return self.clone();
        }
        Self {
            source_header: self.source_header.clone(),
            canonical,
            confidence: 1.0,
            method: MappingMethod::Override,
        }
    }
}
