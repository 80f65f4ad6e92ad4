//! Learnable schema knowledge exchanged between the engine and the store.

use serde::{Deserialize, Serialize};

/// Learned value rewrite for a canonical column.
///
/// `pattern` is a regular expression matched case-insensitively against the
/// whole trimmed raw value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueTransform {
    pub pattern: String,
    pub suggest: String,
}

impl ValueTransform {
    pub fn new(pattern: impl Into<String>, suggest: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            suggest: suggest.into(),
        }
    }
}

/// Definition proposed for a header that matched no canonical column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeaderProposal {
    /// Proposed canonical key (snake_case).
    #[serde(alias = "canonical", alias = "header")]
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub header_regex: Option<String>,
}

/// Entry of the session change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SchemaChange {
    AddHeader { canonical: String, source: String },
    PromoteSynonym { canonical: String, synonym: String },
    RecordTransform {
        column: String,
        pattern: String,
        suggest: String,
    },
}

impl SchemaChange {
    pub fn action(&self) -> &'static str {
        match self {
            Self::AddHeader { .. } => "add_header",
            Self::PromoteSynonym { .. } => "promote_synonym",
            Self::RecordTransform { .. } => "record_transform",
        }
    }

    /// Canonical column the change applies to.
    pub fn canonical(&self) -> &str {
        match self {
            Self::AddHeader { canonical, .. } | Self::PromoteSynonym { canonical, .. } => canonical,
            Self::RecordTransform { column, .. } => column,
        }
    }
}
