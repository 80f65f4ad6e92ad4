//! Issue ledger entries produced while cleaning a dataset.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::knowledge::HeaderProposal;

/// Why a cell or column was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueReason {
    /// Required value is empty.
    Empty,
    /// Value does not match the column's identifier format.
    InvalidFormat,
    /// Postal code with the wrong number of digits.
    WrongLength,
    /// Value is not a real calendar date.
    InvalidDate,
    InvalidEmail,
    /// Phone number found in the email column.
    PhoneInEmail,
    InvalidPhone,
    /// Email address found in the phone column.
    EmailInPhone,
    NotNumeric,
    Negative,
    /// Quantity is not a whole number.
    NotWholeNumber,
    /// Fraction outside [0, 1].
    OutOfRange,
    UnknownCurrency,
    /// Canonical column absent from the source.
    MissingColumn,
    /// Source column that was not mapped or was ignored.
    ExtraColumn,
    /// Source column mapped to a key already taken by an earlier column.
    DuplicateMapping,
    /// Unmapped header with a proposed schema definition.
    NewHeaderProposal,
}

impl IssueReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::InvalidFormat => "invalid format",
            Self::WrongLength => "wrong length",
            Self::InvalidDate => "invalid date",
            Self::InvalidEmail => "invalid email",
            Self::PhoneInEmail => "phone found in email field",
            Self::InvalidPhone => "invalid phone",
            Self::EmailInPhone => "email found in phone field",
            Self::NotNumeric => "not numeric",
            Self::Negative => "negative value",
            Self::NotWholeNumber => "not a whole number",
            Self::OutOfRange => "out of range",
            Self::UnknownCurrency => "unknown currency",
            Self::MissingColumn => "missing column",
            Self::ExtraColumn => "extra column",
            Self::DuplicateMapping => "duplicate mapping",
            Self::NewHeaderProposal => "new header proposal",
        }
    }

    /// True for column-level reasons that never carry a row index.
    pub fn is_summary(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn | Self::ExtraColumn | Self::DuplicateMapping | Self::NewHeaderProposal
        )
    }
}

impl fmt::Display for IssueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    /// The column rule repaired the value itself.
    Rule,
    /// Taken from a contact helper column of the same row.
    Helper,
    /// A learned value transform matched.
    Transform,
    Oracle,
}

impl SuggestionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Helper => "helper",
            Self::Transform => "transform",
            Self::Oracle => "oracle",
        }
    }

    /// Only oracle answers carry knowledge the schema does not already hold.
    pub fn is_learnable(&self) -> bool {
        matches!(self, Self::Oracle)
    }
}

/// A single entry of the issue ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Zero-based row in the proposed table; `None` for column-level issues.
    pub row_index: Option<usize>,
    /// Canonical key for cell issues, source header for extra columns.
    pub column: String,
    /// Raw cell value.
    pub value: Option<String>,
    pub reason: IssueReason,
    /// Replacement value that passes the column rule.
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SuggestionSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal: Option<HeaderProposal>,
}

impl ValidationIssue {
    pub fn cell(
        row_index: usize,
        column: impl Into<String>,
        value: impl Into<String>,
        reason: IssueReason,
        suggestion: Option<String>,
    ) -> Self {
        Self {
            row_index: Some(row_index),
            column: column.into(),
            value: Some(value.into()),
            reason,
            suggestion,
            source: None,
            proposal: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Option<SuggestionSource>) -> Self {
        self.source = source;
        self
    }

    pub fn column(column: impl Into<String>, reason: IssueReason) -> Self {
        Self {
            row_index: None,
            column: column.into(),
            value: None,
            reason,
            suggestion: None,
            source: None,
            proposal: None,
        }
    }

    pub fn proposal(column: impl Into<String>, proposal: HeaderProposal) -> Self {
        Self {
            proposal: Some(proposal),
            ..Self::column(column, IssueReason::NewHeaderProposal)
        }
    }

    /// Whether `apply_fixes` can act on this issue.
    pub fn is_fixable(&self) -> bool {
        self.row_index.is_some() && self.suggestion.is_some()
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row_index {
            Some(row) => write!(f, "row {row}, {}: {}", self.column, self.reason)?,
            None => write!(f, "{}: {}", self.column, self.reason)?,
        }
        if let Some(value) = &self.value {
            write!(f, " ({value:?})")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " -> {suggestion}")?;
        }
        Ok(())
    }
}
