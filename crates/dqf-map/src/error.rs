//! Error types for mapping operations.

use std::fmt;

/// Errors from applying user overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Override names a canonical key the schema does not define.
    UnknownCanonical { header: String, key: String },
    /// Override names a header that is not in the source.
    UnknownHeader(String),
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCanonical { header, key } => {
                write!(f, "Override for '{header}' names unknown canonical key '{key}'")
            }
            Self::UnknownHeader(header) => write!(f, "Header not found in source: {header}"),
        }
    }
}

impl std::error::Error for MappingError {}
