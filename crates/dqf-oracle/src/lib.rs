//! Language-model oracle used as the last resort of header mapping and value
//! cleaning.
//!
//! Every oracle answer is advisory. Callers re-check results against the
//! schema and the column rules, and every failure is reported as "no answer".

pub mod config;
pub mod error;
pub mod openai;
pub mod parse;

pub use config::{OracleConfig, have_credentials};
pub use error::OracleError;
pub use openai::OpenAiOracle;

use dqf_model::HeaderProposal;

/// Source of non-deterministic answers.
pub trait Oracle {
    /// Whether calls may be attempted at all.
    fn is_available(&self) -> bool;

    /// Picks one of `keys` for an unmatched header.
    fn resolve_header(&self, header: &str, keys: &[&str]) -> Option<String>;

    /// Proposes a schema definition for a header no column matched.
    fn propose_new_header(&self, header: &str, samples: &[String]) -> Option<HeaderProposal>;

    /// Suggests a cleaned replacement for a value that failed validation.
    fn suggest_value(&self, column: &str, raw: &str, description: &str) -> Option<String>;
}

/// Oracle that never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOracle;

impl Oracle for DisabledOracle {
    fn is_available(&self) -> bool {
        false
    }

    fn resolve_header(&self, _header: &str, _keys: &[&str]) -> Option<String> {
        None
    }

    fn propose_new_header(&self, _header: &str, _samples: &[String]) -> Option<HeaderProposal> {
        None
    }

    fn suggest_value(&self, _column: &str, _raw: &str, _description: &str) -> Option<String> {
        None
    }
}

impl<T: Oracle + ?Sized> Oracle for &T {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn resolve_header(&self, header: &str, keys: &[&str]) -> Option<String> {
        (**self).resolve_header(header, keys)
    }

    fn propose_new_header(&self, header: &str, samples: &[String]) -> Option<HeaderProposal> {
        (**self).propose_new_header(header, samples)
    }

    fn suggest_value(&self, column: &str, raw: &str, description: &str) -> Option<String> {
        (**self).suggest_value(column, raw, description)
    }
}
