//! Canonical schema truth.
//!
//! [`SchemaTruth`] owns the canonical columns, the merged synonym index and the
//! learned value transforms. [`SchemaStore`] loads it from and flushes it to the
//! JSON document on disk.

pub mod error;
pub mod store;
pub mod truth;

pub use error::SchemaError;
pub use store::{SchemaStore, parse_document, to_document};
pub use truth::{
    CanonicalColumn, KnownTerm, MergeConflict, MergeReport, PromoteOutcome, SchemaTruth,
    SynonymConflict, TransformOutcome,
};
