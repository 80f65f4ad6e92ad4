pub mod issue;
pub mod knowledge;
pub mod mapping;
pub mod table;

pub use issue::{IssueReason, SuggestionSource, ValidationIssue};
pub use knowledge::{HeaderProposal, SchemaChange, ValueTransform};
pub use mapping::{HeaderMapping, MappingMethod};
pub use table::Table;
