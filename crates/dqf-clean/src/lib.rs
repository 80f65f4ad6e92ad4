//! Cleaning engine and schema learning.
//!
//! [`CleaningEngine`] projects a raw table onto the canonical columns, runs
//! the column validators and collects the issue ledger. [`LearningSession`]
//! gathers accepted overrides, fixes and header proposals and promotes them
//! into the schema truth in one explicit step.

pub mod engine;
pub mod learning;

pub use engine::{
    CleanOptions, CleanOutcome, CleaningEngine, DEFAULT_PROPOSAL_SAMPLES, apply_fixes,
    apply_selected,
};
pub use learning::{LearningSession, PromotionConflict, PromotionReport, Rejection};
