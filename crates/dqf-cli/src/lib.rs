//! CLI library components for the data quality fixer.

pub mod logging;
pub mod workflow;
