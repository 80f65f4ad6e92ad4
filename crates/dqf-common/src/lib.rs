//! Shared utilities for the data quality fixer crates.
//!
//! This crate provides the header normalizer used by schema lookups,
//! header mapping and synonym promotion.

pub mod normalize;

// Re-export commonly used functions at crate root for convenience
pub use normalize::{compact, normalize};
