//! Header resolution against the canonical schema.
//!
//! [`HeaderMapper`] runs an ordered strategy chain (canonical, regex, synonym,
//! fuzzy, oracle) and tags every decision with its method and confidence.
//! [`apply_overrides`] layers explicit user choices on top.

pub mod engine;
pub mod error;
pub mod score;
pub mod state;

pub use engine::{DEFAULT_FUZZY_THRESHOLD, HeaderMapper, MapperOptions};
pub use error::MappingError;
pub use score::{FuzzyMatch, best_fuzzy_match};
pub use state::{MappingSummary, apply_overrides};
