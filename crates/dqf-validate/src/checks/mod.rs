//! Per-rule value checks.

pub mod contact;
pub mod currency;
pub mod dates;
pub mod identifier;
pub mod numeric;

pub(crate) fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}
