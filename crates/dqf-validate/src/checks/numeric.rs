//! Amounts, quantities and fractions.

use std::sync::LazyLock;

use regex::Regex;

use dqf_model::IssueReason;

use crate::CellOutcome;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+(\.\d+)?|\.\d+)$").expect("Invalid number regex"));

static EMBEDDED_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(\.\d+)?").expect("Invalid number regex"));

const CURRENCY_MARKS: &[char] = &['₹', '$', '€', '£', '¥'];

/// Drops currency symbols, thousands separators and whitespace.
fn clean_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && !CURRENCY_MARKS.contains(c))
        .collect()
}

fn parse_clean(value: &str) -> Option<f64> {
    if NUMBER.is_match(value) {
        value.parse().ok()
    } else {
        None
    }
}

/// The only number embedded in `value`, if there is exactly one and it is
/// not signed negative.
fn single_embedded(value: &str) -> Option<String> {
    let mut found = EMBEDDED_NUMBER.find_iter(value);
    let first = found.next()?;
    if found.next().is_some() || first.as_str().starts_with('-') {
        return None;
    }
    Some(first.as_str().to_string())
}

/// Integer digits of a whole number written as `007` or `12.00`, kept exactly.
fn whole_digits(value: &str) -> Option<&str> {
    let (integer, fraction) = value.split_once('.').unwrap_or((value, ""));
    if !integer.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b == b'0') {
        return None;
    }
    match integer.trim_start_matches('0') {
        "" => Some("0"),
        digits => Some(digits),
    }
}

fn format_number(value: f64) -> String {
    format!("{value}")
}

/// Non-negative number; `whole` additionally requires an integer.
pub fn check_numeric(raw: &str, whole: bool) -> CellOutcome {
    let cleaned = clean_number(raw);
    let Some(number) = parse_clean(&cleaned) else {
        return CellOutcome::invalid(raw, IssueReason::NotNumeric)
            .with_suggestion(single_embedded(&cleaned));
    };
    if number < 0.0 {
        return CellOutcome::invalid(raw, IssueReason::Negative);
    }
    if whole {
        if let Some(digits) = whole_digits(cleaned.trim_start_matches('+')) {
            return CellOutcome::valid(digits);
        }
        if number.fract() != 0.0 {
            return CellOutcome::invalid(raw, IssueReason::NotWholeNumber)
                .with_suggestion(Some(format_number(number.round())));
        }
        return CellOutcome::valid(format_number(number));
    }
    CellOutcome::valid(cleaned.trim_start_matches('+'))
}

fn format_fraction(value: f64) -> String {
    format_number((value * 10_000.0).round() / 10_000.0)
}

/// Fraction in [0, 1]; a `%` suffix divides by 100.
pub fn check_fraction(raw: &str) -> CellOutcome {
    let cleaned = clean_number(raw);
    let (body, percent) = match cleaned.strip_suffix('%') {
        Some(body) => (body, true),
        None => (cleaned.as_str(), false),
    };
    let Some(number) = parse_clean(body) else {
        return CellOutcome::invalid(raw, IssueReason::NotNumeric);
    };
    let fraction = if percent { number / 100.0 } else { number };
    if (0.0..=1.0).contains(&fraction) {
        return CellOutcome::valid(format_fraction(fraction));
    }
    let suggestion = (!percent && number > 1.0 && number <= 100.0)
        .then(|| format_fraction(number / 100.0));
    CellOutcome::invalid(raw, IssueReason::OutOfRange).with_suggestion(suggestion)
}
