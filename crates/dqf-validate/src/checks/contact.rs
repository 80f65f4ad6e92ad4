//! Email and phone checks, plus extraction from helper columns.

use std::sync::LazyLock;

use regex::Regex;

use dqf_model::IssueReason;

use super::strip_whitespace;
use crate::CellOutcome;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static EMBEDDED_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("Invalid email regex")
});

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{7,}").expect("Invalid digit run regex"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d+$").expect("Invalid phone regex"));

const MIN_PHONE_DIGITS: usize = 7;

/// Header fragments marking raw columns that may hold contact details.
const HELPER_HINTS: &[&str] = &["contact", "mobile", "phone", "email", "e-mail"];

pub fn is_helper_header(header: &str) -> bool {
    let lower = header.to_lowercase();
    HELPER_HINTS.iter().any(|hint| lower.contains(hint))
}

pub fn check_email(raw: &str) -> CellOutcome {
    let value = strip_whitespace(raw);
    if EMAIL.is_match(&value) {
        return CellOutcome::valid(value);
    }
    if let Some(found) = EMBEDDED_EMAIL.find(&value) {
        return CellOutcome::invalid(raw, IssueReason::InvalidEmail)
            .with_suggestion(Some(found.as_str().to_string()));
    }
    if DIGIT_RUN.is_match(&value) {
        return CellOutcome::invalid(raw, IssueReason::PhoneInEmail);
    }
    CellOutcome::invalid(raw, IssueReason::InvalidEmail)
}

pub fn check_phone(raw: &str) -> CellOutcome {
    if raw.contains('@') {
        return CellOutcome::invalid(raw, IssueReason::EmailInPhone);
    }
    let value = strip_whitespace(raw);
    let stripped = phone_digits(&value);
    let enough = digit_count(&stripped) >= MIN_PHONE_DIGITS;
    if enough && PHONE.is_match(&value) {
        return CellOutcome::valid(value);
    }
    CellOutcome::invalid(raw, IssueReason::InvalidPhone).with_suggestion(enough.then_some(stripped))
}

/// Digits of `value`, keeping a `+` only when it precedes every digit.
fn phone_digits(value: &str) -> String {
    let mut out = String::new();
    for c in value.chars() {
        if c.is_ascii_digit() {
            out.push(c);
        } else if c == '+' && out.is_empty() {
            out.push(c);
        }
    }
    out
}

fn digit_count(value: &str) -> usize {
    value.chars().filter(char::is_ascii_digit).count()
}

/// First email address found in the row's helper values.
pub fn email_from_helpers(helpers: &[String]) -> Option<String> {
    helpers
        .iter()
        .find_map(|value| EMBEDDED_EMAIL.find(value.trim()))
        .map(|found| found.as_str().to_string())
}

/// First helper value carrying at least seven digits, as a phone number.
pub fn phone_from_helpers(helpers: &[String]) -> Option<String> {
    helpers
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty() && !EMAIL.is_match(value))
        .map(phone_digits)
        .find(|digits| digit_count(digits) >= MIN_PHONE_DIGITS)
}
