//! Business identifiers and postal codes.

use std::sync::LazyLock;

use regex::Regex;

use dqf_model::IssueReason;

use super::strip_whitespace;
use crate::CellOutcome;

static ORDER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ORD-\d{4}$").expect("Invalid order id regex"));
static ORDER_ID_LOOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ORD(\d{4})$").expect("Invalid order id regex"));

static CUSTOMER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CUST-\d+$").expect("Invalid customer id regex"));
static CUSTOMER_ID_LOOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CUST(\d+)$").expect("Invalid customer id regex"));

static SKU: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}-\d{4}$").expect("Invalid SKU regex"));
static SKU_LOOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{2})(\d{4})$").expect("Invalid SKU regex"));

/// Indian GST identification number.
static GSTIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$").expect("Invalid GSTIN regex")
});

static PIN6: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}$").expect("Invalid postal code regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// `ORD-dddd`
    OrderId,
    /// `CUST-d+`
    CustomerId,
    /// `AA-dddd`
    ProductSku,
    Gstin,
}

impl IdentifierKind {
    /// Strict pattern, loose pattern over the alphanumeric-only value, and
    /// the replacement that rebuilds the strict form.
    fn patterns(self) -> (&'static Regex, &'static Regex, &'static str) {
        match self {
            Self::OrderId => (&*ORDER_ID, &*ORDER_ID_LOOSE, "ORD-${1}"),
            Self::CustomerId => (&*CUSTOMER_ID, &*CUSTOMER_ID_LOOSE, "CUST-${1}"),
            Self::ProductSku => (&*SKU, &*SKU_LOOSE, "${1}-${2}"),
            Self::Gstin => (&*GSTIN, &*GSTIN, "${0}"),
        }
    }
}

/// Uppercases and removes whitespace, then checks the identifier format.
pub fn check_identifier(kind: IdentifierKind, raw: &str) -> CellOutcome {
    let value = strip_whitespace(raw).to_uppercase();
    let (strict, loose, template) = kind.patterns();
    if strict.is_match(&value) {
        return CellOutcome::valid(value);
    }
    let alphanumeric: String = value.chars().filter(char::is_ascii_alphanumeric).collect();
    let suggestion = loose
        .is_match(&alphanumeric)
        .then(|| loose.replace(&alphanumeric, template).into_owned());
    CellOutcome::invalid(raw, IssueReason::InvalidFormat).with_suggestion(suggestion)
}

/// Six digit PIN code.
pub fn check_postal(raw: &str) -> CellOutcome {
    let value = strip_whitespace(raw);
    if PIN6.is_match(&value) {
        return CellOutcome::valid(value);
    }
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 6 {
        CellOutcome::invalid(raw, IssueReason::InvalidFormat).with_suggestion(Some(digits))
    } else {
        CellOutcome::invalid(raw, IssueReason::WrongLength)
    }
}
