//! Rule table: which check applies to which canonical key.

use crate::CellOutcome;
use crate::checks::contact::{check_email, check_phone};
use crate::checks::currency::check_currency;
use crate::checks::dates::check_date;
use crate::checks::identifier::{IdentifierKind, check_identifier, check_postal};
use crate::checks::numeric::{check_fraction, check_numeric};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Identifier(IdentifierKind),
    Postal,
    Date,
    Email,
    Phone,
    /// Non-negative number; `whole` for counts.
    Numeric { whole: bool },
    Fraction,
    Currency,
    /// Trimmed, always valid, may be empty.
    FreeText,
}

/// Rule for a canonical key. Unknown keys are free text.
pub fn rule_for(key: &str) -> Rule {
    match key {
        "order_id" => Rule::Identifier(IdentifierKind::OrderId),
        "customer_id" => Rule::Identifier(IdentifierKind::CustomerId),
        "product_sku" => Rule::Identifier(IdentifierKind::ProductSku),
        "tax_id" => Rule::Identifier(IdentifierKind::Gstin),
        "postal_code" => Rule::Postal,
        "order_date" => Rule::Date,
        "email" => Rule::Email,
        "phone" => Rule::Phone,
        "quantity" => Rule::Numeric { whole: true },
        "unit_price" | "shipping_fee" | "total_amount" => Rule::Numeric { whole: false },
        "discount_pct" | "tax_pct" => Rule::Fraction,
        "currency" => Rule::Currency,
        _ => Rule::FreeText,
    }
}

impl Rule {
    pub fn requires_value(&self) -> bool {
        !matches!(self, Self::FreeText)
    }

    /// Runs the check on a non-empty raw value.
    pub fn check(&self, raw: &str) -> CellOutcome {
        match *self {
            Self::Identifier(kind) => check_identifier(kind, raw),
            Self::Postal => check_postal(raw),
            Self::Date => check_date(raw),
            Self::Email => check_email(raw),
            Self::Phone => check_phone(raw),
            Self::Numeric { whole } => check_numeric(raw, whole),
            Self::Fraction => check_fraction(raw),
            Self::Currency => check_currency(raw),
            Self::FreeText => CellOutcome::valid(raw.trim()),
        }
    }

    /// Normalized form of `candidate` when it passes this rule.
    pub fn confirm(&self, candidate: &str) -> Option<String> {
        if candidate.trim().is_empty() {
            return None;
        }
        let outcome = self.check(candidate);
        outcome.valid.then_some(outcome.value)
    }
}
