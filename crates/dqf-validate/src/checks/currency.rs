//! Currency codes.

use dqf_model::IssueReason;

use crate::CellOutcome;

const SYMBOLS: &[(&str, &str)] = &[
    ("₹", "INR"),
    ("$", "USD"),
    ("US$", "USD"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("¥", "JPY"),
];

const SYNONYMS: &[(&str, &str)] = &[
    ("rs", "INR"),
    ("rs.", "INR"),
    ("rupee", "INR"),
    ("rupees", "INR"),
    ("dollar", "USD"),
    ("dollars", "USD"),
    ("euro", "EUR"),
    ("euros", "EUR"),
    ("pound", "GBP"),
    ("pounds", "GBP"),
];

const ISO_CODES: &str = "AED ARS AUD BDT BGN BHD BRL CAD CHF CLP CNY COP CZK DKK EGP EUR GBP \
    HKD HUF IDR ILS INR JPY KES KRW KWD LKR MAD MXN MYR NGN NOK NPR NZD OMR PEN PHP PKR PLN \
    QAR RON RUB SAR SEK SGD THB TRY TWD UAH USD VND ZAR";

pub fn is_known_code(code: &str) -> bool {
    code.len() == 3 && ISO_CODES.split_whitespace().any(|known| known == code)
}

/// Maps symbols, common names and three-letter codes to an ISO 4217 code.
pub fn check_currency(raw: &str) -> CellOutcome {
    let value = raw.trim();
    if let Some((_, code)) = SYMBOLS.iter().find(|(symbol, _)| *symbol == value) {
        return CellOutcome::valid(*code);
    }
    let lower = value.to_lowercase();
    if let Some((_, code)) = SYNONYMS.iter().find(|(name, _)| *name == lower) {
        return CellOutcome::valid(*code);
    }
    let upper = value.to_uppercase();
    if is_known_code(&upper) {
        return CellOutcome::valid(upper);
    }
    CellOutcome::invalid(raw, IssueReason::UnknownCurrency)
}
