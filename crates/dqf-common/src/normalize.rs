//! Header normalization for comparisons.
//!
//! Two forms are exposed:
//! - [`normalize`]: lowercase, symbol-harmonized, single-spaced text
//! - [`compact`]: the normalized text with every non-alphanumeric character removed
//!
//! Both functions are total and idempotent.

/// Normalizes text for comparison.
///
/// - Trims and lowercases
/// - Maps dash and quote variants to their ASCII form
/// - Maps Unicode spaces to a plain space and drops zero-width characters
/// - Collapses runs of whitespace to a single space
pub fn normalize(raw: &str) -> String {
    let harmonized: String = raw.chars().filter_map(harmonize_char).collect();
    harmonized
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compact form of [`normalize`] used for strict equality checks.
///
/// `%` and `#` keep their meaning as `pct` and `num` before all
/// remaining non-alphanumeric characters are stripped.
pub fn compact(raw: &str) -> String {
    let normalized = normalize(raw);
    let mut out = String::with_capacity(normalized.len());
    for ch in normalized.chars() {
        match ch {
            '%' => out.push_str("pct"),
            '#' => out.push_str("num"),
            c if c.is_alphanumeric() => out.push(c),
            _ => {}
        }
    }
    out
}

fn harmonize_char(ch: char) -> Option<char> {
    match ch {
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' | '\u{FE63}' | '\u{FF0D}' => Some('-'),
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{FF07}' => Some('\''),
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{FF02}' => Some('"'),
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' => None,
        c if c.is_whitespace() => Some(' '),
        c => Some(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(normalize("  Order \t  Number "), "order number");
    }

    #[test]
    fn harmonizes_dashes_and_quotes() {
        assert_eq!(normalize("E\u{2013}Mail"), "e-mail");
        assert_eq!(normalize("Customer\u{2019}s Name"), "customer's name");
        assert_eq!(normalize("Ship\u{00A0}Fee"), "ship fee");
    }

    #[test]
    fn compact_strips_separators() {
        assert_eq!(compact("Order_ID"), "orderid");
        assert_eq!(compact("order-id"), "orderid");
        assert_eq!(compact("Order ID"), "orderid");
    }

    #[test]
    fn compact_keeps_symbol_hints() {
        assert_eq!(compact("Discount %"), "discountpct");
        assert_eq!(compact("Order #"), "ordernum");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(compact("   "), "");
    }
}
