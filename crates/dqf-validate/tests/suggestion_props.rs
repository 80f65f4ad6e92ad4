//! Property tests for suggestion derivation.
use proptest::prelude::*;

use dqf_validate::{ValidationContext, validate_cell};

const KEYS: &[&str] = &[
    "order_id",
    "customer_id",
    "product_sku",
    "tax_id",
    "postal_code",
    "email",
    "phone",
    "quantity",
    "unit_price",
    "discount_pct",
    "currency",
    "city",
];

proptest! {
    #[test]
    fn every_suggestion_passes_its_rule(
        key in prop::sample::select(KEYS),
        raw in "[0-9A-Za-z@.+%/ -]{0,16}",
    ) {
        let ctx = ValidationContext::new();
        let outcome = validate_cell(key, &raw, &ctx);
        if let Some(suggestion) = outcome.suggestion {
            prop_assert!(!outcome.valid);
            let again = validate_cell(key, &suggestion, &ctx);
            prop_assert!(again.valid, "{key}: {raw:?} suggested {suggestion:?}");
        }
    }

    #[test]
    fn free_text_is_always_valid(raw in "\\PC{0,24}") {
        let outcome = validate_cell("customer_name", &raw, &ValidationContext::new());
        prop_assert!(outcome.valid);
        prop_assert_eq!(outcome.value, raw.trim());
    }
}
