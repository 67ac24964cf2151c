//! Discounts
//!
//! Discount codes are validated by the backend against the exact order
//! subtotal; the client never computes an amount itself. The validated
//! amount comes back in both currencies and stays bound to the subtotal it
//! was validated against. If the subtotal later changes, the amount is
//! stale and must be cleared and re-validated, never reused.

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a discount's value is interpreted. The distinction only matters
/// server-side; the client treats the resulting amount as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

/// The catalog shape of a discount code, as the admin back office defines
/// it. Checkout never evaluates these rules locally; they are listed here
/// because admin responses carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    /// Codes are case-normalized to uppercase.
    pub code: String,
    pub kind: DiscountKind,
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub min_purchase: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub max_discount: Option<Decimal>,
    #[serde(default)]
    pub starts_at: Option<Timestamp>,
    #[serde(default)]
    pub ends_at: Option<Timestamp>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    pub times_used: u32,
    pub active: bool,
}

/// A successfully validated discount: opaque amounts in both currencies.
///
/// The VES amount is authoritative from the server and is never re-derived
/// from the USD amount locally: the backend may have locked a different
/// rate snapshot than the one used for subtotal display.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDiscount {
    pub code: String,
    pub amount_usd: Decimal,
    pub amount_ves: Option<Decimal>,
}

/// The validator's result. A rejected code is an expected outcome, not an
/// error; the reason is the backend's human-readable message (unknown code,
/// expired, usage cap reached, below minimum purchase).
#[derive(Debug, Clone, PartialEq)]
pub enum DiscountOutcome {
    Valid(ValidatedDiscount),
    Invalid { reason: String },
}

/// A validated discount held by the checkout flow, bound to the subtotal it
/// was validated against.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDiscount {
    pub code: String,
    /// The order subtotal the backend computed the amounts for.
    pub subtotal_usd: Decimal,
    pub amount_usd: Decimal,
    pub amount_ves: Option<Decimal>,
}

impl AppliedDiscount {
    /// Binds a validation result to the subtotal it was requested with.
    #[must_use]
    pub fn bind(validated: ValidatedDiscount, subtotal_usd: Decimal) -> Self {
        Self {
            code: validated.code,
            subtotal_usd,
            amount_usd: validated.amount_usd,
            amount_ves: validated.amount_ves,
        }
    }

    /// Whether the subtotal has drifted since validation. A stale amount
    /// must not be honored.
    #[must_use]
    pub fn is_stale(&self, current_subtotal_usd: Decimal) -> bool {
        self.subtotal_usd != current_subtotal_usd
    }
}

/// Normalizes a user-entered code: trimmed, uppercased.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn normalize_code_trims_and_uppercases() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
        assert_eq!(normalize_code("NAVIDAD25"), "NAVIDAD25");
    }

    #[test]
    fn applied_discount_detects_subtotal_drift() -> TestResult {
        let applied = AppliedDiscount::bind(
            ValidatedDiscount {
                code: "SAVE10".to_owned(),
                amount_usd: "10".parse()?,
                amount_ves: Some("365".parse()?),
            },
            "100".parse()?,
        );

        assert!(!applied.is_stale("100".parse()?));
        assert!(applied.is_stale("150".parse()?));

        Ok(())
    }

    #[test]
    fn discount_catalog_shape_deserializes() -> TestResult {
        let discount: Discount = serde_json::from_str(
            r#"{
                "code": "SAVE10",
                "kind": "percentage",
                "value": "10",
                "minPurchase": "50.00",
                "usageLimit": 100,
                "timesUsed": 3,
                "active": true
            }"#,
        )?;

        assert_eq!(discount.kind, DiscountKind::Percentage);
        assert_eq!(discount.min_purchase, Some("50.00".parse()?));
        assert_eq!(discount.max_discount, None);
        assert_eq!(discount.ends_at, None);

        Ok(())
    }
}
