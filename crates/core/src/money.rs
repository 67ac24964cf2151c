//! Money
//!
//! Dual-currency amounts for the storefront. Every monetary value is held in
//! USD as a [`Decimal`]; bolívar (VES) amounts are derived from USD at the
//! leaves using the current exchange rate. The one exception is discount
//! amounts, which arrive from the backend in both currencies and are never
//! re-derived locally (the backend may have locked a different rate snapshot).

use jiff::civil::Date;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing price strings.
#[derive(Debug, Error)]
pub enum MoneyError {
    /// The input could not be read as a decimal amount.
    #[error("invalid price string: {0:?}")]
    InvalidPrice(String),
}

/// A USD→VES exchange rate snapshot.
///
/// Loaded once per checkout session. Everywhere a rate is consumed it is
/// optional: when none is available, VES display degrades to USD-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    /// Bolívares per one US dollar.
    pub rate: Decimal,
    /// The day the rate was published.
    pub date: Date,
    /// Where the rate came from, e.g. `"BCV"`.
    pub source: String,
}

/// Parses a price string into a [`Decimal`].
///
/// Accepts the backend's plain string-encoded decimals (`"10.50"`) as well as
/// USD-formatted display strings (`"$1,234.56"`). VES-formatted strings are
/// display-only and are not parsed back.
///
/// # Errors
///
/// Returns [`MoneyError::InvalidPrice`] when the input is not a decimal
/// amount.
pub fn parse_price(input: &str) -> Result<Decimal, MoneyError> {
    let cleaned: String = input
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| !matches!(c, ',' | ' '))
        .collect();

    if cleaned.is_empty() {
        return Err(MoneyError::InvalidPrice(input.to_owned()));
    }

    cleaned
        .parse::<Decimal>()
        .map_err(|_| MoneyError::InvalidPrice(input.to_owned()))
}

/// Derives a VES amount from a USD amount using the given rate.
///
/// Returns `None` when no rate is available (or the rate is not positive, a
/// state the backend has never produced but which must not yield a bogus
/// total). The result is rounded to two decimal places.
#[must_use]
pub fn derive_ves(usd: Decimal, rate: Option<&ExchangeRate>) -> Option<Decimal> {
    let rate = rate?;

    if rate.rate <= Decimal::ZERO {
        return None;
    }

    Some(round_cents(usd * rate.rate))
}

/// Rounds an amount to two decimal places, midpoint away from zero.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats a USD amount as `$1,234.56`.
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    let (sign, integer, fraction) = split_amount(amount);

    format!("{sign}${}.{fraction}", group_digits(&integer, ','))
}

/// Formats a VES amount with Venezuelan conventions, `Bs. 1.234,56`.
#[must_use]
pub fn format_ves(amount: Decimal) -> String {
    let (sign, integer, fraction) = split_amount(amount);

    format!("{sign}Bs. {},{fraction}", group_digits(&integer, '.'))
}

/// Rounds to cents and splits into sign, integer digits and two fraction
/// digits.
fn split_amount(amount: Decimal) -> (&'static str, String, String) {
    let rounded = round_cents(amount);
    let sign = if rounded.is_sign_negative() { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());

    match text.split_once('.') {
        Some((integer, fraction)) => (sign, integer.to_owned(), fraction.to_owned()),
        None => (sign, text, "00".to_owned()),
    }
}

/// Inserts a thousands separator every three digits.
fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped: Vec<char> = Vec::with_capacity(digits.len() + digits.len() / 3);

    for (position, digit) in digits.chars().rev().enumerate() {
        if position > 0 && position % 3 == 0 {
            grouped.push(separator);
        }

        grouped.push(digit);
    }

    grouped.iter().rev().collect()
}
