//! Fee parsing and formatting.
//!
//! Amounts are exact decimals end to end; rounding happens once, to two
//! places, midpoint away from zero.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::debug;

use contractgen_shared::{ContractGenError, CurrencyInfo, ReferenceData, Result};

use crate::words;

/// A fee in every shape the documents need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedAmount {
    /// The parsed amount as entered.
    pub amount: Decimal,
    /// Two decimals with thousands grouping (`2,000.00`).
    pub display: String,
    /// Amount in words, or `<display> <CODE>` when words are unavailable.
    pub words: String,
    /// The amount converted to the reference currency, rounded.
    pub equivalent: Decimal,
    /// [`Self::equivalent`] formatted like [`Self::display`].
    pub equivalent_display: String,
    pub currency: CurrencyInfo,
}

/// Parse a raw fee string. Grouping commas and whitespace are ignored.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(ContractGenError::invalid_amount(raw, "amount is empty"));
    }
    let amount: Decimal = cleaned
        .parse()
        .map_err(|e| ContractGenError::invalid_amount(raw, format!("not a number: {e}")))?;
    if amount <= Decimal::ZERO {
        return Err(ContractGenError::invalid_amount(
            raw,
            "amount must be greater than zero",
        ));
    }
    Ok(amount)
}

/// Round to two places, midpoint away from zero, keeping both decimals.
pub fn round_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Two-decimal display with `,` thousands grouping.
pub fn format_display(amount: Decimal) -> String {
    let text = round_cents(amount).to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*d);
    }
    format!("{sign}{grouped}.{frac_part}")
}

/// `amount × rate`, rounded to cents.
pub fn equivalent(amount: Decimal, rate: Decimal) -> Result<Decimal> {
    amount
        .checked_mul(rate)
        .map(round_cents)
        .ok_or_else(|| ContractGenError::invalid_amount(amount.to_string(), "amount too large"))
}

/// Amount in words in the currency's units, title-cased.
///
/// Returns `None` when the currency has no unit names or the amount is too
/// large to spell.
pub fn amount_in_words(amount: Decimal, currency: &CurrencyInfo) -> Option<String> {
    let units = currency.units.as_ref()?;
    let cents = round_cents(amount);
    let major = cents.trunc();
    let minor = ((cents - major) * Decimal::ONE_HUNDRED).trunc();

    let major = major.to_u64()?;
    let minor = minor.to_u8()?;
    words::currency(major, minor, units).map(|w| words::title_case(&w))
}

/// Parse and format `raw` in `currency_code`.
pub fn format_amount(
    raw: &str,
    currency_code: &str,
    reference: &ReferenceData,
) -> Result<FormattedAmount> {
    let currency = reference.currency(currency_code)?.clone();
    let amount = parse_amount(raw)?;
    let display = format_display(amount);

    let words = amount_in_words(amount, &currency).unwrap_or_else(|| {
        debug!(code = currency.code, "no words for amount, using plain display");
        format!("{display} {}", currency.code)
    });

    let equivalent = equivalent(amount, currency.rate)?;
    let equivalent_display = format_display(equivalent);

    Ok(FormattedAmount {
        amount,
        display,
        words,
        equivalent,
        equivalent_display,
        currency,
    })
}
