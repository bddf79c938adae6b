//! Price and number rendering.
//!
//! Values are rounded half away from zero on their magnitude, so `-1.005`
//! and `1.005` differ only by the leading minus sign.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{CurrencyError, Result};

pub const NUM_PLACEHOLDER: &str = "%NUM%";
pub const SYMBOL_PLACEHOLDER: &str = "%SYMBOL%";

/// Precision used wherever a bare exchange rate is displayed.
pub const RATE_PRECISION: u32 = 3;

/// Largest scale a `Decimal` can carry.
pub const MAX_PRECISION: u32 = 28;

/// Formats `value` and substitutes it together with `symbol` into `template`.
pub fn format_price(
    value: f64,
    precision: u32,
    thousand_separator: &str,
    decimal_separator: &str,
    symbol: &str,
    template: &str,
) -> Result<String> {
    let price = format(value, precision, decimal_separator, thousand_separator)?;

    Ok(template
        .replace(NUM_PLACEHOLDER, &price)
        .replace(SYMBOL_PLACEHOLDER, symbol))
}

/// Formats `value` without any template.
pub fn format(
    value: f64,
    precision: u32,
    decimal_separator: &str,
    thousand_separator: &str,
) -> Result<String> {
    let value = to_decimal(value)?;
    Ok(format_decimal(
        value,
        precision,
        decimal_separator,
        thousand_separator,
    ))
}

/// Compact rendering of an exchange rate: three decimals, `.` and a space.
pub fn format_rate(rate: Decimal) -> String {
    format_decimal(rate, RATE_PRECISION, ".", " ")
}

/// Converts a float into a decimal using its shortest round-trip text, so
/// `1.005` stays `1.005` instead of `1.00499999...`.
pub fn to_decimal(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(CurrencyError::InvalidNumber(value.to_string()));
    }

    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .ok_or_else(|| CurrencyError::InvalidNumber(value.to_string()))
}

pub fn round_half_away(value: Decimal, precision: u32) -> Decimal {
    let magnitude = value
        .abs()
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);

    if value.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    }
}

pub fn format_decimal(
    value: Decimal,
    precision: u32,
    decimal_separator: &str,
    thousand_separator: &str,
) -> String {
    let rounded = round_half_away(value, precision);
    let plain = rounded.abs().to_string();
    let (integer, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), ""));

    let mut out = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&group_thousands(integer, thousand_separator));

    if precision > 0 {
        out.push_str(decimal_separator);
        out.push_str(fraction);
        for _ in fraction.len()..precision as usize {
            out.push('0');
        }
    }

    out
}

fn group_thousands(integer: &str, separator: &str) -> String {
    let len = integer.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());

    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(digit);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn formats_czech_price() {
        let price = format_price(1234567.89, 2, " ", ",", "Kč", "%NUM% %SYMBOL%").unwrap();
        assert_eq!(price, "1 234 567,89 Kč");
    }

    #[test]
    fn passes_template_text_through() {
        let price = format_price(9.5, 2, ",", ".", "€", "<b>%SYMBOL%</b>&nbsp;%NUM%").unwrap();
        assert_eq!(price, "<b>€</b>&nbsp;9.50");
    }

    #[test]
    fn negative_rounding_mirrors_positive() {
        let positive = format_price(1.005, 2, " ", ",", "Kč", "%NUM%").unwrap();
        let negative = format_price(-1.005, 2, " ", ",", "Kč", "%NUM%").unwrap();

        assert_eq!(positive, "1,01");
        assert_eq!(negative, format!("-{positive}"));
    }

    #[test]
    fn rounds_midpoint_away_from_zero() {
        assert_eq!(format(2.5, 0, ",", " ").unwrap(), "3");
        assert_eq!(format(-2.5, 0, ",", " ").unwrap(), "-3");
    }

    #[test]
    fn drops_sign_of_rounded_zero() {
        assert_eq!(format(-0.001, 2, ",", " ").unwrap(), "0,00");
    }

    #[test]
    fn zero_precision_has_no_decimal_separator() {
        assert_eq!(format(1234567.89, 0, ",", " ").unwrap(), "1 234 568");
    }

    #[test]
    fn pads_missing_decimals() {
        assert_eq!(format(1000.0, 3, ".", ",").unwrap(), "1,000.000");
        assert_eq!(format(12.0, 2, ",", " ").unwrap(), "12,00");
    }

    #[test]
    fn multi_character_separators() {
        let price = format_price(1234.5, 2, "&nbsp;", ",", "Kč", "%NUM%&nbsp;%SYMBOL%").unwrap();
        assert_eq!(price, "1&nbsp;234,50&nbsp;Kč");
    }

    #[test]
    fn rate_uses_three_decimals() {
        assert_eq!(format_rate(Decimal::new(24335, 3)), "24.335");
        assert_eq!(format_rate(Decimal::new(2528, 1)), "252.800");
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(matches!(format(f64::NAN, 2, ",", " "), Err(CurrencyError::InvalidNumber(_))));
        assert!(matches!(
            format_price(f64::INFINITY, 2, " ", ",", "Kč", "%NUM%"),
            Err(CurrencyError::InvalidNumber(_))
        ));
        assert!(format(f64::NEG_INFINITY, 2, ",", " ").is_err());
    }
}
