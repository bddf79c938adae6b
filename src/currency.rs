use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adjust::{RateModifyOperator, compute_effective_rate};
use crate::error::{CurrencyError, Result};
use crate::number;

/// No-break space between the number and the symbol in seeded schemas.
const NBSP: char = '\u{a0}';

/// Formatting settings shared by stored currencies and historical snapshots.
pub trait CurrencyFormat {
    fn decimal_precision(&self) -> u32;
    fn decimal_separator(&self) -> &str;
    fn thousand_separator(&self) -> &str;
    fn schema(&self) -> &str;
    fn symbol(&self) -> &str;

    fn format_price(&self, value: f64) -> Result<String> {
        number::format_price(
            value,
            self.decimal_precision(),
            self.thousand_separator(),
            self.decimal_separator(),
            self.symbol(),
            self.schema(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub symbol: String,
    pub schema: String,
    pub thousand_separator: String,
    pub decimal_separator: String,
    pub decimal_precision: u32,
    pub rate: Decimal,
    pub real_rate: Decimal,
    pub rate_locked: bool,
    pub rate_modify_operator: RateModifyOperator,
    pub rate_modify_value: Decimal,
    pub last_update: Option<DateTime<Utc>>,
    pub active: bool,
    pub is_default: bool,
}

impl Currency {
    pub fn new(name: &str, code: &str, symbol: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            code: code.to_string(),
            symbol: symbol.to_string(),
            schema: format!("%NUM%{NBSP}%SYMBOL%"),
            thousand_separator: " ".to_string(),
            decimal_separator: ",".to_string(),
            decimal_precision: 2,
            rate: Decimal::ONE,
            real_rate: Decimal::ONE,
            rate_locked: false,
            rate_modify_operator: RateModifyOperator::None,
            rate_modify_value: Decimal::ZERO,
            last_update: None,
            active: false,
            is_default: false,
        }
    }

    /// Builds a currency from admin input. The entered rate seeds the real
    /// rate as well, then the modifier is applied.
    pub fn from_input(input: CurrencyInput) -> Result<Self> {
        let mut currency = Currency::new(&input.name, &input.code, &input.symbol);
        currency.real_rate = input.rate;
        currency.apply_input(input)?;
        Ok(currency)
    }

    /// Overwrites the editable fields. Unless the rate is locked the entered
    /// rate is replaced by the modifier applied to the last real rate.
    /// Rejected input leaves the currency untouched.
    pub fn apply_input(&mut self, input: CurrencyInput) -> Result<()> {
        if input.decimal_precision > number::MAX_PRECISION {
            return Err(CurrencyError::InvalidNumber(format!(
                "decimal precision {}",
                input.decimal_precision
            )));
        }

        let rate = if self.rate_locked {
            input.rate
        } else {
            compute_effective_rate(self.real_rate, input.rate_modify_operator, input.rate_modify_value)?
        };

        self.name = input.name;
        self.code = input.code;
        self.symbol = input.symbol;
        self.schema = input.schema;
        self.thousand_separator = input.thousand_separator;
        self.decimal_separator = input.decimal_separator;
        self.decimal_precision = input.decimal_precision;
        self.rate = rate;
        self.rate_modify_operator = input.rate_modify_operator;
        self.rate_modify_value = input.rate_modify_value;
        Ok(())
    }

    pub fn is_rate_modified(&self) -> bool {
        self.real_rate != self.rate
    }

    pub fn modified_rate(&self, real_rate: Decimal) -> Result<Decimal> {
        compute_effective_rate(real_rate, self.rate_modify_operator, self.rate_modify_value)
    }

    /// Stores a fresh feed rate observed at `at`. A locked rate is left
    /// alone; a modifier that overflows leaves the whole record unchanged.
    pub fn record_real_rate(&mut self, real_rate: Decimal, at: DateTime<Utc>) -> Result<()> {
        if !self.rate_locked {
            self.rate = self.modified_rate(real_rate)?;
        }
        self.real_rate = real_rate;
        self.last_update = Some(at);
        Ok(())
    }

    pub fn rate_formatted(&self) -> String {
        number::format_rate(self.rate)
    }

    pub fn real_rate_formatted(&self) -> String {
        number::format_rate(self.real_rate)
    }

    pub fn format_example(&self) -> Result<String> {
        self.format_price(1234567.89)
    }

    /// Label used by currency pickers.
    pub fn choice_label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

impl CurrencyFormat for Currency {
    fn decimal_precision(&self) -> u32 {
        self.decimal_precision
    }

    fn decimal_separator(&self) -> &str {
        &self.decimal_separator
    }

    fn thousand_separator(&self) -> &str {
        &self.thousand_separator
    }

    fn schema(&self) -> &str {
        &self.schema
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }
}

/// Editable fields of a currency, as submitted by an admin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyInput {
    pub name: String,
    pub code: String,
    pub symbol: String,
    pub schema: String,
    pub thousand_separator: String,
    pub decimal_separator: String,
    pub decimal_precision: u32,
    pub rate: Decimal,
    #[serde(default)]
    pub rate_modify_operator: RateModifyOperator,
    #[serde(default)]
    pub rate_modify_value: Decimal,
}

/// Point-in-time copy of a currency with the rate of some past day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencySnapshot {
    name: String,
    code: String,
    symbol: String,
    schema: String,
    thousand_separator: String,
    decimal_separator: String,
    decimal_precision: u32,
    rate: Decimal,
    real_rate: Decimal,
    rate_locked: bool,
    rate_modify_operator: RateModifyOperator,
    rate_modify_value: Decimal,
    effective_at: DateTime<Utc>,
    active: bool,
    is_default: bool,
}

impl CurrencySnapshot {
    pub fn of(currency: &Currency, effective_at: DateTime<Utc>) -> Self {
        Self {
            name: currency.name.clone(),
            code: currency.code.clone(),
            symbol: currency.symbol.clone(),
            schema: currency.schema.clone(),
            thousand_separator: currency.thousand_separator.clone(),
            decimal_separator: currency.decimal_separator.clone(),
            decimal_precision: currency.decimal_precision,
            rate: currency.rate,
            real_rate: currency.real_rate,
            rate_locked: currency.rate_locked,
            rate_modify_operator: currency.rate_modify_operator,
            rate_modify_value: currency.rate_modify_value,
            effective_at,
            active: currency.active,
            is_default: currency.is_default,
        }
    }

    pub(crate) fn record_real_rate(&mut self, real_rate: Decimal) -> Result<()> {
        if !self.rate_locked {
            self.rate =
                compute_effective_rate(real_rate, self.rate_modify_operator, self.rate_modify_value)?;
        }
        self.real_rate = real_rate;
        Ok(())
    }

    pub(crate) fn set_effective_at(&mut self, effective_at: DateTime<Utc>) {
        self.effective_at = effective_at;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn real_rate(&self) -> Decimal {
        self.real_rate
    }

    pub fn is_rate_locked(&self) -> bool {
        self.rate_locked
    }

    pub fn effective_at(&self) -> DateTime<Utc> {
        self.effective_at
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn is_rate_modified(&self) -> bool {
        self.real_rate != self.rate
    }

    pub fn rate_formatted(&self) -> String {
        number::format_rate(self.rate)
    }
}

impl CurrencyFormat for CurrencySnapshot {
    fn decimal_precision(&self) -> u32 {
        self.decimal_precision
    }

    fn decimal_separator(&self) -> &str {
        &self.decimal_separator
    }

    fn thousand_separator(&self) -> &str {
        &self.thousand_separator
    }

    fn schema(&self) -> &str {
        &self.schema
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }
}

/// The currencies created by a fresh install.
pub fn seed_currencies() -> Vec<Currency> {
    let num_symbol = format!("%NUM%{NBSP}%SYMBOL%");
    let symbol_num = format!("%SYMBOL%{NBSP}%NUM%");

    let seeds = [
        ("Česká koruna", "CZK", 1, true, &num_symbol, "Kč", " ", ",", 0, true, true),
        ("Euro", "EUR", 25, false, &symbol_num, "€", ",", ".", 2, true, false),
        ("Americký dolar", "USD", 22, false, &symbol_num, "$", ",", ".", 2, false, false),
        ("Libra šterlinků", "GBP", 35, false, &num_symbol, "£", ",", ".", 2, false, false),
    ];

    seeds
        .into_iter()
        .map(
            |(name, code, rate, locked, schema, symbol, thousand, decimal, precision, active, default)| {
                let mut currency = Currency::new(name, code, symbol);
                currency.schema = schema.clone();
                currency.rate = Decimal::from(rate);
                currency.rate_locked = locked;
                currency.thousand_separator = thousand.to_string();
                currency.decimal_separator = decimal.to_string();
                currency.decimal_precision = precision;
                currency.active = active;
                currency.is_default = default;
                currency
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn euro() -> Currency {
        let mut currency = Currency::new("Euro", "EUR", "€");
        currency.schema = "%SYMBOL% %NUM%".to_string();
        currency.thousand_separator = ",".to_string();
        currency.decimal_separator = ".".to_string();
        currency
    }

    #[test]
    fn rate_modified_tracks_real_rate() {
        let mut currency = euro();
        assert!(!currency.is_rate_modified());

        currency.rate_modify_operator = RateModifyOperator::Add;
        currency.rate_modify_value = Decimal::new(5, 1);
        currency.record_real_rate(Decimal::new(2450, 2), Utc::now()).unwrap();

        assert_eq!(currency.rate, Decimal::new(2500, 2));
        assert!(currency.is_rate_modified());
    }

    #[test]
    fn locked_rate_survives_new_real_rate() {
        let mut currency = euro();
        currency.rate = Decimal::from(25);
        currency.rate_locked = true;
        currency.rate_modify_operator = RateModifyOperator::Multiply;
        currency.rate_modify_value = Decimal::from(2);

        let at = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        currency.record_real_rate(Decimal::new(2433, 2), at).unwrap();

        assert_eq!(currency.rate, Decimal::from(25));
        assert_eq!(currency.real_rate, Decimal::new(2433, 2));
        assert_eq!(currency.last_update, Some(at));
        assert!(currency.is_rate_modified());
    }

    #[test]
    fn format_example_uses_own_settings() {
        assert_eq!(euro().format_example().unwrap(), "€ 1,234,567.89");
    }

    #[test]
    fn formatted_rates_use_three_decimals() {
        let mut currency = euro();
        currency.record_real_rate(Decimal::new(24335, 3), Utc::now()).unwrap();
        assert_eq!(currency.rate_formatted(), "24.335");
        assert_eq!(currency.real_rate_formatted(), "24.335");
    }

    fn franc_input() -> CurrencyInput {
        CurrencyInput {
            name: "Švýcarský frank".to_string(),
            code: "CHF".to_string(),
            symbol: "CHF".to_string(),
            schema: "%NUM% %SYMBOL%".to_string(),
            thousand_separator: " ".to_string(),
            decimal_separator: ",".to_string(),
            decimal_precision: 2,
            rate: Decimal::from(26),
            rate_modify_operator: RateModifyOperator::Multiply,
            rate_modify_value: Decimal::new(11, 1),
        }
    }

    #[test]
    fn input_seeds_real_rate_on_create() {
        let currency = Currency::from_input(franc_input()).unwrap();

        assert_eq!(currency.real_rate, Decimal::from(26));
        assert_eq!(currency.rate, Decimal::new(286, 1));
        assert!(!currency.active);
        assert!(!currency.is_default);
    }

    #[test]
    fn precision_beyond_decimal_scale_is_rejected() {
        let mut input = franc_input();
        input.decimal_precision = number::MAX_PRECISION + 1;
        assert!(matches!(Currency::from_input(input), Err(CurrencyError::InvalidNumber(_))));

        let mut currency = euro();
        let before = currency.clone();
        let mut input = franc_input();
        input.decimal_precision = u32::MAX;
        assert!(currency.apply_input(input).is_err());
        assert_eq!(currency, before);

        let mut input = franc_input();
        input.decimal_precision = number::MAX_PRECISION;
        assert_eq!(Currency::from_input(input).unwrap().decimal_precision, 28);
    }

    #[test]
    fn overflowing_modifier_is_rejected_without_changes() {
        let mut input = franc_input();
        input.rate = Decimal::MAX;
        input.rate_modify_value = Decimal::from(2);
        assert!(matches!(Currency::from_input(input), Err(CurrencyError::InvalidNumber(_))));

        let mut currency = euro();
        currency.rate_modify_operator = RateModifyOperator::Add;
        currency.rate_modify_value = Decimal::ONE;
        let before = currency.clone();
        assert!(currency.record_real_rate(Decimal::MAX, Utc::now()).is_err());
        assert_eq!(currency, before);
    }

    #[test]
    fn snapshot_formats_like_its_currency() {
        let currency = euro();
        let snapshot = CurrencySnapshot::of(&currency, Utc::now());
        assert_eq!(
            snapshot.format_price(10.0).unwrap(),
            currency.format_price(10.0).unwrap()
        );
    }

    #[test]
    fn snapshot_respects_lock() {
        let mut currency = euro();
        currency.rate_locked = true;
        let mut snapshot = CurrencySnapshot::of(&currency, Utc::now());

        snapshot.record_real_rate(Decimal::from(24)).unwrap();

        assert_eq!(snapshot.rate(), Decimal::ONE);
        assert_eq!(snapshot.real_rate(), Decimal::from(24));
        assert_eq!(currency.real_rate, Decimal::ONE);
    }

    #[test]
    fn seed_set_has_single_default() {
        let seeds = seed_currencies();
        assert_eq!(seeds.len(), 4);
        assert_eq!(seeds.iter().filter(|c| c.is_default).count(), 1);

        let czk = seeds.iter().find(|c| c.code == "CZK").unwrap();
        assert!(czk.rate_locked);
        assert_eq!(czk.decimal_precision, 0);
        assert_eq!(czk.format_price(1500.0).unwrap(), "1 500\u{a0}Kč");
    }
}
