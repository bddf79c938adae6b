use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CurrencyError, Result};

/// Arithmetic applied to the feed rate to obtain the displayed rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateModifyOperator {
    #[default]
    None,
    Multiply,
    Add,
    Subtract,
}

impl RateModifyOperator {
    /// Symbol stored in the database, `None` for a disabled modifier.
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            RateModifyOperator::None => None,
            RateModifyOperator::Multiply => Some("*"),
            RateModifyOperator::Add => Some("+"),
            RateModifyOperator::Subtract => Some("-"),
        }
    }

    pub fn from_symbol(symbol: Option<&str>) -> Self {
        match symbol {
            Some("*") => RateModifyOperator::Multiply,
            Some("+") => RateModifyOperator::Add,
            Some("-") => RateModifyOperator::Subtract,
            _ => RateModifyOperator::None,
        }
    }
}

impl fmt::Display for RateModifyOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol().unwrap_or("none"))
    }
}

impl FromStr for RateModifyOperator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(RateModifyOperator::None),
            "*" | "multiply" => Ok(RateModifyOperator::Multiply),
            "+" | "add" => Ok(RateModifyOperator::Add),
            "-" | "subtract" => Ok(RateModifyOperator::Subtract),
            other => Err(format!("unknown rate operator '{}'", other)),
        }
    }
}

/// Derives the effective rate from a raw feed rate. Fails with
/// `InvalidNumber` when the result does not fit a `Decimal`.
pub fn compute_effective_rate(
    real_rate: Decimal,
    operator: RateModifyOperator,
    operand: Decimal,
) -> Result<Decimal> {
    if operand.is_zero() {
        return Ok(real_rate);
    }

    let rate = match operator {
        RateModifyOperator::None => Some(real_rate),
        RateModifyOperator::Multiply => real_rate.checked_mul(operand),
        RateModifyOperator::Add => real_rate.checked_add(operand),
        RateModifyOperator::Subtract => real_rate.checked_sub(operand),
    };

    rate.ok_or_else(|| {
        CurrencyError::InvalidNumber(format!("{} {} {}", real_rate, operator, operand))
    })
}
