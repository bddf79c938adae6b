//! Today-versus-yesterday rate summary shown next to the navigation.
//!
//! The values are cached as JSON constants by the update job and are never
//! used for conversions.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::number;

pub const CSOB_KEY: &str = "csob_kurz";
pub const CNB_KEY: &str = "cnb_kurz";

const UNKNOWN: &str = "??? / ???";

/// `[today, yesterday]` buy and sell rates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuySellTrend {
    pub buy: Vec<Decimal>,
    pub sell: Vec<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Flat,
    Down,
}

impl Direction {
    pub fn between(today: Decimal, yesterday: Decimal) -> Self {
        if today > yesterday {
            Direction::Up
        } else if today == yesterday {
            Direction::Flat
        } else {
            Direction::Down
        }
    }

    pub fn arrow(self) -> char {
        match self {
            Direction::Up => '↑',
            Direction::Flat => '→',
            Direction::Down => '↓',
        }
    }
}

/// Direction plus the current value, e.g. `↑24.335`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Movement {
    pub direction: Direction,
    pub today: Decimal,
}

impl Movement {
    /// `None` unless both values are present and non-zero.
    pub fn from_pair(values: &[Decimal]) -> Option<Self> {
        let (today, yesterday) = (*values.first()?, *values.get(1)?);
        if today.is_zero() || yesterday.is_zero() {
            return None;
        }

        Some(Self {
            direction: Direction::between(today, yesterday),
            today,
        })
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.direction.arrow(), number::format_rate(self.today))
    }
}

pub fn buy_sell_summary(trend: &BuySellTrend) -> String {
    match (Movement::from_pair(&trend.buy), Movement::from_pair(&trend.sell)) {
        (Some(buy), Some(sell)) => format!("{} / {}", buy, sell),
        _ => UNKNOWN.to_string(),
    }
}

pub fn rate_summary(rates: &[Decimal]) -> String {
    Movement::from_pair(rates)
        .map(|m| m.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Which rows the panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendFields {
    pub buy_sell: bool,
    pub reference: bool,
}

impl Default for TrendFields {
    fn default() -> Self {
        Self {
            buy_sell: true,
            reference: true,
        }
    }
}

impl FromStr for TrendFields {
    type Err = String;

    /// Comma separated list of `csob` and `cnb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = TrendFields {
            buy_sell: false,
            reference: false,
        };

        for name in s.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match name {
                "csob" => fields.buy_sell = true,
                "cnb" => fields.reference = true,
                other => return Err(format!("unknown trend field '{}'", other)),
            }
        }

        Ok(fields)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    pub source: &'static str,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrendPanel {
    fields: TrendFields,
}

impl TrendPanel {
    pub fn new(fields: TrendFields) -> Self {
        Self { fields }
    }

    /// Builds the rows from the cached constants. Missing or unreadable
    /// constants render as unknown.
    pub fn rows(&self, csob: Option<&str>, cnb: Option<&str>) -> Vec<TrendRow> {
        let mut rows = Vec::new();

        if self.fields.buy_sell {
            let trend = csob
                .and_then(|json| decode::<BuySellTrend>(CSOB_KEY, json))
                .unwrap_or_default();
            rows.push(TrendRow {
                source: CSOB_KEY,
                summary: buy_sell_summary(&trend),
            });
        }

        if self.fields.reference {
            let rates = cnb
                .and_then(|json| decode::<Vec<Decimal>>(CNB_KEY, json))
                .unwrap_or_default();
            rows.push(TrendRow {
                source: CNB_KEY,
                summary: rate_summary(&rates),
            });
        }

        rows
    }
}

fn decode<T: serde::de::DeserializeOwned>(key: &str, json: &str) -> Option<T> {
    serde_json::from_str(json)
        .map_err(|e| log::warn!("Unreadable {} constant: {}", key, e))
        .ok()
}
