//! The commercial bank's XML rate list with buy and sell rates per country.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{TextFetcher, normalize_decimal_string};
use crate::error::{CurrencyError, Result};
use crate::trend::BuySellTrend;

pub const DEFAULT_URL_TEMPLATE: &str =
    "https://www.csob.cz/portal/lide/kurzovni-listek/-/date/{date}/kurzovni-listek.xml";

/// The bank rejects requests without a browser-like agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; MSIE 9.0; Windows NT 6.1; Trident/5.0)";

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct CashlessRate {
    #[serde(rename = "@Buy")]
    pub buy: String,
    #[serde(rename = "@Sale")]
    pub sale: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct Country {
    #[serde(rename = "@ID")]
    pub id: String,
    #[serde(rename = "FXcashless")]
    pub cashless: Option<CashlessRate>,
}

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RateList {
    #[serde(rename = "Country", default)]
    pub countries: Vec<Country>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuySell {
    pub buy: Decimal,
    pub sell: Decimal,
}

impl RateList {
    pub fn parse(xml: &str) -> Result<Self> {
        quick_xml::de::from_str(xml).map_err(|e| CurrencyError::FeedUnavailable(e.to_string()))
    }

    pub fn rate_for(&self, code: &str) -> Option<BuySell> {
        let cashless = self
            .countries
            .iter()
            .find(|country| country.id == code)?
            .cashless
            .as_ref()?;

        Some(BuySell {
            buy: Decimal::from_str(&normalize_decimal_string(&cashless.buy)).ok()?,
            sell: Decimal::from_str(&normalize_decimal_string(&cashless.sale)).ok()?,
        })
    }
}

pub struct CsobFeed {
    fetcher: Arc<dyn TextFetcher>,
    url_template: String,
    user_agent: String,
}

impl CsobFeed {
    pub fn new(fetcher: Arc<dyn TextFetcher>, url_template: &str, user_agent: &str) -> Self {
        Self {
            fetcher,
            url_template: url_template.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    pub fn url_for(&self, date: NaiveDate) -> String {
        self.url_template
            .replace("{date}", &date.format("%Y-%m-%d").to_string())
    }

    /// The list for `date`. Empty when the feed is down or the document is
    /// not readable.
    pub async fn rate_list(&self, date: NaiveDate) -> RateList {
        let url = self.url_for(date);
        log::info!("Loading {}", url);

        self.fetcher
            .get_text(&url, Some(&self.user_agent))
            .await
            .and_then(|text| RateList::parse(&text))
            .unwrap_or_else(|e| {
                log::warn!("{}", e);
                RateList::default()
            })
    }

    /// Buy and sell rates of `code` for `today` and the day before.
    pub async fn trend(&self, code: &str, today: NaiveDate) -> BuySellTrend {
        let mut trend = BuySellTrend::default();

        let mut days = vec![today];
        if let Some(yesterday) = today.checked_sub_days(Days::new(1)) {
            days.push(yesterday);
        }

        for day in days {
            if let Some(rate) = self.rate_list(day).await.rate_for(code) {
                trend.buy.push(rate.buy);
                trend.sell.push(rate.sell);
            }
        }

        trend
    }
}
