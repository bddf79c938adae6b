//! The national bank's daily list: a dated header followed by
//! `country|currency|quantity|code|rate` lines.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveDateTime, Timelike};
use rust_decimal::Decimal;

use super::{TextFetcher, normalize_decimal_string, normalize_text};

pub const DEFAULT_URL: &str =
    "http://www.cnb.cz/cs/financni_trhy/devizovy_trh/kurzy_devizoveho_trhu/denni_kurz.txt";

/// Local time from which the current day's list is published.
const PUBLICATION_TIME: (u32, u32) = (14, 30);

#[derive(Debug, Clone, PartialEq)]
pub struct RateRow {
    pub country: String,
    pub currency: String,
    pub quantity: u32,
    pub code: String,
    /// Rate for one unit of the currency.
    pub rate: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyList {
    pub published: Option<NaiveDate>,
    pub rows: Vec<RateRow>,
}

impl DailyList {
    pub fn parse(text: &str) -> Self {
        let mut list = DailyList::default();

        for line in normalize_text(text).lines() {
            if is_rate_line(line) {
                match parse_row(line) {
                    Some(row) => list.rows.push(row),
                    None => log::debug!("Skipping malformed rate line {:?}", line),
                }
            } else if let Some(date) = publication_date(line) {
                list.published = Some(date);
            }
        }

        list
    }

    pub fn rate_for(&self, code: &str) -> Option<Decimal> {
        self.rows.iter().find(|row| row.code == code).map(|row| row.rate)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A rate line starts with an upper-case country name: its first character
/// is not a digit and upper-casing it changes nothing. An empty line passes
/// too and is rejected by the row parser.
pub fn is_rate_line(line: &str) -> bool {
    match line.chars().next() {
        None => true,
        Some(first) => !first.is_ascii_digit() && first.to_uppercase().eq(std::iter::once(first)),
    }
}

fn parse_row(line: &str) -> Option<RateRow> {
    let mut fields = line.split('|');
    let country = fields.next()?;
    let currency = fields.next()?;
    let quantity = fields.next()?;
    let code = fields.next()?;
    let rate = fields.next()?;

    let quantity: u32 = quantity.trim().parse().ok()?;
    if quantity == 0 {
        return None;
    }
    let rate = Decimal::from_str(&normalize_decimal_string(rate)).ok()?;

    Some(RateRow {
        country: country.to_string(),
        currency: currency.to_string(),
        quantity,
        code: code.trim().to_string(),
        rate: rate / Decimal::from(quantity),
    })
}

/// Reads a leading `DD.MM.YYYY`.
fn publication_date(line: &str) -> Option<NaiveDate> {
    let head = line.get(..10)?;
    let shaped = head.bytes().enumerate().all(|(i, b)| match i {
        2 | 5 => b == b'.',
        _ => b.is_ascii_digit(),
    });
    if !shaped {
        return None;
    }

    NaiveDate::parse_from_str(head, "%d.%m.%Y").ok()
}

/// Day whose list is the latest one published at local time `now`.
pub fn publication_day(now: NaiveDateTime) -> NaiveDate {
    let today = now.date();
    if (now.hour(), now.minute()) < PUBLICATION_TIME {
        today.checked_sub_days(Days::new(1)).unwrap_or(today)
    } else {
        today
    }
}

pub struct CnbFeed {
    fetcher: Arc<dyn TextFetcher>,
    url: String,
}

impl CnbFeed {
    pub fn new(fetcher: Arc<dyn TextFetcher>, url: &str) -> Self {
        Self {
            fetcher,
            url: url.to_string(),
        }
    }

    pub fn url_for(&self, date: Option<NaiveDate>) -> String {
        match date {
            Some(date) => format!("{}?date={}", self.url, date.format("%d.%m.%Y")),
            None => self.url.clone(),
        }
    }

    /// The list for `date`, or the latest one. Empty when the feed is down.
    pub async fn daily_list(&self, date: Option<NaiveDate>) -> DailyList {
        let url = self.url_for(date);
        log::info!("Loading {}", url);

        match self.fetcher.get_text(&url, None).await {
            Ok(text) => DailyList::parse(&text),
            Err(e) => {
                log::warn!("{}", e);
                DailyList::default()
            }
        }
    }

    /// Rates of `code` for the latest published day and the day before,
    /// whichever of the two could be loaded.
    pub async fn trend(&self, code: &str, now: NaiveDateTime) -> Vec<Decimal> {
        let today = publication_day(now);
        let mut rates = Vec::with_capacity(2);

        if let Some(rate) = self.daily_list(Some(today)).await.rate_for(code) {
            rates.push(rate);
        }
        if let Some(yesterday) = today.checked_sub_days(Days::new(1)) {
            if let Some(rate) = self.daily_list(Some(yesterday)).await.rate_for(code) {
                rates.push(rate);
            }
        }

        rates
    }
}
