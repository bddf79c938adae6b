use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::cache::CurrencyCache;
use crate::currency::{Currency, CurrencyFormat, CurrencyInput, CurrencySnapshot, seed_currencies};
use crate::error::{CurrencyError, Result};
use crate::feed::{CnbFeed, RateRow};
use crate::store::CurrencyRepository;

/// Outcome of one rate refresh.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Currencies that received a new real rate.
    pub updated: usize,
    /// Feed rows without a matching currency, or whose modifier overflowed.
    pub ignored: usize,
}

/// Entry point for reading, editing and refreshing currencies.
pub struct CurrencyManager {
    repository: Arc<dyn CurrencyRepository>,
    feed: CnbFeed,
    cache: CurrencyCache,
    refresh_lock: Mutex<()>,
}

impl CurrencyManager {
    pub fn new(repository: Arc<dyn CurrencyRepository>, feed: CnbFeed, cache_ttl: Duration) -> Self {
        Self {
            repository,
            feed,
            cache: CurrencyCache::new(cache_ttl),
            refresh_lock: Mutex::new(()),
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Currency> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CurrencyError::NotFound(id.to_string()))
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Currency> {
        self.repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| CurrencyError::NotFound(code.to_string()))
    }

    /// Every currency, ordered by name.
    pub async fn list_all(&self) -> Result<Vec<Currency>> {
        if let Some(all) = self.cache.all() {
            return Ok(all);
        }

        let generation = self.cache.generation();
        let all = self.repository.find_all().await?;
        self.cache.store_all(generation, all.clone());
        Ok(all)
    }

    /// Active currencies, ordered by name.
    pub async fn list_active(&self) -> Result<Vec<Currency>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|c| c.active)
            .collect())
    }

    /// `(id, "CODE - Name")` pairs for currency pickers.
    pub async fn form_choices(&self) -> Result<Vec<(Uuid, String)>> {
        Ok(self
            .list_all()
            .await?
            .iter()
            .map(|c| (c.id, c.choice_label()))
            .collect())
    }

    pub async fn default_currency(&self) -> Result<Currency> {
        if let Some(currency) = self.cache.default_currency() {
            return Ok(currency);
        }

        let generation = self.cache.generation();
        let mut defaults = self.repository.find_defaults().await?;
        match defaults.len() {
            0 => Err(CurrencyError::MissingDefault),
            1 => {
                let currency = defaults.remove(0);
                self.cache.store_default(generation, currency.clone());
                Ok(currency)
            }
            _ => Err(CurrencyError::TooManyDefaults),
        }
    }

    /// Creates the initial currency set. Refuses to touch a non-empty table.
    pub async fn install(&self) -> Result<usize> {
        if self.repository.count().await? > 0 {
            return Err(CurrencyError::AlreadyInstalled);
        }

        let seeds = seed_currencies();
        self.repository.insert_all(&seeds).await?;
        self.cache.invalidate();

        log::info!("Installed {} currencies", seeds.len());
        Ok(seeds.len())
    }

    /// Loads the latest national bank list and stores the new real rates.
    /// An unavailable feed updates nothing.
    pub async fn refresh_rates(&self) -> Result<RefreshReport> {
        let _running = self.refresh_lock.lock().await;

        let list = self.feed.daily_list(None).await;
        if list.is_empty() {
            log::warn!("Rate list is empty, keeping current rates");
            return Ok(RefreshReport::default());
        }

        let result = self.apply_rates(&list.rows).await;
        self.cache.invalidate();

        let report = result?;
        log::info!(
            "Updated {} currencies, ignored {} feed rows",
            report.updated,
            report.ignored
        );
        Ok(report)
    }

    async fn apply_rates(&self, rows: &[RateRow]) -> Result<RefreshReport> {
        let mut by_code: HashMap<String, Currency> = self
            .repository
            .find_all()
            .await?
            .into_iter()
            .map(|c| (c.code.clone(), c))
            .collect();

        let now = Utc::now();
        let mut report = RefreshReport::default();

        for row in rows {
            let Some(currency) = by_code.get_mut(&row.code) else {
                log::debug!("No currency for feed code {}", row.code);
                report.ignored += 1;
                continue;
            };

            if let Err(e) = currency.record_real_rate(row.rate, now) {
                log::warn!("Keeping {} unchanged: {}", row.code, e);
                report.ignored += 1;
                continue;
            }
            self.repository.update(currency).await?;
            report.updated += 1;
        }

        Ok(report)
    }

    /// The currency as it was priced by the national bank on `date`.
    pub async fn historical_rate(&self, currency: &Currency, date: NaiveDate) -> CurrencySnapshot {
        let list = self.feed.daily_list(Some(date)).await;
        let mut snapshot = CurrencySnapshot::of(currency, date.and_time(NaiveTime::MIN).and_utc());

        if let Some(rate) = list.rate_for(&currency.code) {
            if let Err(e) = snapshot.record_real_rate(rate) {
                log::warn!("Keeping stored rate of {}: {}", currency.code, e);
            }
        }
        if let Some(published) = list.published {
            snapshot.set_effective_at(published.and_time(NaiveTime::MIN).and_utc());
        }

        snapshot
    }

    pub async fn create(&self, input: CurrencyInput) -> Result<Currency> {
        let currency = Currency::from_input(input)?;
        self.repository.insert(&currency).await?;
        self.cache.invalidate();

        log::info!("Created currency {}", currency.code);
        Ok(currency)
    }

    pub async fn update(&self, id: Uuid, input: CurrencyInput) -> Result<Currency> {
        let mut currency = self.get_by_id(id).await?;
        currency.apply_input(input)?;
        self.save(currency).await
    }

    pub async fn toggle_rate_lock(&self, id: Uuid) -> Result<Currency> {
        let mut currency = self.get_by_id(id).await?;
        currency.rate_locked = !currency.rate_locked;
        self.save(currency).await
    }

    pub async fn toggle_active(&self, id: Uuid) -> Result<Currency> {
        let mut currency = self.get_by_id(id).await?;
        currency.active = !currency.active;
        self.save(currency).await
    }

    /// Makes `id` the only default currency.
    pub async fn set_default(&self, id: Uuid) -> Result<Currency> {
        self.repository.set_default(id).await?;
        self.cache.invalidate();
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let currency = self.get_by_id(id).await?;

        let result = self.repository.delete(id).await;
        self.cache.invalidate();

        match result {
            Err(CurrencyError::ReferencedElsewhere(_)) => {
                log::warn!("Currency {} is still in use", currency.code);
                Err(CurrencyError::ReferencedElsewhere(currency.code))
            }
            other => other,
        }
    }

    /// Formats `value` in `currency`, or in the default currency when none
    /// is given.
    pub async fn format_price(&self, value: f64, currency: Option<&Currency>) -> Result<String> {
        match currency {
            Some(currency) => currency.format_price(value),
            None => self.default_currency().await?.format_price(value),
        }
    }

    async fn save(&self, currency: Currency) -> Result<Currency> {
        let result = self.repository.update(&currency).await;
        self.cache.invalidate();
        result.map(|_| currency)
    }
}
