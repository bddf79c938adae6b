use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use super::{ConstantStore, CurrencyRepository};
use crate::currency::Currency;
use crate::error::{CurrencyError, Result};

/// Test double backed by plain collections, with hooks for failing writes
/// and for pinning rows as referenced.
#[derive(Default)]
pub struct MemoryStore {
    currencies: RwLock<Vec<Currency>>,
    constants: RwLock<HashMap<String, String>>,
    referenced: RwLock<HashSet<Uuid>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_currencies(currencies: Vec<Currency>) -> Self {
        let store = Self::default();
        *store.currencies.write().unwrap_or_else(|e| e.into_inner()) = currencies;
        store
    }

    /// Marks a currency as used by another record, blocking its removal.
    pub fn reference(&self, id: Uuid) {
        self.referenced
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id);
    }

    /// Makes every subsequent write fail.
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CurrencyError::PersistenceFailure(
                "store is read-only".to_string(),
            ));
        }
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Currency>> {
        self.currencies.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Currency>> {
        self.currencies.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn check_unique_code(currencies: &[Currency], candidate: &Currency) -> Result<()> {
    if currencies
        .iter()
        .any(|c| c.code == candidate.code && c.id != candidate.id)
    {
        return Err(CurrencyError::PersistenceFailure(format!(
            "duplicate currency code {}",
            candidate.code
        )));
    }
    Ok(())
}

#[async_trait]
impl CurrencyRepository for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Currency>> {
        let mut all = self.read().clone();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Currency>> {
        Ok(self.read().iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Currency>> {
        Ok(self.read().iter().find(|c| c.code == code).cloned())
    }

    async fn find_defaults(&self) -> Result<Vec<Currency>> {
        Ok(self.read().iter().filter(|c| c.is_default).cloned().collect())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.read().len() as i64)
    }

    async fn insert(&self, currency: &Currency) -> Result<()> {
        self.check_writable()?;
        let mut currencies = self.write();
        check_unique_code(&currencies, currency)?;
        currencies.push(currency.clone());
        Ok(())
    }

    async fn insert_all(&self, new: &[Currency]) -> Result<()> {
        self.check_writable()?;
        let mut currencies = self.write();
        let mut staged = currencies.clone();
        for currency in new {
            check_unique_code(&staged, currency)?;
            staged.push(currency.clone());
        }
        *currencies = staged;
        Ok(())
    }

    async fn update(&self, currency: &Currency) -> Result<()> {
        self.check_writable()?;
        let mut currencies = self.write();
        check_unique_code(&currencies, currency)?;
        let slot = currencies
            .iter_mut()
            .find(|c| c.id == currency.id)
            .ok_or_else(|| CurrencyError::NotFound(currency.id.to_string()))?;
        *slot = currency.clone();
        Ok(())
    }

    async fn set_default(&self, id: Uuid) -> Result<()> {
        self.check_writable()?;
        let mut currencies = self.write();
        if !currencies.iter().any(|c| c.id == id) {
            return Err(CurrencyError::NotFound(id.to_string()));
        }
        for currency in currencies.iter_mut() {
            currency.is_default = currency.id == id;
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.check_writable()?;
        if self
            .referenced
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&id)
        {
            return Err(CurrencyError::ReferencedElsewhere(id.to_string()));
        }

        let mut currencies = self.write();
        let before = currencies.len();
        currencies.retain(|c| c.id != id);
        if currencies.len() == before {
            return Err(CurrencyError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConstantStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .constants
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.constants
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_by_name() {
        let store = MemoryStore::with_currencies(vec![
            Currency::new("Libra", "GBP", "£"),
            Currency::new("Euro", "EUR", "€"),
        ]);

        let names: Vec<String> = store.find_all().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Euro", "Libra"]);
    }

    #[tokio::test]
    async fn insert_all_is_all_or_nothing() {
        let store = MemoryStore::with_currencies(vec![Currency::new("Euro", "EUR", "€")]);

        let result = store
            .insert_all(&[Currency::new("Dolar", "USD", "$"), Currency::new("Euro 2", "EUR", "€")])
            .await;

        assert!(matches!(result, Err(CurrencyError::PersistenceFailure(_))));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn referenced_currency_cannot_be_deleted() {
        let euro = Currency::new("Euro", "EUR", "€");
        let store = MemoryStore::with_currencies(vec![euro.clone()]);
        store.reference(euro.id);

        assert!(matches!(
            store.delete(euro.id).await,
            Err(CurrencyError::ReferencedElsewhere(_))
        ));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn constants_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("cnb_kurz").await.unwrap(), None);

        store.set("cnb_kurz", "[24.3,24.4]").await.unwrap();
        assert_eq!(store.get("cnb_kurz").await.unwrap().as_deref(), Some("[24.3,24.4]"));
    }
}
