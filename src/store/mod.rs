//! Persistence seams for currencies and cached constants.

#[cfg(test)]
mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::currency::Currency;
use crate::error::Result;

#[cfg(test)]
pub(crate) use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CurrencyRepository: Send + Sync {
    /// All currencies ordered by name.
    async fn find_all(&self) -> Result<Vec<Currency>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Currency>>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Currency>>;
    async fn find_defaults(&self) -> Result<Vec<Currency>>;
    async fn count(&self) -> Result<i64>;
    async fn insert(&self, currency: &Currency) -> Result<()>;
    /// Inserts every currency or none of them.
    async fn insert_all(&self, currencies: &[Currency]) -> Result<()>;
    async fn update(&self, currency: &Currency) -> Result<()>;
    /// Flags `id` as the default and clears the flag everywhere else.
    async fn set_default(&self, id: Uuid) -> Result<()>;
    /// Fails with `ReferencedElsewhere` when other records point at the row.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Key/value store for values cached by the update job.
#[async_trait]
pub trait ConstantStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
