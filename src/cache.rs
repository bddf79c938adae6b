//! Read-through cache for the currency list and the default currency.
//!
//! Entries expire after `ttl` so that writes made by another process show
//! up eventually; writes made through the manager clear it immediately.
//!
//! Every invalidation bumps a generation. A reader takes the generation
//! before querying the repository and hands it back when storing, so a
//! result read before a write can never outlive that write.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::currency::Currency;

struct Cached<T> {
    value: T,
    stored_at: Instant,
}

impl<T: Clone> Cached<T> {
    fn fresh(&self, ttl: Duration) -> Option<T> {
        (self.stored_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

#[derive(Default)]
struct Entries {
    generation: u64,
    all: Option<Cached<Vec<Currency>>>,
    default: Option<Cached<Currency>>,
}

pub struct CurrencyCache {
    ttl: Duration,
    entries: RwLock<Entries>,
}

impl CurrencyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(Entries::default()),
        }
    }

    pub fn generation(&self) -> u64 {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).generation
    }

    pub fn all(&self) -> Option<Vec<Currency>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.all.as_ref()?.fresh(self.ttl)
    }

    /// Stores the list unless the cache was invalidated since `generation`.
    pub fn store_all(&self, generation: u64, currencies: Vec<Currency>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.generation != generation {
            log::debug!("Discarding currency list read before the last write");
            return;
        }
        entries.all = Some(Cached {
            value: currencies,
            stored_at: Instant::now(),
        });
    }

    pub fn default_currency(&self) -> Option<Currency> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.default.as_ref()?.fresh(self.ttl)
    }

    /// Stores the default unless the cache was invalidated since `generation`.
    pub fn store_default(&self, generation: u64, currency: Currency) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.generation != generation {
            log::debug!("Discarding default currency read before the last write");
            return;
        }
        entries.default = Some(Cached {
            value: currency,
            stored_at: Instant::now(),
        });
    }

    pub fn invalidate(&self) {
        log::debug!("Invalidating currency cache");
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        *entries = Entries {
            generation: entries.generation.wrapping_add(1),
            ..Entries::default()
        };
    }
}
