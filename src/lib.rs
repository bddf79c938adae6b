pub mod adjust;
pub mod api;
pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod feed;
pub mod job;
pub mod manager;
pub mod number;
pub mod store;
pub mod trend;

pub use currency::{Currency, CurrencyFormat, CurrencySnapshot};
pub use error::{CurrencyError, Result};
pub use manager::{CurrencyManager, RefreshReport};
