use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{CurrencyError, Result};
use crate::feed::{cnb, csob};
use crate::trend::TrendFields;

pub struct Config {
    pub database_url: String,
    pub cnb_url: String,
    pub csob_url_template: String,
    pub user_agent: String,
    pub listen_addr: SocketAddr,
    pub cache_ttl: Duration,
    pub trend_fields: TrendFields,
    pub trend_code: String,
}

impl Config {
    /// Reads `.env` and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = var("DATABASE_URL")
            .ok_or_else(|| CurrencyError::Config("DATABASE_URL must be set".to_string()))?;

        let listen_addr = var("KURZY_BIND")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| CurrencyError::Config(format!("Invalid KURZY_BIND: {}", e)))?;

        let ttl_secs: u64 = match var("KURZY_CACHE_TTL_SECS") {
            Some(value) => value
                .parse()
                .map_err(|e| CurrencyError::Config(format!("Invalid KURZY_CACHE_TTL_SECS: {}", e)))?,
            None => 300,
        };

        let trend_fields = match var("KURZY_TREND_FIELDS") {
            Some(value) => value.parse().map_err(CurrencyError::Config)?,
            None => TrendFields::default(),
        };

        Ok(Self {
            database_url,
            cnb_url: var("KURZY_CNB_URL").unwrap_or_else(|| cnb::DEFAULT_URL.to_string()),
            csob_url_template: var("KURZY_CSOB_URL")
                .unwrap_or_else(|| csob::DEFAULT_URL_TEMPLATE.to_string()),
            user_agent: var("KURZY_USER_AGENT")
                .unwrap_or_else(|| csob::DEFAULT_USER_AGENT.to_string()),
            listen_addr,
            cache_ttl: Duration::from_secs(ttl_secs),
            trend_fields,
            trend_code: var("KURZY_TREND_CODE").unwrap_or_else(|| "EUR".to_string()),
        })
    }
}
