use thiserror::Error;

pub type Result<T> = std::result::Result<T, CurrencyError>;

/// Everything that can go wrong while managing currencies.
#[derive(Error, Debug)]
pub enum CurrencyError {
    #[error("Currency not found: {0}")]
    NotFound(String),

    #[error("Currencies are already installed or the currency table is not empty")]
    AlreadyInstalled,

    #[error("No default currency is set")]
    MissingDefault,

    #[error("More than one currency is set as default")]
    TooManyDefaults,

    #[error("Currency {0} cannot be removed because it is in use")]
    ReferencedElsewhere(String),

    #[error("Rate feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("Failed to persist currency data: {0}")]
    PersistenceFailure(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<sqlx::Error> for CurrencyError {
    fn from(e: sqlx::Error) -> Self {
        CurrencyError::PersistenceFailure(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for CurrencyError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        CurrencyError::PersistenceFailure(e.to_string())
    }
}
