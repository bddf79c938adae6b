use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::{ConstantStore, CurrencyRepository};
use crate::adjust::RateModifyOperator;
use crate::currency::Currency;
use crate::error::{CurrencyError, Result};

const COLUMNS: &str = "id, name, code, symbol, default_schema, thousand_separator, \
    decimal_separator, decimal_precision, rate, real_rate, rate_lock, rate_modify_operator, \
    rate_modify_value, last_update, active, is_default";

#[derive(sqlx::FromRow)]
struct CurrencyRow {
    id: Uuid,
    name: String,
    code: String,
    symbol: String,
    default_schema: String,
    thousand_separator: String,
    decimal_separator: String,
    decimal_precision: i32,
    rate: Decimal,
    real_rate: Decimal,
    rate_lock: bool,
    rate_modify_operator: Option<String>,
    rate_modify_value: Decimal,
    last_update: Option<DateTime<Utc>>,
    active: bool,
    is_default: bool,
}

impl From<CurrencyRow> for Currency {
    fn from(row: CurrencyRow) -> Self {
        Currency {
            id: row.id,
            name: row.name,
            code: row.code,
            symbol: row.symbol,
            schema: row.default_schema,
            thousand_separator: row.thousand_separator,
            decimal_separator: row.decimal_separator,
            decimal_precision: row.decimal_precision.max(0) as u32,
            rate: row.rate,
            real_rate: row.real_rate,
            rate_locked: row.rate_lock,
            rate_modify_operator: RateModifyOperator::from_symbol(row.rate_modify_operator.as_deref()),
            rate_modify_value: row.rate_modify_value,
            last_update: row.last_update,
            active: row.active,
            is_default: row.is_default,
        }
    }
}

/// PostgreSQL-backed store. Migrations run on connect.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::migrate!().run(&pool).await?;

        Ok(Self { pool })
    }

    async fn fetch(&self, filter: &str) -> Result<Vec<Currency>> {
        let sql = format!("SELECT {} FROM currency {} ORDER BY name ASC", COLUMNS, filter);
        let rows = sqlx::query_as::<_, CurrencyRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Currency::from).collect())
    }
}

fn insert_query(currency: &Currency) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO currency (id, name, code, symbol, default_schema, thousand_separator,
            decimal_separator, decimal_precision, rate, real_rate, rate_lock,
            rate_modify_operator, rate_modify_value, last_update, active, is_default)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#,
    )
    .bind(currency.id)
    .bind(&currency.name)
    .bind(&currency.code)
    .bind(&currency.symbol)
    .bind(&currency.schema)
    .bind(&currency.thousand_separator)
    .bind(&currency.decimal_separator)
    .bind(currency.decimal_precision as i32)
    .bind(currency.rate)
    .bind(currency.real_rate)
    .bind(currency.rate_locked)
    .bind(currency.rate_modify_operator.symbol())
    .bind(currency.rate_modify_value)
    .bind(currency.last_update)
    .bind(currency.active)
    .bind(currency.is_default)
}

#[async_trait]
impl CurrencyRepository for PgStore {
    async fn find_all(&self) -> Result<Vec<Currency>> {
        self.fetch("").await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Currency>> {
        let sql = format!("SELECT {} FROM currency WHERE id = $1", COLUMNS);
        let row = sqlx::query_as::<_, CurrencyRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Currency::from))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Currency>> {
        let sql = format!("SELECT {} FROM currency WHERE code = $1", COLUMNS);
        let row = sqlx::query_as::<_, CurrencyRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Currency::from))
    }

    async fn find_defaults(&self) -> Result<Vec<Currency>> {
        self.fetch("WHERE is_default").await
    }

    async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM currency")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn insert(&self, currency: &Currency) -> Result<()> {
        insert_query(currency).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_all(&self, currencies: &[Currency]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for currency in currencies {
            insert_query(currency).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn update(&self, currency: &Currency) -> Result<()> {
        let done = sqlx::query(
            r#"
            UPDATE currency SET
                name = $2, code = $3, symbol = $4, default_schema = $5,
                thousand_separator = $6, decimal_separator = $7, decimal_precision = $8,
                rate = $9, real_rate = $10, rate_lock = $11, rate_modify_operator = $12,
                rate_modify_value = $13, last_update = $14, active = $15, is_default = $16
            WHERE id = $1
            "#,
        )
        .bind(currency.id)
        .bind(&currency.name)
        .bind(&currency.code)
        .bind(&currency.symbol)
        .bind(&currency.schema)
        .bind(&currency.thousand_separator)
        .bind(&currency.decimal_separator)
        .bind(currency.decimal_precision as i32)
        .bind(currency.rate)
        .bind(currency.real_rate)
        .bind(currency.rate_locked)
        .bind(currency.rate_modify_operator.symbol())
        .bind(currency.rate_modify_value)
        .bind(currency.last_update)
        .bind(currency.active)
        .bind(currency.is_default)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(CurrencyError::NotFound(currency.id.to_string()));
        }
        Ok(())
    }

    async fn set_default(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let done = sqlx::query("UPDATE currency SET is_default = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if done.rows_affected() == 0 {
            return Err(CurrencyError::NotFound(id.to_string()));
        }

        sqlx::query("UPDATE currency SET is_default = FALSE WHERE id <> $1 AND is_default")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM currency WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(CurrencyError::NotFound(id.to_string())),
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(CurrencyError::ReferencedElsewhere(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ConstantStore for PgStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<(String,)> = sqlx::query_as("SELECT value FROM app_constant WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value.map(|(v,)| v))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO app_constant (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
