//! SQLite-backed record of instruments that have already been screened,
//! keyed by ISIN. The pipeline checks it before scoring so a candidate is
//! only ever emailed once.

use anyhow::Result;
use async_trait::async_trait;
use screener_core::{ScoredInstrument, SeenStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS screened_instruments (
    isin TEXT PRIMARY KEY,
    total_score INTEGER NOT NULL,
    screened_at TEXT NOT NULL
)";

#[derive(Clone)]
pub struct ScreenStore {
    pool: SqlitePool,
}

impl ScreenStore {
    /// Open (or create) the store at `database_url`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;

        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SeenStore for ScreenStore {
    async fn exists(&self, isin: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM screened_instruments WHERE isin = ?")
                .bind(isin)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    async fn record(&self, instrument: &ScoredInstrument) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO screened_instruments (isin, total_score, screened_at)
             VALUES (?, ?, ?)",
        )
        .bind(&instrument.isin)
        .bind(instrument.total_score as i64)
        .bind(instrument.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_exists_round_trip() {
        let store = ScreenStore::new("sqlite::memory:").await.unwrap();

        assert!(!store.exists("US0378331005").await.unwrap());

        store
            .record(&ScoredInstrument {
                isin: "US0378331005".to_string(),
                total_score: 15,
                timestamp: Utc::now(),
            })
            .await
            .unwrap();

        assert!(store.exists("US0378331005").await.unwrap());
        assert!(!store.exists("US5949181045").await.unwrap());
    }

    #[tokio::test]
    async fn test_record_is_idempotent_per_isin() {
        let store = ScreenStore::new("sqlite::memory:").await.unwrap();
        let scored = ScoredInstrument {
            isin: "IE00BCRY6557".to_string(),
            total_score: 42,
            timestamp: Utc::now(),
        };

        store.record(&scored).await.unwrap();
        store.record(&scored).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM screened_instruments")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
