//! SQLite alert history backend
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Readers (stats, health) don't block the worker's writes
//! - **Migrations**: Schema versioning with sqlx
//!
//! Prices are stored as TEXT to keep decimal precision; instants are Unix
//! milliseconds.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use tracing::{debug, info, instrument, trace, warn};

use super::backend::{AlertHistoryBackend, HealthStatus, SaveOutcome};
use super::error::{StorageError, StorageResult};
use super::schema::AlertHistoryRow;
use crate::AlertType;

pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteBackend {
    /// Open (or create) the database and run migrations
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("database migrations complete");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    fn decode_row(row: &SqliteRow) -> StorageResult<AlertHistoryRow> {
        let decimal = |column: &'static str, raw: &str| {
            Decimal::from_str(raw).map_err(|e| StorageError::decode(column, format!("{raw:?}: {e}")))
        };

        let price: String = row.try_get("price_mwh")?;
        let threshold: Option<String> = row.try_get("threshold_or_average")?;
        let alert_type: String = row.try_get("alert_type")?;

        Ok(AlertHistoryRow {
            alert_id: row.try_get("alert_id")?,
            node_id: row.try_get("node_id")?,
            alert_type: AlertType::from_str(&alert_type)
                .map_err(|e| StorageError::decode("alert_type", e))?,
            price_mwh: decimal("price_mwh", &price)?,
            threshold_or_average: threshold
                .as_deref()
                .map(|raw| decimal("threshold_or_average", raw))
                .transpose()?,
            raised_at: Self::millis_to_timestamp(row.try_get("raised_at")?),
            persisted_at: Self::millis_to_timestamp(row.try_get("persisted_at")?),
        })
    }
}

#[async_trait]
impl AlertHistoryBackend for SqliteBackend {
    #[instrument(skip_all, fields(count = alert_ids.len()))]
    async fn existing_alert_ids(&self, alert_ids: &[String]) -> StorageResult<HashSet<String>> {
        if alert_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT alert_id FROM alert_history WHERE alert_id IN (",
        );
        let mut ids = query.separated(", ");
        for id in alert_ids {
            ids.push_bind(id);
        }
        ids.push_unseparated(")");

        let found: Vec<String> = query
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;

        Ok(found.into_iter().collect())
    }

    #[instrument(skip_all, fields(alert_id = %row.alert_id))]
    async fn insert_one(&self, row: AlertHistoryRow) -> StorageResult<SaveOutcome> {
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM alert_history WHERE alert_id = ?")
                .bind(&row.alert_id)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            trace!("alert already persisted");
            return Ok(SaveOutcome::AlreadyPersisted);
        }

        // Single autocommit statement; a concurrent writer trips the unique
        // constraint and surfaces as DuplicateKey
        sqlx::query(
            r#"
            INSERT INTO alert_history (
                alert_id, node_id, alert_type, price_mwh,
                threshold_or_average, raised_at, persisted_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.alert_id)
        .bind(&row.node_id)
        .bind(row.alert_type.as_str())
        .bind(row.price_mwh.to_string())
        .bind(row.threshold_or_average.map(|d| d.to_string()))
        .bind(row.raised_at.timestamp_millis())
        .bind(row.persisted_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        debug!("alert persisted");
        Ok(SaveOutcome::Inserted)
    }

    async fn find_by_alert_id(&self, alert_id: &str) -> StorageResult<Option<AlertHistoryRow>> {
        let row = sqlx::query(
            r#"
            SELECT alert_id, node_id, alert_type, price_mwh,
                   threshold_or_average, raised_at, persisted_at
            FROM alert_history
            WHERE alert_id = ?
            "#,
        )
        .bind(alert_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::decode_row).transpose()
    }

    async fn count(&self) -> StorageResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alert_history")
            .fetch_one(&self.pool)
            .await?;
        Ok(total as u64)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                let mut metadata = HashMap::new();
                metadata.insert("backend".to_string(), "sqlite".to_string());
                metadata.insert("db_path".to_string(), self.db_path.clone());

                Ok(HealthStatus {
                    healthy: true,
                    message: "SQLite backend operational".to_string(),
                    metadata,
                })
            }
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_stats(&self) -> StorageResult<String> {
        let total_rows = self.count().await?;

        let (oldest, newest): (Option<i64>, Option<i64>) =
            sqlx::query_as("SELECT MIN(raised_at), MAX(raised_at) FROM alert_history")
                .fetch_one(&self.pool)
                .await?;

        let file_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);
        let file_size_mb = file_size as f64 / 1_000_000.0;

        let time_range = match (oldest, newest) {
            (Some(old), Some(new)) => format!(
                "{} to {}",
                Self::millis_to_timestamp(old).format("%Y-%m-%d"),
                Self::millis_to_timestamp(new).format("%Y-%m-%d")
            ),
            _ => "no data".to_string(),
        };

        Ok(format!(
            "SQLite: {} alerts, {:.2} MB on disk, raised: {}",
            total_rows, file_size_mb, time_range
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
