//! SQLite persistence for measurements and aggregate results.
//!
//! Two tables keyed by `file_name`: `measurements` (the raw rows of each
//! upload) and `aggregate_results` (one row per distinct file name, kept
//! unique by the delete-then-insert replace inside a single transaction).
//! All timestamps are stored and compared as UTC.

use std::str::FromStr;

use opstats_core::error::Result;
use opstats_core::models::{AggregateResult, Measurement, NewAggregateResult, NewMeasurement, ResultFilter};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;
use tracing::{debug, info};

/// How many rows the latest-measurements read returns at most.
pub const LATEST_LIMIT: i64 = 10;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS measurements (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name       TEXT NOT NULL,
    timestamp       TEXT NOT NULL,
    execution_time  REAL NOT NULL,
    indicator_value REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_measurements_file_timestamp
    ON measurements(file_name, timestamp);
CREATE TABLE IF NOT EXISTS aggregate_results (
    id                      INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name               TEXT NOT NULL,
    first_operation_time    TEXT NOT NULL,
    total_time_span_seconds REAL NOT NULL,
    avg_execution_time      REAL NOT NULL,
    avg_indicator_value     REAL NOT NULL,
    median_indicator_value  REAL NOT NULL,
    max_indicator_value     REAL NOT NULL,
    min_indicator_value     REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_aggregate_results_file
    ON aggregate_results(file_name);
"#;

// ── Store ─────────────────────────────────────────────────────────────────────

/// Handle to the SQLite database. Cheap to clone; wraps a connection pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if necessary) the database at `url` and ensure the
    /// schema exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        info!("connected to SQLite store at {url}");
        Ok(Self { pool })
    }

    /// Open a private in-memory database. Used by tests.
    ///
    /// A single connection keeps the in-memory database alive and visible to
    /// every query issued through the pool.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Atomically replace all persisted data for one file name.
    ///
    /// Within a single transaction: delete any existing measurements and
    /// aggregate for `result.file_name` (a no-op when none exist), insert the
    /// new batch, insert the new aggregate, commit. Any failure rolls the
    /// whole transaction back, leaving prior state untouched.
    pub async fn replace_file_data(
        &self,
        measurements: &[NewMeasurement],
        result: &NewAggregateResult,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM measurements WHERE file_name = ?")
            .bind(&result.file_name)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM aggregate_results WHERE file_name = ?")
            .bind(&result.file_name)
            .execute(&mut *tx)
            .await?;

        for m in measurements {
            sqlx::query(
                "INSERT INTO measurements (file_name, timestamp, execution_time, indicator_value) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&m.file_name)
            .bind(m.timestamp)
            .bind(m.execution_time)
            .bind(m.indicator_value)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO aggregate_results (file_name, first_operation_time, \
             total_time_span_seconds, avg_execution_time, avg_indicator_value, \
             median_indicator_value, max_indicator_value, min_indicator_value) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&result.file_name)
        .bind(result.first_operation_time)
        .bind(result.total_time_span_seconds)
        .bind(result.avg_execution_time)
        .bind(result.avg_indicator_value)
        .bind(result.median_indicator_value)
        .bind(result.max_indicator_value)
        .bind(result.min_indicator_value)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            "replaced data for \"{}\": {} measurement(s)",
            result.file_name,
            measurements.len()
        );
        Ok(())
    }

    /// Return all aggregates matching the conjunction of the supplied
    /// criteria. An empty filter matches every row.
    ///
    /// Substring matching uses `instr` rather than `LIKE` so the comparison
    /// stays case-sensitive and wildcard characters in the needle are inert.
    pub async fn filter_results(&self, filter: &ResultFilter) -> Result<Vec<AggregateResult>> {
        let mut query = QueryBuilder::new("SELECT * FROM aggregate_results WHERE 1 = 1");

        if let Some(name) = filter.file_name.as_deref().filter(|s| !s.is_empty()) {
            query.push(" AND instr(file_name, ");
            query.push_bind(name.to_string());
            query.push(") > 0");
        }
        if let Some(start) = filter.start_date {
            query.push(" AND first_operation_time >= ");
            query.push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND first_operation_time <= ");
            query.push_bind(end);
        }
        if let Some(min) = filter.min_avg_value {
            query.push(" AND avg_indicator_value >= ");
            query.push_bind(min);
        }
        if let Some(max) = filter.max_avg_value {
            query.push(" AND avg_indicator_value <= ");
            query.push_bind(max);
        }
        if let Some(min) = filter.min_avg_execution_time {
            query.push(" AND avg_execution_time >= ");
            query.push_bind(min);
        }
        if let Some(max) = filter.max_avg_execution_time {
            query.push(" AND avg_execution_time <= ");
            query.push_bind(max);
        }

        let results = query
            .build_query_as::<AggregateResult>()
            .fetch_all(&self.pool)
            .await?;
        Ok(results)
    }

    /// Return up to [`LATEST_LIMIT`] measurements for `file_name`, newest
    /// first.
    pub async fn latest_measurements(&self, file_name: &str) -> Result<Vec<Measurement>> {
        let rows = sqlx::query_as::<_, Measurement>(
            "SELECT * FROM measurements WHERE file_name = ? \
             ORDER BY timestamp DESC LIMIT ?",
        )
        .bind(file_name)
        .bind(LATEST_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Total number of persisted measurement rows for `file_name`.
    pub async fn count_measurements(&self, file_name: &str) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM measurements WHERE file_name = ?")
                .bind(file_name)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
