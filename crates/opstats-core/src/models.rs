use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::timestamp;

// ── Raw (parser output) ───────────────────────────────────────────────────────

/// A timestamp as it appeared in the CSV cell, before normalization.
///
/// The distinction matters: a value that carried an explicit offset has
/// already been *adjusted* to UTC, while a naive value must be
/// *reinterpreted* as UTC without shifting the wall-clock reading. Collapsing
/// the two into a single instant at parse time would silently shift naive
/// timestamps on re-upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawTimestamp {
    /// Parsed from a form with an explicit offset (`Z`, `+02:00`, ...),
    /// already adjusted to UTC.
    Explicit(DateTime<Utc>),
    /// Parsed from a form with no offset marker.
    Naive(NaiveDateTime),
}

impl RawTimestamp {
    /// Normalize to a UTC instant.
    ///
    /// Explicit values pass through unchanged; naive values are reinterpreted
    /// as UTC (same wall-clock reading, no adjustment).
    pub fn normalize(&self) -> DateTime<Utc> {
        match self {
            RawTimestamp::Explicit(dt) => *dt,
            RawTimestamp::Naive(naive) => Utc.from_utc_datetime(naive),
        }
    }
}

impl std::fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawTimestamp::Explicit(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.fZ")),
            RawTimestamp::Naive(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

/// A single CSV row as produced by the parser. No invariants enforced yet;
/// the validator owns the business rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub timestamp: RawTimestamp,
    pub execution_time: f64,
    pub indicator_value: f64,
}

// ── Persisted models ──────────────────────────────────────────────────────────

/// A validated measurement row as stored in the `measurements` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Store-assigned row id.
    pub id: i64,
    /// Upload base name (extension stripped) this row belongs to.
    pub file_name: String,
    /// Normalized UTC timestamp.
    pub timestamp: DateTime<Utc>,
    /// Execution time in seconds, always ≥ 0.
    pub execution_time: f64,
    /// Indicator value, always ≥ 0.
    pub indicator_value: f64,
}

/// A measurement ready for insertion (no id yet).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeasurement {
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
    pub execution_time: f64,
    pub indicator_value: f64,
}

/// Per-file aggregate statistics as stored in the `aggregate_results` table.
///
/// Exactly one row exists per distinct `file_name`; uniqueness is maintained
/// by the delete-then-insert replace inside the ingest transaction, not by a
/// database constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub id: i64,
    pub file_name: String,
    /// Minimum timestamp of the batch.
    pub first_operation_time: DateTime<Utc>,
    /// Max timestamp minus min timestamp, in fractional seconds.
    pub total_time_span_seconds: f64,
    pub avg_execution_time: f64,
    pub avg_indicator_value: f64,
    pub median_indicator_value: f64,
    pub max_indicator_value: f64,
    pub min_indicator_value: f64,
}

/// An aggregate ready for insertion (no id yet).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAggregateResult {
    pub file_name: String,
    pub first_operation_time: DateTime<Utc>,
    pub total_time_span_seconds: f64,
    pub avg_execution_time: f64,
    pub avg_indicator_value: f64,
    pub median_indicator_value: f64,
    pub max_indicator_value: f64,
    pub min_indicator_value: f64,
}

// ── Query criteria ────────────────────────────────────────────────────────────

/// Optional filter criteria for the aggregate read API.
///
/// Supplied criteria are ANDed together; an empty filter matches every row.
/// Date bounds accept RFC 3339, naive datetimes and plain `YYYY-MM-DD`
/// strings — naive forms are reinterpreted as UTC, the same rule ingest uses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultFilter {
    /// Substring match on `file_name`.
    pub file_name: Option<String>,
    /// Inclusive lower bound on `first_operation_time`.
    #[serde(default, deserialize_with = "deserialize_flexible_date")]
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `first_operation_time`.
    #[serde(default, deserialize_with = "deserialize_flexible_date")]
    pub end_date: Option<DateTime<Utc>>,
    /// Inclusive lower bound on `avg_indicator_value`.
    pub min_avg_value: Option<f64>,
    /// Inclusive upper bound on `avg_indicator_value`.
    pub max_avg_value: Option<f64>,
    /// Inclusive lower bound on `avg_execution_time`.
    pub min_avg_execution_time: Option<f64>,
    /// Inclusive upper bound on `avg_execution_time`.
    pub max_avg_execution_time: Option<f64>,
}

impl ResultFilter {
    /// Whether any criterion was supplied at all.
    pub fn is_empty(&self) -> bool {
        self.file_name.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.min_avg_value.is_none()
            && self.max_avg_value.is_none()
            && self.min_avg_execution_time.is_none()
            && self.max_avg_execution_time.is_none()
    }
}

fn deserialize_flexible_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => timestamp::parse_flexible_date(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
