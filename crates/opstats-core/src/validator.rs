//! Batch validation rules for parsed CSV records.
//!
//! The batch-size rule runs first and aborts before any per-row checks.
//! Per-row rules then run over *every* row, accumulating one message per
//! violation rather than failing fast, so the caller can report the complete
//! list back to the client.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{OpstatsError, Result};
use crate::models::{NewMeasurement, RawRecord};

/// Minimum number of data rows an upload may contain.
pub const MIN_ROWS: usize = 1;
/// Maximum number of data rows an upload may contain.
pub const MAX_ROWS: usize = 10_000;

/// Earliest timestamp accepted in any row.
fn min_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
        .single()
        .expect("2000-01-01T00:00:00Z is a valid instant")
}

// ── RecordValidator ───────────────────────────────────────────────────────────

/// Applies the batch-size and per-row business rules.
///
/// Carries the reference "now" so that the upper timestamp bound is stable
/// across the whole batch (and injectable in tests).
pub struct RecordValidator {
    now: DateTime<Utc>,
}

impl RecordValidator {
    /// Create a validator with the given reference time.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Create a validator anchored at the current wall-clock time.
    pub fn with_current_time() -> Self {
        Self::new(Utc::now())
    }

    /// Validate a parsed batch and, on success, return the normalized
    /// measurements ready for persistence.
    ///
    /// Rules, in evaluation order:
    /// 1. Row count in `[MIN_ROWS, MAX_ROWS]` — violation aborts immediately.
    /// 2. Per row (all rows checked, violations accumulated):
    ///    * normalized timestamp within `[2000-01-01T00:00:00Z, now]`,
    ///    * `execution_time >= 0`,
    ///    * `indicator_value >= 0`.
    ///
    /// Any violation rejects the entire batch; nothing is partially accepted.
    pub fn validate(&self, records: &[RawRecord], file_name: &str) -> Result<Vec<NewMeasurement>> {
        if records.len() < MIN_ROWS || records.len() > MAX_ROWS {
            return Err(OpstatsError::RowCount {
                count: records.len(),
                min: MIN_ROWS,
                max: MAX_ROWS,
            });
        }

        let min_date = min_timestamp();
        let mut errors: Vec<String> = Vec::new();

        for (i, record) in records.iter().enumerate() {
            let row = i + 1; // 1-based in messages
            let utc = record.timestamp.normalize();

            if utc < min_date || utc > self.now {
                errors.push(format!(
                    "Row {row}: Invalid date {}. Date must be between 2000-01-01 and current date",
                    record.timestamp
                ));
            }
            if record.execution_time < 0.0 {
                errors.push(format!("Row {row}: Execution time cannot be negative"));
            }
            if record.indicator_value < 0.0 {
                errors.push(format!("Row {row}: Indicator value cannot be negative"));
            }
        }

        if !errors.is_empty() {
            return Err(OpstatsError::Validation(errors));
        }

        Ok(records
            .iter()
            .map(|r| NewMeasurement {
                file_name: file_name.to_string(),
                timestamp: r.timestamp.normalize(),
                execution_time: r.execution_time,
                indicator_value: r.indicator_value,
            })
            .collect())
    }
}
