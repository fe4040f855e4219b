//! Pure aggregate statistics over a validated measurement batch.

use crate::models::{NewAggregateResult, NewMeasurement};

// ── Median helper ─────────────────────────────────────────────────────────────

/// Compute the median of a **sorted** slice.
///
/// Odd count → middle element; even count → arithmetic mean of the two
/// middle elements. Returns `0.0` for an empty slice, although batches are
/// guaranteed non-empty by the row-count rule.
pub fn median_of_sorted(sorted: &[f64]) -> f64 {
    let size = sorted.len();
    if size == 0 {
        return 0.0;
    }
    let mid = size / 2;
    if size % 2 != 0 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

// ── StatisticsCalculator ──────────────────────────────────────────────────────

/// Stateless calculator for the seven per-file aggregate fields.
pub struct StatisticsCalculator;

impl StatisticsCalculator {
    /// Compute the aggregate for a validated batch.
    ///
    /// The batch must be non-empty (guaranteed upstream by
    /// [`crate::validator::MIN_ROWS`]) and all rows share `file_name`.
    /// Input row order is irrelevant; min/max scans and an explicit sort for
    /// the median make the result order-independent.
    pub fn calculate(measurements: &[NewMeasurement], file_name: &str) -> NewAggregateResult {
        let count = measurements.len() as f64;

        let first = measurements
            .iter()
            .map(|m| m.timestamp)
            .min()
            .unwrap_or_default();
        let last = measurements
            .iter()
            .map(|m| m.timestamp)
            .max()
            .unwrap_or_default();
        let total_time_span_seconds = (last - first)
            .num_microseconds()
            .map(|us| us as f64 / 1_000_000.0)
            .unwrap_or_else(|| (last - first).num_milliseconds() as f64 / 1000.0);

        let avg_execution_time =
            measurements.iter().map(|m| m.execution_time).sum::<f64>() / count;

        let mut indicator_values: Vec<f64> =
            measurements.iter().map(|m| m.indicator_value).collect();
        indicator_values.sort_by(f64::total_cmp);

        let avg_indicator_value = indicator_values.iter().sum::<f64>() / count;
        let median_indicator_value = median_of_sorted(&indicator_values);
        let min_indicator_value = indicator_values.first().copied().unwrap_or_default();
        let max_indicator_value = indicator_values.last().copied().unwrap_or_default();

        NewAggregateResult {
            file_name: file_name.to_string(),
            first_operation_time: first,
            total_time_span_seconds,
            avg_execution_time,
            avg_indicator_value,
            median_indicator_value,
            max_indicator_value,
            min_indicator_value,
        }
    }
}
