//! CSV parsing for uploaded measurement files.
//!
//! Columns are resolved by header name, so reordered or extra columns are
//! tolerated. Parse failures abort on the first bad cell (unlike validation,
//! which accumulates) and carry the offending row number. An empty or
//! header-only file parses to zero records; the validator's row-count rule
//! decides whether that is acceptable.

use csv::{ReaderBuilder, StringRecord, Trim};
use opstats_core::error::{OpstatsError, Result};
use opstats_core::models::RawRecord;
use opstats_core::timestamp;
use tracing::debug;

/// Required column holding the measurement timestamp.
pub const COL_TIMESTAMP: &str = "Timestamp";
/// Required column holding the execution time in seconds.
pub const COL_EXECUTION_TIME: &str = "ExecutionTime";
/// Required column holding the indicator value.
pub const COL_INDICATOR_VALUE: &str = "IndicatorValue";

/// Resolved positions of the required columns within the header row.
struct Columns {
    timestamp: usize,
    execution_time: usize,
    indicator_value: usize,
}

impl Columns {
    /// Look up the required columns by name.
    ///
    /// Returns the list of missing column names on failure. The caller only
    /// reports that error once a data row actually needs the columns, so a
    /// header-only or empty file still parses to zero records.
    fn resolve(headers: &StringRecord) -> std::result::Result<Self, Vec<&'static str>> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let timestamp = find(COL_TIMESTAMP);
        let execution_time = find(COL_EXECUTION_TIME);
        let indicator_value = find(COL_INDICATOR_VALUE);

        match (timestamp, execution_time, indicator_value) {
            (Some(timestamp), Some(execution_time), Some(indicator_value)) => Ok(Self {
                timestamp,
                execution_time,
                indicator_value,
            }),
            _ => {
                let mut missing = Vec::new();
                if timestamp.is_none() {
                    missing.push(COL_TIMESTAMP);
                }
                if execution_time.is_none() {
                    missing.push(COL_EXECUTION_TIME);
                }
                if indicator_value.is_none() {
                    missing.push(COL_INDICATOR_VALUE);
                }
                Err(missing)
            }
        }
    }
}

/// Parse raw CSV bytes into an ordered sequence of [`RawRecord`]s.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| OpstatsError::CsvParse(e.to_string()))?
        .clone();
    let columns = Columns::resolve(&headers);

    let mut records: Vec<RawRecord> = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let row = i + 1;
        let record = record.map_err(|e| OpstatsError::CsvParse(e.to_string()))?;

        let columns = match &columns {
            Ok(columns) => columns,
            Err(missing) => {
                return Err(OpstatsError::CsvParse(format!(
                    "missing required column(s): {}",
                    missing.join(", ")
                )))
            }
        };

        let timestamp = timestamp::parse_timestamp(field(&record, columns.timestamp, row, COL_TIMESTAMP)?)
            .map_err(|e| OpstatsError::CsvParse(format!("row {row}: {e}")))?;
        let execution_time = parse_float(&record, columns.execution_time, row, COL_EXECUTION_TIME)?;
        let indicator_value =
            parse_float(&record, columns.indicator_value, row, COL_INDICATOR_VALUE)?;

        records.push(RawRecord {
            timestamp,
            execution_time,
            indicator_value,
        });
    }

    debug!("parsed {} CSV record(s)", records.len());
    Ok(records)
}

/// Fetch one cell, reporting a missing field for short rows.
fn field<'r>(record: &'r StringRecord, index: usize, row: usize, name: &str) -> Result<&'r str> {
    record
        .get(index)
        .ok_or_else(|| OpstatsError::CsvParse(format!("row {row}: missing field {name}")))
}

fn parse_float(record: &StringRecord, index: usize, row: usize, name: &str) -> Result<f64> {
    let cell = field(record, index, row, name)?;
    cell.parse::<f64>().map_err(|_| {
        OpstatsError::CsvParse(format!("row {row}: invalid number \"{cell}\" in {name}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use opstats_core::models::RawTimestamp;

    #[test]
    fn test_parse_valid_rows_in_order() {
        let csv = "Timestamp,ExecutionTime,IndicatorValue\n\
                   2023-01-01T12:00:00,1.5,10.2\n\
                   2023-01-01T12:01:00,2.3,15.7\n";
        let records = parse_records(csv.as_bytes()).expect("should parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].execution_time, 1.5);
        assert_eq!(records[1].indicator_value, 15.7);
        assert!(matches!(records[0].timestamp, RawTimestamp::Naive(_)));
    }

    #[test]
    fn test_reordered_columns_resolved_by_name() {
        let csv = "IndicatorValue,Timestamp,ExecutionTime\n\
                   10.2,2023-01-01T12:00:00Z,1.5\n";
        let records = parse_records(csv.as_bytes()).expect("should parse");
        assert_eq!(records[0].indicator_value, 10.2);
        assert_eq!(records[0].execution_time, 1.5);
        assert!(matches!(records[0].timestamp, RawTimestamp::Explicit(_)));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let csv = "Timestamp,Operator,ExecutionTime,IndicatorValue,Comment\n\
                   2023-01-01T12:00:00,alice,1.5,10.2,fine\n";
        let records = parse_records(csv.as_bytes()).expect("should parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].indicator_value, 10.2);
    }

    #[test]
    fn test_missing_column_with_data_rows_fails() {
        let csv = "Timestamp,ExecutionTime\n2023-01-01T12:00:00,1.5\n";
        let err = parse_records(csv.as_bytes()).expect_err("must fail");
        assert!(err.to_string().contains("IndicatorValue"), "got: {err}");
    }

    #[test]
    fn test_empty_input_yields_zero_records() {
        assert_eq!(parse_records(b"").expect("empty is fine").len(), 0);
    }

    #[test]
    fn test_header_only_yields_zero_records() {
        let csv = "Timestamp,ExecutionTime,IndicatorValue\n";
        assert_eq!(parse_records(csv.as_bytes()).expect("header only").len(), 0);
    }

    #[test]
    fn test_header_only_with_wrong_columns_is_not_an_error() {
        // Count rule downstream reports this as an empty batch instead.
        assert_eq!(parse_records(b"A,B,C\n").expect("no data rows").len(), 0);
    }

    #[test]
    fn test_non_numeric_cell_reports_row() {
        let csv = "Timestamp,ExecutionTime,IndicatorValue\n\
                   2023-01-01T12:00:00,1.5,10.2\n\
                   2023-01-01T12:01:00,abc,15.7\n";
        let err = parse_records(csv.as_bytes()).expect_err("must fail");
        let msg = err.to_string();
        assert!(msg.contains("row 2"), "got: {msg}");
        assert!(msg.contains("ExecutionTime"), "got: {msg}");
    }

    #[test]
    fn test_unparseable_timestamp_reports_row() {
        let csv = "Timestamp,ExecutionTime,IndicatorValue\n\
                   01/01/2023 oops,1.5,10.2\n";
        let err = parse_records(csv.as_bytes()).expect_err("must fail");
        assert!(err.to_string().contains("row 1"), "got: {err}");
    }

    #[test]
    fn test_short_row_reports_missing_field() {
        let csv = "Timestamp,ExecutionTime,IndicatorValue\n\
                   2023-01-01T12:00:00,1.5\n";
        let err = parse_records(csv.as_bytes()).expect_err("must fail");
        assert!(err.to_string().contains("missing field"), "got: {err}");
    }
}
