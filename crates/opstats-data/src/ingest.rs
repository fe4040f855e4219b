//! Upload ingest coordination.
//!
//! Drives one upload through parse → validate → statistics → atomic replace.
//! Parse and validation failures reject the request before anything touches
//! the store; a storage failure rolls the transaction back inside
//! [`Store::replace_file_data`], so a committed transaction is the only path
//! that changes persisted state.

use std::path::Path;

use chrono::{DateTime, Utc};
use opstats_core::error::{OpstatsError, Result};
use opstats_core::statistics::StatisticsCalculator;
use opstats_core::validator::RecordValidator;
use tracing::{info, warn};

use crate::csv_reader;
use crate::store::Store;

/// Maximum length of a derived file name.
const MAX_FILE_NAME_LEN: usize = 255;

/// Summary of one committed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Derived base name the batch was stored under.
    pub file_name: String,
    /// Number of measurement rows persisted.
    pub rows_ingested: usize,
}

/// Derive the storage key from the uploaded file name: strip any directory
/// components and the extension, then enforce the 1–255 character bound.
pub fn derive_file_name(original: &str) -> Result<String> {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .trim();
    if stem.is_empty() || stem.chars().count() > MAX_FILE_NAME_LEN {
        return Err(OpstatsError::InvalidFileName(original.to_string()));
    }
    Ok(stem.to_string())
}

// ── IngestCoordinator ─────────────────────────────────────────────────────────

/// Coordinates the ingest pipeline against one [`Store`].
pub struct IngestCoordinator {
    store: Store,
    now: DateTime<Utc>,
}

impl IngestCoordinator {
    /// Create a coordinator anchored at the current wall-clock time.
    pub fn new(store: Store) -> Self {
        Self::with_reference_time(store, Utc::now())
    }

    /// Create a coordinator with an injected reference time (tests).
    pub fn with_reference_time(store: Store, now: DateTime<Utc>) -> Self {
        Self { store, now }
    }

    /// Ingest one uploaded CSV file.
    ///
    /// `original_file_name` is the client-supplied upload name; the batch is
    /// stored under its base name with the extension stripped. Re-uploading
    /// the same name replaces the previous batch and its aggregate wholesale.
    pub async fn ingest(&self, original_file_name: &str, bytes: &[u8]) -> Result<IngestOutcome> {
        let file_name = derive_file_name(original_file_name)?;

        let records = match csv_reader::parse_records(bytes) {
            Ok(records) => records,
            Err(e) => {
                warn!("rejecting \"{file_name}\": {e}");
                return Err(e);
            }
        };

        let measurements = match RecordValidator::new(self.now).validate(&records, &file_name) {
            Ok(measurements) => measurements,
            Err(e) => {
                warn!("rejecting \"{file_name}\": {e}");
                return Err(e);
            }
        };

        let result = StatisticsCalculator::calculate(&measurements, &file_name);
        self.store.replace_file_data(&measurements, &result).await?;

        info!(
            "ingested {} row(s) for \"{}\" (span {:.3}s, median {})",
            measurements.len(),
            file_name,
            result.total_time_span_seconds,
            result.median_indicator_value
        );
        Ok(IngestOutcome {
            file_name,
            rows_ingested: measurements.len(),
        })
    }
}
