use thiserror::Error;

/// All errors produced by the opstats pipeline.
///
/// The variants fall into four groups that the HTTP layer maps to responses:
/// input errors (`NoFileUploaded`, `NotCsv`, `InvalidFileName`), parse errors
/// (`CsvParse`), validation errors (`RowCount`, `Validation`) and persistence
/// errors (`Database`, `Io`, `Other`). Only the persistence group is reported
/// as an opaque server error; everything else carries a client-facing message.
#[derive(Error, Debug)]
pub enum OpstatsError {
    /// The upload request carried no file, or the file was empty.
    #[error("No file uploaded")]
    NoFileUploaded,

    /// The uploaded file does not have a `.csv` extension.
    #[error("Only CSV files are allowed")]
    NotCsv,

    /// The derived file name is empty or longer than 255 characters.
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    /// The CSV content could not be parsed into records.
    #[error("Error parsing CSV: {0}")]
    CsvParse(String),

    /// The batch row count is outside the allowed range.
    #[error("Invalid row count: {count}. Must be between {min}-{max}")]
    RowCount { count: usize, min: usize, max: usize },

    /// One or more rows violated a business rule. Every violation in the
    /// batch is collected, not just the first.
    #[error("Validation failed with {} error(s)", .0.len())]
    Validation(Vec<String>),

    /// A database operation failed. Surfaced to clients as a generic
    /// server error; details only go to the log.
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Pass-through for raw I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OpstatsError {
    /// Whether this error is the caller's fault (bad upload) rather than a
    /// server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OpstatsError::NoFileUploaded
                | OpstatsError::NotCsv
                | OpstatsError::InvalidFileName(_)
                | OpstatsError::CsvParse(_)
                | OpstatsError::RowCount { .. }
                | OpstatsError::Validation(_)
        )
    }
}

/// Convenience alias used throughout the opstats crates.
pub type Result<T> = std::result::Result<T, OpstatsError>;
