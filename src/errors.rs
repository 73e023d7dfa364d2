//! Module for errors.
use std::path::PathBuf;

use thiserror::Error;

use crate::station_id::StationId;

/// Error from the archive interface.
#[derive(Debug, Error)]
pub enum WeatherDataErr {
    // Inherited errors from std
    /// Error forwarded from std
    #[error("std lib io error: {0}")]
    IO(#[from] std::io::Error),

    // Other forwarded errors
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Bad log filter directive
    #[error("invalid log filter: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),

    // My own errors from this crate
    /// A line in an observation file could not be parsed.
    #[error("malformed line {line} in {}: {reason}", .file.display())]
    Parse {
        /// The file being ingested.
        file: PathBuf,
        /// One based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },
    /// Station identifier is empty or not alphanumeric.
    #[error("invalid station id: {0}")]
    InvalidStationId(String),
    /// The database structure is wrong.
    #[error("invalid index format")]
    InvalidSchema,
    /// The ingestion source is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// There is already an archive at this location.
    #[error("archive already exists at {}", .0.display())]
    ArchiveExists(PathBuf),
}

/// Outcome of a query that did not produce any data.
///
/// Validation failures are detected before the store is touched, the two not-found flavors are
/// decided after it, and storage faults are forwarded untouched.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A filter or pagination value was malformed.
    #[error("{0}")]
    Validation(String),
    /// The station has never been seen by the archive.
    #[error("Station ID not found.")]
    StationNotFound(StationId),
    /// The parameters were fine, but no records matched.
    #[error("No weather data found for the given parameters.")]
    NoRecords,
    /// The parameters were fine, but no statistics matched.
    #[error("No weather statistics found for the given station ID.")]
    NoStats,
    /// Error forwarded from the archive.
    #[error(transparent)]
    Storage(#[from] WeatherDataErr),
}

impl QueryError {
    /// True for the not-found family of outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            QueryError::StationNotFound(_) | QueryError::NoRecords | QueryError::NoStats
        )
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(err: rusqlite::Error) -> QueryError {
        QueryError::Storage(WeatherDataErr::Database(err))
    }
}
