//! An archive of daily weather observations.

use std::path::PathBuf;

pub use self::ingest::IngestSummary;
pub use self::root::default_root;

/// The archive.
#[derive(Debug)]
pub struct Archive {
    root: PathBuf,                 // The root directory.
    db_conn: rusqlite::Connection, // An sqlite connection.
}

mod aggregate;
mod clean;
mod ingest;
mod modify;
mod query;
mod root;
