#![deny(missing_docs)]
//! Package to ingest, clean, aggregate and serve an archive of daily weather observations.

//
// Public API
//
pub use crate::archive::{default_root, Archive, IngestSummary};
pub use crate::cmd_line::{init_logging, CommonCmdLineArgs};
pub use crate::errors::{QueryError, WeatherDataErr};
pub use crate::filter::{Pagination, RecordFilter};
pub use crate::http::{router, AppState};
pub use crate::record::{Measurement, WeatherRecord, WeatherStats, SENTINEL};
pub use crate::service::QueryService;
pub use crate::station_id::StationId;

//
// Implementation only
//
mod archive;
mod cmd_line;
mod errors;
mod filter;
mod http;
mod record;
mod service;
mod station_id;
