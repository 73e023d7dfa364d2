//! Validated query parameters.
//!
//! Everything in here is checked before the archive is consulted, so a malformed request never
//! reaches the database.

use std::sync::OnceLock;

use regex::Regex;

use crate::{errors::QueryError, station_id::StationId};

const DATE_MESSAGE: &str = "Date must be in YYYYMMDD format";
const STATION_ID_MESSAGE: &str = "Station ID must be alphanumeric and non-empty";
const PAGE_MESSAGE: &str = "Page number must be greater than 0";
const PER_PAGE_MESSAGE: &str = "Items per page must be between 1 and 100";

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{8}$").expect("static regex"))
}

/// Check an exact match date filter.
pub fn validate_date(value: &str) -> Result<&str, QueryError> {
    if date_pattern().is_match(value) {
        Ok(value)
    } else {
        Err(QueryError::Validation(DATE_MESSAGE.to_owned()))
    }
}

/// Check an exact match station filter.
pub fn validate_station_id(value: &str) -> Result<StationId, QueryError> {
    StationId::new(value).map_err(|_| QueryError::Validation(STATION_ID_MESSAGE.to_owned()))
}

// Empty query parameters are treated as if they were never given.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|val| !val.is_empty())
}

/// Optional exact match filters for a record query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordFilter {
    date: Option<String>,
    station_id: Option<StationId>,
}

impl RecordFilter {
    /// Validate the raw filter values.
    pub fn new(date: Option<&str>, station_id: Option<&str>) -> Result<Self, QueryError> {
        let date = non_empty(date)
            .map(validate_date)
            .transpose()?
            .map(str::to_owned);
        let station_id = non_empty(station_id)
            .map(validate_station_id)
            .transpose()?;

        Ok(RecordFilter { date, station_id })
    }

    /// A filter that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a single station.
    pub fn for_station(station_id: StationId) -> Self {
        RecordFilter {
            date: None,
            station_id: Some(station_id),
        }
    }

    /// The `YYYYMMDD` date filter, if any.
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// The station filter, if any.
    pub fn station_id(&self) -> Option<&StationId> {
        self.station_id.as_ref()
    }
}

/// Validate an optional station filter for a statistics query.
pub fn stats_filter(station_id: Option<&str>) -> Result<Option<StationId>, QueryError> {
    non_empty(station_id).map(validate_station_id).transpose()
}

/// A page of results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    per_page: u32,
}

impl Pagination {
    /// Default page number.
    pub const DEFAULT_PAGE: i64 = 1;
    /// Default number of items per page.
    pub const DEFAULT_PER_PAGE: i64 = 10;
    /// Largest allowed page size.
    pub const MAX_PER_PAGE: i64 = 100;

    /// Validate a page number and page size.
    pub fn new(page: i64, per_page: i64) -> Result<Self, QueryError> {
        let page = u64::try_from(page)
            .ok()
            .filter(|&page| page >= 1)
            .ok_or_else(|| QueryError::Validation(PAGE_MESSAGE.to_owned()))?;
        let per_page = u32::try_from(per_page)
            .ok()
            .filter(|&per_page| (1..=Self::MAX_PER_PAGE as u32).contains(&per_page))
            .ok_or_else(|| QueryError::Validation(PER_PAGE_MESSAGE.to_owned()))?;

        Ok(Pagination { page, per_page })
    }

    /// The one based page number.
    pub fn page(self) -> u64 {
        self.page
    }

    /// Number of rows per page, the SQL `LIMIT`.
    pub fn per_page(self) -> u32 {
        self.per_page
    }

    /// Number of rows to skip, the SQL `OFFSET`.
    ///
    /// Saturates at `i64::MAX`, a page that far out is simply empty.
    pub fn offset(self) -> i64 {
        let offset = (self.page - 1).saturating_mul(u64::from(self.per_page));
        i64::try_from(offset).unwrap_or(i64::MAX)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: Self::DEFAULT_PAGE as u64,
            per_page: Self::DEFAULT_PER_PAGE as u32,
        }
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
