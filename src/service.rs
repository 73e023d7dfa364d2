//! Validated, paginated reads from the archive.

use crate::{
    archive::Archive,
    errors::QueryError,
    filter::{self, Pagination, RecordFilter},
    record::{WeatherRecord, WeatherStats},
    station_id::StationId,
};

/// The public read interface of the archive.
///
/// A `QueryService` holds no state of its own, it borrows an open archive for as long as the
/// caller needs it.
#[derive(Debug, Clone, Copy)]
pub struct QueryService<'a> {
    arch: &'a Archive,
}

impl<'a> QueryService<'a> {
    /// Create a new service for an archive.
    pub fn new(arch: &'a Archive) -> Self {
        QueryService { arch }
    }

    /// Validate raw request values and fetch a page of records.
    ///
    /// Validation happens before the archive is consulted. Empty string filters count as absent.
    pub fn query_records(
        &self,
        date: Option<&str>,
        station_id: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<WeatherRecord>, QueryError> {
        let filter = RecordFilter::new(date, station_id)?;
        let page = Pagination::new(page, per_page)?;

        self.records(&filter, page)
    }

    /// Fetch a page of records with already validated parameters.
    ///
    /// An empty page is reported as [`QueryError::StationNotFound`] when a station filter names a
    /// station the archive has never aggregated, otherwise as [`QueryError::NoRecords`].
    pub fn records(
        &self,
        filter: &RecordFilter,
        page: Pagination,
    ) -> Result<Vec<WeatherRecord>, QueryError> {
        let records = self.arch.records(filter, page)?;

        if records.is_empty() {
            return Err(self.empty_result(filter.station_id(), QueryError::NoRecords));
        }

        Ok(records)
    }

    /// Validate a raw station filter and fetch statistics.
    pub fn query_stats(&self, station_id: Option<&str>) -> Result<Vec<WeatherStats>, QueryError> {
        let station_id = filter::stats_filter(station_id)?;

        self.stats(station_id.as_ref())
    }

    /// Fetch statistics, for one station or all of them.
    pub fn stats(&self, station_id: Option<&StationId>) -> Result<Vec<WeatherStats>, QueryError> {
        let stats = self.arch.stats(station_id)?;

        if stats.is_empty() {
            return Err(self.empty_result(station_id, QueryError::NoStats));
        }

        Ok(stats)
    }

    fn empty_result(&self, station_id: Option<&StationId>, no_data: QueryError) -> QueryError {
        let station_id = match station_id {
            Some(station_id) => station_id,
            None => return no_data,
        };

        match self.arch.station_has_stats(station_id) {
            Ok(true) => no_data,
            Ok(false) => QueryError::StationNotFound(station_id.clone()),
            Err(err) => QueryError::Storage(err),
        }
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
