use chrono::NaiveDate;
use rusqlite::types::{ToSql, Type};

use super::Archive;

use crate::{
    errors::WeatherDataErr,
    filter::{Pagination, RecordFilter},
    record::{WeatherRecord, WeatherStats, DATE_FORMAT},
    station_id::StationId,
};

impl Archive {
    /// Retrieve a page of records matching the filter.
    ///
    /// Records are ordered by date, then station, so consecutive pages never overlap.
    pub fn records(
        &self,
        filter: &RecordFilter,
        page: Pagination,
    ) -> Result<Vec<WeatherRecord>, WeatherDataErr> {
        let mut sql = String::from(
            "
                SELECT
                    station_id,
                    date,
                    max_temperature,
                    min_temperature,
                    precipitation
                FROM weather_records
                WHERE 1=1
            ",
        );
        let mut params: Vec<&dyn ToSql> = vec![];

        let date = filter.date();
        if let Some(ref date) = date {
            sql.push_str(" AND date = ?");
            params.push(date);
        }
        if let Some(station_id) = filter.station_id() {
            sql.push_str(" AND station_id = ?");
            params.push(station_id);
        }

        let limit = page.per_page();
        let offset = page.offset();
        sql.push_str(" ORDER BY date, station_id LIMIT ? OFFSET ?");
        params.push(&limit);
        params.push(&offset);

        let mut stmt = self.db_conn.prepare(&sql)?;

        let vals: Result<Vec<WeatherRecord>, WeatherDataErr> = stmt
            .query_and_then(params.as_slice(), Self::parse_row_to_record)?
            .map(|res| res.map_err(WeatherDataErr::Database))
            .collect();

        vals
    }

    /// Retrieve the statistics rows, optionally for a single station.
    pub fn stats(
        &self,
        station_id: Option<&StationId>,
    ) -> Result<Vec<WeatherStats>, WeatherDataErr> {
        let mut stmt = self.db_conn.prepare(
            "
                SELECT
                    station_id,
                    avg_max_temperature,
                    avg_min_temperature,
                    total_precipitation
                FROM weather_stats
                WHERE ?1 IS NULL OR station_id = ?1
                ORDER BY station_id
            ",
        )?;

        let vals: Result<Vec<WeatherStats>, WeatherDataErr> = stmt
            .query_and_then([&station_id], Self::parse_row_to_stats)?
            .map(|res| res.map_err(WeatherDataErr::Database))
            .collect();

        vals
    }

    /// Check whether a station has a row in the statistics table.
    pub fn station_has_stats(&self, station_id: &StationId) -> Result<bool, WeatherDataErr> {
        let exists: bool = self.db_conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM weather_stats WHERE station_id = ?1)",
            [station_id],
            |row| row.get(0),
        )?;

        Ok(exists)
    }

    /// Total number of records in the archive.
    pub fn record_count(&self) -> Result<u64, WeatherDataErr> {
        let count: i64 =
            self.db_conn
                .query_row("SELECT COUNT(*) FROM weather_records", [], |row| row.get(0))?;

        Ok(count as u64)
    }

    /// Number of stations with statistics.
    pub fn station_count(&self) -> Result<u64, WeatherDataErr> {
        let count: i64 =
            self.db_conn
                .query_row("SELECT COUNT(*) FROM weather_stats", [], |row| row.get(0))?;

        Ok(count as u64)
    }

    fn parse_row_to_record(row: &rusqlite::Row) -> Result<WeatherRecord, rusqlite::Error> {
        let station_id = Self::parse_station_id(row, 0)?;

        let date: String = row.get(1)?;
        let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|err| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(err)))?;

        let max_temperature: Option<i32> = row.get(2)?;
        let min_temperature: Option<i32> = row.get(3)?;
        let precipitation: Option<i32> = row.get(4)?;

        Ok(WeatherRecord {
            station_id,
            date,
            max_temperature,
            min_temperature,
            precipitation,
        })
    }

    pub(super) fn parse_row_to_stats(row: &rusqlite::Row) -> Result<WeatherStats, rusqlite::Error> {
        let station_id = Self::parse_station_id(row, 0)?;

        let avg_max_temperature: Option<f64> = row.get(1)?;
        let avg_min_temperature: Option<f64> = row.get(2)?;
        let total_precipitation: Option<f64> = row.get(3)?;

        Ok(WeatherStats {
            station_id,
            avg_max_temperature,
            avg_min_temperature,
            total_precipitation,
        })
    }

    fn parse_station_id(row: &rusqlite::Row, idx: usize) -> Result<StationId, rusqlite::Error> {
        let station_id: String = row.get(idx)?;

        StationId::new(&station_id)
            .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
