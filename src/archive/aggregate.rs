//! Per station summary statistics.

use tracing::info;

use super::Archive;

use crate::{errors::WeatherDataErr, record::WeatherStats};

impl Archive {
    /// Compute summary statistics for every station from the records currently stored.
    ///
    /// Temperatures are averaged and precipitation summed as floating point values. This only
    /// reads, use [`Archive::calculate_stats`] to store the results.
    pub fn station_aggregates(&self) -> Result<Vec<WeatherStats>, WeatherDataErr> {
        let mut stmt = self
            .db_conn
            .prepare(include_str!("aggregate/station_aggregates.sql"))?;

        let vals: Result<Vec<WeatherStats>, WeatherDataErr> = stmt
            .query_and_then([], Self::parse_row_to_stats)?
            .map(|res| res.map_err(WeatherDataErr::Database))
            .collect();

        vals
    }

    /// Recompute the statistics for every station and replace what is stored.
    ///
    /// Returns the number of stations written.
    pub fn calculate_stats(&self) -> Result<usize, WeatherDataErr> {
        let tx = self.db_conn.unchecked_transaction()?;

        let stats = self.station_aggregates()?;
        self.upsert_stats(&stats)?;

        tx.commit()?;

        info!(stations = stats.len(), "station statistics updated");
        Ok(stats.len())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
