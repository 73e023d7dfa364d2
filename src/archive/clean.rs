//! Normalization of the "missing value" marker used by the raw observation files.

use strum::IntoEnumIterator;
use tracing::debug;

use super::Archive;

use crate::{
    errors::WeatherDataErr,
    record::{Measurement, CLEANED_VALUE, SENTINEL},
};

impl Archive {
    /// Replace every stored sentinel value with the cleaned value.
    ///
    /// This runs over the whole table, not just recently added rows, and is idempotent. Returns
    /// the number of individual values rewritten.
    pub fn clean_sentinels(&self) -> Result<usize, WeatherDataErr> {
        let mut num_cleaned = 0;

        for measurement in Measurement::iter() {
            let column = measurement.column();
            let num_rows = self.db_conn.execute(
                &format!(
                    "UPDATE weather_records SET {col} = ?1 WHERE {col} = ?2",
                    col = column
                ),
                [CLEANED_VALUE, SENTINEL],
            )?;

            debug!(column, num_rows, "cleaned sentinel values");
            num_cleaned += num_rows;
        }

        Ok(num_cleaned)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
