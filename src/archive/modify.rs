use super::Archive;

use crate::{
    errors::WeatherDataErr,
    record::{WeatherRecord, WeatherStats},
};

impl Archive {
    /// Add a record to the archive unless one already exists for the same station and date.
    ///
    /// Returns `true` if the record was written, `false` if it was a duplicate. Duplicates are
    /// never an error and never overwrite what is stored.
    pub fn insert_record_if_absent(&self, record: &WeatherRecord) -> Result<bool, WeatherDataErr> {
        let mut stmt = self
            .db_conn
            .prepare_cached(include_str!("modify/insert_record.sql"))?;

        let num_inserted = stmt.execute(rusqlite::params![
            &record.station_id,
            &record.date_string(),
            &record.max_temperature,
            &record.min_temperature,
            &record.precipitation,
        ])?;

        Ok(num_inserted == 1)
    }

    /// Insert or replace the statistics rows for each station in `stats`.
    pub fn upsert_stats(&self, stats: &[WeatherStats]) -> Result<(), WeatherDataErr> {
        let mut stmt = self
            .db_conn
            .prepare_cached(include_str!("modify/upsert_stats.sql"))?;

        for row in stats {
            stmt.execute(rusqlite::params![
                &row.station_id,
                &row.avg_max_temperature,
                &row.avg_min_temperature,
                &row.total_precipitation,
            ])?;
        }

        Ok(())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use crate::archive::unit::*; // test helpers.
    use crate::{
        filter::{Pagination, RecordFilter},
        record::WeatherStats,
        station_id::StationId,
    };

    use pretty_assertions::assert_eq;

    #[test]
    fn test_adding_duplicates() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");

        let rec = record("Station1", (2023, 1, 1), 25, 10, 5);

        assert!(arch.insert_record_if_absent(&rec).expect("db error"));
        assert!(!arch.insert_record_if_absent(&rec).expect("db error"));

        assert_eq!(arch.record_count().unwrap(), 1);
    }

    #[test]
    fn test_duplicates_do_not_overwrite() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");

        let original = record("Station1", (2023, 1, 1), 25, 10, 5);
        let conflicting = record("Station1", (2023, 1, 1), 99, 99, 99);

        arch.insert_record_if_absent(&original).unwrap();
        arch.insert_record_if_absent(&conflicting).unwrap();

        let stored = arch
            .records(&RecordFilter::all(), Pagination::default())
            .unwrap();
        assert_eq!(stored, vec![original]);
    }

    #[test]
    fn test_same_date_different_stations() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");

        assert!(arch
            .insert_record_if_absent(&record("A1", (2023, 1, 1), 1, 1, 1))
            .unwrap());
        assert!(arch
            .insert_record_if_absent(&record("B2", (2023, 1, 1), 1, 1, 1))
            .unwrap());

        assert_eq!(arch.record_count().unwrap(), 2);
    }

    #[test]
    fn test_upsert_stats_replaces() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");

        let station_id = StationId::new("Station1").unwrap();
        let first = WeatherStats {
            station_id: station_id.clone(),
            avg_max_temperature: Some(25.0),
            avg_min_temperature: Some(10.0),
            total_precipitation: Some(5.0),
        };
        let second = WeatherStats {
            station_id: station_id.clone(),
            avg_max_temperature: Some(30.0),
            avg_min_temperature: None,
            total_precipitation: Some(12.5),
        };

        arch.upsert_stats(&[first]).unwrap();
        arch.upsert_stats(&[second.clone()]).unwrap();

        assert_eq!(arch.stats(Some(&station_id)).unwrap(), vec![second]);
        assert_eq!(arch.station_count().unwrap(), 1);
    }
}
