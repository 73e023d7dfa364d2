//! Records and statistics stored in the archive.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::station_id::StationId;

/// Value used in the raw observation files when a measurement is missing.
pub const SENTINEL: i32 = -9999;

/// Value a sentinel is replaced with during cleaning.
pub const CLEANED_VALUE: i32 = 0;

/// Format of a date in the observation files, the database, and the query interface.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// The measured quantities of a daily observation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumString, IntoStaticStr, EnumIter, Hash)]
pub enum Measurement {
    /// Daily maximum temperature.
    #[strum(serialize = "max_temperature")]
    MaxTemperature,
    /// Daily minimum temperature.
    #[strum(serialize = "min_temperature")]
    MinTemperature,
    /// Daily accumulated precipitation.
    #[strum(serialize = "precipitation")]
    Precipitation,
}

impl Measurement {
    /// The name of the database column holding this measurement.
    pub fn column(self) -> &'static str {
        self.into()
    }
}

/// One observation for one station on one date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeatherRecord {
    /// The station that made the observation.
    pub station_id: StationId,
    /// The day of the observation.
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    /// Maximum temperature.
    pub max_temperature: Option<i32>,
    /// Minimum temperature.
    pub min_temperature: Option<i32>,
    /// Precipitation.
    pub precipitation: Option<i32>,
}

impl WeatherRecord {
    /// Parse one tab separated line of a station file.
    ///
    /// The fields are `date`, `max_temperature`, `min_temperature`, and `precipitation`, in that
    /// order. On failure the reason is returned so the caller can attach a file and line number.
    pub fn parse_line(station_id: &StationId, line: &str) -> Result<WeatherRecord, String> {
        let fields: Vec<&str> = line.trim().split('\t').map(str::trim).collect();

        if fields.len() != 4 {
            return Err(format!("expected 4 tab separated fields, found {}", fields.len()));
        }

        let date = parse_date(fields[0])?;
        let max_temperature = parse_measurement(Measurement::MaxTemperature, fields[1])?;
        let min_temperature = parse_measurement(Measurement::MinTemperature, fields[2])?;
        let precipitation = parse_measurement(Measurement::Precipitation, fields[3])?;

        Ok(WeatherRecord {
            station_id: station_id.clone(),
            date,
            max_temperature: Some(max_temperature),
            min_temperature: Some(min_temperature),
            precipitation: Some(precipitation),
        })
    }

    /// The date as it is stored in the database.
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Aggregate statistics for one station.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeatherStats {
    /// The station these statistics describe.
    pub station_id: StationId,
    /// Mean of the daily maximum temperatures.
    pub avg_max_temperature: Option<f64>,
    /// Mean of the daily minimum temperatures.
    pub avg_min_temperature: Option<f64>,
    /// Sum of the daily precipitation.
    pub total_precipitation: Option<f64>,
}

/// Parse a `YYYYMMDD` date string.
pub fn parse_date(text: &str) -> Result<NaiveDate, String> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("date '{}' is not in YYYYMMDD format", text));
    }

    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|err| format!("date '{}' is not a calendar date: {}", text, err))
}

fn parse_measurement(measurement: Measurement, text: &str) -> Result<i32, String> {
    text.parse::<i32>()
        .map_err(|_| format!("{} '{}' is not an integer", measurement.column(), text))
}

fn serialize_date<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(DATE_FORMAT))
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
