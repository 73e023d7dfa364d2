use std::{fmt::Display, str::FromStr, sync::OnceLock};

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::errors::WeatherDataErr;

/// New type wrapper for a station identifier.
///
/// A station id is a non-empty run of ASCII letters and digits. It doubles as the stem of the file
/// the station's observations are ingested from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId {
    id: String,
}

fn station_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("static regex"))
}

impl StationId {
    /// Test to see if a string would make a valid station id.
    pub fn is_valid(id: &str) -> bool {
        station_id_pattern().is_match(id)
    }

    /// Create a new one, checking the format.
    pub fn new(id: &str) -> Result<Self, WeatherDataErr> {
        if Self::is_valid(id) {
            Ok(StationId { id: id.to_owned() })
        } else {
            Err(WeatherDataErr::InvalidStationId(id.to_owned()))
        }
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl FromStr for StationId {
    type Err = WeatherDataErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StationId::new(s)
    }
}

impl AsRef<str> for StationId {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

impl Display for StationId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(formatter, "{}", self.id)
    }
}

impl Serialize for StationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl rusqlite::ToSql for StationId {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        self.id.to_sql()
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
