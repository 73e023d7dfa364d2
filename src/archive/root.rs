use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::debug;

use super::Archive;

use crate::errors::WeatherDataErr;

/// The default location of the archive, `${HOME}/weather`.
pub fn default_root() -> Option<PathBuf> {
    dirs::home_dir().map(|hd| hd.join("weather"))
}

impl Archive {
    const DB_FILE: &'static str = "weather.db";
    const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
    const TABLES: [&'static str; 2] = ["weather_records", "weather_stats"];

    /// Initialize an archive, creating the root directory and tables if they do not exist yet.
    ///
    /// This is safe to call on an existing archive, nothing already stored is touched.
    pub fn create(root: &dyn AsRef<Path>) -> Result<Self, WeatherDataErr> {
        let db_file = root.as_ref().join(Archive::DB_FILE);
        let root = root.as_ref().to_path_buf();

        std::fs::create_dir_all(&root)?;

        // Create and set up the archive
        let db_conn = rusqlite::Connection::open_with_flags(
            &db_file,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        db_conn.busy_timeout(Archive::BUSY_TIMEOUT)?;

        let mode: String =
            db_conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(db = %db_file.display(), journal_mode = %mode, "opened archive for writing");

        db_conn.execute_batch(include_str!("root/create_index.sql"))?;

        Ok(Archive { root, db_conn })
    }

    /// Open an existing archive.
    pub fn connect(root: &dyn AsRef<Path>) -> Result<Self, WeatherDataErr> {
        let db_file = root.as_ref().join(Archive::DB_FILE);
        let root = root.as_ref().to_path_buf();

        // Create and set up the archive
        let db_conn = rusqlite::Connection::open_with_flags(
            db_file,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE,
        )?;
        db_conn.busy_timeout(Archive::BUSY_TIMEOUT)?;

        Self::validate_db_structure(&db_conn)?;

        Ok(Archive { root, db_conn })
    }

    /// Retrieve a path to the root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path of the database file inside an archive root.
    pub fn db_file(root: &dyn AsRef<Path>) -> PathBuf {
        root.as_ref().join(Archive::DB_FILE)
    }

    /// Validate the database structure is correct.
    fn validate_db_structure(db_conn: &rusqlite::Connection) -> Result<(), WeatherDataErr> {
        let mut stmt = db_conn.prepare(
            "SELECT COUNT(name) FROM sqlite_master WHERE type='table' AND name = ?1",
        )?;

        for table in Archive::TABLES.iter() {
            let num_tables: i64 = stmt.query_row([table], |row| row.get(0))?;

            if num_tables != 1 {
                return Err(WeatherDataErr::InvalidSchema);
            }
        }

        Ok(())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_connect_rejects_foreign_database() {
        let tmp = TempDir::new().unwrap();

        let conn = rusqlite::Connection::open(Archive::db_file(&tmp.path())).unwrap();
        conn.execute_batch("CREATE TABLE files (file_name TEXT);")
            .unwrap();
        drop(conn);

        match Archive::connect(&tmp.path()) {
            Err(WeatherDataErr::InvalidSchema) => {}
            other => panic!("Expected InvalidSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_connect_missing_database() {
        let tmp = TempDir::new().unwrap();

        match Archive::connect(&tmp.path()) {
            Err(WeatherDataErr::Database(_)) => {}
            other => panic!("Expected a database error, got {:?}", other),
        }
    }
}
