//! Loading a directory of station files into the archive.

use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use super::Archive;

use crate::{errors::WeatherDataErr, record::WeatherRecord, station_id::StationId};

/// Totals for a single ingestion run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    /// Number of station files read.
    pub files: usize,
    /// Number of data lines parsed.
    pub lines: usize,
    /// Number of new records stored.
    pub inserted: usize,
    /// Number of records skipped because the station and date were already stored.
    pub duplicates: usize,
    /// Number of sentinel values replaced during cleaning.
    pub cleaned: usize,
    /// Wall clock time for the run.
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataFileKind {
    Plain,
    Gzip,
}

impl DataFileKind {
    const PLAIN_EXTENSION: &'static str = ".txt";
    const GZIP_EXTENSION: &'static str = ".txt.gz";

    /// Split a file name into the station part and the kind of file, if it is a data file.
    fn classify(file_name: &str) -> Option<(&str, DataFileKind)> {
        if let Some(stem) = file_name.strip_suffix(Self::GZIP_EXTENSION) {
            Some((stem, DataFileKind::Gzip))
        } else {
            file_name
                .strip_suffix(Self::PLAIN_EXTENSION)
                .map(|stem| (stem, DataFileKind::Plain))
        }
    }

    fn open(self, path: &Path) -> Result<Box<dyn BufRead>, WeatherDataErr> {
        let file = File::open(path)?;

        let reader: Box<dyn Read> = match self {
            DataFileKind::Plain => Box::new(file),
            DataFileKind::Gzip => Box::new(flate2::read::GzDecoder::new(file)),
        };

        Ok(Box::new(BufReader::new(reader)))
    }
}

impl Archive {
    /// Ingest every station file in `dir`, then clean sentinel values.
    ///
    /// Each `*.txt` (or `*.txt.gz`) file holds the full history of one station, the station id is
    /// the file name without the extension. The whole run is a single transaction, any malformed
    /// line aborts it and nothing from the run is kept.
    pub fn ingest_directory(
        &self,
        dir: &Path,
        progress: Option<&ProgressBar>,
    ) -> Result<IngestSummary, WeatherDataErr> {
        if !dir.is_dir() {
            return Err(WeatherDataErr::NotADirectory(dir.to_path_buf()));
        }

        let start = chrono::Local::now();
        let timer = Instant::now();
        info!(dir = %dir.display(), "data ingestion started at: {}", start);

        let files = Self::station_files(dir)?;
        if let Some(pb) = progress {
            pb.set_length(files.len() as u64);
        }

        let tx = self.db_conn.unchecked_transaction()?;

        let mut summary = IngestSummary::default();
        for (path, station_id, kind) in &files {
            if let Err(err) = self.ingest_file(path, station_id, *kind, &mut summary) {
                warn!(file = %path.display(), "ingestion aborted, rolling back: {}", err);
                return Err(err);
            }

            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        summary.cleaned = self.clean_sentinels()?;
        tx.commit()?;

        summary.elapsed = timer.elapsed();
        let end = chrono::Local::now();
        info!(
            files = summary.files,
            lines = summary.lines,
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            cleaned = summary.cleaned,
            "data ingestion completed at: {}, total time taken {:.3} seconds",
            end,
            summary.elapsed.as_secs_f64()
        );

        Ok(summary)
    }

    fn ingest_file(
        &self,
        path: &Path,
        station_id: &StationId,
        kind: DataFileKind,
        summary: &mut IngestSummary,
    ) -> Result<(), WeatherDataErr> {
        debug!(file = %path.display(), station = %station_id, "ingesting station file");

        let reader = kind.open(path)?;
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            let record = WeatherRecord::parse_line(station_id, &line).map_err(|reason| {
                WeatherDataErr::Parse {
                    file: path.to_path_buf(),
                    line: line_num + 1,
                    reason,
                }
            })?;

            summary.lines += 1;
            if self.insert_record_if_absent(&record)? {
                summary.inserted += 1;
            } else {
                summary.duplicates += 1;
            }
        }

        summary.files += 1;
        Ok(())
    }

    /// List the data files in a directory, sorted by file name.
    fn station_files(dir: &Path) -> Result<Vec<(PathBuf, StationId, DataFileKind)>, WeatherDataErr> {
        let mut files = vec![];

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            let file_name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name.to_owned(),
                None => {
                    debug!(path = %path.display(), "skipping file with non utf-8 name");
                    continue;
                }
            };

            match DataFileKind::classify(&file_name) {
                Some((stem, kind)) => {
                    let station_id = StationId::new(stem)?;
                    files.push((path, station_id, kind));
                }
                None => debug!(path = %path.display(), "skipping non-data file"),
            }
        }

        files.sort_unstable_by(|left, right| left.0.cmp(&right.0));

        Ok(files)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use crate::archive::unit::*; // test helpers.
    use crate::filter::{Pagination, RecordFilter};

    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_classify_file_names() {
        assert_eq!(
            DataFileKind::classify("STN1.txt"),
            Some(("STN1", DataFileKind::Plain))
        );
        assert_eq!(
            DataFileKind::classify("STN1.txt.gz"),
            Some(("STN1", DataFileKind::Gzip))
        );
        assert_eq!(DataFileKind::classify("README.md"), None);
        assert_eq!(DataFileKind::classify("STN1.csv"), None);
    }

    #[test]
    fn test_ingest_end_to_end() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");
        let data_dir = TempDir::new().unwrap();

        write_station_file(data_dir.path(), "STN1.txt", &["20230101\t25\t10\t5"]);

        let summary = arch.ingest_directory(data_dir.path(), None).unwrap();
        assert_eq!(summary.files, 1);
        assert_eq!(summary.lines, 1);
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.duplicates, 0);

        let stored = arch
            .records(&RecordFilter::all(), Pagination::default())
            .unwrap();
        assert_eq!(stored, vec![record("STN1", (2023, 1, 1), 25, 10, 5)]);
    }

    #[test]
    fn test_ingest_twice_is_idempotent() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");
        let data_dir = TempDir::new().unwrap();

        write_station_file(
            data_dir.path(),
            "USC00110072.txt",
            &[
                "19850101\t  -22\t -128\t   94",
                "19850102\t -122\t -217\t-9999",
                "19850103\t-9999\t -244\t    0",
            ],
        );

        let first = arch.ingest_directory(data_dir.path(), None).unwrap();
        assert_eq!(first.inserted, 3);
        assert_eq!(first.cleaned, 2);

        let second = arch.ingest_directory(data_dir.path(), None).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 3);
        assert_eq!(second.cleaned, 0);

        assert_eq!(arch.record_count().unwrap(), 3);
        let stored = arch
            .records(&RecordFilter::all(), Pagination::default())
            .unwrap();
        assert_eq!(
            stored,
            vec![
                record("USC00110072", (1985, 1, 1), -22, -128, 94),
                record("USC00110072", (1985, 1, 2), -122, -217, 0),
                record("USC00110072", (1985, 1, 3), 0, -244, 0),
            ]
        );
    }

    #[test]
    fn test_ingest_skips_other_files_and_blank_lines() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");
        let data_dir = TempDir::new().unwrap();

        write_station_file(data_dir.path(), "STN1.txt", &["20230101\t25\t10\t5", "", "  "]);
        write_station_file(data_dir.path(), "notes.md", &["not\tweather\tdata"]);
        std::fs::create_dir(data_dir.path().join("nested.txt")).unwrap();

        let summary = arch.ingest_directory(data_dir.path(), None).unwrap();
        assert_eq!(summary.files, 1);
        assert_eq!(summary.lines, 1);
    }

    #[test]
    fn test_ingest_gzip_file() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");
        let data_dir = TempDir::new().unwrap();

        let file = File::create(data_dir.path().join("STN2.txt.gz")).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder
            .write_all(b"20230101\t25\t10\t5\n20230102\t27\t12\t-9999\n")
            .unwrap();
        encoder.finish().unwrap();

        let summary = arch.ingest_directory(data_dir.path(), None).unwrap();
        assert_eq!(summary.inserted, 2);

        let stored = arch
            .records(&RecordFilter::all(), Pagination::default())
            .unwrap();
        assert_eq!(
            stored,
            vec![
                record("STN2", (2023, 1, 1), 25, 10, 5),
                record("STN2", (2023, 1, 2), 27, 12, 0),
            ]
        );
    }

    #[test]
    fn test_malformed_line_rolls_back_the_run() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");
        let data_dir = TempDir::new().unwrap();

        arch.insert_record_if_absent(&record("OLD1", (2000, 1, 1), -9999, 1, 1))
            .unwrap();

        write_station_file(data_dir.path(), "A1.txt", &["20230101\t25\t10\t5"]);
        write_station_file(
            data_dir.path(),
            "B2.txt",
            &["20230101\t25\t10\t5", "20230102\t25\tten\t5"],
        );

        match arch.ingest_directory(data_dir.path(), None) {
            Err(WeatherDataErr::Parse { file, line, .. }) => {
                assert_eq!(file, data_dir.path().join("B2.txt"));
                assert_eq!(line, 2);
            }
            other => panic!("Expected a parse error, got {:?}", other),
        }

        // Nothing from the failed run was kept, and the old row was not cleaned.
        let stored = arch
            .records(&RecordFilter::all(), Pagination::default())
            .unwrap();
        assert_eq!(stored, vec![record("OLD1", (2000, 1, 1), -9999, 1, 1)]);

        let reader = Archive::connect(&arch.root()).unwrap();
        let seen = reader
            .records(&RecordFilter::all(), Pagination::default())
            .unwrap();
        assert_eq!(seen, stored);
    }

    #[test]
    fn test_ingest_into_fresh_root_after_create() {
        let tmp = TempDir::new().unwrap();
        let data_dir = TempDir::new().unwrap();
        let root = tmp.path().join("new").join("archive");

        write_station_file(data_dir.path(), "STN1.txt", &["20230101\t25\t10\t5"]);

        let arch = Archive::create(&root).unwrap();
        arch.ingest_directory(data_dir.path(), None).unwrap();
        drop(arch);

        // Creating again on every start keeps what is already there.
        let arch = Archive::create(&root).unwrap();
        arch.ingest_directory(data_dir.path(), None).unwrap();
        assert_eq!(arch.record_count().unwrap(), 1);
    }

    #[test]
    fn test_other_connections_see_only_committed_runs() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");

        let old = record("OLD1", (2000, 1, 1), -9999, 1, 1);
        arch.insert_record_if_absent(&old).unwrap();

        let reader = Archive::connect(&arch.root()).unwrap();
        let all = || {
            reader
                .records(&RecordFilter::all(), Pagination::default())
                .unwrap()
        };

        // Same steps as an ingestion run, held open.
        let tx = arch.db_conn.unchecked_transaction().unwrap();
        arch.insert_record_if_absent(&record("NEW1", (2023, 1, 1), 25, -9999, 5))
            .unwrap();
        assert_eq!(arch.clean_sentinels().unwrap(), 2);

        assert_eq!(all(), vec![old.clone()]);

        tx.commit().unwrap();

        assert_eq!(
            all(),
            vec![
                record("OLD1", (2000, 1, 1), 0, 1, 1),
                record("NEW1", (2023, 1, 1), 25, 0, 5),
            ]
        );
    }

    #[test]
    fn test_invalid_station_file_name() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");
        let data_dir = TempDir::new().unwrap();

        write_station_file(data_dir.path(), "bad-name.txt", &["20230101\t25\t10\t5"]);

        match arch.ingest_directory(data_dir.path(), None) {
            Err(WeatherDataErr::InvalidStationId(id)) => assert_eq!(id, "bad-name"),
            other => panic!("Expected an invalid station id, got {:?}", other),
        }
        assert_eq!(arch.record_count().unwrap(), 0);
    }

    #[test]
    fn test_ingest_requires_a_directory() {
        let TestArchive { tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");

        let missing = tmp.path().join("no_such_dir");
        match arch.ingest_directory(&missing, None) {
            Err(WeatherDataErr::NotADirectory(path)) => assert_eq!(path, missing),
            other => panic!("Expected NotADirectory, got {:?}", other),
        }
    }

    #[test]
    fn test_progress_bar_counts_files() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");
        let data_dir = TempDir::new().unwrap();

        write_station_file(data_dir.path(), "A1.txt", &["20230101\t25\t10\t5"]);
        write_station_file(data_dir.path(), "B2.txt", &["20230101\t25\t10\t5"]);

        let pb = ProgressBar::hidden();
        arch.ingest_directory(data_dir.path(), Some(&pb)).unwrap();

        assert_eq!(pb.length(), Some(2));
        assert_eq!(pb.position(), 2);
    }
}
