//! Command line options that are used across applications.

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::Mutex,
};

use clap::Args;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{archive::default_root, errors::WeatherDataErr};

/// Struct to package up command line arguments.
#[derive(Clone, Debug, Args)]
pub struct CommonCmdLineArgs {
    /// Path to the archive. Defaults to '${HOME}/weather/'.
    #[arg(short, long, env = "WX_ARCHIVE_ROOT", global = true)]
    root: Option<PathBuf>,

    /// Log level, or a full tracing filter directive.
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Append log output to this file instead of writing it to stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

impl CommonCmdLineArgs {
    /// Get the root of the archive, if one was given or a home directory is available.
    pub fn root(&self) -> Option<PathBuf> {
        self.root.clone().or_else(default_root)
    }

    /// Get the log filter.
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Get the log file, if any.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Install the global tracing subscriber.
    pub fn init_logging(&self) -> Result<(), WeatherDataErr> {
        init_logging(self.log_level(), self.log_file())
    }
}

/// Install the global tracing subscriber with the given filter, optionally appending to a file.
pub fn init_logging(log_level: &str, log_file: Option<&Path>) -> Result<(), WeatherDataErr> {
    let filter = EnvFilter::try_new(log_level)?;

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestApp {
        #[command(flatten)]
        common: CommonCmdLineArgs,
    }

    #[test]
    fn test_explicit_root() {
        let app = TestApp::parse_from(["test", "--root", "/tmp/wx", "--log-level", "debug"]);

        assert_eq!(app.common.root(), Some(PathBuf::from("/tmp/wx")));
        assert_eq!(app.common.log_level(), "debug");
        assert!(app.common.log_file().is_none());
    }

    #[test]
    fn test_bad_log_filter_is_an_error() {
        match init_logging("weather_archive=loud", None) {
            Err(WeatherDataErr::LogFilter(_)) => {}
            other => panic!("Expected a log filter error, got {:?}", other),
        }
    }

    #[test]
    fn test_log_file() {
        let app = TestApp::parse_from(["test", "-r", "/tmp/wx", "--log-file", "logs.log"]);

        assert_eq!(app.common.log_file(), Some(Path::new("logs.log")));
    }
}
