//! Weather Archive Manager

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use weather_archive::{Archive, CommonCmdLineArgs, Pagination, QueryService, WeatherDataErr};

/// Manage an archive of daily weather observations.
#[derive(Debug, Parser)]
#[command(name = "wxarc", version)]
struct Cli {
    #[command(flatten)]
    common: CommonCmdLineArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new archive.
    Create {
        /// Overwrite any existing archive database at `root`.
        #[arg(long)]
        force: bool,
    },
    /// Load every station file in a directory, clean it, and update the statistics.
    Ingest {
        /// Directory holding one `<STATION>.txt` or `<STATION>.txt.gz` file per station.
        dir: PathBuf,
        /// Do not recompute the station statistics afterwards.
        #[arg(long)]
        skip_stats: bool,
        /// Do not show a progress bar.
        #[arg(short, long)]
        quiet: bool,
    },
    /// Recompute the statistics for every station.
    Aggregate,
    /// Print a page of daily records as JSON.
    Records {
        /// Only records for this date, YYYYMMDD.
        #[arg(short, long)]
        date: Option<String>,
        /// Only records for this station.
        #[arg(short, long)]
        station: Option<String>,
        /// Page number, starting at 1.
        #[arg(short, long, default_value_t = Pagination::DEFAULT_PAGE, allow_negative_numbers = true)]
        page: i64,
        /// Number of records per page.
        #[arg(long, default_value_t = Pagination::DEFAULT_PER_PAGE, allow_negative_numbers = true)]
        per_page: i64,
    },
    /// Print the station statistics as JSON.
    Stats {
        /// Only statistics for this station.
        #[arg(short, long)]
        station: Option<String>,
    },
    /// Print the number of records and stations in the archive.
    Summary,
}

fn main() {
    if let Err(ref e) = run() {
        println!("error: {}", e);

        for cause in e.chain().skip(1) {
            println!("caused by: {}", cause);
        }

        ::std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli { common, command } = Cli::parse();
    common.init_logging()?;

    let root = common
        .root()
        .context("no archive root given and no home directory to default to")?;

    match command {
        Command::Create { force } => create(&root, force),
        Command::Ingest {
            dir,
            skip_stats,
            quiet,
        } => ingest(&root, &dir, skip_stats, quiet),
        Command::Aggregate => aggregate(&root),
        Command::Records {
            date,
            station,
            page,
            per_page,
        } => {
            let arch = connect(&root)?;
            let records = QueryService::new(&arch).query_records(
                date.as_deref(),
                station.as_deref(),
                page,
                per_page,
            )?;
            print_json(&records)
        }
        Command::Stats { station } => {
            let arch = connect(&root)?;
            let stats = QueryService::new(&arch).query_stats(station.as_deref())?;
            print_json(&stats)
        }
        Command::Summary => summary(&root),
    }
}

fn connect(root: &Path) -> Result<Archive> {
    Archive::connect(&root)
        .with_context(|| format!("unable to open the archive at {}", root.display()))
}

fn create(root: &Path, force: bool) -> Result<()> {
    // Check if the archive already exists. (try connecting to it)
    let already_exists = Archive::connect(&root).is_ok();

    if already_exists && force {
        remove_database(root)?;
    } else if already_exists {
        return Err(WeatherDataErr::ArchiveExists(root.to_path_buf()))
            .context("must use --force to overwrite");
    }

    Archive::create(&root)?;
    info!(root = %root.display(), "archive created");

    Ok(())
}

// Only the database and its WAL side files are removed, never the rest of the root directory.
fn remove_database(root: &Path) -> Result<()> {
    let db_file = Archive::db_file(&root);

    for suffix in &["", "-wal", "-shm"] {
        let mut name = db_file.clone().into_os_string();
        name.push(suffix);
        let path = PathBuf::from(name);

        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("unable to remove {}", path.display()))?;
        }
    }

    Ok(())
}

fn ingest(root: &Path, dir: &Path, skip_stats: bool, quiet: bool) -> Result<()> {
    let arch = Archive::create(&root)
        .with_context(|| format!("unable to open the archive at {}", root.display()))?;

    let pb = if quiet {
        None
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
                .progress_chars("#>-"),
        );
        Some(pb)
    };

    let summary = arch.ingest_directory(dir, pb.as_ref())?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    println!(
        "{} files, {} lines: {} inserted, {} duplicates, {} missing values cleaned in {:.3}s",
        summary.files,
        summary.lines,
        summary.inserted,
        summary.duplicates,
        summary.cleaned,
        summary.elapsed.as_secs_f64()
    );

    if !skip_stats {
        let stations = arch.calculate_stats()?;
        println!("statistics updated for {} stations", stations);
    }

    Ok(())
}

fn aggregate(root: &Path) -> Result<()> {
    let arch = connect(root)?;
    let stations = arch.calculate_stats()?;
    println!("statistics updated for {} stations", stations);

    Ok(())
}

fn summary(root: &Path) -> Result<()> {
    let arch = connect(root)?;

    println!("archive:  {}", arch.root().display());
    println!("records:  {}", arch.record_count()?);
    println!("stations: {}", arch.station_count()?);

    Ok(())
}

fn print_json<T: Serialize>(vals: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(vals)?);
    Ok(())
}
