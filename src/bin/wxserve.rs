//! Weather Archive HTTP Server
//!
//! Serves daily records and station statistics from an existing archive.

use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use weather_archive::{router, AppState, Archive, CommonCmdLineArgs};

/// Serve an archive of daily weather observations over HTTP.
#[derive(Debug, Parser)]
#[command(name = "wxserve", version)]
struct Args {
    #[command(flatten)]
    common: CommonCmdLineArgs,

    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "WX_LISTEN_ADDR")]
    listen: String,

    /// Seconds before a request is abandoned.
    #[arg(long, default_value_t = 10, env = "WX_TIMEOUT_SECS")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        common,
        listen,
        timeout_secs,
    } = Args::parse();
    common.init_logging()?;

    let root = common
        .root()
        .context("no archive root given and no home directory to default to")?;

    // Fail at startup rather than on the first request.
    Archive::connect(&root)
        .with_context(|| format!("unable to open the archive at {}", root.display()))?;

    let app = router(AppState::new(root.clone()), Duration::from_secs(timeout_secs));

    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("invalid listen address: {}", listen))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("unable to bind to {}", addr))?;

    info!(root = %root.display(), "serving weather archive on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("unable to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
