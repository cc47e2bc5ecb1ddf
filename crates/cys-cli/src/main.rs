//! cys - command-line access to the cys creative-portfolio store.
//!
//! Browses and edits the locally cached portfolios, events and users,
//! seeding them from a configured site or the built-in sample data.

mod app;
mod commands;
mod render;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cys_core::{Config, StoreError};

/// Log file written inside the data directory
const LOG_FILE: &str = "cys.log";

/// Initialize the tracing subscriber for logging.
///
/// Warnings go to stderr; the same events are appended to the log file in
/// `log_dir` when it is available. The returned guard flushes the file
/// writer and must be held until exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok()) {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (
            Config::default().with_env_overrides(|name| std::env::var(name).ok()),
            Some(e),
        ),
    };

    let log_dir = config.data_dir().ok();
    let _guard = init_tracing(log_dir.as_deref());
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if e.downcast_ref::<StoreError>().map_or(false, StoreError::is_auth_error) {
                eprintln!("Sign in with `cys login <email>` and try again.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = commands::parse(&args)?;
    debug!(?command, "Running command");

    let mut app = App::new(config)?;
    let mut stdout = io::stdout().lock();
    app.execute(command, &mut stdout).await
}
