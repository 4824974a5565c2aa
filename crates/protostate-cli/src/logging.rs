use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// Console level for the `-v` count; `--quiet` keeps errors only.
fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbosity) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    }
}

fn open_log_file(path: &Path) -> Result<Mutex<File>> {
    File::create(path).map(Mutex::new).map_err(CliError::Io)
}

/// Installs the global subscriber: a compact stderr layer plus, when `log_file` is given, a
/// plain-text layer that also records span context and thread ids. Fails if a global
/// subscriber is already installed.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let file = log_file
        .map(|path| {
            open_log_file(path).map(|writer| {
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_thread_ids(true)
            })
        })
        .transpose()?;

    tracing_subscriber::registry()
        .with(level_for(verbosity, quiet))
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::Error::new(e)))
}
