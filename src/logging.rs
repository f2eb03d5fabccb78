use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDateTime;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Console threshold for the number of `-v` flags.
pub fn console_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

pub fn log_file_name(started: NaiveDateTime) -> String {
    format!("reconciliation_{}.log", started.format("%Y%m%d_%H%M%S"))
}

fn open_log_file(dir: &Path) -> std::io::Result<(PathBuf, File)> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(log_file_name(chrono::Local::now().naive_local()));
    let file = File::create(&path)?;
    Ok((path, file))
}

/// Install the global subscriber: stderr at the verbosity level (RUST_LOG
/// overrides), plus a DEBUG log file under `log_dir` when one is given and
/// writable. Returns the log file path.
pub fn init(log_dir: Option<&Path>, verbosity: u8) -> Option<PathBuf> {
    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level(verbosity).into())
        .from_env_lossy();
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let mut open_error = None;
    let file = log_dir.and_then(|dir| match open_log_file(dir) {
        Ok(opened) => Some(opened),
        Err(e) => {
            open_error = Some(format!("{}: {e}", dir.display()));
            None
        }
    });
    let path = file.as_ref().map(|(p, _)| p.clone());
    let file_layer = file.map(|(_, f)| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(f))
            .with_filter(LevelFilter::DEBUG)
    });

    if tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        return None;
    }

    if let Some(e) = open_error {
        tracing::warn!("File logging disabled, cannot write log in {e}");
    }
    if let Some(p) = &path {
        tracing::debug!("Logging to {}", p.display());
    }
    path
}
