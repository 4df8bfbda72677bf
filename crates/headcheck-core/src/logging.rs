//! Tracing setup for headcheck runs.
//!
//! Events go to `headcheck.log` in the XDG state dir. The CLI switches to
//! stderr when that file cannot be opened.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,headcheck_core=debug,headcheck=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Per-event sink. A handle that fails to duplicate sends that event to stderr.
enum LogSink {
    Log(File),
    Stderr,
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::Log(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::Log(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

/// Shares one append handle across all subscriber threads.
struct LogFile(File);

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> LogSink {
        match self.0.try_clone() {
            Ok(f) => LogSink::Log(f),
            Err(_) => LogSink::Stderr,
        }
    }
}

/// `$XDG_STATE_HOME/headcheck/headcheck.log`.
pub fn log_path() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("headcheck")?;
    Ok(dirs
        .get_state_home()
        .join("headcheck")
        .join("headcheck.log"))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

fn install(writer: BoxMakeWriter) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();
}

/// Send run logs to [`log_path`]. Errors leave no subscriber installed.
pub fn init_logging() -> Result<()> {
    let path = log_path()?;
    let file = open_log_file(&path)?;
    install(BoxMakeWriter::new(LogFile(file)));
    tracing::info!(path = %path.display(), "headcheck log opened");
    Ok(())
}

/// Send run logs to stderr.
pub fn init_logging_stderr() {
    install(BoxMakeWriter::new(io::stderr));
}
