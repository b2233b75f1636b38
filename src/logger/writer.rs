//! Access log writer module
//!
//! Thread-safe access log output to a file or stdout. Diagnostics go through
//! `tracing`; only access log lines are written here.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Global access log writer instance
static ACCESS_WRITER: OnceLock<AccessLogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    File(File),
}

/// Thread-safe access log writer
pub struct AccessLogWriter {
    target: Mutex<LogTarget>,
}

impl AccessLogWriter {
    fn new(access_log_file: Option<&str>) -> io::Result<Self> {
        let target = match access_log_file {
            Some(path) => LogTarget::File(open_log_file(path)?),
            None => LogTarget::Stdout,
        };
        Ok(Self {
            target: Mutex::new(target),
        })
    }

    /// Write one access log line
    pub fn write_line(&self, message: &str) {
        let Ok(mut target) = self.target.lock() else {
            return;
        };
        match &mut *target {
            LogTarget::Stdout => println!("{message}"),
            LogTarget::File(file) => {
                if let Err(e) = writeln!(file, "{message}") {
                    tracing::warn!(error = %e, "failed to write access log line");
                }
            }
        }
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global access log writer
///
/// Returns an error if the log file cannot be opened or the writer was already set.
pub fn init(access_log_file: Option<&str>) -> io::Result<()> {
    let writer = AccessLogWriter::new(access_log_file)?;
    ACCESS_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Access log writer already initialized",
        )
    })
}

/// Write an access log line, falling back to stdout before `init`
pub fn write_access(message: &str) {
    match ACCESS_WRITER.get() {
        Some(writer) => writer.write_line(message),
        None => println!("{message}"),
    }
}
