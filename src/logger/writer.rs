//! Log writer module
//!
//! Provides thread-safe log writing to files or stdout/stderr, or nowhere
//! when running silent.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
#[derive(Debug)]
enum LogTarget {
    Stdout,
    Stderr,
    File(Mutex<File>),
    /// Drop everything
    Discard,
}

impl LogTarget {
    fn open(path: Option<&str>, console: Self) -> io::Result<Self> {
        match path {
            Some(path) => Ok(Self::File(Mutex::new(open_log_file(path)?))),
            None => Ok(console),
        }
    }

    fn write(&self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(file) => {
                let mut f = file.lock().unwrap_or_else(PoisonError::into_inner);
                let _ = writeln!(f, "{message}");
            }
            Self::Discard => {}
        }
    }
}

/// Thread-safe log writer
#[derive(Debug)]
pub struct LogWriter {
    /// Access log target (request lines, banner)
    access: LogTarget,
    /// Error log target (warnings, failures)
    error: LogTarget,
}

impl LogWriter {
    fn new(
        access_log_file: Option<&str>,
        error_log_file: Option<&str>,
        silent: bool,
    ) -> io::Result<Self> {
        if silent {
            return Ok(Self {
                access: LogTarget::Discard,
                error: LogTarget::Discard,
            });
        }

        Ok(Self {
            access: LogTarget::open(access_log_file, LogTarget::Stdout)?,
            error: LogTarget::open(error_log_file, LogTarget::Stderr)?,
        })
    }

    /// Write to access log
    pub fn write_access(&self, message: &str) {
        self.access.write(message);
    }

    /// Write to error log
    pub fn write_error(&self, message: &str) {
        self.error.write(message);
    }

    /// Whether access lines end up on an interactive terminal
    pub fn access_is_terminal(&self) -> bool {
        matches!(self.access, LogTarget::Stdout) && io::stdout().is_terminal()
    }

    /// Whether error lines end up on an interactive terminal
    pub fn error_is_terminal(&self) -> bool {
        matches!(self.error, LogTarget::Stderr) && io::stderr().is_terminal()
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

/// Initialize the global log writer
///
/// This should be called once at application startup.
/// Returns error if log files cannot be opened.
pub fn init(
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
    silent: bool,
) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file, silent)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if initialized
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
