//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Start-up banner and shutdown lines
//! - One request line per response, pretty or JSON
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{LogFormat, RequestLogEntry};

use crate::config::LoggingConfig;
use owo_colors::OwoColorize;
use std::io::Write;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    writer::init(
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
        config.silent,
    )
}

/// Write to access log
fn write_access(message: &str) {
    if let Some(writer) = writer::get() {
        writer.write_access(message);
    } else {
        println!("{message}");
    }
}

/// Write to error log
fn write_error(message: &str) {
    if let Some(writer) = writer::get() {
        writer.write_error(message);
    } else {
        eprintln!("{message}");
    }
}

fn access_colored() -> bool {
    writer::get().is_some_and(writer::LogWriter::access_is_terminal)
}

fn error_colored() -> bool {
    writer::get().is_some_and(writer::LogWriter::error_is_terminal)
}

/// Clear the terminal before the banner
pub fn clear_console() {
    if access_colored() {
        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "\x1B[2J\x1B[H");
        let _ = stdout.flush();
    }
}

/// Start-up banner
pub struct Banner<'a> {
    pub local: &'a str,
    /// `None` when bound to a loopback name
    pub network: Option<&'a str>,
    pub protected: bool,
}

pub fn log_server_start(banner: &Banner<'_>) {
    let colored = access_colored();
    let paint = |label: &str| {
        if colored {
            label.cyan().to_string()
        } else {
            label.to_string()
        }
    };

    let ready = if colored {
        "Your app is ready!".green().bold().to_string()
    } else {
        "Your app is ready!".to_string()
    };

    let network = banner
        .network
        .map_or_else(|| "add --host to expose".to_string(), ToString::to_string);

    write_access("");
    write_access(&format!("    {ready}"));
    write_access("");
    write_access(&format!("    - {}    {}", paint("Local:"), banner.local));
    write_access(&format!("    - {}  {}", paint("Network:"), network));
    if banner.protected {
        write_access("    - Protected by a password.");
    }
    write_access(&format!("    {}", "-".repeat(36)));
}

pub fn log_shutdown() {
    write_access("Shutting down...");
}

pub fn log_request(entry: &RequestLogEntry, format: LogFormat) {
    write_access(&entry.format(format, access_colored()));
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    log_error(&format!("Failed to serve connection: {err}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Warning tagged with a stable code such as `PORT_OCCUPIED`
pub fn log_warning_code(code: &str, message: &str) {
    if error_colored() {
        write_error(&format!("[WARN] {} {message}", code.yellow()));
    } else {
        write_error(&format!("[WARN] {code} {message}"));
    }
}
