//! Command line interface

use crate::logger::LogFormat;
use clap::Parser;
use std::path::PathBuf;

/// Serve a directory over HTTP(S)
#[derive(Debug, Default, Parser)]
#[command(name = "serw", version, about, long_about = None)]
pub struct Cli {
    /// Directory to serve [default: ./public if present, else the current directory]
    pub root: Option<PathBuf>,

    /// Host to listen on [default: localhost]
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on [default: 3000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Index file served for the root directory [default: index.html]
    #[arg(short = 'm', long)]
    pub index: Option<String>,

    /// Serve files whose name starts with a dot
    #[arg(short, long)]
    pub dot_files: bool,

    /// Glob or path patterns to hide
    #[arg(short, long, num_args = 1..)]
    pub ignore_files: Vec<String>,

    /// Disable directory listings
    #[arg(short = 'l', long)]
    pub no_dir_listing: bool,

    /// Page served for missing files
    #[arg(short = 'E', long)]
    pub error_page: Option<PathBuf>,

    /// Serve a robots.txt that disallows everything
    #[arg(short, long)]
    pub robots: bool,

    /// Send permissive CORS headers
    #[arg(short, long)]
    pub cors: bool,

    /// Send ETag headers and answer conditional requests
    #[arg(short, long)]
    pub etag: bool,

    /// Cache-Control max-age in seconds
    #[arg(short = 'M', long)]
    pub max_age: Option<u64>,

    /// Mark cached responses immutable
    #[arg(short = 'I', long)]
    pub immutable: bool,

    /// Require this password before serving anything
    #[arg(short = 'P', long)]
    pub password: Option<String>,

    /// Salt used to hash the password [default: random]
    #[arg(long)]
    pub salt: Option<String>,

    /// Serve over HTTPS
    #[arg(short, long)]
    pub ssl: bool,

    /// TLS private key (PEM) [default: key.pem]
    #[arg(short = 'K', long)]
    pub key: Option<PathBuf>,

    /// TLS certificate chain (PEM) [default: cert.pem]
    #[arg(short = 'C', long)]
    pub cert: Option<PathBuf>,

    /// Configuration file [default: serw.{toml,json,yaml} if present]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log the client address
    #[arg(long)]
    pub log_ip: bool,

    /// Log the client user agent
    #[arg(long)]
    pub log_agent: bool,

    /// Omit timestamps from request logs
    #[arg(long)]
    pub no_log_timestamp: bool,

    /// Keep previous terminal output on start-up
    #[arg(long)]
    pub no_clear_console: bool,

    /// Disable all logging
    #[arg(long)]
    pub silent: bool,

    /// Request log format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Append request logs to this file instead of stdout
    #[arg(long)]
    pub access_log_file: Option<String>,

    /// Append error logs to this file instead of stderr
    #[arg(long)]
    pub error_log_file: Option<String>,

    /// Number of runtime worker threads
    #[arg(long)]
    pub workers: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "serw", "site", "-p", "8080", "-H", "0.0.0.0", "-d", "-l", "-e", "-M", "60", "-I",
            "-i", "*.log", "drafts", "-P", "secret",
        ]);
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert!(cli.dot_files && cli.no_dir_listing && cli.etag && cli.immutable);
        assert_eq!(cli.max_age, Some(60));
        assert_eq!(cli.ignore_files, vec!["*.log", "drafts"]);
        assert_eq!(cli.password.as_deref(), Some("secret"));
        assert!(!cli.ssl);
    }

    #[test]
    fn test_log_format_flag() {
        let cli = Cli::parse_from(["serw", "--log-format", "json", "--silent"]);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(cli.silent);
    }
}
