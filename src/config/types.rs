// Configuration types module
// Raw settings as deserialized, and the validated form the server runs with

use crate::auth::Credentials;
use crate::http::cache::CachePolicy;
use crate::logger::LogFormat;
use serde::Deserialize;
use std::path::PathBuf;

/// Raw configuration, merged from defaults, file, environment and CLI
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub root: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub index: String,
    pub dot_files: bool,
    pub ignore_files: Vec<String>,
    pub dir_listing: bool,
    #[serde(default)]
    pub error_page: Option<PathBuf>,
    pub robots: bool,
    pub cors: bool,
    pub etag: bool,
    #[serde(default)]
    pub max_age: Option<u64>,
    pub immutable: bool,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub salt: Option<String>,
    pub ssl: bool,
    pub key: PathBuf,
    pub cert: PathBuf,
    #[serde(default)]
    pub workers: Option<usize>,
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub log_ip: bool,
    pub log_agent: bool,
    pub log_timestamp: bool,
    pub clear_console: bool,
    pub silent: bool,
    pub format: LogFormat,
    #[serde(default)]
    pub access_log_file: Option<String>,
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_ip: false,
            log_agent: false,
            log_timestamp: true,
            clear_console: true,
            silent: false,
            format: LogFormat::Pretty,
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// TLS key and certificate locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub key: PathBuf,
    pub cert: PathBuf,
}

/// Validated, immutable server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Canonical, existing directory
    pub root: PathBuf,
    pub host: String,
    pub port: u16,
    pub index: String,
    pub dot_files: bool,
    pub ignore_files: Vec<String>,
    pub dir_listing: bool,
    /// Only set when the page exists and is not a directory
    pub error_page: Option<PathBuf>,
    pub robots: bool,
    pub cors: bool,
    pub etag: bool,
    pub cache: CachePolicy,
    pub credentials: Option<Credentials>,
    /// Requested TLS material; checked again when the listener starts
    pub tls: Option<TlsFiles>,
    pub workers: Option<usize>,
    pub logging: LoggingConfig,
}

#[cfg(test)]
impl ServerConfig {
    /// Defaults for a given root, for tests
    pub fn for_root(root: PathBuf) -> Self {
        Self {
            root,
            host: "localhost".to_string(),
            port: 3000,
            index: "index.html".to_string(),
            dot_files: false,
            ignore_files: Vec::new(),
            dir_listing: true,
            error_page: None,
            robots: false,
            cors: false,
            etag: false,
            cache: CachePolicy::default(),
            credentials: None,
            tls: None,
            workers: None,
            logging: LoggingConfig::default(),
        }
    }
}
