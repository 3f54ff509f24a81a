// Configuration module entry point
// Layers defaults, config file, environment and CLI flags, then validates

mod state;
mod types;

use crate::auth::Credentials;
use crate::cli::Cli;
use crate::error::StartupError;
use crate::http::cache::CachePolicy;
use crate::logger;
use config::Source;
use std::path::{Path, PathBuf};

pub use state::AppState;
pub use types::{Config, LoggingConfig, ServerConfig, TlsFiles};

/// Config file basename looked up when `--config` is not given
const DEFAULT_CONFIG_NAME: &str = "serw";

impl Config {
    /// Load configuration; CLI flags win over environment, environment over
    /// the config file, the config file over built-in defaults
    pub fn load(cli: &Cli) -> Result<Self, config::ConfigError> {
        let file = match &cli.config {
            Some(path) => config::File::from(path.as_path()).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("SERW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("ignore_files"),
            )
            .set_default("host", "localhost")?
            .set_default("port", 3000)?
            .set_default("index", "index.html")?
            .set_default("dot_files", false)?
            .set_default("ignore_files", Vec::<String>::new())?
            .set_default("dir_listing", true)?
            .set_default("robots", false)?
            .set_default("cors", false)?
            .set_default("etag", false)?
            .set_default("immutable", false)?
            .set_default("ssl", false)?
            .set_default("key", "key.pem")?
            .set_default("cert", "cert.pem")?
            .set_default("logging.log_ip", false)?
            .set_default("logging.log_agent", false)?
            .set_default("logging.log_timestamp", true)?
            .set_default("logging.clear_console", true)?
            .set_default("logging.silent", false)?
            .set_default("logging.format", "pretty")?
            .set_override_option("root", path_string(cli.root.as_deref()))?
            .set_override_option("host", cli.host.clone())?
            .set_override_option("port", cli.port)?
            .set_override_option("index", cli.index.clone())?
            .set_override_option("dot_files", flag(cli.dot_files))?
            .set_override_option(
                "ignore_files",
                (!cli.ignore_files.is_empty()).then(|| cli.ignore_files.clone()),
            )?
            .set_override_option("dir_listing", cli.no_dir_listing.then_some(false))?
            .set_override_option("error_page", path_string(cli.error_page.as_deref()))?
            .set_override_option("robots", flag(cli.robots))?
            .set_override_option("cors", flag(cli.cors))?
            .set_override_option("etag", flag(cli.etag))?
            .set_override_option("max_age", cli.max_age)?
            .set_override_option("immutable", flag(cli.immutable))?
            .set_override_option("password", cli.password.clone())?
            .set_override_option("salt", cli.salt.clone())?
            .set_override_option("ssl", flag(cli.ssl))?
            .set_override_option("key", path_string(cli.key.as_deref()))?
            .set_override_option("cert", path_string(cli.cert.as_deref()))?
            .set_override_option("workers", cli.workers.and_then(|w| u64::try_from(w).ok()))?
            .set_override_option("logging.log_ip", flag(cli.log_ip))?
            .set_override_option("logging.log_agent", flag(cli.log_agent))?
            .set_override_option("logging.log_timestamp", cli.no_log_timestamp.then_some(false))?
            .set_override_option("logging.clear_console", cli.no_clear_console.then_some(false))?
            .set_override_option("logging.silent", flag(cli.silent))?
            .set_override_option("logging.format", cli.log_format.map(|f| f.as_str()))?
            .set_override_option("logging.access_log_file", cli.access_log_file.clone())?
            .set_override_option("logging.error_log_file", cli.error_log_file.clone())?
            .build()?;

        for hint in legacy_key_hints(&settings) {
            logger::log_warning_code("CONFIG_KEY", &hint);
        }

        settings.try_deserialize()
    }
}

/// camelCase option names accepted by older config files, and their
/// current spelling
const LEGACY_KEYS: [(&str, &str); 10] = [
    ("dotfiles", "dot_files"),
    ("ignorefiles", "ignore_files"),
    ("dirlisting", "dir_listing"),
    ("errorpage", "error_page"),
    ("maxage", "max_age"),
    ("logip", "logging.log_ip"),
    ("logagent", "logging.log_agent"),
    ("logtimestamp", "logging.log_timestamp"),
    ("clearconsole", "logging.clear_console"),
    ("silent", "logging.silent"),
];

/// One message per top-level key that only an older schema understands
fn legacy_key_hints(settings: &config::Config) -> Vec<String> {
    let Ok(table) = settings.collect() else {
        return Vec::new();
    };

    let mut hints: Vec<String> = table
        .keys()
        .filter_map(|key| {
            let folded = key.to_ascii_lowercase().replace('_', "");
            LEGACY_KEYS
                .iter()
                .find(|(legacy, current)| *legacy == folded && key != current)
                .map(|(_, current)| format!("'{key}' is not recognized, use '{current}'."))
        })
        .collect();
    hints.sort();
    hints
}

/// Boolean flags only override when they are set
fn flag(enabled: bool) -> Option<bool> {
    enabled.then_some(true)
}

fn path_string(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.to_string_lossy().into_owned())
}

impl ServerConfig {
    /// Validate raw settings
    ///
    /// Fails when the root is missing or not a directory. An unusable error
    /// page is dropped with a warning.
    pub fn from_config(config: Config) -> Result<Self, StartupError> {
        let root = resolve_root(config.root)?;
        let error_page = config.error_page.and_then(validate_error_page);

        let credentials = config.password.map(|password| match config.salt {
            Some(salt) => Credentials::new(&password, salt),
            None => Credentials::with_random_salt(&password),
        });

        let tls = config.ssl.then(|| TlsFiles {
            key: config.key,
            cert: config.cert,
        });

        Ok(Self {
            root,
            host: config.host,
            port: config.port,
            index: config.index,
            dot_files: config.dot_files,
            ignore_files: config.ignore_files,
            dir_listing: config.dir_listing,
            error_page,
            robots: config.robots,
            cors: config.cors,
            etag: config.etag,
            cache: CachePolicy::new(config.max_age, config.immutable),
            credentials,
            tls,
            workers: config.workers,
            logging: config.logging,
        })
    }
}

/// `./public` when it exists, otherwise the working directory
fn default_root() -> PathBuf {
    let public = PathBuf::from("public");
    if public.is_dir() {
        public
    } else {
        PathBuf::from(".")
    }
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf, StartupError> {
    let root = root.unwrap_or_else(default_root);
    if !root.exists() {
        return Err(StartupError::RootMissing(root));
    }
    if !root.is_dir() {
        return Err(StartupError::RootNotDirectory(root));
    }
    Ok(root.canonicalize()?)
}

fn validate_error_page(page: PathBuf) -> Option<PathBuf> {
    if !page.exists() {
        logger::log_warning_code(
            "ERROR_PAGE_MISSING",
            &format!("{} doesn't exist.", page.display()),
        );
        return None;
    }
    if page.is_dir() {
        logger::log_warning_code(
            "ERROR_PAGE_INVALID",
            &format!("{} is a directory.", page.display()),
        );
        return None;
    }
    Some(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn cli_for(root: &Path) -> Cli {
        Cli {
            root: Some(root.to_path_buf()),
            ..Cli::default()
        }
    }

    fn load(cli: &Cli) -> Config {
        Config::load(cli).expect("load")
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load(&cli_for(dir.path()));
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3000);
        assert_eq!(config.index, "index.html");
        assert!(config.dir_listing);
        assert!(!config.dot_files && !config.etag && !config.ssl);
        assert_eq!(config.key, PathBuf::from("key.pem"));
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_cli_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cli = Cli {
            port: Some(8080),
            no_dir_listing: true,
            etag: true,
            max_age: Some(120),
            ignore_files: vec!["*.log".into()],
            ..cli_for(dir.path())
        };
        let config = load(&cli);
        assert_eq!(config.port, 8080);
        assert!(!config.dir_listing);
        assert!(config.etag);
        assert_eq!(config.max_age, Some(120));
        assert_eq!(config.ignore_files, vec!["*.log"]);
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("serw.toml");
        fs::write(&file, "port = 4000\ncors = true\n[logging]\nlog_ip = true\n").expect("write");

        let cli = Cli {
            config: Some(file),
            host: Some("0.0.0.0".into()),
            ..Cli::default()
        };
        let config = Config::load(&cli).expect("load");
        assert_eq!(config.port, 4000);
        assert!(config.cors);
        assert!(config.logging.log_ip);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_legacy_keys_are_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("old.json");
        fs::write(&file, r#"{"dotFiles": true, "maxAge": 60, "logIp": true, "cors": true}"#)
            .expect("write");

        let settings = config::Config::builder()
            .add_source(config::File::from(file.as_path()))
            .build()
            .expect("build");
        let hints = legacy_key_hints(&settings);
        assert_eq!(hints.len(), 3);
        assert!(hints.iter().any(|h| h.ends_with("use 'dot_files'.")));
        assert!(hints.iter().any(|h| h.ends_with("use 'max_age'.")));
        assert!(hints.iter().any(|h| h.ends_with("use 'logging.log_ip'.")));

        // Loading still succeeds; the old keys simply have no effect
        let cli = Cli {
            config: Some(file),
            ..cli_for(dir.path())
        };
        let config = load(&cli);
        assert!(config.cors);
        assert!(!config.dot_files);
        assert_eq!(config.max_age, None);
    }

    #[test]
    fn test_current_keys_are_not_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("serw.toml");
        fs::write(&file, "dot_files = true\nmax_age = 5\n[logging]\nsilent = true\n")
            .expect("write");

        let settings = config::Config::builder()
            .add_source(config::File::from(file.as_path()))
            .build()
            .expect("build");
        assert!(legacy_key_hints(&settings).is_empty());
    }

    #[test]
    fn test_missing_explicit_config_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cli = Cli {
            config: Some(dir.path().join("absent.toml")),
            ..cli_for(dir.path())
        };
        assert!(Config::load(&cli).is_err());
    }

    #[test]
    fn test_server_config_validation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cli = Cli {
            password: Some("pw".into()),
            salt: Some("nacl".into()),
            ..cli_for(dir.path())
        };
        let mut config = load(&cli);
        config.error_page = Some(dir.path().join("nope.html"));

        let server = ServerConfig::from_config(config).expect("valid");
        assert_eq!(server.root, dir.path().canonicalize().expect("canonical"));
        assert!(server.error_page.is_none());
        let credentials = server.credentials.expect("credentials");
        assert_eq!(credentials.salt, "nacl");
        assert!(credentials.verify("pw"));
        assert!(server.tls.is_none());
    }

    #[test]
    fn test_random_salt_when_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cli = Cli {
            password: Some("pw".into()),
            ..cli_for(dir.path())
        };
        let server = ServerConfig::from_config(load(&cli)).expect("valid");
        let credentials = server.credentials.expect("credentials");
        assert_eq!(credentials.salt.len(), 32);
        assert!(credentials.verify("pw"));
    }

    #[test]
    fn test_root_must_be_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").expect("write");

        let mut config = load(&cli_for(dir.path()));
        config.root = Some(file);
        assert!(matches!(
            ServerConfig::from_config(config),
            Err(StartupError::RootNotDirectory(_))
        ));

        let mut config = load(&cli_for(dir.path()));
        config.root = Some(dir.path().join("absent"));
        assert!(matches!(
            ServerConfig::from_config(config),
            Err(StartupError::RootMissing(_))
        ));
    }

    #[test]
    fn test_error_page_directory_is_dropped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let page = dir.path().join("404.html");
        fs::write(&page, "custom").expect("write");

        let mut config = load(&cli_for(dir.path()));
        config.error_page = Some(page.clone());
        let server = ServerConfig::from_config(config).expect("valid");
        assert_eq!(server.error_page, Some(page));

        let mut config = load(&cli_for(dir.path()));
        config.error_page = Some(dir.path().to_path_buf());
        let server = ServerConfig::from_config(config).expect("valid");
        assert!(server.error_page.is_none());
    }
}
