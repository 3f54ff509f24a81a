// Application state module
// Everything a request handler needs, shared through an Arc

use crate::auth::SessionStore;
use crate::resolve::IgnoreMatcher;

use super::types::ServerConfig;

/// Application state
#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    /// Compiled once from `config.ignore_files` and `config.dot_files`
    pub ignore: IgnoreMatcher,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let ignore = IgnoreMatcher::new(&config.ignore_files, config.dot_files);
        Self {
            config,
            ignore,
            sessions: SessionStore::default(),
        }
    }
}
