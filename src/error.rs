//! Error types
//!
//! Start-up failures abort the process; per-request failures are turned into
//! HTTP replies at the dispatch boundary.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised before the server accepts its first connection
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{} doesn't exist.", .0.display())]
    RootMissing(PathBuf),

    #[error("{} is not a directory.", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid address '{addr}': {reason}")]
    Address { addr: String, reason: String },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure while serving a single request
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("permission denied: {0}")]
    PermissionDenied(io::Error),

    #[error("i/o failure: {0}")]
    Io(io::Error),
}

impl From<io::Error> for ServeError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied(err)
        } else {
            Self::Io(err)
        }
    }
}

impl ServeError {
    /// Message shown on the 500 page
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "File not accessible.",
            Self::Io(_) => "Internal server error.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_errors_are_classified() {
        let err = ServeError::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ServeError::PermissionDenied(_)));
        assert_eq!(err.public_message(), "File not accessible.");

        let err = ServeError::from(io::Error::other("disk on fire"));
        assert!(matches!(err, ServeError::Io(_)));
        assert_eq!(err.public_message(), "Internal server error.");
    }

    #[test]
    fn test_startup_messages() {
        let err = StartupError::RootMissing(PathBuf::from("/nope"));
        assert_eq!(err.to_string(), "/nope doesn't exist.");
    }
}
