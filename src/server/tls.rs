// TLS module
// Loads PEM key material and builds the acceptor used for HTTPS connections

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig as RustlsConfig;
use tokio_rustls::TlsAcceptor;

use crate::config::TlsFiles;
use crate::error::StartupError;
use crate::logger;

/// Check that both files exist and are regular files
///
/// Problems are logged with `SSL_KEY` / `SSL_CERT` and reported as `false`,
/// in which case the server runs over plain HTTP.
pub fn files_usable(files: &TlsFiles) -> bool {
    let key_ok = check_file(&files.key, "SSL_KEY", "key");
    let cert_ok = check_file(&files.cert, "SSL_CERT", "certificate");
    key_ok && cert_ok
}

fn check_file(path: &Path, code: &str, what: &str) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => true,
        Ok(_) => {
            logger::log_warning_code(
                code,
                &format!("SSL {what} '{}' is not a file, falling back to HTTP.", path.display()),
            );
            false
        }
        Err(_) => {
            logger::log_warning_code(
                code,
                &format!("SSL {what} '{}' not found, falling back to HTTP.", path.display()),
            );
            false
        }
    }
}

/// Build a TLS acceptor from PEM files
pub fn load_acceptor(files: &TlsFiles) -> Result<TlsAcceptor, StartupError> {
    let certs = load_certs(&files.cert)?;
    let key = load_key(&files.key)?;

    let mut config = RustlsConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|e| StartupError::Tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| StartupError::Tls(e.to_string()))?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, StartupError> {
    let mut reader = open_pem(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StartupError::Tls(format!("{}: {e}", path.display())))?;
    if certs.is_empty() {
        return Err(StartupError::Tls(format!(
            "{}: no certificates found",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, StartupError> {
    let mut reader = open_pem(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| StartupError::Tls(format!("{}: {e}", path.display())))?
        .ok_or_else(|| StartupError::Tls(format!("{}: no private key found", path.display())))
}

fn open_pem(path: &Path) -> Result<BufReader<File>, StartupError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| StartupError::Tls(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_are_not_usable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let files = TlsFiles {
            key: dir.path().join("key.pem"),
            cert: dir.path().join("cert.pem"),
        };
        assert!(!files_usable(&files));

        std::fs::write(&files.key, "").expect("write");
        std::fs::create_dir(&files.cert).expect("mkdir");
        assert!(!files_usable(&files));
    }

    #[test]
    fn test_garbage_pem_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let files = TlsFiles {
            key: dir.path().join("key.pem"),
            cert: dir.path().join("cert.pem"),
        };
        std::fs::write(&files.key, "not a key").expect("write");
        std::fs::write(&files.cert, "not a cert").expect("write");

        assert!(files_usable(&files));
        assert!(matches!(load_acceptor(&files), Err(StartupError::Tls(_))));
    }
}
