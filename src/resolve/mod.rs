//! Path resolution module
//!
//! Maps a request path onto the served root. Lexical normalization keeps the
//! result inside the root; the filesystem is then probed to decide between a
//! redirect, a file, a directory, or a missing/forbidden answer.

pub mod ignore;

pub use ignore::IgnoreMatcher;

use crate::config::ServerConfig;
use hyper::Uri;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};

/// Index name always tried in any directory
const DEFAULT_INDEX: &str = "index.html";

/// Path component of a request, raw and percent-decoded
#[derive(Debug, Clone)]
pub struct RequestPath<'a> {
    pub raw: &'a str,
    pub query: Option<&'a str>,
    pub decoded: Cow<'a, str>,
}

impl<'a> RequestPath<'a> {
    /// `None` when the decoded bytes are not UTF-8
    pub fn parse(uri: &'a Uri) -> Option<Self> {
        let raw = uri.path();
        let decoded = percent_decode_str(raw).decode_utf8().ok()?;
        Some(Self {
            raw,
            query: uri.query(),
            decoded,
        })
    }

    /// Same URL with a `/` appended to the path
    pub fn with_trailing_slash(&self) -> String {
        match self.query {
            Some(query) => format!("{}/?{query}", self.raw),
            None => format!("{}/", self.raw),
        }
    }

    /// Root-relative path without leading or trailing slashes
    pub fn relative(&self) -> String {
        normalize(&self.decoded)
    }
}

/// A file opened during resolution; the handle is reused for the body
#[derive(Debug)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub file: File,
    pub metadata: Metadata,
}

/// Where a request path leads
#[derive(Debug)]
pub enum Resolution {
    Redirect(String),
    Missing,
    Forbidden,
    /// Directory without a usable index; `relative` is root-relative
    Directory { path: PathBuf, relative: String },
    File(ResolvedFile),
}

/// Collapse `.`/`..`/empty segments; `..` never climbs above the root
pub fn normalize(decoded: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn join_relative(relative: &str, name: &str) -> String {
    if relative.is_empty() {
        name.to_string()
    } else {
        format!("{relative}/{name}")
    }
}

fn absolute(root: &Path, relative: &str) -> PathBuf {
    if relative.is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

/// Resolve a request path against the configured root
pub async fn resolve(
    request: &RequestPath<'_>,
    config: &ServerConfig,
    ignore: &IgnoreMatcher,
) -> io::Result<Resolution> {
    let relative = request.relative();
    let path = absolute(&config.root, &relative);

    match fs::metadata(&path).await {
        Ok(meta) if meta.is_dir() => {
            // Ignored directories look absent, with or without the slash
            if ignore.is_ignored(&relative) {
                return Ok(Resolution::Missing);
            }
            if !request.raw.ends_with('/') {
                return Ok(Resolution::Redirect(request.with_trailing_slash()));
            }
            resolve_directory(path, relative, config, ignore).await
        }
        Ok(_) => open_file(path, &relative, ignore).await,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            resolve_extensionless(&relative, config, ignore).await
        }
        Err(e) => classify(e),
    }
}

async fn resolve_directory(
    path: PathBuf,
    relative: String,
    config: &ServerConfig,
    ignore: &IgnoreMatcher,
) -> io::Result<Resolution> {
    let mut candidates = Vec::with_capacity(2);
    if relative.is_empty() {
        candidates.push(config.index.as_str());
    }
    candidates.push(DEFAULT_INDEX);

    for name in candidates {
        let candidate = join_relative(&relative, name);
        if ignore.is_ignored(&candidate) {
            continue;
        }
        if let Some(found) = probe_file(&config.root, &candidate, ignore).await? {
            return Ok(found);
        }
    }

    Ok(Resolution::Directory { path, relative })
}

/// `/about` serves `about.html` or `about.htm` when `about` is absent
async fn resolve_extensionless(
    relative: &str,
    config: &ServerConfig,
    ignore: &IgnoreMatcher,
) -> io::Result<Resolution> {
    if relative.is_empty() || Path::new(relative).extension().is_some() {
        return Ok(Resolution::Missing);
    }

    for ext in ["html", "htm"] {
        let candidate = format!("{relative}.{ext}");
        if let Some(found) = probe_file(&config.root, &candidate, ignore).await? {
            return Ok(found);
        }
    }

    Ok(Resolution::Missing)
}

/// Open `relative` when it exists and is not a directory
async fn probe_file(
    root: &Path,
    relative: &str,
    ignore: &IgnoreMatcher,
) -> io::Result<Option<Resolution>> {
    let path = absolute(root, relative);
    match fs::metadata(&path).await {
        Ok(meta) if meta.is_dir() => Ok(None),
        Ok(_) => open_file(path, relative, ignore).await.map(Some),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            Ok(None)
        }
        Err(e) => classify(e).map(Some),
    }
}

async fn open_file(
    path: PathBuf,
    relative: &str,
    ignore: &IgnoreMatcher,
) -> io::Result<Resolution> {
    if ignore.is_ignored(relative) {
        return Ok(Resolution::Missing);
    }

    // File symlinks are answered with their literal target
    let link_meta = match fs::symlink_metadata(&path).await {
        Ok(meta) => meta,
        Err(e) => return classify(e),
    };
    if link_meta.file_type().is_symlink() {
        let target = fs::read_link(&path).await?;
        return Ok(Resolution::Redirect(target.to_string_lossy().into_owned()));
    }

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) => return classify(e),
    };
    let metadata = file.metadata().await?;

    Ok(Resolution::File(ResolvedFile {
        path,
        file,
        metadata,
    }))
}

fn classify(err: io::Error) -> io::Result<Resolution> {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Ok(Resolution::Missing),
        io::ErrorKind::PermissionDenied => Ok(Resolution::Forbidden),
        _ => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::fs as stdfs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, ServerConfig) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        stdfs::write(root.join("home.html"), "home").expect("write");
        stdfs::write(root.join("about.html"), "about").expect("write");
        stdfs::write(root.join("notes.htm"), "notes").expect("write");
        stdfs::write(root.join("app.js"), "js").expect("write");
        stdfs::write(root.join(".env"), "SECRET=1").expect("write");
        stdfs::create_dir(root.join("docs")).expect("mkdir");
        stdfs::write(root.join("docs/index.html"), "docs").expect("write");
        stdfs::create_dir(root.join("empty")).expect("mkdir");

        let config = ServerConfig::for_root(stdfs::canonicalize(root).expect("canonical"));
        (dir, config)
    }

    async fn run(config: &ServerConfig, uri: &str) -> Resolution {
        let uri: Uri = uri.parse().expect("uri");
        let request = RequestPath::parse(&uri).expect("path");
        let ignore = IgnoreMatcher::new(&config.ignore_files, config.dot_files);
        resolve(&request, config, &ignore).await.expect("resolve")
    }

    fn file_name(resolution: &Resolution) -> String {
        match resolution {
            Resolution::File(f) => f
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/"), "");
        assert_eq!(normalize("/a//b/./c/"), "a/b/c");
        assert_eq!(normalize("/a/../b"), "b");
        assert_eq!(normalize("/../../etc/passwd"), "etc/passwd");
        assert_eq!(normalize("/a\\..\\..\\x"), "x");
    }

    #[test]
    fn test_request_path() {
        let uri: Uri = "/my%20docs?x=1".parse().expect("uri");
        let request = RequestPath::parse(&uri).expect("path");
        assert_eq!(request.decoded, "/my docs");
        assert_eq!(request.with_trailing_slash(), "/my%20docs/?x=1");

        let uri: Uri = "/%FF".parse().expect("uri");
        assert!(RequestPath::parse(&uri).is_none());
    }

    #[tokio::test]
    async fn test_root_index() {
        let (_dir, mut config) = fixture();
        config.index = "home.html".into();
        assert_eq!(file_name(&run(&config, "/").await), "home.html");
    }

    #[tokio::test]
    async fn test_root_without_index_is_directory() {
        let (_dir, config) = fixture();
        assert!(matches!(
            run(&config, "/").await,
            Resolution::Directory { ref relative, .. } if relative.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_directory_redirects_to_slash() {
        let (_dir, config) = fixture();
        match run(&config, "/docs").await {
            Resolution::Redirect(location) => assert_eq!(location, "/docs/"),
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_subdirectory_index() {
        let (_dir, config) = fixture();
        assert_eq!(file_name(&run(&config, "/docs/").await), "index.html");
        assert!(matches!(
            run(&config, "/empty/").await,
            Resolution::Directory { .. }
        ));
    }

    #[tokio::test]
    async fn test_extensionless_fallback() {
        let (_dir, config) = fixture();
        assert_eq!(file_name(&run(&config, "/about").await), "about.html");
        assert_eq!(file_name(&run(&config, "/notes").await), "notes.htm");
        assert!(matches!(run(&config, "/nothing").await, Resolution::Missing));
        assert!(matches!(run(&config, "/nothing.txt").await, Resolution::Missing));
    }

    #[tokio::test]
    async fn test_traversal_stays_in_root() {
        let (_dir, config) = fixture();
        assert_eq!(file_name(&run(&config, "/../../app.js").await), "app.js");
        assert!(matches!(
            run(&config, "/%2e%2e/%2e%2e/etc/passwd").await,
            Resolution::Missing
        ));
    }

    #[tokio::test]
    async fn test_ignored_file_is_missing() {
        let (_dir, config) = fixture();
        assert!(matches!(run(&config, "/.env").await, Resolution::Missing));
    }

    #[tokio::test]
    async fn test_ignored_directory_is_missing_without_redirect() {
        let (dir, config) = fixture();
        stdfs::create_dir(dir.path().join(".git")).expect("mkdir");
        assert!(matches!(run(&config, "/.git").await, Resolution::Missing));
        assert!(matches!(run(&config, "/.git/").await, Resolution::Missing));
    }

    #[tokio::test]
    async fn test_file_below_file_is_missing() {
        let (_dir, config) = fixture();
        assert!(matches!(run(&config, "/app.js/x").await, Resolution::Missing));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_redirects_to_literal_target() {
        let (dir, config) = fixture();
        std::os::unix::fs::symlink("app.js", dir.path().join("link.js")).expect("symlink");
        match run(&config, "/link.js").await {
            Resolution::Redirect(location) => assert_eq!(location, "app.js"),
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directory_is_served() {
        let (dir, config) = fixture();
        std::os::unix::fs::symlink(dir.path().join("docs"), dir.path().join("manual"))
            .expect("symlink");
        assert_eq!(file_name(&run(&config, "/manual/").await), "index.html");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_file_is_forbidden() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, config) = fixture();
        let path = dir.path().join("app.js");
        stdfs::set_permissions(&path, stdfs::Permissions::from_mode(0o000)).expect("chmod");
        // Privileged users read through mode bits
        if stdfs::File::open(&path).is_ok() {
            return;
        }

        assert!(matches!(run(&config, "/app.js").await, Resolution::Forbidden));
        stdfs::set_permissions(&path, stdfs::Permissions::from_mode(0o644)).expect("chmod");
    }
}
