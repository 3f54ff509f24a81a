//! Directory listing
//!
//! Children are classified without following symlinks, filtered through the
//! ignore rules and rendered into the listing template as JSON.

use crate::http::Reply;
use crate::resolve::{IgnoreMatcher, RequestPath};
use crate::templates;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use std::cmp::Ordering;
use std::io;
use std::path::Path;
use tokio::fs;

/// Characters escaped in a single URL path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

/// One row of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Display name; directories carry a trailing `/`
    pub base: String,
    /// Link target (absolute, percent-encoded)
    pub relative: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
}

/// Render the listing for a directory
///
/// `relative` is the root-relative directory path without slashes at either
/// end. An unreadable directory is answered with 403.
pub async fn render_listing(
    dir: &Path,
    relative: &str,
    request: &RequestPath<'_>,
    ignore: &IgnoreMatcher,
) -> io::Result<Reply> {
    let entries = match read_entries(dir, relative, ignore).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            return Ok(Reply::error(
                hyper::StatusCode::FORBIDDEN,
                request.raw,
                "No permission.",
            ));
        }
        Err(e) => return Err(e),
    };

    let json = serde_json::to_string(&entries)
        .map_err(io::Error::other)?
        .replace('<', "\\u003c");

    Ok(Reply::DirectoryListing {
        html: templates::listing_page(&request.decoded, &json),
    })
}

/// Sorted entries, with the `..` entry first below the root
pub async fn read_entries(
    dir: &Path,
    relative: &str,
    ignore: &IgnoreMatcher,
) -> io::Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    let mut reader = fs::read_dir(dir).await?;

    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let child = if relative.is_empty() {
            name.clone()
        } else {
            format!("{relative}/{name}")
        };
        if ignore.is_ignored(&child) {
            continue;
        }

        let href = url_for(&child);
        // lstat: symlinks are listed, not followed
        let file_type = fs::symlink_metadata(entry.path())
            .await
            .ok()
            .map(|m| m.file_type());

        let entry = match file_type {
            Some(t) if t.is_dir() => FileEntry {
                kind: EntryKind::Directory,
                base: format!("{name}/"),
                relative: format!("{href}/"),
                title: name,
                ext: None,
            },
            other => FileEntry {
                kind: if other.is_some_and(|t| t.is_symlink()) {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                ext: Some(extension_of(&name)),
                base: name.clone(),
                relative: href,
                title: name,
            },
        };
        entries.push(entry);
    }

    entries.sort_by(compare_entries);

    if !relative.is_empty() {
        let parent = parent_url(relative);
        entries.insert(
            0,
            FileEntry {
                kind: EntryKind::Directory,
                base: "..".to_string(),
                relative: parent.clone(),
                title: parent,
                ext: Some(String::new()),
            },
        );
    }

    Ok(entries)
}

/// Directories first, then case-insensitive name, lowercase before uppercase
fn compare_entries(a: &FileEntry, b: &FileEntry) -> Ordering {
    a.kind
        .cmp(&b.kind)
        .then_with(|| a.base.to_lowercase().cmp(&b.base.to_lowercase()))
        .then_with(|| b.base.cmp(&a.base))
}

/// Extension without the dot, empty when there is none
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `/a%20b/c` for `a b/c`
fn url_for(relative: &str) -> String {
    relative
        .split('/')
        .fold(String::new(), |mut url, segment| {
            url.push('/');
            url.extend(utf8_percent_encode(segment, SEGMENT));
            url
        })
}

/// URL of the parent directory, always ending in `/`
fn parent_url(relative: &str) -> String {
    match relative.rsplit_once('/') {
        Some((parent, _)) => format!("{}/", url_for(parent)),
        None => "/".to_string(),
    }
}
