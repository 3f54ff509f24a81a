//! Static file serving module
//!
//! Turns a resolved file into a full, partial or not-modified reply, and
//! answers missing paths with the configured 404 page.

use crate::config::ServerConfig;
use crate::handler::router::RequestContext;
use crate::http::{cache, mime, parse_range_header, FileHeaders, RangeParseResult, Reply};
use crate::logger;
use crate::resolve::ResolvedFile;
use hyper::StatusCode;
use std::ffi::OsStr;
use std::io::{self, SeekFrom};
use tokio::fs;
use tokio::io::AsyncSeekExt;

/// Serve an opened file
pub async fn serve_file(
    ctx: &RequestContext<'_>,
    resolved: ResolvedFile,
    config: &ServerConfig,
) -> io::Result<Reply> {
    let ResolvedFile {
        path,
        mut file,
        metadata,
    } = resolved;
    let size = metadata.len();
    let modified = metadata.modified().ok();

    let etag = config.etag.then(|| cache::generate_etag(size, modified));
    if let Some(etag) = &etag {
        if cache::check_etag_match(ctx.if_none_match, etag) {
            return Ok(Reply::NotModified { etag: etag.clone() });
        }
    }

    let extension = path.extension().and_then(OsStr::to_str);
    let content_encoding = if ctx.has_content_encoding {
        None
    } else {
        mime::get_content_encoding(extension)
    };

    let headers = FileHeaders {
        content_type: mime::get_content_type(extension),
        last_modified: modified,
        etag,
        cache_control: config.cache.to_header_value(),
        content_encoding,
    };

    match parse_range_header(ctx.range, size) {
        RangeParseResult::Valid(range) => {
            file.seek(SeekFrom::Start(range.start)).await?;
            Ok(Reply::PartialContent {
                file,
                range,
                headers,
            })
        }
        RangeParseResult::NotSatisfiable => Ok(Reply::RangeNotSatisfiable { size }),
        RangeParseResult::None => Ok(Reply::FullContent {
            file,
            size,
            headers,
        }),
    }
}

/// 404 reply: configured error page, then `<root>/404.html`, then the
/// built-in page
pub async fn serve_missing(ctx: &RequestContext<'_>, config: &ServerConfig) -> Reply {
    let page = config
        .error_page
        .clone()
        .unwrap_or_else(|| config.root.join("404.html"));

    if let Ok(meta) = fs::metadata(&page).await {
        if !meta.is_dir() {
            match fs::read(&page).await {
                Ok(body) => {
                    return Reply::Html {
                        status: StatusCode::NOT_FOUND,
                        body: body.into(),
                    }
                }
                Err(e) => logger::log_warning(&format!(
                    "Failed to read 404 page '{}': {e}",
                    page.display()
                )),
            }
        }
    }

    Reply::error(
        StatusCode::NOT_FOUND,
        ctx.url,
        format!("{} was not found!", ctx.url),
    )
}
