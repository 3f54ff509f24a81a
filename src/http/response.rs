//! HTTP response building module
//!
//! Every handler outcome is a [`Reply`]; [`Reply::into_response`] is the only
//! place a `Response` is assembled, so each request is answered exactly once.

use crate::http::range::{unsatisfied_range, RangeSpec};
use crate::templates;
use futures_util::TryStreamExt;
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use std::io;
use std::time::SystemTime;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

/// Body type shared by every response
pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

const HTML_UTF8: &str = "text/html;charset=utf-8";

/// In-memory body
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Stream at most `len` bytes from the file's current position
///
/// The handle is owned by the stream and closed when the body finishes or is
/// dropped.
pub fn file_body(file: File, len: u64) -> ResponseBody {
    let stream = ReaderStream::new(file.take(len)).map_ok(Frame::data);
    StreamBody::new(stream).boxed_unsync()
}

/// Representation headers of a served file
#[derive(Debug, Clone, Default)]
pub struct FileHeaders {
    pub content_type: String,
    pub last_modified: Option<SystemTime>,
    pub etag: Option<String>,
    pub cache_control: Option<String>,
    pub content_encoding: Option<&'static str>,
}

/// Outcome of handling one request
#[derive(Debug)]
pub enum Reply {
    /// 302 to `location`
    Redirect { location: String },
    /// Templated error page
    Error {
        status: StatusCode,
        url: String,
        message: String,
    },
    /// Wrong password: 403 with a Basic challenge
    Denied { url: String, page: Option<String> },
    /// 401 with the password prompt
    Login,
    /// Pre-rendered HTML, sent verbatim
    Html { status: StatusCode, body: Bytes },
    Text {
        status: StatusCode,
        content_type: &'static str,
        body: String,
    },
    NotModified { etag: String },
    RangeNotSatisfiable { size: u64 },
    /// 206; `file` is already positioned at `range.start`
    PartialContent {
        file: File,
        range: RangeSpec,
        headers: FileHeaders,
    },
    FullContent {
        file: File,
        size: u64,
        headers: FileHeaders,
    },
    DirectoryListing { html: String },
}

impl Reply {
    pub fn error(status: StatusCode, url: &str, message: impl Into<String>) -> Self {
        Self::Error {
            status,
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
        }
    }

    /// Status code this reply will be written with
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Redirect { .. } => StatusCode::FOUND,
            Self::Error { status, .. } | Self::Html { status, .. } | Self::Text { status, .. } => {
                *status
            }
            Self::Denied { .. } => StatusCode::FORBIDDEN,
            Self::Login => StatusCode::UNAUTHORIZED,
            Self::NotModified { .. } => StatusCode::NOT_MODIFIED,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::PartialContent { .. } => StatusCode::PARTIAL_CONTENT,
            Self::FullContent { .. } | Self::DirectoryListing { .. } => StatusCode::OK,
        }
    }

    /// Write the reply as an HTTP response
    pub fn into_response(self) -> Response<ResponseBody> {
        let status = self.status();
        let builder = Response::builder().status(status);

        let result = match self {
            Self::Redirect { location } => builder
                .header(header::LOCATION, location)
                .header(header::CONTENT_LENGTH, 0)
                .body(empty_body()),
            Self::Error {
                status,
                url,
                message,
            } => {
                let html = templates::error_page(status.as_u16(), &url, &message);
                builder
                    .header(header::CONTENT_TYPE, HTML_UTF8)
                    .header(header::CONTENT_LENGTH, html.len())
                    .body(full_body(html))
            }
            Self::Denied { url, page } => {
                let html = templates::error_page(status.as_u16(), &url, "Access denied.");
                let mut builder = builder
                    .header(header::WWW_AUTHENTICATE, "Basic realm=\"Restricted Area\"")
                    .header(header::CONTENT_TYPE, HTML_UTF8)
                    .header(header::CONTENT_LENGTH, html.len());
                if let Some(page) = page {
                    builder = builder.header(header::LOCATION, page);
                }
                builder.body(full_body(html))
            }
            Self::Login => {
                let html = templates::login_page();
                builder
                    .header(header::CONTENT_TYPE, HTML_UTF8)
                    .header(header::CONTENT_LENGTH, html.len())
                    .body(full_body(html))
            }
            Self::Html { body, .. } => builder
                .header(header::CONTENT_TYPE, HTML_UTF8)
                .header(header::CONTENT_LENGTH, body.len())
                .body(full_body(body)),
            Self::DirectoryListing { html } => builder
                .header(header::CONTENT_TYPE, HTML_UTF8)
                .header(header::CONTENT_LENGTH, html.len())
                .body(full_body(html)),
            Self::Text {
                content_type, body, ..
            } => builder
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, body.len())
                .body(full_body(body)),
            Self::NotModified { etag } => builder.header(header::ETAG, etag).body(empty_body()),
            Self::RangeNotSatisfiable { size } => builder
                .header(header::CONTENT_RANGE, unsatisfied_range(size))
                .header(header::CONTENT_LENGTH, 0)
                .body(empty_body()),
            Self::PartialContent {
                file,
                range,
                headers,
            } => apply_file_headers(builder, &headers)
                .header(header::CONTENT_RANGE, range.content_range())
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_LENGTH, range.length())
                .body(file_body(file, range.length())),
            Self::FullContent {
                file,
                size,
                headers,
            } => apply_file_headers(builder, &headers)
                .header(header::CONTENT_LENGTH, size)
                .body(file_body(file, size)),
        };

        result.unwrap_or_else(|e| {
            log_build_error(status, &e);
            let mut fallback = Response::new(empty_body());
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }
}

fn apply_file_headers(
    mut builder: hyper::http::response::Builder,
    headers: &FileHeaders,
) -> hyper::http::response::Builder {
    builder = builder.header(header::CONTENT_TYPE, headers.content_type.as_str());
    if let Some(modified) = headers.last_modified {
        builder = builder.header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified));
    }
    if let Some(etag) = &headers.etag {
        builder = builder.header(header::ETAG, etag.as_str());
    }
    if let Some(cache_control) = &headers.cache_control {
        builder = builder.header(header::CACHE_CONTROL, cache_control.as_str());
    }
    if let Some(encoding) = headers.content_encoding {
        builder = builder
            .header(header::CONTENT_ENCODING, encoding)
            .header(header::VARY, HeaderValue::from_static("Accept-Encoding"));
    }
    builder
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
