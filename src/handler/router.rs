//! Request dispatch module
//!
//! Entry point for HTTP request processing: URL sanity checks, CORS, robots,
//! the password gate, method restriction, resolution and the failure
//! boundary. Exactly one log line is written per request.

use crate::auth::{self, Gate};
use crate::config::{AppState, LoggingConfig};
use crate::error::ServeError;
use crate::handler::{listing, static_files};
use crate::http::{Reply, ResponseBody};
use crate::logger::{self, RequestLogEntry};
use crate::resolve::{self, RequestPath, Resolution};
use chrono::Local;
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderValue};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /";

const CORS_HEADERS: [(&str, &str); 5] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, POST"),
    ("access-control-allow-headers", "*"),
    ("access-control-allow-credentials", "true"),
    ("access-control-allow-private-network", "true"),
];

/// Request context encapsulating information needed for file serving
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Raw request target, used in error pages
    pub url: &'a str,
    pub if_none_match: Option<&'a str>,
    pub range: Option<&'a str>,
    /// The request itself carries `Content-Encoding`
    pub has_content_encoding: bool,
}

impl<'a> RequestContext<'a> {
    fn from_parts(parts: &'a Parts) -> Self {
        Self {
            url: request_target(parts),
            if_none_match: header_str(parts, header::IF_NONE_MATCH),
            range: header_str(parts, header::RANGE),
            has_content_encoding: parts.headers.contains_key(header::CONTENT_ENCODING),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer: Option<SocketAddr>,
) -> Response<ResponseBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let response = dispatch(&parts, body, &state).await;

    log_request(
        &parts,
        peer,
        response.status(),
        started,
        &state.config.logging,
    );
    response
}

async fn dispatch<B>(parts: &Parts, body: B, state: &AppState) -> Response<ResponseBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = parts.uri.path();

    // 1. Only origin-form targets are served
    if !path.starts_with('/') {
        return Reply::error(StatusCode::BAD_REQUEST, path, "Missing URL Parameter.")
            .into_response();
    }

    // 2. Collapse repeated slashes
    if path.contains("//") {
        let mut location = collapse_slashes(path);
        if let Some(query) = parts.uri.query() {
            location.push('?');
            location.push_str(query);
        }
        return Reply::redirect(location).into_response();
    }

    let (reply, set_cookie) = route(parts, body, state).await;
    let mut response = reply.into_response();

    if let Some(cookie) = set_cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            Err(e) => logger::log_error(&format!("Invalid session cookie: {e}")),
        }
    }

    // 3. CORS on everything past the URL checks
    if state.config.cors {
        let headers = response.headers_mut();
        for (name, value) in CORS_HEADERS {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }

    response
}

/// Robots, gate, method check, then the failure boundary around serving
async fn route<B>(parts: &Parts, body: B, state: &AppState) -> (Reply, Option<String>)
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let config = &state.config;
    let url = request_target(parts);

    // 4. robots.txt
    if config.robots && parts.uri.path() == "/robots.txt" {
        let reply = Reply::Text {
            status: StatusCode::OK,
            content_type: "text/plain",
            body: ROBOTS_TXT.to_string(),
        };
        return (reply, None);
    }

    // 5. Password gate
    let set_cookie = match auth::check(parts, body, config.credentials.as_ref(), &state.sessions).await
    {
        Gate::Pass { set_cookie } => set_cookie,
        Gate::Reply { reply, set_cookie } => return (reply, set_cookie),
    };

    // 6. Content is read-only
    if parts.method != Method::GET {
        let reply = Reply::error(StatusCode::METHOD_NOT_ALLOWED, url, "Method not allowed!");
        return (reply, set_cookie);
    }

    // 7-8. Resolve and serve, mapping I/O failures to 500
    let reply = match serve(parts, state).await {
        Ok(reply) => reply,
        Err(e) => failure_reply(url, e),
    };

    (reply, set_cookie)
}

async fn serve(parts: &Parts, state: &AppState) -> io::Result<Reply> {
    let config = &state.config;
    let ctx = RequestContext::from_parts(parts);

    let Some(request) = RequestPath::parse(&parts.uri) else {
        return Ok(Reply::error(
            StatusCode::BAD_REQUEST,
            ctx.url,
            "Malformed URL.",
        ));
    };

    let reply = match resolve::resolve(&request, config, &state.ignore).await? {
        Resolution::Redirect(location) => Reply::redirect(location),
        Resolution::Missing => static_files::serve_missing(&ctx, config).await,
        Resolution::Forbidden => {
            Reply::error(StatusCode::FORBIDDEN, ctx.url, "No permission.")
        }
        Resolution::Directory { path, relative } => {
            if config.dir_listing {
                listing::render_listing(&path, &relative, &request, &state.ignore).await?
            } else {
                static_files::serve_missing(&ctx, config).await
            }
        }
        Resolution::File(file) => static_files::serve_file(&ctx, file, config).await?,
    };

    Ok(reply)
}

/// 500 for an I/O failure that escaped resolution and serving
fn failure_reply(url: &str, error: io::Error) -> Reply {
    let err = ServeError::from(error);
    logger::log_error(&format!("Failed to serve {url}: {err}"));
    Reply::error(StatusCode::INTERNAL_SERVER_ERROR, url, err.public_message())
}

fn header_str(parts: &Parts, name: header::HeaderName) -> Option<&str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Path plus query as received
fn request_target(parts: &Parts) -> &str {
    parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path(), |pq| pq.as_str())
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

fn log_request(
    parts: &Parts,
    peer: Option<SocketAddr>,
    status: StatusCode,
    started: Instant,
    logging: &LoggingConfig,
) {
    if logging.silent {
        return;
    }

    let entry = RequestLogEntry {
        time: logging.log_timestamp.then(Local::now),
        status: status.as_u16(),
        method: parts.method.to_string(),
        url: percent_decode_str(request_target(parts))
            .decode_utf8_lossy()
            .into_owned(),
        remote_addr: logging
            .log_ip
            .then(|| peer.map(|p| p.ip().to_string()))
            .flatten(),
        user_agent: logging
            .log_agent
            .then(|| {
                parts
                    .headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .map(ToString::to_string)
            })
            .flatten(),
        elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
    };

    logger::log_request(&entry, logging.format);
}
