//! Password gate
//!
//! When a password is configured every request needs a live session cookie,
//! except the `POST /login` form submission that creates one.

pub mod password;
pub mod session;

pub use password::Credentials;
pub use session::SessionStore;

use crate::http::Reply;
use crate::logger;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::http::request::Parts;
use hyper::{header, Method, StatusCode};
use std::time::SystemTime;

/// Largest accepted login form body
pub const MAX_LOGIN_BODY: usize = 64 * 1024;

const LOGIN_PATH: &str = "/login";

/// Outcome of the password gate
#[derive(Debug)]
pub enum Gate {
    /// Continue with normal handling
    Pass { set_cookie: Option<String> },
    /// Answer immediately
    Reply {
        reply: Reply,
        set_cookie: Option<String>,
    },
}

impl Gate {
    const fn reply(reply: Reply) -> Self {
        Self::Reply {
            reply,
            set_cookie: None,
        }
    }
}

/// Run the gate for one request
pub async fn check<B>(
    parts: &Parts,
    body: B,
    credentials: Option<&Credentials>,
    sessions: &SessionStore,
) -> Gate
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let Some(credentials) = credentials else {
        return Gate::Pass { set_cookie: None };
    };

    let now = SystemTime::now();
    let session_id = parts
        .headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session::session_from_cookie);

    if session_id.is_some_and(|id| sessions.is_valid(id, now)) {
        return Gate::Pass { set_cookie: None };
    }

    if parts.method == Method::POST && parts.uri.path() == LOGIN_PATH {
        return login(parts, body, credentials, sessions, now).await;
    }

    Gate::reply(Reply::Login)
}

async fn login<B>(
    parts: &Parts,
    body: B,
    credentials: &Credentials,
    sessions: &SessionStore,
    now: SystemTime,
) -> Gate
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let url = parts.uri.path();
    let form = match Limited::new(body, MAX_LOGIN_BODY).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            logger::log_warning(&format!(
                "Login form larger than {MAX_LOGIN_BODY} bytes rejected"
            ));
            return Gate::reply(Reply::error(
                StatusCode::PAYLOAD_TOO_LARGE,
                url,
                "Payload too large.",
            ));
        }
        Err(e) => {
            logger::log_error(&format!("Failed to read login form: {e}"));
            return Gate::reply(Reply::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                url,
                "Internal server error.",
            ));
        }
    };

    let (password, page) = parse_login_form(&form);

    if !credentials.verify(&password) {
        return Gate::reply(Reply::Denied {
            url: url.to_string(),
            page,
        });
    }

    let id = sessions.create(now);
    let set_cookie = session::session_cookie(&id);

    match page {
        Some(page) => Gate::Reply {
            reply: Reply::redirect(page),
            set_cookie: Some(set_cookie),
        },
        None => Gate::Pass {
            set_cookie: Some(set_cookie),
        },
    }
}

/// `password` and `page` fields of an urlencoded form
fn parse_login_form(form: &[u8]) -> (String, Option<String>) {
    let mut password = String::new();
    let mut page = None;
    for (key, value) in url::form_urlencoded::parse(form) {
        match key.as_ref() {
            "password" => password = value.into_owned(),
            "page" => page = Some(value.into_owned()),
            _ => {}
        }
    }
    (password, page)
}
