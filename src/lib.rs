//! serw: a static file server for development and small deployments
//!
//! Serves a directory over HTTP/1.1 (optionally TLS) with directory listings,
//! byte ranges, weak ETags, cache headers, ignore rules and an optional
//! password gate backed by cookie sessions.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod resolve;
pub mod server;
pub mod templates;
