// Server module entry
// Binds the listener, prints the banner and runs the accept loop until a
// shutdown signal arrives

pub mod connection;
pub mod listener;
pub mod signal;
pub mod tls;

use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::config::{AppState, ServerConfig};
use crate::error::StartupError;
use crate::logger::{self, Banner};

/// Run the server until SIGINT/SIGTERM
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    let addr = resolve_address(&config.host, config.port).await?;

    let acceptor = match &config.tls {
        Some(files) if tls::files_usable(files) => Some(tls::load_acceptor(files)?),
        _ => None,
    };

    let listener = listener::bind_with_fallback(addr)?;
    let bound = listener.local_addr()?;

    let state = Arc::new(AppState::new(config));
    announce(&state.config, bound, acceptor.is_some());

    let shutdown = Arc::new(Notify::new());
    signal::start_signal_handler(Arc::clone(&shutdown));

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    connection::accept_connection(stream, peer_addr, &state, acceptor.as_ref());
                }
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },
            () = shutdown.notified() => break,
        }
    }

    logger::log_shutdown();
    Ok(())
}

/// First socket address the host name resolves to
async fn resolve_address(host: &str, port: u16) -> Result<SocketAddr, StartupError> {
    let invalid = |reason: String| StartupError::Address {
        addr: format!("{host}:{port}"),
        reason,
    };

    tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("no addresses found".to_string()))
}

fn announce(config: &ServerConfig, bound: SocketAddr, https: bool) {
    let logging = &config.logging;
    if logging.silent {
        return;
    }
    if logging.clear_console {
        logger::clear_console();
    }

    let scheme = if https { "https" } else { "http" };
    let port = bound.port();
    let local = format!("{scheme}://localhost:{port}");
    let network = network_url(&config.host, bound, scheme);

    logger::log_server_start(&Banner {
        local: &local,
        network: network.as_deref(),
        protected: config.credentials.is_some(),
    });
}

/// URL other machines can use, `None` for loopback host names
fn network_url(host: &str, bound: SocketAddr, scheme: &str) -> Option<String> {
    if host.to_ascii_lowercase().contains("localhost") {
        return None;
    }
    let ip = if bound.ip().is_unspecified() {
        lan_address().unwrap_or_else(|| bound.ip())
    } else {
        bound.ip()
    };
    Some(match ip {
        IpAddr::V4(v4) => format!("{scheme}://{v4}:{}", bound.port()),
        IpAddr::V6(v6) => format!("{scheme}://[{v6}]:{}", bound.port()),
    })
}

/// Address of the outbound interface; connecting a UDP socket sends nothing
fn lan_address() -> Option<IpAddr> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).ok()?;
    socket.connect(("192.0.2.1", 80)).ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}
