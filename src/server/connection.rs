// Connection module
// Serves one accepted TCP connection (plain or TLS) in its own task

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Handle a single connection in a spawned task.
///
/// The TLS handshake, when an acceptor is given, runs inside the task so a
/// slow client cannot stall the accept loop.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    tls: Option<&TlsAcceptor>,
) {
    let state = Arc::clone(state);
    let tls = tls.cloned();

    tokio::spawn(async move {
        match tls {
            Some(acceptor) => match acceptor.accept(stream).await {
                Ok(stream) => serve(stream, peer_addr, state).await,
                Err(e) => logger::log_connection_error(&format!("TLS handshake with {peer_addr}: {e}")),
            },
            None => serve(stream, peer_addr, state).await,
        }
    });
}

async fn serve<S>(stream: S, peer_addr: SocketAddr, state: Arc<AppState>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);

    let service = service_fn(move |req| {
        let state = Arc::clone(&state);
        async move {
            Ok::<_, std::convert::Infallible>(
                handler::handle_request(req, state, Some(peer_addr)).await,
            )
        }
    });

    if let Err(err) = http1::Builder::new()
        .keep_alive(true)
        .serve_connection(io, service)
        .await
    {
        logger::log_connection_error(&err);
    }
}
