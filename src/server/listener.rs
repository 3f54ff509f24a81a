// Listener module
// Binds TCP listeners through socket2, stepping to another port when the
// configured one is taken

use std::io;
use std::net::SocketAddr;

use rand::Rng;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

use crate::logger;

/// Create a `TcpListener` with `SO_REUSEADDR` enabled.
///
/// `SO_REUSEADDR` allows binding to a port in `TIME_WAIT` state after a
/// restart. The socket is non-blocking with a backlog of 128.
pub fn create_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

/// Bind `addr`, or the next free port if it is in use
///
/// Ports are tried upwards from the requested one; past 65535 a random port
/// in 1024..=65535 is drawn. Each skip is logged as `PORT_OCCUPIED`.
pub fn bind_with_fallback(mut addr: SocketAddr) -> io::Result<TcpListener> {
    loop {
        match create_listener(addr) {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                let next = next_port(addr.port());
                logger::log_warning_code(
                    "PORT_OCCUPIED",
                    &format!("Port {} is in use, trying {next} instead.", addr.port()),
                );
                addr.set_port(next);
            }
            Err(e) => return Err(e),
        }
    }
}

fn next_port(port: u16) -> u16 {
    port.checked_add(1)
        .unwrap_or_else(|| rand::thread_rng().gen_range(1024..=u16::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_port() {
        assert_eq!(next_port(3000), 3001);
        assert!(next_port(u16::MAX) >= 1024);
    }

    #[tokio::test]
    async fn test_occupied_port_falls_through() {
        let taken = create_listener("127.0.0.1:0".parse().expect("addr")).expect("bind");
        let port = taken.local_addr().expect("addr").port();

        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = bind_with_fallback(addr).expect("fallback");
        assert_ne!(listener.local_addr().expect("addr").port(), port);
    }
}
