//! TCP transport setup for the tokio client.

use std::io;
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Open a TCP connection to `host:port` with keepalive enabled.
pub async fn connect_tcp(host: &str, port: u16) -> io::Result<TcpStream> {
    let stream = TcpStream::connect((host, port)).await?;
    if let Err(e) = enable_keepalive(&stream) {
        warn!(error = %e, "failed to enable TCP keepalive");
    }
    debug!(host, port, peer = ?stream.peer_addr().ok(), "tcp connected");
    Ok(stream)
}

fn enable_keepalive(stream: &TcpStream) -> io::Result<()> {
    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)
}
