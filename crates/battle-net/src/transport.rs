//! The datagram transport seam: production code talks to a real UDP socket,
//! tests talk to an in-memory loopback that can drop, delay, duplicate, or
//! reorder datagrams on purpose.

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// Anything that can send and receive whole datagrams, addressed by
/// `SocketAddr`. `battle-session` is written against this trait, never
/// against `UdpSocket` directly, so fault-injecting tests can swap it in.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_to(&self, bytes: &[u8], target: SocketAddr) -> io::Result<()>;

    /// Wait for the next inbound datagram. Returns its payload and sender.
    async fn recv_from(&self) -> io::Result<(Vec<u8>, SocketAddr)>;

    /// The address this transport is bound to (for logging/diagnostics).
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

/// Production transport: a bound `tokio::net::UdpSocket`.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(UdpTransport { socket })
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send_to(&self, bytes: &[u8], target: SocketAddr) -> io::Result<()> {
        self.socket.send_to(bytes, target).await?;
        Ok(())
    }

    async fn recv_from(&self) -> io::Result<(Vec<u8>, SocketAddr)> {
        let mut buf = vec![0u8; 2048];
        let (n, from) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(n);
        Ok((buf, from))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
