use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReliabilityError {
    #[error("socket I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("peer {0} did not ack after the retry budget was exhausted")]
    PeerUnreachable(SocketAddr),
    #[error("datagram from {0} failed to decode: {1}")]
    Undecodable(SocketAddr, battle_wire::WireError),
}
