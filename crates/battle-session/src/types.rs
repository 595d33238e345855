use std::fmt;
use std::net::SocketAddr;

/// A remote party's (IP, UDP port) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerEndpoint(pub SocketAddr);

impl fmt::Display for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SocketAddr> for PeerEndpoint {
    fn from(addr: SocketAddr) -> Self {
        PeerEndpoint(addr)
    }
}

/// A peer's part in a battle. Host is the unique listener and
/// authoritative broadcaster; Joiner is the unique battle counterparty;
/// Spectators are observed, read-only, by the Host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Joiner,
    Spectator,
}

impl Role {
    /// The name this peer identifies itself as in chat `sender_name` and
    /// in `CalculationReport.attacker`/`GameOver.winner` fields.
    pub fn display_name(self) -> &'static str {
        match self {
            Role::Host => "Host",
            Role::Joiner => "Joiner",
            Role::Spectator => "Spectator",
        }
    }
}
