//! The top-level failure type surfaced to the driver.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    PeerLost,
    ProtocolDesync,
    MalformedMessage,
    Io,
}

#[derive(Debug)]
pub struct BattleFailure {
    pub kind: FailureKind,
    pub cause: String,
}

impl BattleFailure {
    pub fn new(kind: FailureKind, cause: impl Into<String>) -> Self {
        BattleFailure { kind, cause: cause.into() }
    }

    /// Process exit code: 0 normal, non-zero per failure kind.
    pub fn exit_code(&self) -> i32 {
        match self.kind {
            FailureKind::PeerLost => 1,
            FailureKind::ProtocolDesync => 2,
            FailureKind::MalformedMessage => 3,
            FailureKind::Io => 4,
        }
    }
}

impl fmt::Display for BattleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.cause)
    }
}

impl std::error::Error for BattleFailure {}

impl From<std::io::Error> for BattleFailure {
    fn from(e: std::io::Error) -> Self {
        BattleFailure::new(FailureKind::Io, e.to_string())
    }
}

impl From<battle_net::ReliabilityError> for BattleFailure {
    fn from(e: battle_net::ReliabilityError) -> Self {
        match e {
            battle_net::ReliabilityError::PeerUnreachable(peer) => {
                BattleFailure::new(FailureKind::PeerLost, format!("{peer} stopped responding"))
            }
            other => BattleFailure::new(FailureKind::Io, other.to_string()),
        }
    }
}

impl From<battle_session::SessionError> for BattleFailure {
    fn from(e: battle_session::SessionError) -> Self {
        use battle_session::SessionError::*;
        match e {
            PeerLost => BattleFailure::new(FailureKind::PeerLost, e.to_string()),
            ProtocolDesync => BattleFailure::new(FailureKind::ProtocolDesync, e.to_string()),
            other => BattleFailure::new(FailureKind::MalformedMessage, other.to_string()),
        }
    }
}
