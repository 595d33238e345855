use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no special-attack boost uses remain")]
    NoBoostAvailable,
    #[error("received AttackAnnounce while it is the local peer's own turn")]
    IllegalTurn,
    #[error("remote peer stopped responding after the retry budget was exhausted")]
    PeerLost,
    #[error("calculation disagreement persisted through the resolution exchange")]
    ProtocolDesync,
    #[error("sticker payload exceeds the 1400-byte cap")]
    StickerOversize,
    #[error("battle already has a winner and cannot accept further moves")]
    BattleAlreadyOver,
}
