//! Typed payloads for the eleven message kinds in the wire schema.
//!
//! `stat_boosts` and `pokemon_data` on [`BattleSetup`] are carried as opaque
//! `{key: value, ...}` literal strings — the wire codec does not know their
//! internal shape; `battle-model`/`battle-session` parse them.

use std::fmt;

/// How the peers expect datagrams to be addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunicationMode {
    P2P,
    Broadcast,
}

impl fmt::Display for CommunicationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommunicationMode::P2P => "P2P",
            CommunicationMode::Broadcast => "BROADCAST",
        })
    }
}

impl std::str::FromStr for CommunicationMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P2P" => Ok(CommunicationMode::P2P),
            "BROADCAST" => Ok(CommunicationMode::Broadcast),
            _ => Err(()),
        }
    }
}

/// Chat payload discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatContentType {
    Text,
    Sticker,
}

impl fmt::Display for ChatContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChatContentType::Text => "TEXT",
            ChatContentType::Sticker => "STICKER",
        })
    }
}

impl std::str::FromStr for ChatContentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEXT" => Ok(ChatContentType::Text),
            "STICKER" => Ok(ChatContentType::Sticker),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub ack_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    pub sequence_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponse {
    pub sequence_number: u64,
    pub seed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectatorRequest {
    pub sequence_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleSetup {
    pub sequence_number: u64,
    pub communication_mode: CommunicationMode,
    pub pokemon_name: String,
    /// Opaque `{special_attack_uses: N, special_defense_uses: N}` literal.
    pub stat_boosts: String,
    /// Opaque `{hp: N, attack: N, ...}` literal — the full stat block.
    pub pokemon_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackAnnounce {
    pub sequence_number: u64,
    pub move_name: String,
    pub use_attack_boost: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefenseAnnounce {
    pub sequence_number: u64,
    pub use_defense_boost: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationReport {
    pub sequence_number: u64,
    pub attacker: String,
    pub move_used: String,
    pub remaining_health: i32,
    pub damage_dealt: u32,
    pub defender_hp_remaining: i32,
    pub status_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationConfirm {
    pub sequence_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub sequence_number: u64,
    pub attacker: String,
    pub move_used: String,
    pub damage_dealt: u32,
    pub defender_hp_remaining: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOver {
    pub sequence_number: u64,
    pub winner: String,
    pub loser: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sequence_number: u64,
    pub sender_name: String,
    pub content_type: ChatContentType,
    pub message_text: Option<String>,
    pub sticker_data: Option<String>,
}

/// All wire message kinds in the v1 protocol.
///
/// Every variant except [`Message::Ack`] carries a `sequence_number` scoped
/// to the sender; see [`Message::sequence_number`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Ack(Ack),
    HandshakeRequest(HandshakeRequest),
    HandshakeResponse(HandshakeResponse),
    SpectatorRequest(SpectatorRequest),
    BattleSetup(BattleSetup),
    AttackAnnounce(AttackAnnounce),
    DefenseAnnounce(DefenseAnnounce),
    CalculationReport(CalculationReport),
    CalculationConfirm(CalculationConfirm),
    ResolutionRequest(ResolutionRequest),
    GameOver(GameOver),
    ChatMessage(ChatMessage),
}

impl Message {
    /// The sender-scoped sequence number, or `None` for [`Message::Ack`]
    /// (which carries `ack_number` instead — see [`Message::ack_number`]).
    pub fn sequence_number(&self) -> Option<u64> {
        match self {
            Message::Ack(_) => None,
            Message::HandshakeRequest(m) => Some(m.sequence_number),
            Message::HandshakeResponse(m) => Some(m.sequence_number),
            Message::SpectatorRequest(m) => Some(m.sequence_number),
            Message::BattleSetup(m) => Some(m.sequence_number),
            Message::AttackAnnounce(m) => Some(m.sequence_number),
            Message::DefenseAnnounce(m) => Some(m.sequence_number),
            Message::CalculationReport(m) => Some(m.sequence_number),
            Message::CalculationConfirm(m) => Some(m.sequence_number),
            Message::ResolutionRequest(m) => Some(m.sequence_number),
            Message::GameOver(m) => Some(m.sequence_number),
            Message::ChatMessage(m) => Some(m.sequence_number),
        }
    }

    /// The `ack_number` carried by an [`Message::Ack`], `None` otherwise.
    pub fn ack_number(&self) -> Option<u64> {
        match self {
            Message::Ack(a) => Some(a.ack_number),
            _ => None,
        }
    }

    /// `message_type` tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Ack(_) => "ACK",
            Message::HandshakeRequest(_) => "HandshakeRequest",
            Message::HandshakeResponse(_) => "HandshakeResponse",
            Message::SpectatorRequest(_) => "SpectatorRequest",
            Message::BattleSetup(_) => "BattleSetup",
            Message::AttackAnnounce(_) => "AttackAnnounce",
            Message::DefenseAnnounce(_) => "DefenseAnnounce",
            Message::CalculationReport(_) => "CalculationReport",
            Message::CalculationConfirm(_) => "CalculationConfirm",
            Message::ResolutionRequest(_) => "ResolutionRequest",
            Message::GameOver(_) => "GameOver",
            Message::ChatMessage(_) => "ChatMessage",
        }
    }
}
