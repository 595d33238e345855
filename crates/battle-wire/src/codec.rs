//! Encode/decode for the newline `key: value` wire format.
//!
//! The first line is always `message_type: <KIND>`. Unknown keys are
//! ignored on decode; a known kind missing a required key is rejected with
//! [`WireError`]. `encode` writes fields in a fixed order per kind so that
//! byte-identical inputs produce byte-identical output on both peers.

use crate::error::WireError;
use crate::types::*;
use std::collections::HashMap;

/// Encode a [`Message`] into its newline-delimited wire form.
///
/// Deterministic: the same `Message` value always encodes to the same
/// bytes, which is what lets the four-step turn exchange be replayed as a
/// golden test vector.
pub fn encode(message: &Message) -> Vec<u8> {
    let mut lines = vec![format!("message_type: {}", message.kind())];

    match message {
        Message::Ack(m) => {
            lines.push(format!("ack_number: {}", m.ack_number));
        }
        Message::HandshakeRequest(m) => {
            lines.push(format!("sequence_number: {}", m.sequence_number));
        }
        Message::HandshakeResponse(m) => {
            lines.push(format!("sequence_number: {}", m.sequence_number));
            lines.push(format!("seed: {}", m.seed));
        }
        Message::SpectatorRequest(m) => {
            lines.push(format!("sequence_number: {}", m.sequence_number));
        }
        Message::BattleSetup(m) => {
            lines.push(format!("sequence_number: {}", m.sequence_number));
            lines.push(format!("communication_mode: {}", m.communication_mode));
            lines.push(format!("pokemon_name: {}", m.pokemon_name));
            lines.push(format!("stat_boosts: {}", m.stat_boosts));
            lines.push(format!("pokemon_data: {}", m.pokemon_data));
        }
        Message::AttackAnnounce(m) => {
            lines.push(format!("sequence_number: {}", m.sequence_number));
            lines.push(format!("move_name: {}", m.move_name));
            lines.push(format!("use_attack_boost: {}", m.use_attack_boost));
        }
        Message::DefenseAnnounce(m) => {
            lines.push(format!("sequence_number: {}", m.sequence_number));
            lines.push(format!("use_defense_boost: {}", m.use_defense_boost));
        }
        Message::CalculationReport(m) => {
            lines.push(format!("sequence_number: {}", m.sequence_number));
            lines.push(format!("attacker: {}", m.attacker));
            lines.push(format!("move_used: {}", m.move_used));
            lines.push(format!("remaining_health: {}", m.remaining_health));
            lines.push(format!("damage_dealt: {}", m.damage_dealt));
            lines.push(format!(
                "defender_hp_remaining: {}",
                m.defender_hp_remaining
            ));
            lines.push(format!("status_message: {}", m.status_message));
        }
        Message::CalculationConfirm(m) => {
            lines.push(format!("sequence_number: {}", m.sequence_number));
        }
        Message::ResolutionRequest(m) => {
            lines.push(format!("sequence_number: {}", m.sequence_number));
            lines.push(format!("attacker: {}", m.attacker));
            lines.push(format!("move_used: {}", m.move_used));
            lines.push(format!("damage_dealt: {}", m.damage_dealt));
            lines.push(format!(
                "defender_hp_remaining: {}",
                m.defender_hp_remaining
            ));
        }
        Message::GameOver(m) => {
            lines.push(format!("sequence_number: {}", m.sequence_number));
            lines.push(format!("winner: {}", m.winner));
            lines.push(format!("loser: {}", m.loser));
        }
        Message::ChatMessage(m) => {
            lines.push(format!("sequence_number: {}", m.sequence_number));
            lines.push(format!("sender_name: {}", m.sender_name));
            lines.push(format!("content_type: {}", m.content_type));
            if let Some(text) = &m.message_text {
                lines.push(format!("message_text: {}", text));
            }
            if let Some(sticker) = &m.sticker_data {
                lines.push(format!("sticker_data: {}", sticker));
            }
        }
    }

    lines.join("\n").into_bytes()
}

/// Decode a datagram into a [`Message`], or reject it as [`WireError`].
pub fn decode(bytes: &[u8]) -> Result<Message, WireError> {
    let text = std::str::from_utf8(bytes).map_err(|_| WireError::NotUtf8)?;
    let mut lines = text.lines();

    let kind = lines
        .next()
        .and_then(|first| first.strip_prefix("message_type:"))
        .map(str::trim)
        .ok_or(WireError::MissingMessageType)?
        .to_owned();

    let mut fields: HashMap<&str, &str> = HashMap::new();
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim(), value.trim());
        }
    }

    match kind.as_str() {
        "ACK" => Ok(Message::Ack(Ack {
            ack_number: parse_required(&fields, "ACK", "ack_number")?,
        })),
        "HandshakeRequest" => Ok(Message::HandshakeRequest(HandshakeRequest {
            sequence_number: parse_required(&fields, "HandshakeRequest", "sequence_number")?,
        })),
        "HandshakeResponse" => Ok(Message::HandshakeResponse(HandshakeResponse {
            sequence_number: parse_required(&fields, "HandshakeResponse", "sequence_number")?,
            seed: parse_required(&fields, "HandshakeResponse", "seed")?,
        })),
        "SpectatorRequest" => Ok(Message::SpectatorRequest(SpectatorRequest {
            sequence_number: parse_required(&fields, "SpectatorRequest", "sequence_number")?,
        })),
        "BattleSetup" => Ok(Message::BattleSetup(BattleSetup {
            sequence_number: parse_required(&fields, "BattleSetup", "sequence_number")?,
            communication_mode: parse_required(&fields, "BattleSetup", "communication_mode")?,
            pokemon_name: required_str(&fields, "BattleSetup", "pokemon_name")?,
            stat_boosts: required_str(&fields, "BattleSetup", "stat_boosts")?,
            pokemon_data: required_str(&fields, "BattleSetup", "pokemon_data")?,
        })),
        "AttackAnnounce" => Ok(Message::AttackAnnounce(AttackAnnounce {
            sequence_number: parse_required(&fields, "AttackAnnounce", "sequence_number")?,
            move_name: required_str(&fields, "AttackAnnounce", "move_name")?,
            use_attack_boost: fields
                .get("use_attack_boost")
                .map(|v| parse_field("AttackAnnounce", "use_attack_boost", v))
                .transpose()?
                .unwrap_or(false),
        })),
        "DefenseAnnounce" => Ok(Message::DefenseAnnounce(DefenseAnnounce {
            sequence_number: parse_required(&fields, "DefenseAnnounce", "sequence_number")?,
            use_defense_boost: fields
                .get("use_defense_boost")
                .map(|v| parse_field("DefenseAnnounce", "use_defense_boost", v))
                .transpose()?
                .unwrap_or(false),
        })),
        "CalculationReport" => Ok(Message::CalculationReport(CalculationReport {
            sequence_number: parse_required(&fields, "CalculationReport", "sequence_number")?,
            attacker: required_str(&fields, "CalculationReport", "attacker")?,
            move_used: required_str(&fields, "CalculationReport", "move_used")?,
            remaining_health: parse_required(&fields, "CalculationReport", "remaining_health")?,
            damage_dealt: parse_required(&fields, "CalculationReport", "damage_dealt")?,
            defender_hp_remaining: parse_required(
                &fields,
                "CalculationReport",
                "defender_hp_remaining",
            )?,
            status_message: required_str(&fields, "CalculationReport", "status_message")?,
        })),
        "CalculationConfirm" => Ok(Message::CalculationConfirm(CalculationConfirm {
            sequence_number: parse_required(&fields, "CalculationConfirm", "sequence_number")?,
        })),
        "ResolutionRequest" => Ok(Message::ResolutionRequest(ResolutionRequest {
            sequence_number: parse_required(&fields, "ResolutionRequest", "sequence_number")?,
            attacker: required_str(&fields, "ResolutionRequest", "attacker")?,
            move_used: required_str(&fields, "ResolutionRequest", "move_used")?,
            damage_dealt: parse_required(&fields, "ResolutionRequest", "damage_dealt")?,
            defender_hp_remaining: parse_required(
                &fields,
                "ResolutionRequest",
                "defender_hp_remaining",
            )?,
        })),
        "GameOver" => Ok(Message::GameOver(GameOver {
            sequence_number: parse_required(&fields, "GameOver", "sequence_number")?,
            winner: required_str(&fields, "GameOver", "winner")?,
            loser: required_str(&fields, "GameOver", "loser")?,
        })),
        "ChatMessage" => {
            let content_type: ChatContentType =
                parse_required(&fields, "ChatMessage", "content_type")?;
            Ok(Message::ChatMessage(ChatMessage {
                sequence_number: parse_required(&fields, "ChatMessage", "sequence_number")?,
                sender_name: required_str(&fields, "ChatMessage", "sender_name")?,
                content_type,
                message_text: fields.get("message_text").map(|v| v.to_string()),
                sticker_data: fields.get("sticker_data").map(|v| v.to_string()),
            }))
        }
        other => Err(WireError::UnknownMessageType(other.to_owned())),
    }
}

fn required_str(
    fields: &HashMap<&str, &str>,
    kind: &'static str,
    field: &'static str,
) -> Result<String, WireError> {
    fields
        .get(field)
        .map(|v| v.to_string())
        .ok_or(WireError::MissingField { kind, field })
}

fn parse_field<T: std::str::FromStr>(
    kind: &'static str,
    field: &'static str,
    value: &str,
) -> Result<T, WireError> {
    value.parse().map_err(|_| WireError::BadField {
        kind,
        field,
        value: value.to_owned(),
    })
}

fn parse_required<T: std::str::FromStr>(
    fields: &HashMap<&str, &str>,
    kind: &'static str,
    field: &'static str,
) -> Result<T, WireError> {
    let value = fields.get(field).ok_or(WireError::MissingField { kind, field })?;
    parse_field(kind, field, value)
}
