use thiserror::Error;

/// Failures parsing the opaque `{key: value, ...}` literals carried by
/// `BattleSetup` (`stat_boosts`, `pokemon_data`) — see battle-wire's
/// `BattleSetup` docs for why those fields are opaque strings at the wire
/// layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("literal is not a `{{key: value, ...}}` object: '{0}'")]
    NotAnObjectLiteral(String),
    #[error("literal is missing required key '{0}'")]
    MissingKey(&'static str),
    #[error("key '{key}' has an unparsable value '{value}'")]
    BadValue { key: &'static str, value: String },
    #[error("unknown Pokémon type '{0}'")]
    UnknownType(String),
}
