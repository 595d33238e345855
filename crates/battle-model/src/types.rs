//! Pokémon/move/type data model and the
//! `{key: value, ...}` (de)serialization of the two opaque `BattleSetup`
//! fields the wire codec doesn't interpret.

use crate::error::ModelError;
use crate::literal;
use std::fmt;
use std::str::FromStr;

/// One of the eighteen standard Pokémon elemental types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PokemonType {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl PokemonType {
    pub const ALL: [PokemonType; 18] = [
        PokemonType::Normal,
        PokemonType::Fire,
        PokemonType::Water,
        PokemonType::Electric,
        PokemonType::Grass,
        PokemonType::Ice,
        PokemonType::Fighting,
        PokemonType::Poison,
        PokemonType::Ground,
        PokemonType::Flying,
        PokemonType::Psychic,
        PokemonType::Bug,
        PokemonType::Rock,
        PokemonType::Ghost,
        PokemonType::Dragon,
        PokemonType::Dark,
        PokemonType::Steel,
        PokemonType::Fairy,
    ];
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PokemonType::Normal => "Normal",
            PokemonType::Fire => "Fire",
            PokemonType::Water => "Water",
            PokemonType::Electric => "Electric",
            PokemonType::Grass => "Grass",
            PokemonType::Ice => "Ice",
            PokemonType::Fighting => "Fighting",
            PokemonType::Poison => "Poison",
            PokemonType::Ground => "Ground",
            PokemonType::Flying => "Flying",
            PokemonType::Psychic => "Psychic",
            PokemonType::Bug => "Bug",
            PokemonType::Rock => "Rock",
            PokemonType::Ghost => "Ghost",
            PokemonType::Dragon => "Dragon",
            PokemonType::Dark => "Dark",
            PokemonType::Steel => "Steel",
            PokemonType::Fairy => "Fairy",
        };
        f.write_str(s)
    }
}

impl FromStr for PokemonType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Normal" => PokemonType::Normal,
            "Fire" => PokemonType::Fire,
            "Water" => PokemonType::Water,
            "Electric" => PokemonType::Electric,
            "Grass" => PokemonType::Grass,
            "Ice" => PokemonType::Ice,
            "Fighting" => PokemonType::Fighting,
            "Poison" => PokemonType::Poison,
            "Ground" => PokemonType::Ground,
            "Flying" => PokemonType::Flying,
            "Psychic" => PokemonType::Psychic,
            "Bug" => PokemonType::Bug,
            "Rock" => PokemonType::Rock,
            "Ghost" => PokemonType::Ghost,
            "Dragon" => PokemonType::Dragon,
            "Dark" => PokemonType::Dark,
            "Steel" => PokemonType::Steel,
            "Fairy" => PokemonType::Fairy,
            other => return Err(ModelError::UnknownType(other.to_owned())),
        })
    }
}

/// Whether a move's damage derives from Attack/Defense or
/// SpecialAttack/SpecialDefense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageCategory {
    Physical,
    Special,
}

impl fmt::Display for DamageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DamageCategory::Physical => "Physical",
            DamageCategory::Special => "Special",
        })
    }
}

impl FromStr for DamageCategory {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Physical" => Ok(DamageCategory::Physical),
            "Special" => Ok(DamageCategory::Special),
            other => Err(ModelError::UnknownType(other.to_owned())),
        }
    }
}

/// Base stats, self-contained so recipients never need a shared catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatBlock {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub special_attack: u32,
    pub special_defense: u32,
    pub speed: u32,
}

/// A move the player can use: name, base power, category, and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub name: String,
    pub base_power: u32,
    pub category: DamageCategory,
    pub move_type: PokemonType,
}

/// The initial per-battle stat-boost allotment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatBoosts {
    pub special_attack_uses: u32,
    pub special_defense_uses: u32,
}

impl StatBoosts {
    /// Render to the wire's opaque `{key: value, ...}` literal.
    pub fn to_literal(self) -> String {
        literal::render(&[
            ("special_attack_uses", self.special_attack_uses.to_string()),
            ("special_defense_uses", self.special_defense_uses.to_string()),
        ])
    }

    /// Parse from the wire's opaque `{key: value, ...}` literal.
    pub fn from_literal(literal: &str) -> Result<Self, ModelError> {
        let fields = literal::parse(literal)?;
        Ok(StatBoosts {
            special_attack_uses: parse_u32(&fields, "special_attack_uses")?,
            special_defense_uses: parse_u32(&fields, "special_defense_uses")?,
        })
    }
}

/// A Pokémon's identity as exchanged in `BattleSetup`: name, full stat
/// block, and one or two types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PokemonSpec {
    pub name: String,
    pub stats: StatBlock,
    pub type1: PokemonType,
    pub type2: Option<PokemonType>,
}

impl PokemonSpec {
    /// Render `stats`/`type1`/`type2` to the wire's opaque `pokemon_data`
    /// literal (the `pokemon_name` field carries `name` separately — see
    /// `battle_wire::BattleSetup`).
    pub fn to_literal(&self) -> String {
        literal::render(&[
            ("hp", self.stats.hp.to_string()),
            ("attack", self.stats.attack.to_string()),
            ("defense", self.stats.defense.to_string()),
            ("special_attack", self.stats.special_attack.to_string()),
            ("special_defense", self.stats.special_defense.to_string()),
            ("speed", self.stats.speed.to_string()),
            ("type1", self.type1.to_string()),
            (
                "type2",
                self.type2.map_or_else(|| "None".to_owned(), |t| t.to_string()),
            ),
        ])
    }

    /// Parse `name` + the opaque `pokemon_data` literal into a full spec.
    pub fn from_literal(name: &str, literal: &str) -> Result<Self, ModelError> {
        let fields = literal::parse(literal)?;
        let stats = StatBlock {
            hp: parse_u32(&fields, "hp")?,
            attack: parse_u32(&fields, "attack")?,
            defense: parse_u32(&fields, "defense")?,
            special_attack: parse_u32(&fields, "special_attack")?,
            special_defense: parse_u32(&fields, "special_defense")?,
            speed: parse_u32(&fields, "speed")?,
        };
        let type1 = fields
            .get("type1")
            .ok_or(ModelError::MissingKey("type1"))?
            .parse()?;
        let type2 = match fields.get("type2").map(String::as_str) {
            None | Some("None") => None,
            Some(t) => Some(t.parse()?),
        };
        Ok(PokemonSpec {
            name: name.to_owned(),
            stats,
            type1,
            type2,
        })
    }
}

fn parse_u32(
    fields: &std::collections::HashMap<String, String>,
    key: &'static str,
) -> Result<u32, ModelError> {
    fields
        .get(key)
        .ok_or(ModelError::MissingKey(key))?
        .parse()
        .map_err(|_| ModelError::BadValue {
            key,
            value: fields[key].clone(),
        })
}

/// The in-battle, mutable view of a Pokémon.
///
/// Created at `BattleSetup`; mutated only via `apply_damage` and
/// `consume_*_boost`; destroyed on session teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattlePokemon {
    pub spec: PokemonSpec,
    pub current_hp: i32,
    pub special_attack_uses_remaining: u32,
    pub special_defense_uses_remaining: u32,
}

impl BattlePokemon {
    pub fn new(spec: PokemonSpec, boosts: StatBoosts) -> Self {
        BattlePokemon {
            current_hp: spec.stats.hp as i32,
            spec,
            special_attack_uses_remaining: boosts.special_attack_uses,
            special_defense_uses_remaining: boosts.special_defense_uses,
        }
    }

    /// Apply damage, clamping the *displayed* HP at 0.
    pub fn apply_damage(&mut self, damage: u32) {
        self.current_hp = (self.current_hp - damage as i32).max(0);
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp <= 0
    }

    /// Consume a special-attack boost use. Returns `false` (and leaves the
    /// counter untouched) if none remain, signalling `NoBoostAvailable` to the caller.
    pub fn consume_attack_boost(&mut self) -> bool {
        if self.special_attack_uses_remaining == 0 {
            return false;
        }
        self.special_attack_uses_remaining -= 1;
        true
    }

    /// Consume a special-defense boost use. Returns `false` if none remain.
    pub fn consume_defense_boost(&mut self) -> bool {
        if self.special_defense_uses_remaining == 0 {
            return false;
        }
        self.special_defense_uses_remaining -= 1;
        true
    }
}
