//! The deterministic damage engine: a seeded 64-bit LCG plus a
//! fixed-order floating point formula, so two peers given the same seed and
//! the same sequence of calls compute bit-identical results.

use crate::types::{Move, PokemonType};

/// Numerical-Recipes-style 64-bit LCG, seeded once per battle from the
/// `HandshakeResponse.seed` and advanced once per damage roll.
///
/// Grounded on the same constants as a Lehmer/NR LCG; the formula itself
/// (not just the constants) is part of the wire contract — every peer must
/// run exactly this, in exactly this order, or checksums diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn seeded(seed: u32) -> Self {
        Rng { state: seed as u64 }
    }

    /// Advance the generator and return a uniform `f64` in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.state >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Type-effectiveness multiplier for `attack_type` hitting `defend_type`.
/// `2.0` super effective, `0.5` not very effective, `0.0` immune, `1.0`
/// neutral.
fn effectiveness(attack_type: PokemonType, defend_type: PokemonType) -> f64 {
    use PokemonType::*;
    match (attack_type, defend_type) {
        (Fire, Grass | Ice | Bug | Steel) => 2.0,
        (Fire, Fire | Water | Rock | Dragon) => 0.5,
        (Water, Fire | Ground | Rock) => 2.0,
        (Water, Water | Grass | Dragon) => 0.5,
        (Electric, Water | Flying) => 2.0,
        (Electric, Electric | Grass | Dragon) => 0.5,
        (Electric, Ground) => 0.0,
        (Grass, Water | Ground | Rock) => 2.0,
        (Grass, Fire | Grass | Poison | Flying | Bug | Dragon | Steel) => 0.5,
        (Ice, Grass | Ground | Flying | Dragon) => 2.0,
        (Ice, Fire | Water | Ice | Steel) => 0.5,
        (Fighting, Normal | Ice | Rock | Dark | Steel) => 2.0,
        (Fighting, Poison | Flying | Psychic | Bug | Fairy) => 0.5,
        (Fighting, Ghost) => 0.0,
        (Poison, Grass | Fairy) => 2.0,
        (Poison, Poison | Ground | Rock | Ghost) => 0.5,
        (Poison, Steel) => 0.0,
        (Ground, Fire | Electric | Poison | Rock | Steel) => 2.0,
        (Ground, Grass | Bug) => 0.5,
        (Ground, Flying) => 0.0,
        (Flying, Grass | Fighting | Bug) => 2.0,
        (Flying, Electric | Rock | Steel) => 0.5,
        (Psychic, Fighting | Poison) => 2.0,
        (Psychic, Psychic | Steel) => 0.5,
        (Psychic, Dark) => 0.0,
        (Bug, Grass | Psychic | Dark) => 2.0,
        (Bug, Fire | Fighting | Poison | Flying | Ghost | Steel | Fairy) => 0.5,
        (Rock, Fire | Ice | Flying | Bug) => 2.0,
        (Rock, Fighting | Ground | Steel) => 0.5,
        (Ghost, Psychic | Ghost) => 2.0,
        (Ghost, Dark) => 0.5,
        (Ghost, Normal) => 0.0,
        (Dragon, Dragon) => 2.0,
        (Dragon, Steel) => 0.5,
        (Dragon, Fairy) => 0.0,
        (Dark, Psychic | Ghost) => 2.0,
        (Dark, Fighting | Dark | Fairy) => 0.5,
        (Steel, Ice | Rock | Fairy) => 2.0,
        (Steel, Fire | Water | Electric | Steel) => 0.5,
        (Fairy, Fighting | Dragon | Dark) => 2.0,
        (Fairy, Fire | Poison | Steel) => 0.5,
        _ => 1.0,
    }
}

/// The outcome of a single damage calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageResult {
    pub damage: u32,
    pub effectiveness_tier: EffectivenessTier,
}

/// Coarse bucket of `effectiveness` used to choose the status message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectivenessTier {
    NoEffect,
    NotVeryEffective,
    Neutral,
    SuperEffective,
}

impl EffectivenessTier {
    pub fn status_message(self) -> &'static str {
        match self {
            EffectivenessTier::NoEffect => "It had no effect.",
            EffectivenessTier::NotVeryEffective => "It's not very effective...",
            EffectivenessTier::Neutral => "The attack connects.",
            EffectivenessTier::SuperEffective => "It's super effective!",
        }
    }

    fn from_multiplier(m: f64) -> Self {
        if m == 0.0 {
            EffectivenessTier::NoEffect
        } else if m < 1.0 {
            EffectivenessTier::NotVeryEffective
        } else if m > 1.0 {
            EffectivenessTier::SuperEffective
        } else {
            EffectivenessTier::Neutral
        }
    }
}

/// Compute damage for `attacker` using `move_used` against `defender`.
///
/// Evaluation order is fixed and must not be reassociated: STAB, then
/// Type1, then Type2, then the random roll, each multiplying the running
/// `modifier` left to right; `base` is computed once, before `modifier`.
/// Both peers run this function against the same `rng` state and get the
/// same `damage` back, which is how CalculationReport checksums agree.
pub fn calculate_damage(
    attacker_level_stat: u32,
    attacker_type1: PokemonType,
    attacker_type2: Option<PokemonType>,
    defender_defense_stat: u32,
    defender_type1: PokemonType,
    defender_type2: Option<PokemonType>,
    move_used: &Move,
    rng: &mut Rng,
) -> DamageResult {
    let attack = attacker_level_stat as f64;
    let defense = defender_defense_stat.max(1) as f64;
    let power = move_used.base_power as f64;

    let base = ((2.0 * 50.0 / 5.0 + 2.0) * power * attack / defense) / 50.0 + 2.0;

    let stab = if move_used.move_type == attacker_type1
        || attacker_type2.is_some_and(|t| t == move_used.move_type)
    {
        1.5
    } else {
        1.0
    };

    let type1_mult = effectiveness(move_used.move_type, defender_type1);
    let type2_mult = defender_type2.map_or(1.0, |t| effectiveness(move_used.move_type, t));
    let total_effectiveness = type1_mult * type2_mult;

    let random = 0.85 + rng.next_f64() * 0.15;

    let modifier = stab * type1_mult * type2_mult * random;
    let damage = (base * modifier).floor().max(1.0) as u32;

    let damage = if total_effectiveness == 0.0 { 0 } else { damage };

    DamageResult {
        damage,
        effectiveness_tier: EffectivenessTier::from_multiplier(total_effectiveness),
    }
}
