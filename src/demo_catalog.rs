//! A tiny built-in Pokémon/move catalog so the CLI has something to
//! battle with. Real catalogs (CSV ingestion, a full movedex) are an
//! external collaborator's problem, not the engine's — this is just
//! enough to drive the binary end to end.

use battle_model::{DamageCategory, Move, PokemonSpec, PokemonType, StatBlock};

pub fn pokemon_named(name: &str) -> Option<PokemonSpec> {
    let (stats, type1, type2): (StatBlock, PokemonType, Option<PokemonType>) = match name {
        "Pikachu" => (
            StatBlock { hp: 100, attack: 55, defense: 40, special_attack: 50, special_defense: 50, speed: 90 },
            PokemonType::Electric,
            None,
        ),
        "Charmander" => (
            StatBlock { hp: 100, attack: 52, defense: 43, special_attack: 60, special_defense: 50, speed: 65 },
            PokemonType::Fire,
            None,
        ),
        "Squirtle" => (
            StatBlock { hp: 100, attack: 48, defense: 65, special_attack: 50, special_defense: 64, speed: 43 },
            PokemonType::Water,
            None,
        ),
        "Bulbasaur" => (
            StatBlock { hp: 100, attack: 49, defense: 49, special_attack: 65, special_defense: 65, speed: 45 },
            PokemonType::Grass,
            Some(PokemonType::Poison),
        ),
        _ => return None,
    };
    Some(PokemonSpec { name: name.to_owned(), stats, type1, type2 })
}

pub fn move_named(name: &str) -> Option<Move> {
    let (base_power, category, move_type) = match name {
        "Thunderbolt" => (90, DamageCategory::Special, PokemonType::Electric),
        "Flamethrower" => (90, DamageCategory::Special, PokemonType::Fire),
        "Water Gun" => (40, DamageCategory::Special, PokemonType::Water),
        "Vine Whip" => (45, DamageCategory::Special, PokemonType::Grass),
        "Tackle" => (40, DamageCategory::Physical, PokemonType::Normal),
        "Quick Attack" => (40, DamageCategory::Physical, PokemonType::Normal),
        _ => return None,
    };
    Some(Move { name: name.to_owned(), base_power, category, move_type })
}
