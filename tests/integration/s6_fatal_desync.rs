use battle_model::{DamageCategory, Move, PokemonSpec, PokemonType, StatBlock, StatBoosts};
use battle_session::{BattleState, GameOverReason, PeerEndpoint, Role, Session, UiEvent};
use battle_wire::Message;

fn pikachu() -> PokemonSpec {
    PokemonSpec {
        name: "Pikachu".into(),
        stats: StatBlock { hp: 100, attack: 55, defense: 40, special_attack: 50, special_defense: 50, speed: 90 },
        type1: PokemonType::Electric,
        type2: None,
    }
}

fn squirtle() -> PokemonSpec {
    PokemonSpec {
        name: "Squirtle".into(),
        stats: StatBlock { hp: 100, attack: 48, defense: 65, special_attack: 50, special_defense: 64, speed: 43 },
        type1: PokemonType::Water,
        type2: None,
    }
}

fn thunderbolt() -> Move {
    Move { name: "Thunderbolt".into(), base_power: 90, category: DamageCategory::Special, move_type: PokemonType::Electric }
}

fn boosts() -> StatBoosts {
    StatBoosts { special_attack_uses: 5, special_defense_uses: 5 }
}

fn move_catalog(name: &str) -> Option<Move> {
    (name == "Thunderbolt").then(thunderbolt)
}

#[test]
fn persistent_disagreement_ends_the_battle_on_both_sides_with_no_further_messages() {
    let host_addr: std::net::SocketAddr = "127.0.0.1:9001".parse().unwrap();
    let joiner_addr: std::net::SocketAddr = "127.0.0.1:9002".parse().unwrap();

    let mut host = Session::new(Role::Host, "Ash", move_catalog);
    let mut joiner = Session::new(Role::Joiner, "Misty", move_catalog);

    let connect = joiner.connect(PeerEndpoint::from(host_addr));
    let handshake = host
        .handle_message(PeerEndpoint::from(joiner_addr), connect.outbound[0].message.clone())
        .unwrap();
    joiner
        .handle_message(PeerEndpoint::from(host_addr), handshake.outbound[0].message.clone())
        .unwrap();

    // A permanent, not transient, seed divergence: every subsequent
    // exchange — including the resolution round — keeps disagreeing.
    joiner.seed = joiner.seed.wrapping_add(1);

    let host_setup = host.start_battle(pikachu(), boosts()).unwrap();
    let joiner_setup = joiner.start_battle(squirtle(), boosts()).unwrap();
    joiner
        .handle_message(PeerEndpoint::from(host_addr), host_setup.outbound[0].message.clone())
        .unwrap();
    host.handle_message(PeerEndpoint::from(joiner_addr), joiner_setup.outbound[0].message.clone())
        .unwrap();

    let attack = host.submit_move(thunderbolt(), false).unwrap();
    let defend = joiner
        .handle_message(PeerEndpoint::from(host_addr), attack.outbound[0].message.clone())
        .unwrap();
    let host_after_defend = host
        .handle_message(PeerEndpoint::from(joiner_addr), defend.outbound[0].message.clone())
        .unwrap();

    let joiner_calc = defend
        .outbound
        .iter()
        .find_map(|out| match &out.message {
            Message::CalculationReport(r) => Some(r.clone()),
            _ => None,
        })
        .expect("the defender reports its own calculation alongside the DefenseAnnounce");
    let host_calc = host_after_defend
        .outbound
        .iter()
        .find_map(|out| match &out.message {
            Message::CalculationReport(r) => Some(r.clone()),
            _ => None,
        })
        .expect("the attacker reports its own calculation once it learns the defender's boost choice");

    let host_after_joiner_calc = host
        .handle_message(PeerEndpoint::from(joiner_addr), Message::CalculationReport(joiner_calc.clone()))
        .unwrap();
    let joiner_after_host_calc = joiner
        .handle_message(PeerEndpoint::from(host_addr), Message::CalculationReport(host_calc))
        .unwrap();

    let host_resolution_request = host_after_joiner_calc
        .outbound
        .iter()
        .find_map(|out| match &out.message {
            Message::ResolutionRequest(r) => Some(r.clone()),
            _ => None,
        })
        .expect("the Host must detect the mismatch and ask for resolution");
    let joiner_resolution_request = joiner_after_host_calc
        .outbound
        .iter()
        .find_map(|out| match &out.message {
            Message::ResolutionRequest(r) => Some(r.clone()),
            _ => None,
        })
        .expect("the Joiner must detect the mismatch and ask for resolution");
    assert_ne!(
        host_resolution_request.damage_dealt, joiner_resolution_request.damage_dealt,
        "the two sides must genuinely disagree for this scenario to be meaningful"
    );

    let host_outcome = host
        .handle_message(PeerEndpoint::from(joiner_addr), Message::ResolutionRequest(joiner_resolution_request))
        .unwrap();
    let joiner_outcome = joiner
        .handle_message(PeerEndpoint::from(host_addr), Message::ResolutionRequest(host_resolution_request))
        .unwrap();

    assert!(host_outcome.outbound.is_empty(), "a fatal desync sends no further messages");
    assert!(joiner_outcome.outbound.is_empty(), "a fatal desync sends no further messages");
    assert!(host_outcome
        .ui_events
        .iter()
        .any(|e| matches!(e, UiEvent::BattleEnded { reason: GameOverReason::ProtocolDesync })));
    assert!(joiner_outcome
        .ui_events
        .iter()
        .any(|e| matches!(e, UiEvent::BattleEnded { reason: GameOverReason::ProtocolDesync })));
    assert!(matches!(
        host.battle_state(),
        BattleState::GameOver { reason: GameOverReason::ProtocolDesync }
    ));
    assert!(matches!(
        joiner.battle_state(),
        BattleState::GameOver { reason: GameOverReason::ProtocolDesync }
    ));
}
