use battle_model::{DamageCategory, Move, PokemonSpec, PokemonType, StatBlock, StatBoosts};
use battle_session::{BattleState, PeerEndpoint, Role, Session};
use battle_wire::Message;

fn pikachu() -> PokemonSpec {
    PokemonSpec {
        name: "Pikachu".into(),
        stats: StatBlock { hp: 100, attack: 55, defense: 40, special_attack: 50, special_defense: 50, speed: 90 },
        type1: PokemonType::Electric,
        type2: None,
    }
}

fn charmander() -> PokemonSpec {
    PokemonSpec {
        name: "Charmander".into(),
        stats: StatBlock { hp: 100, attack: 52, defense: 43, special_attack: 60, special_defense: 50, speed: 65 },
        type1: PokemonType::Fire,
        type2: None,
    }
}

fn boosts() -> StatBoosts {
    StatBoosts { special_attack_uses: 5, special_defense_uses: 5 }
}

fn no_moves(_: &str) -> Option<Move> {
    let _ = DamageCategory::Physical;
    None
}

#[test]
fn handshake_and_setup_leave_host_holding_the_first_turn() {
    let mut host = Session::new(Role::Host, "Host", no_moves);
    let mut joiner = Session::new(Role::Joiner, "Joiner", no_moves);

    let host_addr: std::net::SocketAddr = "127.0.0.1:9001".parse().unwrap();
    let joiner_addr: std::net::SocketAddr = "127.0.0.1:9002".parse().unwrap();

    let connect = joiner.connect(PeerEndpoint::from(host_addr));
    let Message::HandshakeRequest(request) = &connect.outbound[0].message else { panic!("expected HandshakeRequest") };
    assert_eq!(request.sequence_number, 1);

    let handshake_outcome = host
        .handle_message(PeerEndpoint::from(joiner_addr), connect.outbound[0].message.clone())
        .unwrap();
    let Message::HandshakeResponse(response) = &handshake_outcome.outbound[0].message else {
        panic!("expected HandshakeResponse")
    };
    assert_ne!(response.seed, 0);
    let seed = response.seed;

    joiner
        .handle_message(PeerEndpoint::from(host_addr), handshake_outcome.outbound[0].message.clone())
        .unwrap();
    assert_eq!(joiner.seed, seed);

    let host_setup = host.start_battle(pikachu(), boosts()).unwrap();
    let joiner_setup = joiner.start_battle(charmander(), boosts()).unwrap();

    joiner
        .handle_message(PeerEndpoint::from(host_addr), host_setup.outbound[0].message.clone())
        .unwrap();
    host.handle_message(PeerEndpoint::from(joiner_addr), joiner_setup.outbound[0].message.clone())
        .unwrap();

    assert!(matches!(host.battle_state(), BattleState::WaitingForMove { my_turn: true }));
    assert!(matches!(joiner.battle_state(), BattleState::WaitingForMove { my_turn: false }));
    assert_eq!(host.seed, seed);
    assert_eq!(joiner.seed, seed);
}
