use battle_model::{DamageCategory, Move, PokemonSpec, PokemonType, StatBlock, StatBoosts};
use battle_session::{PeerEndpoint, Role, Session, UiEvent};
use battle_wire::Message;
use std::net::SocketAddr;

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

/// Feeds `message` (addressed, via `to`, either to `host_addr` or
/// `joiner_addr`) to whichever session owns that address, then queues any
/// outbound messages it produces for the next round. Events are tagged
/// with which side produced them, since each peer only ever knows its own
/// local identity and the other's bare role.
fn deliver(
    host_addr: SocketAddr,
    joiner_addr: SocketAddr,
    host: &mut Session,
    joiner: &mut Session,
    to: SocketAddr,
    from: SocketAddr,
    message: Message,
    queue: &mut Vec<(SocketAddr, SocketAddr, Message)>,
    ui_events: &mut Vec<(&'static str, UiEvent)>,
) {
    let (label, target) = if to == host_addr {
        ("host", &mut *host)
    } else if to == joiner_addr {
        ("joiner", &mut *joiner)
    } else {
        panic!("unknown destination {to}");
    };
    let outcome = target.handle_message(PeerEndpoint::from(from), message).expect("message accepted");
    ui_events.extend(outcome.ui_events.into_iter().map(|e| (label, e)));
    for out in outcome.outbound {
        queue.push((out.to.0, to, out.message));
    }
}

#[test]
fn host_and_joiner_complete_one_full_turn() {
    let mut host = Session::new(Role::Host, "Ash", move_catalog);
    let mut joiner = Session::new(Role::Joiner, "Misty", move_catalog);

    let host_addr: SocketAddr = "127.0.0.1:9001".parse().unwrap();
    let joiner_addr: SocketAddr = "127.0.0.1:9002".parse().unwrap();

    let connect = joiner.connect(PeerEndpoint::from(host_addr));
    assert_eq!(connect.outbound.len(), 1);

    let mut queue: Vec<(SocketAddr, SocketAddr, Message)> = vec![(host_addr, joiner_addr, connect.outbound[0].message.clone())];
    let mut ui_events = Vec::new();

    // Drain the handshake round-trip first so both sides know each other's address.
    while let Some((to, from, message)) = queue.pop() {
        deliver(host_addr, joiner_addr, &mut host, &mut joiner, to, from, message, &mut queue, &mut ui_events);
    }

    let host_setup = host.start_battle(pikachu(), boosts()).unwrap();
    let joiner_setup = joiner.start_battle(squirtle(), boosts()).unwrap();
    assert_eq!(host_setup.outbound.len(), 1);
    assert_eq!(joiner_setup.outbound.len(), 1);

    queue.push((joiner_addr, host_addr, host_setup.outbound[0].message.clone()));
    queue.push((host_addr, joiner_addr, joiner_setup.outbound[0].message.clone()));
    while let Some((to, from, message)) = queue.pop() {
        deliver(host_addr, joiner_addr, &mut host, &mut joiner, to, from, message, &mut queue, &mut ui_events);
    }

    let submit = host.submit_move(thunderbolt(), false).expect("host's turn");
    assert_eq!(submit.outbound.len(), 1);
    queue.push((joiner_addr, host_addr, submit.outbound[0].message.clone()));

    let mut hops = 0;
    while let Some((to, from, message)) = queue.pop() {
        hops += 1;
        assert!(hops < 20, "turn protocol did not converge");
        deliver(host_addr, joiner_addr, &mut host, &mut joiner, to, from, message, &mut queue, &mut ui_events);
    }

    // Each side resolves the turn from its own perspective: the attacker
    // sees its own name, the defender sees the bare "Host" role (no
    // display-name exchange exists on the wire).
    let host_resolution = ui_events.iter().find_map(|(who, e)| match (*who, e) {
        ("host", UiEvent::TurnResolved { attacker, damage_dealt, .. }) => Some((attacker.clone(), *damage_dealt)),
        _ => None,
    });
    let joiner_resolution = ui_events.iter().find_map(|(who, e)| match (*who, e) {
        ("joiner", UiEvent::TurnResolved { attacker, damage_dealt, .. }) => Some((attacker.clone(), *damage_dealt)),
        _ => None,
    });

    let (host_attacker, host_damage) = host_resolution.expect("host resolved the turn");
    let (joiner_attacker, joiner_damage) = joiner_resolution.expect("joiner resolved the turn");

    assert_eq!(host_attacker, "Ash");
    assert_eq!(joiner_attacker, "Host");
    assert_eq!(host_damage, joiner_damage, "both peers must compute bit-identical damage");
    assert!(host_damage > 0);
}
