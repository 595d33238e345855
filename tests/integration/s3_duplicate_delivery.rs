use async_trait::async_trait;
use battle_model::{DamageCategory, Move, PokemonSpec, PokemonType, StatBlock, StatBoosts};
use battle_net::{ReliabilityConfig, ReliableChannel, Transport};
use battle_session::{PeerEndpoint, Role, Session, UiEvent};
use battle_wire::{encode, Message};
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

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

/// Records every outbound datagram instead of delivering it anywhere —
/// only the Acks this test cares about need to be observed.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_to(&self, bytes: &[u8], target: SocketAddr) -> io::Result<()> {
        self.sent.lock().unwrap().push((bytes.to_vec(), target));
        Ok(())
    }

    async fn recv_from(&self) -> io::Result<(Vec<u8>, SocketAddr)> {
        std::future::pending().await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok("127.0.0.1:9001".parse().unwrap())
    }
}

fn count_acks(transport: &RecordingTransport, ack_number: u64) -> usize {
    transport
        .sent
        .lock()
        .unwrap()
        .iter()
        .filter(|(bytes, _)| matches!(battle_wire::decode(bytes), Ok(Message::Ack(ack)) if ack.ack_number == ack_number))
        .count()
}

#[tokio::test]
async fn duplicate_defense_announce_resolves_exactly_once() {
    let host_addr: SocketAddr = "127.0.0.1:9001".parse().unwrap();
    let joiner_addr: SocketAddr = "127.0.0.1:9002".parse().unwrap();

    // Drive the handshake/setup/attack sequence purely at the Session
    // level (no network) to reach the point where the Joiner has just
    // produced its DefenseAnnounce.
    let mut host = Session::new(Role::Host, "Ash", move_catalog);
    let mut joiner = Session::new(Role::Joiner, "Misty", move_catalog);

    let connect = joiner.connect(PeerEndpoint::from(host_addr));
    let handshake = host
        .handle_message(PeerEndpoint::from(joiner_addr), connect.outbound[0].message.clone())
        .unwrap();
    joiner
        .handle_message(PeerEndpoint::from(host_addr), handshake.outbound[0].message.clone())
        .unwrap();

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
    let defense_announce = defend.outbound[0].message.clone();
    let Message::DefenseAnnounce(ref inner) = defense_announce else { panic!("expected DefenseAnnounce") };
    let sequence_number = inner.sequence_number;

    // Now exercise the real reliability layer: the same encoded datagram
    // arrives at the Host twice.
    let transport = Arc::new(RecordingTransport::default());
    let mut host_channel = ReliableChannel::new(transport.clone(), ReliabilityConfig::default());
    let bytes = encode(&defense_announce);

    let first = host_channel.on_datagram(&bytes, joiner_addr).await.unwrap();
    let second = host_channel.on_datagram(&bytes, joiner_addr).await.unwrap();

    assert!(first.is_some(), "first delivery must reach the application");
    assert!(second.is_none(), "duplicate delivery must be suppressed");
    assert_eq!(count_acks(&transport, sequence_number), 2, "both deliveries get acked");

    // The application only ever calls into the session for messages the
    // reliability layer actually handed back, so the state transition and
    // the resulting CalculationReport happen exactly once.
    let outcome = host.handle_message(PeerEndpoint::from(joiner_addr), first.unwrap()).unwrap();
    let calc_reports: Vec<_> = outcome
        .outbound
        .iter()
        .filter(|out| matches!(out.message, Message::CalculationReport(_)))
        .collect();
    assert_eq!(calc_reports.len(), 1, "exactly one CalculationReport must be emitted");
    assert!(outcome.ui_events.iter().all(|e| !matches!(e, UiEvent::BattleEnded { .. })));
}
