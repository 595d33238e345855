use async_trait::async_trait;
use battle_model::{DamageCategory, Move, PokemonSpec, PokemonType, StatBlock, StatBoosts};
use battle_net::{ReliabilityConfig, ReliableChannel, Transport};
use battle_session::{PeerEndpoint, Role, Session};
use battle_test_utils::{FaultSchedule, LoopbackNetwork, LoopbackTransport};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

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

/// Wraps a real transport but silently swallows its very first send,
/// standing in for a single datagram lost in transit.
struct DropFirstSend {
    inner: LoopbackTransport,
    dropped_once: AtomicBool,
}

#[async_trait]
impl Transport for DropFirstSend {
    async fn send_to(&self, bytes: &[u8], target: SocketAddr) -> io::Result<()> {
        if !self.dropped_once.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.inner.send_to(bytes, target).await
    }

    async fn recv_from(&self) -> io::Result<(Vec<u8>, SocketAddr)> {
        self.inner.recv_from().await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

#[tokio::test]
async fn dropped_attack_announce_is_retransmitted_and_the_turn_completes() {
    let host_addr: SocketAddr = "127.0.0.1:9001".parse().unwrap();
    let joiner_addr: SocketAddr = "127.0.0.1:9002".parse().unwrap();

    let mut host = Session::new(Role::Host, "Ash", move_catalog);
    let mut joiner = Session::new(Role::Joiner, "Misty", move_catalog);

    // Handshake and setup at the session level only — the network layer
    // under test should see nothing but the single AttackAnnounce.
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

    let net = LoopbackNetwork::new(&[host_addr, joiner_addr]);
    let host_transport = Arc::new(DropFirstSend {
        inner: net.transport_for(host_addr, FaultSchedule::default()),
        dropped_once: AtomicBool::new(false),
    });
    let joiner_transport = Arc::new(net.transport_for(joiner_addr, FaultSchedule::default()));

    let retry_config = ReliabilityConfig {
        retry_interval: Duration::from_millis(0),
        ..ReliabilityConfig::default()
    };
    let mut host_channel = ReliableChannel::new(host_transport, retry_config);
    let mut joiner_channel = ReliableChannel::new(joiner_transport, ReliabilityConfig::default());

    let attack = host.submit_move(thunderbolt(), false).unwrap();
    let attack_message = attack.outbound[0].message.clone();
    let sequence_number = attack_message.sequence_number().unwrap();

    host_channel.send(joiner_addr, &attack_message).await.unwrap();

    let first_try = tokio::time::timeout(Duration::from_millis(20), joiner_channel.recv()).await;
    assert!(first_try.is_err(), "the first attempt was lost, nothing should arrive yet");

    // A zero-length retry interval means it's immediately due.
    let unreachable = host_channel.tick().await.unwrap();
    assert!(unreachable.is_empty(), "the peer must not be given up on yet");

    let (delivered, from) = tokio::time::timeout(Duration::from_millis(50), joiner_channel.recv())
        .await
        .expect("retransmission must arrive")
        .unwrap()
        .expect("retransmission must decode to an application message");
    assert_eq!(from, host_addr);
    assert_eq!(delivered.sequence_number(), Some(sequence_number));

    let outcome = joiner.handle_message(PeerEndpoint::from(host_addr), delivered.clone()).unwrap();
    let defense_announce = outcome.outbound[0].message.clone();

    // The retransmitted copy still carries the original sequence number,
    // so feeding it again must be recognized as a duplicate.
    let bytes = battle_wire::encode(&delivered);
    assert!(joiner_channel.on_datagram(&bytes, host_addr).await.unwrap().is_none());

    // The inbox still holds the Acks generated by the two deliveries above;
    // drain those before the DefenseAnnounce itself becomes visible.
    joiner_channel.send(host_addr, &defense_announce).await.unwrap();
    let received = loop {
        if let Some((message, _)) = host_channel.recv().await.unwrap() {
            break message;
        }
    };
    let host_outcome = host.handle_message(PeerEndpoint::from(joiner_addr), received).unwrap();
    assert!(matches!(host_outcome.outbound[0].message, battle_wire::Message::CalculationReport(_)));
}
