//! The cooperative single-task event loop: poll the socket,
//! tick the reliability timer, and drain a bounded command channel from
//! stdin, in that priority order, on one task.

use crate::config::EngineConfig;
use crate::error::{BattleFailure, FailureKind};
use battle_model::{PokemonSpec, StatBoosts};
use battle_net::{ReliableChannel, UdpTransport};
use battle_session::{Outcome, PeerEndpoint, Role, Session, UiEvent};
use battle_wire::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

const DEFAULT_BOOST_ALLOTMENT: StatBoosts = StatBoosts { special_attack_uses: 5, special_defense_uses: 5 };

pub enum ReplCommand {
    SubmitMove { name: String, use_boost: bool },
    DeclareDefenseBoost,
    Chat(String),
    Quit,
}

fn parse_repl_line(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if line == "quit" {
        return Some(ReplCommand::Quit);
    }
    if line == "defend-boost" {
        return Some(ReplCommand::DeclareDefenseBoost);
    }
    if let Some(rest) = line.strip_prefix("move ") {
        let use_boost = rest.trim_end().ends_with("--boost");
        let name = rest.trim_end().trim_end_matches("--boost").trim().to_owned();
        return Some(ReplCommand::SubmitMove { name, use_boost });
    }
    if let Some(text) = line.strip_prefix("chat ") {
        return Some(ReplCommand::Chat(text.to_owned()));
    }
    None
}

fn spawn_stdin_reader() -> mpsc::Receiver<ReplCommand> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(command) = parse_repl_line(&line) {
                if tx.send(command).await.is_err() {
                    break;
                }
            } else {
                warn!(%line, "unrecognized command");
            }
        }
    });
    rx
}

pub struct BattleRuntime {
    net: ReliableChannel,
    session: Session,
    own_spec: Option<PokemonSpec>,
}

impl BattleRuntime {
    pub async fn host(port: u16, display_name: String, pokemon: PokemonSpec, config: EngineConfig) -> Result<Self, BattleFailure> {
        let addr: SocketAddr = format!("0.0.0.0:{port}").parse().expect("valid socket addr");
        let transport = UdpTransport::bind(addr).await?;
        info!(%addr, "host listening");
        Ok(BattleRuntime {
            net: ReliableChannel::new(Arc::new(transport), config.reliability),
            session: Session::new(Role::Host, display_name, crate::demo_catalog::move_named),
            own_spec: Some(pokemon),
        })
    }

    pub async fn join(host: SocketAddr, port: u16, display_name: String, pokemon: PokemonSpec, config: EngineConfig) -> Result<Self, BattleFailure> {
        let addr: SocketAddr = format!("0.0.0.0:{port}").parse().expect("valid socket addr");
        let transport = UdpTransport::bind(addr).await?;
        let mut net = ReliableChannel::new(Arc::new(transport), config.reliability);
        let mut session = Session::new(Role::Joiner, display_name, crate::demo_catalog::move_named);
        let outcome = session.connect(PeerEndpoint::from(host));
        for out in outcome.outbound {
            net.send(out.to.0, &out.message).await?;
        }
        Ok(BattleRuntime { net, session, own_spec: Some(pokemon) })
    }

    pub async fn spectate(host: SocketAddr, port: u16, display_name: String, config: EngineConfig) -> Result<Self, BattleFailure> {
        let addr: SocketAddr = format!("0.0.0.0:{port}").parse().expect("valid socket addr");
        let transport = UdpTransport::bind(addr).await?;
        let mut net = ReliableChannel::new(Arc::new(transport), config.reliability);
        let mut session = Session::new(Role::Spectator, display_name, crate::demo_catalog::move_named);
        let outcome = session.connect(PeerEndpoint::from(host));
        for out in outcome.outbound {
            net.send(out.to.0, &out.message).await?;
        }
        Ok(BattleRuntime { net, session, own_spec: None })
    }

    async fn dispatch(&mut self, outcome: Outcome) -> Result<bool, BattleFailure> {
        for out in outcome.outbound {
            self.net.send(out.to.0, &out.message).await?;
        }
        let mut battle_ended = false;
        for event in outcome.ui_events {
            match event {
                UiEvent::ChatReceived { sender, text, sticker } => {
                    if let Some(text) = text {
                        println!("{sender}: {text}");
                    } else if sticker.is_some() {
                        println!("{sender} sent a sticker");
                    }
                }
                UiEvent::TurnResolved { attacker, damage_dealt, status_message } => {
                    println!("{attacker} dealt {damage_dealt} damage. {status_message}");
                }
                UiEvent::BattleEnded { reason } => {
                    println!("battle ended: {reason:?}");
                    battle_ended = true;
                }
                UiEvent::SpectatorJoined(peer) => info!(%peer, "spectator joined"),
                UiEvent::SpectatorJoinRejected(peer) => warn!(%peer, "spectator join rejected"),
            }
        }
        Ok(battle_ended)
    }

    pub async fn run(mut self) -> Result<(), BattleFailure> {
        let mut repl = spawn_stdin_reader();
        let mut tick = tokio::time::interval(Duration::from_millis(100));

        loop {
            tokio::select! {
                biased;

                incoming = self.net.recv() => {
                    match incoming {
                        Ok(Some((message, from))) => {
                            let is_handshake_request = matches!(message, Message::HandshakeRequest(_));
                            let is_handshake_response = matches!(message, Message::HandshakeResponse(_));
                            let peer = PeerEndpoint::from(from);
                            let outcome = self.session.handle_message(peer, message)?;
                            let ended = self.dispatch(outcome).await?;

                            if is_handshake_request && self.session.role == Role::Host {
                                if let Some(spec) = self.own_spec.clone() {
                                    let outcome = self.session.start_battle(spec, DEFAULT_BOOST_ALLOTMENT)?;
                                    self.dispatch(outcome).await?;
                                }
                            }
                            if is_handshake_response && self.session.role == Role::Joiner {
                                if let Some(spec) = self.own_spec.clone() {
                                    let outcome = self.session.start_battle(spec, DEFAULT_BOOST_ALLOTMENT)?;
                                    self.dispatch(outcome).await?;
                                }
                            }
                            if ended {
                                return Ok(());
                            }
                        }
                        Ok(None) => {}
                        Err(e) => return Err(e.into()),
                    }
                }

                _ = tick.tick() => {
                    let unreachable = self.net.tick().await?;
                    if let Some(peer) = unreachable.into_iter().next() {
                        return Err(BattleFailure::new(
                            FailureKind::PeerLost,
                            format!("{peer} stopped responding"),
                        ));
                    }
                }

                command = repl.recv() => {
                    match command {
                        Some(ReplCommand::SubmitMove { name, use_boost }) => {
                            let Some(move_used) = crate::demo_catalog::move_named(&name) else {
                                warn!(%name, "unknown move");
                                continue;
                            };
                            match self.session.submit_move(move_used, use_boost) {
                                Ok(outcome) => { self.dispatch(outcome).await?; }
                                Err(e) => warn!(error = %e, "move rejected"),
                            }
                        }
                        Some(ReplCommand::DeclareDefenseBoost) => self.session.declare_defense_boost(),
                        Some(ReplCommand::Chat(text)) => {
                            let outcome = self.session.send_chat_text(&text);
                            self.dispatch(outcome).await?;
                        }
                        Some(ReplCommand::Quit) | None => return Ok(()),
                    }
                }
            }
        }
    }
}

pub fn resolve_pokemon(name: &str) -> Result<PokemonSpec, BattleFailure> {
    crate::demo_catalog::pokemon_named(name)
        .ok_or_else(|| BattleFailure::new(FailureKind::MalformedMessage, format!("unknown Pokémon '{name}'")))
}
