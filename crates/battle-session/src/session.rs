//! The Session/Role Manager: handshake, battle setup, turn dispatch,
//! spectator fan-out, and chat routing.
//!
//! `Session` never touches a socket. Every method returns an `Outcome`
//! describing what to send and what to show the user; the caller (the
//! cooperative event loop) is the only thing that talks to `battle-net`.

use crate::error::SessionError;
use crate::state_machine::{BattleState, Effect, Event, GameOverReason};
use crate::types::{PeerEndpoint, Role};
use battle_model::{calculate_damage, BattlePokemon, Move, PokemonSpec, Rng, StatBoosts};
use battle_wire::{
    Ack, AttackAnnounce, BattleSetup, CalculationConfirm, CalculationReport, ChatContentType,
    ChatMessage, CommunicationMode, DefenseAnnounce, GameOver, HandshakeRequest,
    HandshakeResponse, Message, ResolutionRequest, SpectatorRequest,
};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Stickers are Base64; cap near the UDP MTU rather than introduce a
/// chunking protocol.
pub const STICKER_MAX_BASE64_BYTES: usize = 1_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub to: PeerEndpoint,
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    ChatReceived {
        sender: String,
        text: Option<String>,
        sticker: Option<String>,
    },
    TurnResolved {
        attacker: String,
        damage_dealt: u32,
        status_message: String,
    },
    BattleEnded {
        reason: GameOverReason,
    },
    SpectatorJoined(PeerEndpoint),
    SpectatorJoinRejected(PeerEndpoint),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub outbound: Vec<Outbound>,
    pub ui_events: Vec<UiEvent>,
}

impl Outcome {
    fn send(to: PeerEndpoint, message: Message) -> Self {
        Outcome {
            outbound: vec![Outbound { to, message }],
            ui_events: vec![],
        }
    }
}

pub struct Session {
    pub role: Role,
    pub local_identity: String,
    pub host_endpoint: Option<PeerEndpoint>,
    pub joiner_endpoint: Option<PeerEndpoint>,
    pub spectators: Vec<PeerEndpoint>,
    pub seed: u32,
    next_seq: u64,
    state: BattleState,
    own_pokemon: Option<BattlePokemon>,
    opponent_pokemon: Option<BattlePokemon>,
    rng: Option<Rng>,
    current_attacker_is_self: Option<bool>,
    current_move_name: Option<String>,
    move_lookup: fn(&str) -> Option<Move>,
    pending_defense_boost: bool,
}

impl Session {
    /// `move_lookup` resolves a move's stats by name; both peers need the
    /// same catalog since `AttackAnnounce` only names the move on the
    /// wire, the way the original games assume a shared movedex.
    pub fn new(role: Role, local_identity: impl Into<String>, move_lookup: fn(&str) -> Option<Move>) -> Self {
        Session {
            role,
            local_identity: local_identity.into(),
            host_endpoint: None,
            joiner_endpoint: None,
            spectators: Vec::new(),
            seed: 0,
            next_seq: 0,
            state: BattleState::Setup,
            own_pokemon: None,
            opponent_pokemon: None,
            rng: None,
            current_attacker_is_self: None,
            current_move_name: None,
            move_lookup,
            pending_defense_boost: false,
        }
    }

    fn next_sequence(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    pub fn battle_state(&self) -> &BattleState {
        &self.state
    }

    fn opponent_identity(&self) -> &'static str {
        match self.role {
            Role::Host => "Joiner",
            Role::Joiner | Role::Spectator => "Host",
        }
    }

    /// The endpoint battle/chat traffic goes to from this peer's point of
    /// view: the Joiner for a Host, the Host for everyone else.
    fn counterpart(&self) -> Option<PeerEndpoint> {
        match self.role {
            Role::Host => self.joiner_endpoint,
            Role::Joiner | Role::Spectator => self.host_endpoint,
        }
    }

    /// Queue copies of `message` to every spectator with a freshly
    /// assigned sequence number, preserving sender identity. A no-op for non-Host roles.
    fn fanout(&mut self, message: &Message) -> Vec<Outbound> {
        if self.role != Role::Host {
            return Vec::new();
        }
        self.spectators
            .clone()
            .into_iter()
            .map(|to| {
                let seq = self.next_sequence();
                Outbound {
                    to,
                    message: with_sequence_number(message, seq),
                }
            })
            .collect()
    }

    // ---------------------------------------------------------------
    // Handshake
    // ---------------------------------------------------------------

    /// Build the first outbound message a Joiner or Spectator sends to a
    /// Host, using this session's own sequence counter so it can never
    /// collide with a later message reusing the same number.
    pub fn connect(&mut self, host: PeerEndpoint) -> Outcome {
        let seq = self.next_sequence();
        let message = match self.role {
            Role::Spectator => Message::SpectatorRequest(SpectatorRequest { sequence_number: seq }),
            Role::Host | Role::Joiner => Message::HandshakeRequest(HandshakeRequest { sequence_number: seq }),
        };
        Outcome::send(host, message)
    }

    pub fn handle_handshake_request(
        &mut self,
        from: PeerEndpoint,
        _request: HandshakeRequest,
    ) -> Outcome {
        if self.role != Role::Host {
            warn!(%from, "HandshakeRequest received by a non-Host role; ignoring");
            return Outcome::default();
        }
        if self.seed == 0 {
            self.seed = rand::Rng::gen_range(&mut rand::thread_rng(), 1..=99_999);
        }
        self.joiner_endpoint = Some(from);
        let seq = self.next_sequence();
        Outcome::send(
            from,
            Message::HandshakeResponse(HandshakeResponse {
                sequence_number: seq,
                seed: self.seed,
            }),
        )
    }

    pub fn handle_spectator_request(
        &mut self,
        from: PeerEndpoint,
        _request: SpectatorRequest,
    ) -> Outcome {
        if self.role != Role::Host {
            return Outcome::default();
        }
        let battle_in_progress = !matches!(self.state, BattleState::Setup | BattleState::GameOver { .. })
            || self.own_pokemon.is_some();
        if battle_in_progress && !self.spectators.contains(&from) {
            warn!(%from, "rejecting spectator join once a battle is underway");
            let seq = self.next_sequence();
            return Outcome {
                outbound: vec![Outbound {
                    to: from,
                    message: Message::HandshakeResponse(HandshakeResponse {
                        sequence_number: seq,
                        seed: 0,
                    }),
                }],
                ui_events: vec![UiEvent::SpectatorJoinRejected(from)],
            };
        }
        if !self.spectators.contains(&from) {
            self.spectators.push(from);
        }
        let seq = self.next_sequence();
        Outcome {
            outbound: vec![Outbound {
                to: from,
                message: Message::HandshakeResponse(HandshakeResponse {
                    sequence_number: seq,
                    seed: self.seed,
                }),
            }],
            ui_events: vec![UiEvent::SpectatorJoined(from)],
        }
    }

    // ---------------------------------------------------------------
    // Battle setup
    // ---------------------------------------------------------------

    pub fn start_battle(&mut self, spec: PokemonSpec, boosts: StatBoosts) -> Result<Outcome, SessionError> {
        let Some(destination) = self.counterpart() else {
            return Err(SessionError::BattleAlreadyOver);
        };
        self.own_pokemon = Some(BattlePokemon::new(spec.clone(), boosts));
        if self.rng.is_none() && self.seed != 0 {
            self.rng = Some(Rng::seeded(self.seed));
        }

        let seq = self.next_sequence();
        let message = Message::BattleSetup(BattleSetup {
            sequence_number: seq,
            communication_mode: CommunicationMode::P2P,
            pokemon_name: spec.name.clone(),
            stat_boosts: boosts.to_literal(),
            pokemon_data: spec.to_literal(),
        });
        let mut outbound = vec![Outbound { to: destination, message: message.clone() }];
        outbound.extend(self.fanout(&message));
        Ok(Outcome { outbound, ui_events: vec![] })
    }

    pub fn handle_battle_setup(
        &mut self,
        from: PeerEndpoint,
        setup: BattleSetup,
    ) -> Result<Outcome, SessionError> {
        let spec = PokemonSpec::from_literal(&setup.pokemon_name, &setup.pokemon_data)
            .map_err(|_| SessionError::ProtocolDesync)?;
        let boosts = StatBoosts::from_literal(&setup.stat_boosts)
            .map_err(|_| SessionError::ProtocolDesync)?;
        self.opponent_pokemon = Some(BattlePokemon::new(spec, boosts));
        if self.rng.is_none() && self.seed != 0 {
            self.rng = Some(Rng::seeded(self.seed));
        }

        let mut outbound = self.fanout(&Message::BattleSetup(setup));

        if self.own_pokemon.is_some() && matches!(self.state, BattleState::Setup) {
            let (state, effects) = std::mem::take(&mut self.state).apply(Event::BattleSetupComplete {
                host_starts: self.role == Role::Host,
            });
            self.state = state;
            let more = self.run_effects(effects);
            outbound.extend(more.outbound);
        }
        let _ = from;
        Ok(Outcome { outbound, ui_events: vec![] })
    }

    // ---------------------------------------------------------------
    // Turn play
    // ---------------------------------------------------------------

    pub fn submit_move(&mut self, move_used: Move, use_attack_boost: bool) -> Result<Outcome, SessionError> {
        if !matches!(self.state, BattleState::WaitingForMove { my_turn: true }) {
            return Err(SessionError::IllegalTurn);
        }
        if use_attack_boost {
            let own = self.own_pokemon.as_mut().ok_or(SessionError::IllegalTurn)?;
            if !own.consume_attack_boost() {
                return Err(SessionError::NoBoostAvailable);
            }
        }
        self.current_attacker_is_self = Some(true);
        self.current_move_name = Some(move_used.name.clone());

        let (state, effects) = std::mem::take(&mut self.state).apply(Event::SubmitMove {
            move_name: move_used.name.clone(),
            use_attack_boost,
        });
        self.state = state;
        Ok(self.run_effects(effects))
    }

    /// Declare an intent to use the special-defense boost the next time an
    /// AttackAnnounce is received; consumed (and reset) on use.
    pub fn declare_defense_boost(&mut self) {
        self.pending_defense_boost = true;
    }

    pub fn handle_message(&mut self, from: PeerEndpoint, message: Message) -> Result<Outcome, SessionError> {
        match message {
            Message::Ack(_) => Ok(Outcome::default()),
            Message::HandshakeRequest(r) => Ok(self.handle_handshake_request(from, r)),
            Message::SpectatorRequest(r) => Ok(self.handle_spectator_request(from, r)),
            Message::HandshakeResponse(r) => {
                self.seed = r.seed;
                self.host_endpoint = Some(from);
                Ok(Outcome::default())
            }
            Message::BattleSetup(s) => self.handle_battle_setup(from, s),
            Message::AttackAnnounce(a) => Ok(self.handle_attack_announce(a)),
            Message::DefenseAnnounce(d) => Ok(self.handle_defense_announce(d)),
            Message::CalculationReport(r) => Ok(self.handle_calc_report(r)),
            Message::CalculationConfirm(_) => Ok(self.handle_calc_confirm()),
            Message::ResolutionRequest(r) => Ok(self.handle_resolution_request(r)),
            Message::GameOver(g) => Ok(self.handle_game_over(g)),
            Message::ChatMessage(c) => Ok(self.handle_chat(from, c)),
        }
    }

    fn handle_attack_announce(&mut self, announce: AttackAnnounce) -> Outcome {
        if !matches!(self.state, BattleState::WaitingForMove { my_turn: false }) {
            warn!("AttackAnnounce received out of turn; dropping");
            return Outcome::default();
        }
        self.current_attacker_is_self = Some(false);
        self.current_move_name = Some(announce.move_name.clone());
        let use_defense_boost = std::mem::take(&mut self.pending_defense_boost);
        if use_defense_boost {
            if let Some(own) = self.own_pokemon.as_mut() {
                if !own.consume_defense_boost() {
                    self.pending_defense_boost = false;
                }
            }
        }
        let (state, effects) = std::mem::take(&mut self.state).apply(Event::AttackAnnounceReceived {
            move_name: announce.move_name,
            use_attack_boost: announce.use_attack_boost,
            use_defense_boost,
        });
        self.state = state;
        self.run_effects(effects)
    }

    fn handle_defense_announce(&mut self, announce: DefenseAnnounce) -> Outcome {
        let (state, effects) = std::mem::take(&mut self.state).apply(Event::DefenseAnnounceReceived {
            use_defense_boost: announce.use_defense_boost,
        });
        self.state = state;
        self.run_effects(effects)
    }

    fn handle_calc_report(&mut self, report: CalculationReport) -> Outcome {
        let (state, effects) = std::mem::take(&mut self.state).apply(Event::PeerCalcReportReceived(
            crate::state_machine::CalcValues {
                damage_dealt: report.damage_dealt,
                defender_hp_remaining: report.defender_hp_remaining,
            },
        ));
        self.state = state;
        self.run_effects(effects)
    }

    fn handle_calc_confirm(&mut self) -> Outcome {
        let (state, effects) = std::mem::take(&mut self.state).apply(Event::PeerCalcConfirmReceived);
        self.state = state;
        self.run_effects(effects)
    }

    fn handle_resolution_request(&mut self, request: ResolutionRequest) -> Outcome {
        let (state, effects) = std::mem::take(&mut self.state).apply(Event::PeerResolutionRequestReceived(
            crate::state_machine::CalcValues {
                damage_dealt: request.damage_dealt,
                defender_hp_remaining: request.defender_hp_remaining,
            },
        ));
        self.state = state;
        self.run_effects(effects)
    }

    fn handle_game_over(&mut self, game_over: GameOver) -> Outcome {
        debug!(winner = %game_over.winner, loser = %game_over.loser, "peer reported game over");
        Outcome {
            outbound: vec![],
            ui_events: vec![UiEvent::BattleEnded { reason: GameOverReason::Lost }],
        }
    }

    fn run_effects(&mut self, effects: Vec<Effect>) -> Outcome {
        let mut outcome = Outcome::default();
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            let Some(destination) = self.counterpart() else {
                continue;
            };
            match effect {
                Effect::SendAttackAnnounce { move_name, use_attack_boost } => {
                    let seq = self.next_sequence();
                    let message = Message::AttackAnnounce(AttackAnnounce {
                        sequence_number: seq,
                        move_name,
                        use_attack_boost,
                    });
                    outcome.outbound.extend(self.fanout(&message));
                    outcome.outbound.push(Outbound { to: destination, message });
                }
                Effect::SendDefenseAnnounce { use_defense_boost } => {
                    let seq = self.next_sequence();
                    let message = Message::DefenseAnnounce(DefenseAnnounce {
                        sequence_number: seq,
                        use_defense_boost,
                    });
                    outcome.outbound.extend(self.fanout(&message));
                    outcome.outbound.push(Outbound { to: destination, message });
                }
                Effect::ComputeDamage { attacker_is_self, move_name: _, use_attack_boost, use_defense_boost } => {
                    let Some(result) = self.compute_damage(attacker_is_self, use_attack_boost, use_defense_boost) else {
                        continue;
                    };
                    let (state, more) = std::mem::take(&mut self.state).apply(Event::OwnCalcReady {
                        damage_dealt: result.0,
                        defender_hp_remaining: result.1,
                        status_message: result.2,
                    });
                    self.state = state;
                    queue.extend(more);
                }
                Effect::SendCalcReport { damage_dealt, defender_hp_remaining, status_message } => {
                    let attacker = self.attacker_name();
                    let move_used = self.current_move_name.clone().unwrap_or_default();
                    let seq = self.next_sequence();
                    let message = Message::CalculationReport(CalculationReport {
                        sequence_number: seq,
                        attacker,
                        move_used,
                        remaining_health: self.attacker_remaining_hp(),
                        damage_dealt,
                        defender_hp_remaining,
                        status_message,
                    });
                    outcome.outbound.extend(self.fanout(&message));
                    outcome.outbound.push(Outbound { to: destination, message });
                }
                Effect::SendCalcConfirm => {
                    let seq = self.next_sequence();
                    let message = Message::CalculationConfirm(CalculationConfirm { sequence_number: seq });
                    outcome.outbound.extend(self.fanout(&message));
                    outcome.outbound.push(Outbound { to: destination, message });
                }
                Effect::SendResolutionRequest(values) => {
                    let attacker = self.attacker_name();
                    let move_used = self.current_move_name.clone().unwrap_or_default();
                    let seq = self.next_sequence();
                    let message = Message::ResolutionRequest(ResolutionRequest {
                        sequence_number: seq,
                        attacker,
                        move_used,
                        damage_dealt: values.damage_dealt,
                        defender_hp_remaining: values.defender_hp_remaining,
                    });
                    outcome.outbound.extend(self.fanout(&message));
                    outcome.outbound.push(Outbound { to: destination, message });
                }
                Effect::ApplyDamage { defender_is_self, damage } => {
                    if defender_is_self {
                        if let Some(p) = self.own_pokemon.as_mut() {
                            p.apply_damage(damage);
                        }
                    } else if let Some(p) = self.opponent_pokemon.as_mut() {
                        p.apply_damage(damage);
                    }
                    outcome.ui_events.push(UiEvent::TurnResolved {
                        attacker: self.attacker_name(),
                        damage_dealt: damage,
                        status_message: String::new(),
                    });
                }
                Effect::FlipTurn => {
                    self.current_attacker_is_self = None;
                    self.current_move_name = None;
                }
                Effect::EndBattle(reason) => {
                    outcome.ui_events.push(UiEvent::BattleEnded { reason });
                    if reason == GameOverReason::Won {
                        let seq = self.next_sequence();
                        let message = Message::GameOver(GameOver {
                            sequence_number: seq,
                            winner: self.local_identity.clone(),
                            loser: self.opponent_identity().to_owned(),
                        });
                        outcome.outbound.extend(self.fanout(&message));
                        outcome.outbound.push(Outbound { to: destination, message });
                    }
                }
                Effect::Log(message) => debug!("{message}"),
            }
        }
        outcome
    }

    fn attacker_name(&self) -> String {
        match self.current_attacker_is_self {
            Some(true) => self.local_identity.clone(),
            Some(false) => self.opponent_identity().to_owned(),
            None => String::new(),
        }
    }

    fn attacker_remaining_hp(&self) -> i32 {
        match self.current_attacker_is_self {
            Some(true) => self.own_pokemon.as_ref().map_or(0, |p| p.current_hp),
            Some(false) => self.opponent_pokemon.as_ref().map_or(0, |p| p.current_hp),
            None => 0,
        }
    }

    fn compute_damage(
        &mut self,
        attacker_is_self: bool,
        use_attack_boost: bool,
        use_defense_boost: bool,
    ) -> Option<(u32, i32, String)> {
        let move_name = self.current_move_name.clone()?;
        let move_used = (self.move_lookup)(&move_name)?;
        let rng = self.rng.as_mut()?;

        let (attacker, defender) = if attacker_is_self {
            (self.own_pokemon.as_ref()?, self.opponent_pokemon.as_ref()?)
        } else {
            (self.opponent_pokemon.as_ref()?, self.own_pokemon.as_ref()?)
        };

        let attacker_stat = if move_used.category == battle_model::DamageCategory::Physical {
            attacker.spec.stats.attack
        } else {
            let boosted = attacker.spec.stats.special_attack as f64 * if use_attack_boost { 1.5 } else { 1.0 };
            boosted as u32
        };
        let defender_stat = if move_used.category == battle_model::DamageCategory::Physical {
            defender.spec.stats.defense
        } else {
            let boosted = defender.spec.stats.special_defense as f64 * if use_defense_boost { 1.5 } else { 1.0 };
            boosted as u32
        };

        let result = calculate_damage(
            attacker_stat,
            attacker.spec.type1,
            attacker.spec.type2,
            defender_stat,
            defender.spec.type1,
            defender.spec.type2,
            &move_used,
            rng,
        );

        let defender_hp_after = (defender.current_hp - result.damage as i32).max(i32::MIN);
        Some((result.damage, defender_hp_after, result.effectiveness_tier.status_message().to_owned()))
    }

    // ---------------------------------------------------------------
    // Chat
    // ---------------------------------------------------------------

    pub fn send_chat_text(&mut self, text: &str) -> Outcome {
        self.route_chat(ChatContentType::Text, Some(text.to_owned()), None, true)
    }

    pub fn send_chat_sticker(&mut self, base64_data: &str) -> Result<Outcome, SessionError> {
        if base64_data.len() > STICKER_MAX_BASE64_BYTES {
            return Err(SessionError::StickerOversize);
        }
        Ok(self.route_chat(ChatContentType::Sticker, None, Some(base64_data.to_owned()), true))
    }

    fn route_chat(
        &mut self,
        content_type: ChatContentType,
        message_text: Option<String>,
        sticker_data: Option<String>,
        from_local_ui: bool,
    ) -> Outcome {
        let mut outcome = Outcome::default();
        let Some(destination) = self.counterpart() else {
            return outcome;
        };
        let seq = self.next_sequence();
        let message = Message::ChatMessage(ChatMessage {
            sequence_number: seq,
            sender_name: self.local_identity.clone(),
            content_type,
            message_text: message_text.clone(),
            sticker_data: sticker_data.clone(),
        });
        outcome.outbound.push(Outbound { to: destination, message: message.clone() });
        outcome.outbound.extend(self.fanout(&message));
        if from_local_ui {
            outcome.ui_events.push(UiEvent::ChatReceived {
                sender: format!("[You] {}", self.local_identity),
                text: message_text,
                sticker: sticker_data,
            });
        }
        outcome
    }

    fn handle_chat(&mut self, from: PeerEndpoint, chat: ChatMessage) -> Outcome {
        let mut outcome = Outcome::default();
        if chat.sender_name != self.local_identity {
            outcome.ui_events.push(UiEvent::ChatReceived {
                sender: chat.sender_name.clone(),
                text: chat.message_text.clone(),
                sticker: chat.sticker_data.clone(),
            });
        }

        if self.role == Role::Host {
            let came_from_spectator = self.spectators.contains(&from);
            let message = Message::ChatMessage(chat);
            if came_from_spectator {
                if let Some(joiner) = self.joiner_endpoint {
                    let seq = self.next_sequence();
                    outcome.outbound.push(Outbound {
                        to: joiner,
                        message: with_sequence_number(&message, seq),
                    });
                }
                for &spectator in &self.spectators.clone() {
                    if spectator == from {
                        continue;
                    }
                    let seq = self.next_sequence();
                    outcome.outbound.push(Outbound {
                        to: spectator,
                        message: with_sequence_number(&message, seq),
                    });
                }
            } else {
                outcome.outbound.extend(self.fanout(&message));
            }
        }
        outcome
    }
}

fn with_sequence_number(message: &Message, sequence_number: u64) -> Message {
    match message.clone() {
        Message::Ack(a) => Message::Ack(Ack { ack_number: a.ack_number }),
        Message::HandshakeRequest(mut m) => { m.sequence_number = sequence_number; Message::HandshakeRequest(m) }
        Message::HandshakeResponse(mut m) => { m.sequence_number = sequence_number; Message::HandshakeResponse(m) }
        Message::SpectatorRequest(mut m) => { m.sequence_number = sequence_number; Message::SpectatorRequest(m) }
        Message::BattleSetup(mut m) => { m.sequence_number = sequence_number; Message::BattleSetup(m) }
        Message::AttackAnnounce(mut m) => { m.sequence_number = sequence_number; Message::AttackAnnounce(m) }
        Message::DefenseAnnounce(mut m) => { m.sequence_number = sequence_number; Message::DefenseAnnounce(m) }
        Message::CalculationReport(mut m) => { m.sequence_number = sequence_number; Message::CalculationReport(m) }
        Message::CalculationConfirm(mut m) => { m.sequence_number = sequence_number; Message::CalculationConfirm(m) }
        Message::ResolutionRequest(mut m) => { m.sequence_number = sequence_number; Message::ResolutionRequest(m) }
        Message::GameOver(mut m) => { m.sequence_number = sequence_number; Message::GameOver(m) }
        Message::ChatMessage(mut m) => { m.sequence_number = sequence_number; Message::ChatMessage(m) }
    }
}
