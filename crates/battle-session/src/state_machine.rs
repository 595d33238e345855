//! The per-turn battle state machine (four-step exchange: Attack →
//! Defense → CalcReport → CalcConfirm/Resolution).
//!
//! `apply` is pure: given a state and an event it returns the next state
//! plus the effects the caller must carry out (send a message, apply
//! damage, flip the turn, end the battle). Nothing here touches the
//! network or the damage engine directly — that keeps the transition
//! table testable without a socket in sight.

/// Values exchanged in a `CalculationReport` or `ResolutionRequest`;
/// equality of this pair is what "the peers agree" means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalcValues {
    pub damage_dealt: u32,
    pub defender_hp_remaining: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    Won,
    Lost,
    PeerLost,
    ProtocolDesync,
}

#[derive(Debug, Clone)]
pub struct ProcessingTurn {
    /// Who initiated this turn — attacker's identity, not whose event we're handling.
    pub attacker_is_self: bool,
    pub move_name: String,
    pub use_attack_boost: bool,
    pub use_defense_boost: bool,
    pub own_report: Option<CalcValues>,
    pub peer_report: Option<CalcValues>,
    pub own_confirm_sent: bool,
    pub peer_confirm_seen: bool,
}

#[derive(Debug, Clone)]
pub struct Resolving {
    pub attacker_is_self: bool,
    pub own_values: CalcValues,
}

#[derive(Debug, Clone, Default)]
pub enum BattleState {
    #[default]
    Setup,
    WaitingForMove {
        my_turn: bool,
    },
    ProcessingTurn(ProcessingTurn),
    Resolving(Resolving),
    GameOver {
        reason: GameOverReason,
    },
}

#[derive(Debug, Clone)]
pub enum Event {
    BattleSetupComplete { host_starts: bool },
    SubmitMove {
        move_name: String,
        use_attack_boost: bool,
    },
    AttackAnnounceReceived {
        move_name: String,
        use_attack_boost: bool,
        use_defense_boost: bool,
    },
    /// Only meaningful on the attacker's own side: the defender's boost
    /// declaration arrives over the wire and is needed before the
    /// attacker can compute damage.
    DefenseAnnounceReceived {
        use_defense_boost: bool,
    },
    /// The local damage-engine invocation the session performed after
    /// emitting `Effect::ComputeDamage` has a result.
    OwnCalcReady {
        damage_dealt: u32,
        defender_hp_remaining: i32,
        status_message: String,
    },
    PeerCalcReportReceived(CalcValues),
    PeerCalcConfirmReceived,
    OwnCalcConfirmAcked,
    PeerResolutionRequestReceived(CalcValues),
    PeerUnreachable,
}

#[derive(Debug, Clone)]
pub enum Effect {
    SendAttackAnnounce {
        move_name: String,
        use_attack_boost: bool,
    },
    SendDefenseAnnounce {
        use_defense_boost: bool,
    },
    /// Tells the session to invoke the damage engine and feed the result
    /// back in as `Event::OwnCalcReady`.
    ComputeDamage {
        attacker_is_self: bool,
        move_name: String,
        use_attack_boost: bool,
        use_defense_boost: bool,
    },
    SendCalcReport {
        damage_dealt: u32,
        defender_hp_remaining: i32,
        status_message: String,
    },
    SendCalcConfirm,
    SendResolutionRequest(CalcValues),
    /// `defender_is_self` tells the session which Pokémon takes the damage.
    ApplyDamage {
        defender_is_self: bool,
        damage: u32,
    },
    FlipTurn,
    EndBattle(GameOverReason),
    Log(String),
}

fn complete_turn(turn: &ProcessingTurn, values: CalcValues) -> (BattleState, Vec<Effect>) {
    let defender_is_self = turn.attacker_is_self;
    let mut effects = vec![Effect::ApplyDamage {
        defender_is_self,
        damage: values.damage_dealt,
    }];
    if values.defender_hp_remaining <= 0 {
        let reason = if turn.attacker_is_self {
            GameOverReason::Won
        } else {
            GameOverReason::Lost
        };
        effects.push(Effect::EndBattle(reason));
        return (BattleState::GameOver { reason }, effects);
    }
    effects.push(Effect::FlipTurn);
    (
        BattleState::WaitingForMove {
            my_turn: !turn.attacker_is_self,
        },
        effects,
    )
}

impl BattleState {
    pub fn apply(self, event: Event) -> (BattleState, Vec<Effect>) {
        match (self, event) {
            (BattleState::Setup, Event::BattleSetupComplete { host_starts }) => (
                BattleState::WaitingForMove {
                    my_turn: host_starts,
                },
                vec![],
            ),

            (BattleState::WaitingForMove { my_turn: true }, Event::SubmitMove { move_name, use_attack_boost }) => {
                let turn = ProcessingTurn {
                    attacker_is_self: true,
                    move_name: move_name.clone(),
                    use_attack_boost,
                    use_defense_boost: false,
                    own_report: None,
                    peer_report: None,
                    own_confirm_sent: false,
                    peer_confirm_seen: false,
                };
                (
                    BattleState::ProcessingTurn(turn),
                    vec![Effect::SendAttackAnnounce { move_name, use_attack_boost }],
                )
            }

            (
                BattleState::WaitingForMove { my_turn: false },
                Event::AttackAnnounceReceived { move_name, use_attack_boost, use_defense_boost },
            ) => {
                let turn = ProcessingTurn {
                    attacker_is_self: false,
                    move_name: move_name.clone(),
                    use_attack_boost,
                    use_defense_boost,
                    own_report: None,
                    peer_report: None,
                    own_confirm_sent: false,
                    peer_confirm_seen: false,
                };
                (
                    BattleState::ProcessingTurn(turn),
                    vec![
                        Effect::SendDefenseAnnounce { use_defense_boost },
                        Effect::ComputeDamage {
                            attacker_is_self: false,
                            move_name,
                            use_attack_boost,
                            use_defense_boost,
                        },
                    ],
                )
            }

            (BattleState::ProcessingTurn(turn), Event::DefenseAnnounceReceived { use_defense_boost })
                if turn.attacker_is_self =>
            {
                let mut next = turn.clone();
                next.use_defense_boost = use_defense_boost;
                (
                    BattleState::ProcessingTurn(next),
                    vec![Effect::ComputeDamage {
                        attacker_is_self: true,
                        move_name: turn.move_name.clone(),
                        use_attack_boost: turn.use_attack_boost,
                        use_defense_boost,
                    }],
                )
            }

            (
                BattleState::ProcessingTurn(turn),
                Event::OwnCalcReady { damage_dealt, defender_hp_remaining, status_message },
            ) if turn.own_report.is_none() => {
                let values = CalcValues { damage_dealt, defender_hp_remaining };
                let mut effects = vec![Effect::SendCalcReport {
                    damage_dealt,
                    defender_hp_remaining,
                    status_message,
                }];
                let mut next = turn.clone();
                next.own_report = Some(values);
                if let Some(peer_values) = next.peer_report {
                    if peer_values == values {
                        next.own_confirm_sent = true;
                        effects.push(Effect::SendCalcConfirm);
                        if next.peer_confirm_seen {
                            let (state, mut completion) = complete_turn(&next, values);
                            effects.append(&mut completion);
                            return (state, effects);
                        }
                    } else {
                        effects.push(Effect::SendResolutionRequest(values));
                        return (
                            BattleState::Resolving(Resolving {
                                attacker_is_self: next.attacker_is_self,
                                own_values: values,
                            }),
                            effects,
                        );
                    }
                }
                (BattleState::ProcessingTurn(next), effects)
            }

            (BattleState::ProcessingTurn(turn), Event::PeerCalcReportReceived(values))
                if turn.peer_report.is_none() =>
            {
                let mut next = turn.clone();
                next.peer_report = Some(values);
                let mut effects = Vec::new();
                if let Some(own_values) = next.own_report {
                    if own_values == values {
                        next.own_confirm_sent = true;
                        effects.push(Effect::SendCalcConfirm);
                        if next.peer_confirm_seen {
                            let (state, mut completion) = complete_turn(&next, own_values);
                            effects.append(&mut completion);
                            return (state, effects);
                        }
                    } else {
                        effects.push(Effect::SendResolutionRequest(own_values));
                        return (
                            BattleState::Resolving(Resolving {
                                attacker_is_self: next.attacker_is_self,
                                own_values,
                            }),
                            effects,
                        );
                    }
                }
                (BattleState::ProcessingTurn(next), effects)
            }

            (BattleState::ProcessingTurn(turn), Event::PeerCalcConfirmReceived | Event::OwnCalcConfirmAcked) => {
                let mut next = turn.clone();
                next.peer_confirm_seen = true;
                if next.own_confirm_sent {
                    if let Some(values) = next.own_report {
                        return complete_turn(&next, values);
                    }
                }
                (BattleState::ProcessingTurn(next), vec![])
            }

            (BattleState::Resolving(resolving), Event::PeerResolutionRequestReceived(peer_values)) => {
                if peer_values == resolving.own_values {
                    let turn = ProcessingTurn {
                        attacker_is_self: resolving.attacker_is_self,
                        move_name: String::new(),
                        use_attack_boost: false,
                        use_defense_boost: false,
                        own_report: Some(resolving.own_values),
                        peer_report: Some(peer_values),
                        own_confirm_sent: true,
                        peer_confirm_seen: true,
                    };
                    complete_turn(&turn, resolving.own_values)
                } else {
                    (
                        BattleState::GameOver { reason: GameOverReason::ProtocolDesync },
                        vec![Effect::EndBattle(GameOverReason::ProtocolDesync)],
                    )
                }
            }

            (_, Event::PeerUnreachable) => (
                BattleState::GameOver { reason: GameOverReason::PeerLost },
                vec![Effect::EndBattle(GameOverReason::PeerLost)],
            ),

            (state, event) => (
                state,
                vec![Effect::Log(format!("ignoring {event:?} in current state"))],
            ),
        }
    }
}
