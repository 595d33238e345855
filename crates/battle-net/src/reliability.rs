//! Retransmission and duplicate suppression over an unreliable datagram
//! `Transport`.
//!
//! The session layer assigns each outbound `Message` its sequence number;
//! this module only tracks which sequence numbers are still unacknowledged
//! per peer, resends them on a timer, and filters already-seen inbound
//! sequence numbers before the session layer ever sees them.

use crate::error::ReliabilityError;
use crate::transport::Transport;
use battle_wire::{decode, encode, Ack, Message};
use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy)]
pub struct ReliabilityConfig {
    pub retry_interval: Duration,
    pub max_retries: u32,
    pub dedup_window: usize,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        ReliabilityConfig {
            retry_interval: Duration::from_millis(500),
            max_retries: 3,
            dedup_window: 1024,
        }
    }
}

struct Pending {
    bytes: Vec<u8>,
    last_sent: Instant,
    attempts: u32,
}

/// Per-peer outbound retry queue and inbound dedup window.
#[derive(Default)]
struct PeerState {
    pending: HashMap<u64, Pending>,
    seen: HashSet<u64>,
    seen_order: VecDeque<u64>,
}

impl PeerState {
    fn remember_seen(&mut self, window: usize, sequence_number: u64) {
        self.seen.insert(sequence_number);
        self.seen_order.push_back(sequence_number);
        while self.seen_order.len() > window {
            if let Some(oldest) = self.seen_order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
    }
}

/// A reliable, per-peer datagram channel layered over any `Transport`.
pub struct ReliableChannel {
    transport: Arc<dyn Transport>,
    config: ReliabilityConfig,
    peers: HashMap<SocketAddr, PeerState>,
}

impl ReliableChannel {
    pub fn new(transport: Arc<dyn Transport>, config: ReliabilityConfig) -> Self {
        ReliableChannel {
            transport,
            config,
            peers: HashMap::new(),
        }
    }

    /// Encode and send `message` to `peer`, registering it for retry if it
    /// carries a sequence number (Acks themselves are fire-and-forget).
    pub async fn send(
        &mut self,
        peer: SocketAddr,
        message: &Message,
    ) -> Result<(), ReliabilityError> {
        let bytes = encode(message);
        self.transport.send_to(&bytes, peer).await?;

        if let Some(sequence_number) = message.sequence_number() {
            let state = self.peers.entry(peer).or_default();
            state.pending.insert(
                sequence_number,
                Pending {
                    bytes,
                    last_sent: Instant::now(),
                    attempts: 1,
                },
            );
        }
        Ok(())
    }

    /// Block for the next inbound datagram and run it through dedup/ack
    /// bookkeeping in one step — the method the event loop actually polls.
    pub async fn recv(&mut self) -> Result<Option<(Message, SocketAddr)>, ReliabilityError> {
        let (bytes, from) = self.transport.recv_from().await?;
        Ok(self.on_datagram(&bytes, from).await?.map(|m| (m, from)))
    }

    /// The peer this channel last received a datagram from, together with
    /// every peer with currently-pending retransmissions — useful for a
    /// caller that needs `SocketAddr`s rather than message content.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Feed an inbound datagram through dedup and ack bookkeeping.
    ///
    /// Returns `Some(message)` for a new, application-relevant message
    /// (with its Ack already sent back), or `None` for an Ack, a duplicate,
    /// or an undecodable datagram (logged and swallowed — a corrupt
    /// datagram is treated the same as a dropped one).
    pub async fn on_datagram(
        &mut self,
        bytes: &[u8],
        from: SocketAddr,
    ) -> Result<Option<Message>, ReliabilityError> {
        let message = match decode(bytes) {
            Ok(m) => m,
            Err(e) => {
                warn!(peer = %from, error = %e, "dropping undecodable datagram");
                return Ok(None);
            }
        };

        if let Message::Ack(Ack { ack_number }) = message {
            if let Some(state) = self.peers.get_mut(&from) {
                state.pending.remove(&ack_number);
            }
            return Ok(None);
        }

        let Some(sequence_number) = message.sequence_number() else {
            return Ok(Some(message));
        };

        let state = self.peers.entry(from).or_default();
        if state.seen.contains(&sequence_number) {
            trace!(peer = %from, sequence_number, "duplicate suppressed");
            self.send(from, &Message::Ack(Ack { ack_number: sequence_number }))
                .await?;
            return Ok(None);
        }
        state.remember_seen(self.config.dedup_window, sequence_number);

        self.send(from, &Message::Ack(Ack { ack_number: sequence_number }))
            .await?;
        Ok(Some(message))
    }

    /// Resend anything past its retry interval; return peers whose retry
    /// budget has been exhausted so the caller can tear down the session.
    pub async fn tick(&mut self) -> Result<Vec<SocketAddr>, ReliabilityError> {
        let mut unreachable = Vec::new();
        for (&peer, state) in &mut self.peers {
            let mut exhausted = Vec::new();
            for (&sequence_number, pending) in &mut state.pending {
                if pending.last_sent.elapsed() < self.config.retry_interval {
                    continue;
                }
                // attempts counts sends already made, starting at 1 for the original
                // send; give up once that many retries (beyond the original) have run.
                if pending.attempts > self.config.max_retries {
                    exhausted.push(sequence_number);
                    continue;
                }
                debug!(%peer, sequence_number, attempts = pending.attempts, "retransmitting");
                self.transport.send_to(&pending.bytes, peer).await?;
                pending.last_sent = Instant::now();
                pending.attempts += 1;
            }
            if !exhausted.is_empty() {
                for sequence_number in exhausted {
                    state.pending.remove(&sequence_number);
                }
                unreachable.push(peer);
            }
        }
        Ok(unreachable)
    }
}
