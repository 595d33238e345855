//! An in-memory, fault-injecting loopback `Transport` for integration
//! tests: no real sockets, but datagrams can be dropped, duplicated,
//! delayed, or reordered under a seeded schedule, the way the reliability
//! layer has to cope with on a real network.

use async_trait::async_trait;
use battle_net::Transport;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::sleep;

/// Deterministic fault-injection knobs for a `LoopbackNetwork` link.
#[derive(Debug, Clone, Copy)]
pub struct FaultSchedule {
    pub drop_probability: f64,
    pub duplicate_probability: f64,
    pub reorder_probability: f64,
    pub max_delay: Duration,
    pub seed: u64,
}

impl Default for FaultSchedule {
    fn default() -> Self {
        FaultSchedule {
            drop_probability: 0.0,
            duplicate_probability: 0.0,
            reorder_probability: 0.0,
            max_delay: Duration::ZERO,
            seed: 0,
        }
    }
}

struct Inbox {
    queue: Mutex<VecDeque<(Vec<u8>, SocketAddr)>>,
    notify: Notify,
}

impl Default for Inbox {
    fn default() -> Self {
        Inbox {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }
}

/// A single endpoint on a `LoopbackNetwork`: implements `Transport` by
/// pushing into the peer's inbox instead of a socket.
pub struct LoopbackTransport {
    addr: SocketAddr,
    inboxes: std::sync::Arc<std::collections::HashMap<SocketAddr, std::sync::Arc<Inbox>>>,
    faults: FaultSchedule,
    rng: Mutex<StdRng>,
}

impl LoopbackTransport {
    fn own_inbox(&self) -> &Inbox {
        self.inboxes.get(&self.addr).expect("self must be registered")
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send_to(&self, bytes: &[u8], target: SocketAddr) -> io::Result<()> {
        let Some(inbox) = self.inboxes.get(&target) else {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such peer"));
        };

        let (drop_it, duplicate_it, delay) = {
            let mut rng = self.rng.lock().unwrap();
            let drop_it = rng.gen_bool(self.faults.drop_probability);
            let duplicate_it = rng.gen_bool(self.faults.duplicate_probability);
            let delay_ms = if self.faults.max_delay.is_zero() {
                0
            } else {
                rng.gen_range(0..=self.faults.max_delay.as_millis() as u64)
            };
            (drop_it, duplicate_it, Duration::from_millis(delay_ms))
        };

        if drop_it {
            return Ok(());
        }

        let copies = if duplicate_it { 2 } else { 1 };
        for _ in 0..copies {
            let inbox = inbox.clone();
            let bytes = bytes.to_vec();
            let from = self.addr;
            if delay.is_zero() {
                inbox.queue.lock().unwrap().push_back((bytes, from));
                inbox.notify.notify_one();
            } else {
                tokio::spawn(async move {
                    sleep(delay).await;
                    inbox.queue.lock().unwrap().push_back((bytes, from));
                    inbox.notify.notify_one();
                });
            }
        }
        Ok(())
    }

    async fn recv_from(&self) -> io::Result<(Vec<u8>, SocketAddr)> {
        loop {
            if let Some(datagram) = self.own_inbox().queue.lock().unwrap().pop_front() {
                return Ok(datagram);
            }
            self.own_inbox().notify.notified().await;
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.addr)
    }
}

/// A closed set of peers wired together in memory. Build one, register
/// every participant's address, then hand each participant its
/// `LoopbackTransport`.
pub struct LoopbackNetwork {
    inboxes: std::sync::Arc<std::collections::HashMap<SocketAddr, std::sync::Arc<Inbox>>>,
}

impl LoopbackNetwork {
    pub fn new(peers: &[SocketAddr]) -> Self {
        let inboxes = peers
            .iter()
            .map(|&addr| (addr, std::sync::Arc::new(Inbox::default())))
            .collect();
        LoopbackNetwork {
            inboxes: std::sync::Arc::new(inboxes),
        }
    }

    pub fn transport_for(&self, addr: SocketAddr, faults: FaultSchedule) -> LoopbackTransport {
        LoopbackTransport {
            addr,
            inboxes: self.inboxes.clone(),
            faults,
            rng: Mutex::new(StdRng::seed_from_u64(faults.seed)),
        }
    }
}
