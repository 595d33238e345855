//! Session/role management and the per-turn battle state machine: the
//! layer between the reliability substrate and the damage engine.

mod error;
mod session;
mod state_machine;
mod types;

pub use error::SessionError;
pub use session::{Outbound, Outcome, Session, UiEvent, STICKER_MAX_BASE64_BYTES};
pub use state_machine::{BattleState, CalcValues, Effect, Event, GameOverReason};
pub use types::{PeerEndpoint, Role};
