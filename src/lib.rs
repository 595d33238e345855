//! The battle engine library: wires the wire codec, reliability layer,
//! and session/state machine into a runnable cooperative event loop.

pub use battle_model as model;
pub use battle_net as net;
pub use battle_session as session;
pub use battle_wire as wire;

pub mod cli;
pub mod config;
pub mod demo_catalog;
pub mod error;
pub mod runtime;

pub use error::{BattleFailure, FailureKind};
