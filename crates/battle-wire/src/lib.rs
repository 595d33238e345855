//! The wire codec: encode/decode framed text messages and validate schema
//! (component §4.1 — "Wire Codec" in the battle engine design).
//!
//! Messages are UTF-8 text, one per datagram, newline-separated
//! `key: value` lines with `message_type: <KIND>` as the first line.

mod codec;
mod error;
mod types;

pub use codec::{decode, encode};
pub use error::WireError;
pub use types::*;
