//! Wire protocol for Keyrace.
//!
//! This crate defines the messages clients and the server exchange:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`RoomId`],
//!   [`RosterEntry`]) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding
//!   or decoding.
//!
//! The protocol layer sits between transport (raw frames) and the room
//! layer (race state). It knows nothing about connections or rooms,
//! only how messages are shaped.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientMessage, RoomId, RosterEntry, ServerMessage};
