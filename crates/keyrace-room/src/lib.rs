//! Room lifecycle management for Keyrace.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! roster, the ready/countdown handshake, live progress relay, and
//! winner arbitration. All events against one room serialize through its
//! command channel; different rooms proceed fully independently.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — owns the id → room mapping; creates, resolves,
//!   and deletes rooms
//! - [`RoomHandle`] — send events to a running room actor
//! - [`RacePhase`] — lifecycle state machine
//! - [`RoomConfig`] — room settings (countdown, minimum field)

mod config;
mod countdown;
mod error;
mod player;
mod registry;
mod room;

pub use config::{RacePhase, RoomConfig};
pub use error::RoomError;
pub use player::Player;
pub use registry::RoomRegistry;
pub use room::{PlayerSender, RoomHandle, RoomSnapshot};
