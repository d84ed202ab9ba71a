//! # Keyrace
//!
//! Realtime multiplayer typing race backend. Players create and join
//! rooms over WebSocket, synchronize a ready/countdown handshake, see
//! each other's live progress, and race for the single winner slot.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keyrace::prelude::*;
//!
//! # async fn run() -> Result<(), KeyraceError> {
//! let server = KeyraceServer::builder()
//!     .bind("0.0.0.0:4000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;
mod texts;

pub use error::KeyraceError;
pub use server::{KeyraceServer, KeyraceServerBuilder};
pub use texts::TextBank;

/// Common imports for running a Keyrace server.
pub mod prelude {
    pub use crate::{
        KeyraceError, KeyraceServer, KeyraceServerBuilder, TextBank,
    };
    pub use keyrace_protocol::{
        ClientMessage, Codec, JsonCodec, RoomId, RosterEntry,
        ServerMessage,
    };
    pub use keyrace_room::{
        RacePhase, RoomConfig, RoomError, RoomRegistry,
    };
    pub use keyrace_transport::ConnectionId;
}
